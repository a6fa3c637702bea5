//! Theme preference stored in the local key-value store.
//!
//! # Invariants
//! - Missing or unrecognized stored values read as `Light`.

use crate::persist::kv::{KvStore, THEME_KEY};
use crate::persist::PersistResult;
use log::info;
use rusqlite::Connection;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read/write access to the persisted theme.
pub struct ThemeSettings<'conn> {
    kv: KvStore<'conn>,
}

impl<'conn> ThemeSettings<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            kv: KvStore::new(conn),
        }
    }

    pub fn load(&self) -> PersistResult<Theme> {
        let stored = self.kv.get(THEME_KEY)?;
        Ok(stored
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default())
    }

    pub fn set(&self, theme: Theme) -> PersistResult<()> {
        self.kv.set(THEME_KEY, theme.as_str())?;
        info!("event=theme_set module=settings status=ok theme={theme}");
        Ok(())
    }

    /// Flips the stored theme and returns the new value.
    pub fn toggle(&self) -> PersistResult<Theme> {
        let next = self.load()?.toggled();
        self.set(next)?;
        Ok(next)
    }
}
