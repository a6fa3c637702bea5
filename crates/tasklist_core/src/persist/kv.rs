//! String-keyed durable store on top of SQLite.
//!
//! # Responsibility
//! - Provide `get/set/remove` over the `kv_entries` table.
//!
//! # Invariants
//! - `set` is an upsert; the latest write for a key wins.

use crate::persist::PersistResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Key holding the JSON array of task records.
pub const TASKS_KEY: &str = "tasks";
/// Key holding the `light|dark` theme preference.
pub const THEME_KEY: &str = "theme";

/// Key-value access bound to one connection.
#[derive(Clone, Copy)]
pub struct KvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> KvStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    /// Removes `key`; returns whether a value existed.
    pub fn remove(&self, key: &str) -> PersistResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}
