//! Core task list logic.
//! This crate is the single source of truth for task invariants.

pub mod board;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod render;
pub mod settings;
pub mod store;
pub mod transfer;
pub mod view;

pub use board::{Frame, Notice, NoticeKind, TaskBoard};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, Backend, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Priority, Task, TaskId, TaskPatch, TaskRecord, TaskValidationError};
pub use persist::kv::KvStore;
pub use persist::local::LocalTaskPersistence;
pub use persist::remote::RemoteTaskPersistence;
pub use persist::{PersistError, PersistResult, TaskPersistence};
pub use render::{format_rows, render_rows, Intent, TaskRow};
pub use settings::{Theme, ThemeSettings};
pub use store::task_store::{ImportReport, StoreError, StoreResult, TaskStore};
pub use transfer::{export_json, parse_import};
pub use view::projection::{project, SortKey, TaskFilter, ViewState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
