//! Persistence adapters for the task collection.
//!
//! # Responsibility
//! - Define the durability contract the `TaskStore` calls after each mutation.
//! - Provide the local (SQLite key-value) and remote (HTTP API) adapters.
//!
//! # Invariants
//! - Adapters never transform task data beyond wire encoding.
//! - Every adapter hook receives the post-mutation snapshot; the store only
//!   commits that snapshot in memory after the hook returns `Ok`.
//! - No hook retries a failed write.

use crate::db::DbError;
use crate::model::task::{Task, TaskId, TaskPatch, TaskRecord};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod kv;
pub mod local;
pub mod remote;

pub type PersistResult<T> = Result<T, PersistError>;

/// Adapter-level failure.
#[derive(Debug)]
pub enum PersistError {
    /// Local durable store could not be read or written.
    Storage(DbError),
    /// Task collection could not be encoded.
    Serialization(serde_json::Error),
    /// Network failure or non-success HTTP status.
    Transport {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },
    /// Remote service reports the task does not exist.
    NotFound(TaskId),
    /// Remote payload could not be decoded.
    InvalidData(String),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage failure: {err}"),
            Self::Serialization(err) => write!(f, "failed to encode tasks: {err}"),
            Self::Transport {
                endpoint,
                status: Some(status),
                message,
            } => write!(f, "request to {endpoint} failed with status {status}: {message}"),
            Self::Transport {
                endpoint,
                status: None,
                message,
            } => write!(f, "request to {endpoint} failed: {message}"),
            Self::NotFound(id) => write!(f, "task not found on server: {id}"),
            Self::InvalidData(message) => write!(f, "invalid task payload: {message}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Transport { .. } | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Durability contract for `TaskStore`.
///
/// Each hook is called exactly once per store mutation. `snapshot` is the
/// full collection as it will look once the mutation commits. Hooks that
/// return tasks hand back the canonical records the store should keep
/// (a remote service may assign its own ids and timestamps).
pub trait TaskPersistence {
    /// Short backend label for logs (`local`, `remote`).
    fn backend(&self) -> &'static str;

    /// Reads the stored collection as loosely-typed records.
    ///
    /// The store fills in missing ids and timestamps and drops unusable
    /// records, so adapters only skip entries they cannot decode at all.
    fn load_tasks(&self) -> PersistResult<Vec<TaskRecord>>;

    fn task_created(&self, task: &Task, snapshot: &[Task]) -> PersistResult<Task>;

    fn task_updated(&self, task: &Task, patch: &TaskPatch, snapshot: &[Task])
        -> PersistResult<Task>;

    fn task_removed(&self, id: &TaskId, snapshot: &[Task]) -> PersistResult<()>;

    fn tasks_reordered(&self, snapshot: &[Task]) -> PersistResult<()>;

    /// `removed` is the collection as it was before the clear.
    fn tasks_cleared(&self, removed: &[Task]) -> PersistResult<()>;

    fn tasks_imported(&self, added: &[Task], snapshot: &[Task]) -> PersistResult<Vec<Task>>;
}

impl<P: TaskPersistence + ?Sized> TaskPersistence for Box<P> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    fn load_tasks(&self) -> PersistResult<Vec<TaskRecord>> {
        (**self).load_tasks()
    }

    fn task_created(&self, task: &Task, snapshot: &[Task]) -> PersistResult<Task> {
        (**self).task_created(task, snapshot)
    }

    fn task_updated(
        &self,
        task: &Task,
        patch: &TaskPatch,
        snapshot: &[Task],
    ) -> PersistResult<Task> {
        (**self).task_updated(task, patch, snapshot)
    }

    fn task_removed(&self, id: &TaskId, snapshot: &[Task]) -> PersistResult<()> {
        (**self).task_removed(id, snapshot)
    }

    fn tasks_reordered(&self, snapshot: &[Task]) -> PersistResult<()> {
        (**self).tasks_reordered(snapshot)
    }

    fn tasks_cleared(&self, removed: &[Task]) -> PersistResult<()> {
        (**self).tasks_cleared(removed)
    }

    fn tasks_imported(&self, added: &[Task], snapshot: &[Task]) -> PersistResult<Vec<Task>> {
        (**self).tasks_imported(added, snapshot)
    }
}
