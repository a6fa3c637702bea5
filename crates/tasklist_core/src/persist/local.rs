//! Local persistence adapter.
//!
//! # Responsibility
//! - Serialize the whole collection under the `tasks` key on every mutation.
//! - Recover from corrupt stored values by starting from an empty list.
//!
//! # Invariants
//! - A stored value that is not a JSON array loads as empty; this never fails
//!   the caller.
//! - One undecodable entry is dropped alone; the rest of the array loads.

use crate::model::task::{Task, TaskId, TaskPatch, TaskRecord};
use crate::persist::kv::{KvStore, TASKS_KEY};
use crate::persist::{PersistResult, TaskPersistence};
use log::{debug, warn};
use rusqlite::Connection;
use serde_json::Value;

/// Adapter writing the collection into the local key-value store.
pub struct LocalTaskPersistence<'conn> {
    kv: KvStore<'conn>,
}

impl<'conn> LocalTaskPersistence<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            kv: KvStore::new(conn),
        }
    }

    fn write_snapshot(&self, snapshot: &[Task]) -> PersistResult<()> {
        let encoded = serde_json::to_string(snapshot)?;
        self.kv.set(TASKS_KEY, &encoded)?;
        debug!(
            "event=tasks_write module=persist status=ok backend=local count={}",
            snapshot.len()
        );
        Ok(())
    }
}

impl TaskPersistence for LocalTaskPersistence<'_> {
    fn backend(&self) -> &'static str {
        "local"
    }

    fn load_tasks(&self) -> PersistResult<Vec<TaskRecord>> {
        let Some(raw) = self.kv.get(TASKS_KEY)? else {
            return Ok(Vec::new());
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(
                    "event=tasks_load module=persist status=recovered backend=local reason=not_an_array"
                );
                return Ok(Vec::new());
            }
            Err(err) => {
                warn!(
                    "event=tasks_load module=persist status=recovered backend=local reason=corrupt_value error={err}"
                );
                return Ok(Vec::new());
            }
        };

        let total = entries.len();
        let records: Vec<TaskRecord> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        if records.len() != total {
            warn!(
                "event=tasks_load module=persist status=recovered backend=local reason=undecodable_record dropped={}",
                total - records.len()
            );
        }
        Ok(records)
    }

    fn task_created(&self, task: &Task, snapshot: &[Task]) -> PersistResult<Task> {
        self.write_snapshot(snapshot)?;
        Ok(task.clone())
    }

    fn task_updated(
        &self,
        task: &Task,
        _patch: &TaskPatch,
        snapshot: &[Task],
    ) -> PersistResult<Task> {
        self.write_snapshot(snapshot)?;
        Ok(task.clone())
    }

    fn task_removed(&self, _id: &TaskId, snapshot: &[Task]) -> PersistResult<()> {
        self.write_snapshot(snapshot)
    }

    fn tasks_reordered(&self, snapshot: &[Task]) -> PersistResult<()> {
        self.write_snapshot(snapshot)
    }

    fn tasks_cleared(&self, _removed: &[Task]) -> PersistResult<()> {
        self.write_snapshot(&[])
    }

    fn tasks_imported(&self, added: &[Task], snapshot: &[Task]) -> PersistResult<Vec<Task>> {
        self.write_snapshot(snapshot)?;
        Ok(added.to_vec())
    }
}
