//! Task store.
//!
//! # Responsibility
//! - Provide add/update/remove/reorder/clear/import over an ordered list.
//! - Keep the in-memory collection and the durable store in step.
//!
//! # Invariants
//! - Ids are unique within the collection.
//! - Every mutating call performs exactly one adapter write before returning;
//!   calls that change nothing perform none.
//! - A failed write leaves the collection exactly as it was.
//! - New `created_at` values strictly increase within a store instance.

use crate::clock::{Clock, SystemClock};
use crate::model::task::{
    normalize_due_date, normalize_text, Priority, Task, TaskId, TaskPatch, TaskRecord,
    TaskValidationError,
};
use crate::persist::{PersistError, TaskPersistence};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by task store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before any state change.
    Validation(TaskValidationError),
    /// No task with this id in the collection (or on the server).
    NotFound(TaskId),
    /// Local durable store failed.
    Storage(PersistError),
    /// Remote request failed.
    Transport(PersistError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
            Self::Transport(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistError> for StoreError {
    fn from(value: PersistError) -> Self {
        match value {
            PersistError::NotFound(id) => Self::NotFound(id),
            err @ (PersistError::Storage(_) | PersistError::Serialization(_)) => Self::Storage(err),
            err @ (PersistError::Transport { .. } | PersistError::InvalidData(_)) => {
                Self::Transport(err)
            }
        }
    }
}

/// Outcome of [`TaskStore::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Ordered task collection backed by a persistence adapter.
pub struct TaskStore<P: TaskPersistence, C: Clock = SystemClock> {
    persistence: P,
    clock: C,
    tasks: Vec<Task>,
    last_created_at: i64,
}

impl<P: TaskPersistence, C: Clock> TaskStore<P, C> {
    /// Creates an empty store without reading the adapter.
    pub fn new(persistence: P, clock: C) -> Self {
        Self {
            persistence,
            clock,
            tasks: Vec::new(),
            last_created_at: i64::MIN,
        }
    }

    /// Creates a store and loads its initial collection from the adapter.
    pub fn open(persistence: P, clock: C) -> StoreResult<Self> {
        let mut store = Self::new(persistence, clock);
        store.refresh()?;
        Ok(store)
    }

    /// Replaces the in-memory collection with the adapter's contents.
    ///
    /// Records lacking an id get a fresh one; records lacking `created_at`
    /// get the next logical timestamp. Records with blank text or a repeated
    /// id are dropped, and an invalid due date is cleared.
    ///
    /// Returns the number of loaded tasks. On failure the previous collection
    /// is kept.
    pub fn refresh(&mut self) -> StoreResult<usize> {
        let records = self.persistence.load_tasks()?;
        let total = records.len();
        if let Some(max_created_at) = records.iter().filter_map(|record| record.created_at).max()
        {
            self.last_created_at = self.last_created_at.max(max_created_at);
        }

        let mut seen: HashSet<TaskId> = HashSet::with_capacity(total);
        let mut tasks = Vec::with_capacity(total);
        for mut record in records {
            if normalize_due_date(record.due_date.as_deref()).is_err() {
                warn!(
                    "event=tasks_refresh module=store status=recovered reason=invalid_due_date"
                );
                record.due_date = None;
            }
            let created_at = self.peek_created_at();
            let Ok(task) = record.into_task(TaskId::generate, || created_at) else {
                continue;
            };
            if !seen.insert(task.id.clone()) {
                continue;
            }
            self.last_created_at = self.last_created_at.max(task.created_at);
            tasks.push(task);
        }

        if tasks.len() != total {
            warn!(
                "event=tasks_refresh module=store status=recovered backend={} dropped={}",
                self.persistence.backend(),
                total - tasks.len()
            );
        }
        self.tasks = tasks;
        info!(
            "event=tasks_refresh module=store status=ok backend={} count={}",
            self.persistence.backend(),
            self.tasks.len()
        );
        Ok(self.tasks.len())
    }

    /// Current collection in display order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Creates a task at the head of the collection.
    ///
    /// # Errors
    /// - `Validation` when text trims to empty or the due date is malformed.
    /// - `Storage`/`Transport` when the adapter write fails.
    pub fn add(
        &mut self,
        text: &str,
        due_date: Option<&str>,
        priority: Option<Priority>,
    ) -> StoreResult<Task> {
        let text = normalize_text(text)?;
        let due_date = normalize_due_date(due_date)?;
        let created_at = self.peek_created_at();

        let mut task = Task::new(&text, created_at)?;
        task.due_date = due_date;
        task.priority = priority.unwrap_or_default();

        let mut candidate = Vec::with_capacity(self.tasks.len() + 1);
        candidate.push(task.clone());
        candidate.extend(self.tasks.iter().cloned());

        let persisted = self.persistence.task_created(&task, &candidate)?;
        self.last_created_at = self.last_created_at.max(created_at);
        self.last_created_at = self.last_created_at.max(persisted.created_at);
        debug!(
            "event=task_add module=store status=ok task_id={} total={}",
            persisted.id,
            candidate.len()
        );
        self.tasks.insert(0, persisted.clone());
        Ok(persisted)
    }

    /// Merges `patch` into the task with `id`.
    ///
    /// # Errors
    /// - `NotFound` when `id` is absent.
    /// - `Validation` when patched text is blank or the due date malformed.
    pub fn update(&mut self, id: &TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        let index = self.index_of(id)?;
        let patch = patch.normalized()?;

        let mut updated = self.tasks[index].clone();
        patch.apply_to(&mut updated);

        let mut candidate = self.tasks.clone();
        candidate[index] = updated.clone();

        let persisted = self
            .persistence
            .task_updated(&updated, &patch, &candidate)?;
        debug!("event=task_update module=store status=ok task_id={id}");
        self.tasks[index] = persisted.clone();
        Ok(persisted)
    }

    /// Flips the completion flag of `id`.
    pub fn toggle(&mut self, id: &TaskId) -> StoreResult<Task> {
        let completed = self.tasks[self.index_of(id)?].completed;
        self.update(id, &TaskPatch::completed(!completed))
    }

    /// Removes the task with `id`.
    pub fn remove(&mut self, id: &TaskId) -> StoreResult<()> {
        let index = self.index_of(id)?;
        let mut candidate = self.tasks.clone();
        candidate.remove(index);

        self.persistence.task_removed(id, &candidate)?;
        debug!(
            "event=task_remove module=store status=ok task_id={id} total={}",
            candidate.len()
        );
        self.tasks = candidate;
        Ok(())
    }

    /// Moves `moved` so it sits immediately before `before`.
    ///
    /// Returns `Ok(false)` without writing when either id is missing or both
    /// ids are equal.
    pub fn reorder(&mut self, moved: &TaskId, before: &TaskId) -> StoreResult<bool> {
        if moved == before {
            return Ok(false);
        }
        let (Some(from), Some(_)) = (self.position(moved), self.position(before)) else {
            debug!("event=task_reorder module=store status=skipped reason=missing_id");
            return Ok(false);
        };

        let mut candidate = self.tasks.clone();
        let task = candidate.remove(from);
        let Some(to) = candidate.iter().position(|item| &item.id == before) else {
            return Ok(false);
        };
        candidate.insert(to, task);

        if candidate == self.tasks {
            return Ok(false);
        }

        self.persistence.tasks_reordered(&candidate)?;
        debug!("event=task_reorder module=store status=ok task_id={moved} before={before}");
        self.tasks = candidate;
        Ok(true)
    }

    /// Removes every task; returns how many were removed.
    pub fn clear(&mut self) -> StoreResult<usize> {
        if self.tasks.is_empty() {
            return Ok(0);
        }
        self.persistence.tasks_cleared(&self.tasks)?;
        let removed = self.tasks.len();
        self.tasks.clear();
        info!("event=tasks_clear module=store status=ok removed={removed}");
        Ok(removed)
    }

    /// Appends imported records in payload order.
    ///
    /// Records without an id get a fresh one. Records whose id already exists
    /// (in the store or earlier in the payload) are skipped without merging.
    /// The whole payload is validated before anything is written.
    pub fn import(&mut self, records: Vec<TaskRecord>) -> StoreResult<ImportReport> {
        let mut seen: HashSet<TaskId> = self.tasks.iter().map(|task| task.id.clone()).collect();
        let mut report = ImportReport::default();
        let mut added = Vec::with_capacity(records.len());
        let mut next_created_at = self.peek_created_at();

        for mut record in records {
            let id = match record.id.take() {
                Some(id) if !id.is_blank() => id,
                _ => TaskId::generate(),
            };
            if !seen.insert(id.clone()) {
                report.skipped += 1;
                continue;
            }

            let task = record.into_task(
                || id,
                || {
                    next_created_at += 1;
                    next_created_at - 1
                },
            )?;
            added.push(task);
        }

        if added.is_empty() {
            info!(
                "event=tasks_import module=store status=ok imported=0 skipped={}",
                report.skipped
            );
            return Ok(report);
        }

        let mut candidate = self.tasks.clone();
        candidate.extend(added.iter().cloned());

        let persisted = self.persistence.tasks_imported(&added, &candidate)?;
        report.imported = persisted.len();
        if let Some(max_created_at) = persisted.iter().map(|task| task.created_at).max() {
            self.last_created_at = self.last_created_at.max(max_created_at);
        }
        self.tasks.extend(persisted);
        info!(
            "event=tasks_import module=store status=ok imported={} skipped={}",
            report.imported, report.skipped
        );
        Ok(report)
    }

    fn peek_created_at(&self) -> i64 {
        let now = self.clock.now_millis();
        if self.last_created_at == i64::MIN {
            return now;
        }
        now.max(self.last_created_at.saturating_add(1))
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    fn index_of(&self, id: &TaskId) -> StoreResult<usize> {
        self.position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
