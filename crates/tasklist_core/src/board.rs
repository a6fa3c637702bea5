//! Interaction loop: intent, mutation, projection, rows.
//!
//! # Responsibility
//! - Apply one user intent to the store and rebuild the displayed rows.
//! - Convert failures into non-fatal notices after logging them.
//!
//! # Invariants
//! - A failed intent leaves the collection and view state unchanged.
//! - Rows are always recomputed from the store after every call.

use crate::clock::{Clock, SystemClock};
use crate::model::task::{TaskPatch, TaskValidationError};
use crate::persist::TaskPersistence;
use crate::render::{render_rows, Intent, TaskRow};
use crate::store::task_store::{ImportReport, StoreError, TaskStore};
use crate::transfer::{export_json, parse_import};
use crate::view::projection::{project, SortKey, TaskFilter, ViewState};
use log::{debug, error, warn};

/// Category of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    NotFound,
    Storage,
    Transport,
}

/// Non-fatal message shown next to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl From<&StoreError> for Notice {
    fn from(err: &StoreError) -> Self {
        let kind = match err {
            StoreError::Validation(_) => NoticeKind::Validation,
            StoreError::NotFound(_) => NoticeKind::NotFound,
            StoreError::Storage(_) => NoticeKind::Storage,
            StoreError::Transport(_) => NoticeKind::Transport,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Rows to display plus an optional notice from the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub rows: Vec<TaskRow>,
    pub notice: Option<Notice>,
}

/// Task store bundled with the current view controls.
pub struct TaskBoard<P: TaskPersistence, C: Clock = SystemClock> {
    store: TaskStore<P, C>,
    view: ViewState,
}

impl<P: TaskPersistence, C: Clock> TaskBoard<P, C> {
    pub fn new(store: TaskStore<P, C>) -> Self {
        Self {
            store,
            view: ViewState::default(),
        }
    }

    pub fn store(&self) -> &TaskStore<P, C> {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Current rows without applying any intent.
    pub fn frame(&self) -> Frame {
        Frame {
            rows: self.rows(),
            notice: None,
        }
    }

    pub fn rows(&self) -> Vec<TaskRow> {
        let today = self.store.clock().today();
        render_rows(&project(self.store.list(), &self.view, today), today)
    }

    pub fn set_view(&mut self, view: ViewState) -> Frame {
        self.view = view;
        self.frame()
    }

    pub fn set_filter(&mut self, filter: TaskFilter) -> Frame {
        self.view.filter = filter;
        self.frame()
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> Frame {
        self.view.query = query.into();
        self.frame()
    }

    pub fn set_sort(&mut self, sort: SortKey) -> Frame {
        self.view.sort = sort;
        self.frame()
    }

    /// Reloads the collection from the adapter.
    pub fn refresh(&mut self) -> Frame {
        let result = self.store.refresh().map(|_| ());
        self.finish("refresh", result)
    }

    /// Applies one intent and returns the rebuilt rows.
    pub fn dispatch(&mut self, intent: Intent) -> Frame {
        let action = intent_name(&intent);
        let result = self.apply(intent);
        self.finish(action, result)
    }

    /// Exports the full collection (ignoring the view) as JSON.
    pub fn export_json(&self) -> Result<String, Notice> {
        export_json(self.store.list()).map_err(|err| {
            error!("event=tasks_export module=board status=error error={err}");
            Notice {
                kind: NoticeKind::Storage,
                message: format!("failed to export tasks: {err}"),
            }
        })
    }

    /// Imports a JSON payload; returns the report when it was applied.
    pub fn import_json(&mut self, payload: &str) -> (Frame, Option<ImportReport>) {
        let result = parse_import(payload)
            .map_err(StoreError::from)
            .and_then(|records| self.store.import(records));
        match result {
            Ok(report) => (self.frame(), Some(report)),
            Err(err) => (self.finish("import", Err(err)), None),
        }
    }

    fn apply(&mut self, intent: Intent) -> Result<(), StoreError> {
        match intent {
            Intent::Add {
                text,
                due_date,
                priority,
            } => self
                .store
                .add(&text, due_date.as_deref(), priority)
                .map(|_| ()),
            Intent::ToggleComplete(id) => self.store.toggle(&id).map(|_| ()),
            Intent::CommitEdit { id, text } => {
                if text.trim().is_empty() {
                    debug!("event=task_edit module=board status=discarded task_id={id}");
                    return Ok(());
                }
                self.store.update(&id, &TaskPatch::text(text)).map(|_| ())
            }
            Intent::CyclePriority(id) => {
                let next = self
                    .store
                    .get(&id)
                    .map(|task| task.priority.cycled())
                    .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                self.store.update(&id, &TaskPatch::priority(next)).map(|_| ())
            }
            Intent::SetDueDate { id, due_date } => self
                .store
                .update(&id, &TaskPatch::due_date(due_date))
                .map(|_| ()),
            Intent::Delete(id) => self.store.remove(&id),
            Intent::Drop { moved, target } => self.store.reorder(&moved, &target).map(|_| ()),
            Intent::ClearAll => self.store.clear().map(|_| ()),
        }
    }

    fn finish(&self, action: &str, result: Result<(), StoreError>) -> Frame {
        let notice = match result {
            Ok(()) => None,
            Err(err) => {
                log_failure(action, &err);
                Some(Notice::from(&err))
            }
        };
        Frame {
            rows: self.rows(),
            notice,
        }
    }
}

fn log_failure(action: &str, err: &StoreError) {
    match err {
        StoreError::Validation(_) | StoreError::NotFound(_) => {
            warn!("event=intent module=board status=rejected action={action} error={err}");
        }
        StoreError::Storage(_) | StoreError::Transport(_) => {
            error!("event=intent module=board status=error action={action} error={err}");
        }
    }
}

fn intent_name(intent: &Intent) -> &'static str {
    match intent {
        Intent::Add { .. } => "add",
        Intent::ToggleComplete(_) => "toggle",
        Intent::CommitEdit { .. } => "edit",
        Intent::CyclePriority(_) => "cycle_priority",
        Intent::SetDueDate { .. } => "set_due_date",
        Intent::Delete(_) => "delete",
        Intent::Drop { .. } => "reorder",
        Intent::ClearAll => "clear",
    }
}

impl From<TaskValidationError> for Notice {
    fn from(err: TaskValidationError) -> Self {
        Self {
            kind: NoticeKind::Validation,
            message: err.to_string(),
        }
    }
}
