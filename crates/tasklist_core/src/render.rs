//! Display rows and user intents.
//!
//! # Responsibility
//! - Materialize a projection into display rows, rebuilt from scratch on
//!   every call.
//! - Name every user action a row can trigger as an `Intent`.
//!
//! # Invariants
//! - Rendering holds no task state between calls.
//! - Row order equals projection order.

use crate::model::task::{Priority, Task, TaskId};
use chrono::NaiveDate;

/// One displayed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    /// `Due: YYYY-MM-DD` when the task has a due date.
    pub due_label: Option<String>,
    pub overdue: bool,
}

/// User action wired to a row or to the list controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add {
        text: String,
        due_date: Option<String>,
        priority: Option<Priority>,
    },
    ToggleComplete(TaskId),
    /// Inline edit committed on focus loss; blank text discards the edit.
    CommitEdit { id: TaskId, text: String },
    /// `high -> medium -> low -> high`.
    CyclePriority(TaskId),
    /// `None` or blank clears the due date.
    SetDueDate { id: TaskId, due_date: Option<String> },
    Delete(TaskId),
    /// Drag-and-drop: `moved` is reinserted before the row under the pointer.
    Drop { moved: TaskId, target: TaskId },
    ClearAll,
}

/// Builds display rows for `projection`.
pub fn render_rows(projection: &[&Task], today: NaiveDate) -> Vec<TaskRow> {
    projection
        .iter()
        .map(|task| TaskRow {
            id: task.id.clone(),
            text: task.text.clone(),
            completed: task.completed,
            priority: task.priority,
            due_label: task.due_date.as_ref().map(|due| format!("Due: {due}")),
            overdue: task.is_overdue(today),
        })
        .collect()
}

/// Formats rows as terminal lines.
///
/// Example: `[x] Buy milk  (high)  Due: 2024-01-01 !  #<id>`
pub fn format_rows(rows: &[TaskRow]) -> Vec<String> {
    rows.iter().map(format_row).collect()
}

fn format_row(row: &TaskRow) -> String {
    let mut line = format!(
        "[{}] {}  ({})",
        if row.completed { "x" } else { " " },
        row.text,
        row.priority
    );
    if let Some(due) = &row.due_label {
        line.push_str("  ");
        line.push_str(due);
        if row.overdue {
            line.push_str(" !");
        }
    }
    line.push_str("  #");
    line.push_str(row.id.as_str());
    line
}
