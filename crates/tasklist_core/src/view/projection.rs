//! Filter, search and sort projection.
//!
//! # Responsibility
//! - Turn `(tasks, view state, today)` into an ordered list of references.
//!
//! # Invariants
//! - Stages run in a fixed order: filter, then search, then sort.
//! - Sorting is stable: ties keep collection order.
//! - The projection never clones or mutates tasks.

use crate::model::task::{Priority, Task, TaskValidationError};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which tasks are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
    /// Open tasks whose due date is strictly before today.
    Overdue,
    Priority(Priority),
}

impl TaskFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Priority(priority) => priority.as_str(),
        }
    }

    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
            Self::Overdue => task.is_overdue(today),
            Self::Priority(priority) => task.priority == priority,
        }
    }
}

impl Display for TaskFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "overdue" => Ok(Self::Overdue),
            "high" => Ok(Self::Priority(Priority::High)),
            "medium" => Ok(Self::Priority(Priority::Medium)),
            "low" => Ok(Self::Priority(Priority::Low)),
            _ => Err(TaskValidationError::UnknownFilter(value.to_string())),
        }
    }
}

/// Display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Newest first.
    #[default]
    CreatedDesc,
    CreatedAsc,
    /// Earliest due date first; tasks without a due date last.
    DueAsc,
    /// `high`, then `medium`, then `low`.
    Priority,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedDesc => "created_desc",
            Self::CreatedAsc => "created_asc",
            Self::DueAsc => "due_asc",
            Self::Priority => "priority",
        }
    }

    pub fn compare(self, left: &Task, right: &Task) -> Ordering {
        match self {
            Self::CreatedDesc => right.created_at.cmp(&left.created_at),
            Self::CreatedAsc => left.created_at.cmp(&right.created_at),
            Self::DueAsc => match (left.due_date.as_deref(), right.due_date.as_deref()) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Priority => left.priority.cmp(&right.priority),
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "created_desc" => Ok(Self::CreatedDesc),
            "created_asc" => Ok(Self::CreatedAsc),
            "due_asc" => Ok(Self::DueAsc),
            "priority" => Ok(Self::Priority),
            _ => Err(TaskValidationError::UnknownSort(value.to_string())),
        }
    }
}

/// User-selected view controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: TaskFilter,
    /// Case-insensitive substring; blank matches everything.
    pub query: String,
    pub sort: SortKey,
}

impl ViewState {
    pub fn new(filter: TaskFilter, query: impl Into<String>, sort: SortKey) -> Self {
        Self {
            filter,
            query: query.into(),
            sort,
        }
    }
}

/// Projects `tasks` through `view`.
pub fn project<'a>(tasks: &'a [Task], view: &ViewState, today: NaiveDate) -> Vec<&'a Task> {
    let needle = view.query.trim().to_lowercase();

    let mut projected: Vec<&Task> = tasks
        .iter()
        .filter(|task| view.filter.matches(task, today))
        .filter(|task| needle.is_empty() || task.text.to_lowercase().contains(&needle))
        .collect();

    projected.sort_by(|left, right| view.sort.compare(left, right));
    projected
}

#[cfg(test)]
mod tests {
    use super::{SortKey, TaskFilter};
    use crate::model::task::Priority;

    #[test]
    fn labels_parse_back_to_their_values() {
        for filter in [
            TaskFilter::All,
            TaskFilter::Active,
            TaskFilter::Completed,
            TaskFilter::Overdue,
            TaskFilter::Priority(Priority::High),
            TaskFilter::Priority(Priority::Medium),
            TaskFilter::Priority(Priority::Low),
        ] {
            assert_eq!(filter.as_str().parse::<TaskFilter>(), Ok(filter));
        }
        assert!("someday".parse::<TaskFilter>().is_err());
        assert!("alphabetical".parse::<SortKey>().is_err());
    }
}
