//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical `Task` record shared by store, adapters and views.
//! - Normalize user input before it reaches any collection.
//! - Decode stored, remote and imported records leniently.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `text` is trimmed and non-empty.
//! - `priority` is always one of `high|medium|low`; unknown values decoded
//!   from storage fall back to `medium`, unknown values typed by a user are
//!   rejected.
//! - `due_date`, when present, is the `YYYY-MM-DD` form of a real date for
//!   values written through this module.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

static DUE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid due date regex"));

/// Format used for due dates on the wire and in storage.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failures for task input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Text is blank after trim.
    EmptyText,
    /// Due date is not a `YYYY-MM-DD` calendar date.
    InvalidDueDate(String),
    /// Priority label is not `high|medium|low`.
    UnknownPriority(String),
    /// Filter label is not recognized.
    UnknownFilter(String),
    /// Sort label is not recognized.
    UnknownSort(String),
    /// Import payload is not an array of task objects.
    MalformedImport(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text must not be empty"),
            Self::InvalidDueDate(value) => {
                write!(f, "invalid due date `{value}`; expected YYYY-MM-DD")
            }
            Self::UnknownPriority(value) => {
                write!(f, "unknown priority `{value}`; expected high|medium|low")
            }
            Self::UnknownFilter(value) => write!(
                f,
                "unknown filter `{value}`; expected all|active|completed|overdue|high|medium|low"
            ),
            Self::UnknownSort(value) => write!(
                f,
                "unknown sort `{value}`; expected created_desc|created_asc|due_asc|priority"
            ),
            Self::MalformedImport(message) => write!(f, "malformed import payload: {message}"),
        }
    }
}

impl Error for TaskValidationError {}

/// Opaque task identifier.
///
/// Locally created tasks use UUID v4 strings; remote tasks keep whatever id
/// the server assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether the id carries no usable value.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTaskId {
    Text(String),
    Number(i64),
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older local exports used millisecond timestamps as numeric ids.
        match RawTaskId::deserialize(deserializer)? {
            RawTaskId::Text(value) => Ok(Self(value)),
            RawTaskId::Number(value) => Ok(Self(value.to_string())),
        }
    }
}

/// Task priority.
///
/// Declaration order is the sort order: `High < Medium < Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Next priority in the `high -> medium -> low -> high` cycle.
    pub fn cycled(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low => Self::High,
        }
    }

    /// Parses a stored label, coercing anything unrecognized to `Medium`.
    pub fn from_label_lenient(value: Option<&str>) -> Self {
        value
            .and_then(|label| label.parse().ok())
            .unwrap_or_default()
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(TaskValidationError::UnknownPriority(value.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_label_lenient(label.as_deref()))
    }
}

/// Canonical task record.
///
/// Serialized with camelCase keys (`createdAt`, `dueDate`) to stay compatible
/// with the browser storage layout and the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Document-store responses name this field `_id`.
    #[serde(alias = "_id")]
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Logical creation timestamp in epoch milliseconds.
    pub created_at: i64,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    /// Creates an active task with a generated id.
    ///
    /// # Errors
    /// - `EmptyText` when `text` trims to empty.
    pub fn new(text: &str, created_at: i64) -> Result<Self, TaskValidationError> {
        Self::with_id(TaskId::generate(), text, created_at)
    }

    /// Creates an active task with a caller-provided id.
    ///
    /// Used by import paths where identity already exists.
    pub fn with_id(id: TaskId, text: &str, created_at: i64) -> Result<Self, TaskValidationError> {
        Ok(Self {
            id,
            text: normalize_text(text)?,
            completed: false,
            created_at,
            due_date: None,
            priority: Priority::default(),
        })
    }

    /// Returns whether the task is past due on `today` and still open.
    ///
    /// Dates compare as `YYYY-MM-DD` strings, so the check is strict: a task
    /// due today is not overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.completed {
            return false;
        }
        match self.due_date.as_deref() {
            Some(due) => due < today.format(DUE_DATE_FORMAT).to_string().as_str(),
            None => false,
        }
    }
}

/// Partial update applied by `TaskStore::update`.
///
/// `due_date: Some(None)` clears the due date; serialized as `null` so the
/// remote API receives an explicit clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TaskPatch {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Self::default()
        }
    }

    pub fn due_date(value: Option<String>) -> Self {
        Self {
            due_date: Some(value),
            ..Self::default()
        }
    }

    pub fn priority(value: Priority) -> Self {
        Self {
            priority: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.completed.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
    }

    /// Returns a copy with text trimmed and due date validated.
    pub fn normalized(&self) -> Result<Self, TaskValidationError> {
        let text = match self.text.as_deref() {
            Some(value) => Some(normalize_text(value)?),
            None => None,
        };
        let due_date = match &self.due_date {
            Some(value) => Some(normalize_due_date(value.as_deref())?),
            None => None,
        };
        Ok(Self {
            text,
            completed: self.completed,
            due_date,
            priority: self.priority,
        })
    }

    /// Merges provided fields into `task`.
    ///
    /// Expects a patch returned by [`TaskPatch::normalized`].
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(text) = &self.text {
            task.text = text.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
    }
}

/// Loosely-typed task shape read from storage, the server, or an import.
///
/// `id` and `created_at` are optional; the store fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<TaskId>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskRecord {
    /// Completes the record into a task.
    ///
    /// `id` and `created_at` are only called when the record lacks a usable
    /// value.
    ///
    /// # Errors
    /// - `EmptyText` when `text` trims to empty.
    /// - `InvalidDueDate` when `due_date` is not a real `YYYY-MM-DD` date.
    pub fn into_task(
        self,
        id: impl FnOnce() -> TaskId,
        created_at: impl FnOnce() -> i64,
    ) -> Result<Task, TaskValidationError> {
        let id = self.id.filter(|value| !value.is_blank()).unwrap_or_else(id);
        let created_at = self.created_at.unwrap_or_else(created_at);
        let mut task = Task::with_id(id, &self.text, created_at)?;
        task.completed = self.completed;
        task.due_date = normalize_due_date(self.due_date.as_deref())?;
        task.priority = self.priority;
        Ok(task)
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        Self {
            id: Some(task.id),
            text: task.text,
            completed: task.completed,
            created_at: Some(task.created_at),
            due_date: task.due_date,
            priority: task.priority,
        }
    }
}

/// Trims task text and rejects blank input.
pub fn normalize_text(value: &str) -> Result<String, TaskValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Validates a user-supplied due date.
///
/// Blank input means "no due date".
pub fn normalize_due_date(value: Option<&str>) -> Result<Option<String>, TaskValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !DUE_DATE_RE.is_match(trimmed)
        || NaiveDate::parse_from_str(trimmed, DUE_DATE_FORMAT).is_err()
    {
        return Err(TaskValidationError::InvalidDueDate(trimmed.to_string()));
    }
    Ok(Some(trimmed.to_string()))
}

fn deserialize_due_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::{normalize_due_date, Priority, Task, TaskId, TaskPatch, TaskRecord, TaskValidationError};
    use chrono::NaiveDate;

    #[test]
    fn priority_cycle_wraps_around() {
        assert_eq!(Priority::High.cycled(), Priority::Medium);
        assert_eq!(Priority::Medium.cycled(), Priority::Low);
        assert_eq!(Priority::Low.cycled(), Priority::High);
    }

    #[test]
    fn priority_parse_is_strict_but_lenient_decode_falls_back() {
        assert_eq!(" HIGH ".parse::<Priority>(), Ok(Priority::High));
        assert!(matches!(
            "urgent".parse::<Priority>(),
            Err(TaskValidationError::UnknownPriority(_))
        ));
        assert_eq!(Priority::from_label_lenient(Some("urgent")), Priority::Medium);
        assert_eq!(Priority::from_label_lenient(None), Priority::Medium);
    }

    #[test]
    fn due_date_requires_zero_padded_calendar_date() {
        assert_eq!(
            normalize_due_date(Some(" 2024-01-01 ")),
            Ok(Some("2024-01-01".to_string()))
        );
        assert_eq!(normalize_due_date(Some("   ")), Ok(None));
        assert!(normalize_due_date(Some("2024-1-1")).is_err());
        assert!(normalize_due_date(Some("2024-02-30")).is_err());
    }

    #[test]
    fn overdue_is_strictly_before_today_and_open() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut task = Task::new("file taxes", 1).unwrap();

        task.due_date = Some("2024-03-10".to_string());
        assert!(!task.is_overdue(today));

        task.due_date = Some("2024-03-09".to_string());
        assert!(task.is_overdue(today));

        task.completed = true;
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn patch_normalization_trims_and_rejects_blank_text() {
        let patch = TaskPatch::text("  walk dog  ").normalized().unwrap();
        assert_eq!(patch.text.as_deref(), Some("walk dog"));

        let err = TaskPatch::text("   ").normalized().unwrap_err();
        assert_eq!(err, TaskValidationError::EmptyText);
    }

    #[test]
    fn record_fills_missing_identity_from_callers() {
        let legacy: TaskRecord =
            serde_json::from_str(r#"{"text": " water plants ", "completed": true}"#).unwrap();
        let task = legacy
            .into_task(|| TaskId::from("fresh"), || 42)
            .unwrap();
        assert_eq!(task.id.as_str(), "fresh");
        assert_eq!(task.text, "water plants");
        assert_eq!(task.created_at, 42);
        assert!(task.completed);

        let mut original = Task::with_id(TaskId::from("t-9"), "keep", 7).unwrap();
        original.due_date = Some("2024-05-05".to_string());
        let rebuilt = TaskRecord::from(original.clone())
            .into_task(|| unreachable!(), || unreachable!())
            .unwrap();
        assert_eq!(rebuilt, original);
    }
}
