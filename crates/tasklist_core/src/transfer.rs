//! JSON export and import payload parsing.
//!
//! # Responsibility
//! - Encode the collection as a JSON array for download.
//! - Validate an uploaded payload before the store sees any of it.
//!
//! # Invariants
//! - Export order equals collection order.
//! - A payload with any malformed entry is rejected as a whole.

use crate::model::task::{Task, TaskRecord, TaskValidationError};
use serde_json::Value;

/// Encodes tasks as a pretty-printed JSON array.
pub fn export_json(tasks: &[Task]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(tasks)
}

/// Parses an import payload into records.
///
/// # Errors
/// - `MalformedImport` when the payload is not JSON, not an array, contains a
///   non-object entry, an entry with blank `text`, or an entry whose fields
///   have the wrong types.
pub fn parse_import(payload: &str) -> Result<Vec<TaskRecord>, TaskValidationError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|err| TaskValidationError::MalformedImport(format!("invalid JSON: {err}")))?;
    let Value::Array(entries) = value else {
        return Err(TaskValidationError::MalformedImport(
            "expected a JSON array of tasks".to_string(),
        ));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect()
}

fn parse_entry(index: usize, entry: Value) -> Result<TaskRecord, TaskValidationError> {
    if !entry.is_object() {
        return Err(TaskValidationError::MalformedImport(format!(
            "entry {index} is not an object"
        )));
    }
    let record: TaskRecord = serde_json::from_value(entry)
        .map_err(|err| TaskValidationError::MalformedImport(format!("entry {index}: {err}")))?;
    if record.text.trim().is_empty() {
        return Err(TaskValidationError::MalformedImport(format!(
            "entry {index}: text is required"
        )));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::parse_import;
    use crate::model::task::{Priority, TaskValidationError};

    #[test]
    fn accepts_legacy_numeric_ids_and_missing_fields() {
        let records =
            parse_import(r#"[{"id": 1700000000000, "text": "water plants", "completed": true}]"#)
                .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_ref().unwrap().as_str(), "1700000000000");
        assert!(records[0].completed);
        assert_eq!(records[0].priority, Priority::Medium);
        assert_eq!(records[0].created_at, None);
    }

    #[test]
    fn rejects_non_array_and_blank_text() {
        assert!(matches!(
            parse_import(r#"{"text": "x"}"#),
            Err(TaskValidationError::MalformedImport(_))
        ));
        assert!(matches!(
            parse_import(r#"[{"text": "ok"}, {"text": "  "}]"#),
            Err(TaskValidationError::MalformedImport(message)) if message.contains("entry 1")
        ));
    }
}
