use serde_json::json;
use tasklist_core::{Priority, Task, TaskId, TaskValidationError};

#[test]
fn task_new_trims_text_and_sets_defaults() {
    let task = Task::new("  Buy milk  ", 1_700_000_000_000).unwrap();

    assert!(!task.id.is_blank());
    assert_eq!(task.text, "Buy milk");
    assert!(!task.completed);
    assert_eq!(task.created_at, 1_700_000_000_000);
    assert_eq!(task.due_date, None);
    assert_eq!(task.priority, Priority::Medium);
}

#[test]
fn task_new_rejects_blank_text() {
    assert_eq!(Task::new("", 1).unwrap_err(), TaskValidationError::EmptyText);
    assert_eq!(
        Task::new("   ", 1).unwrap_err(),
        TaskValidationError::EmptyText
    );
}

#[test]
fn task_serialization_uses_camel_case_wire_fields() {
    let mut task = Task::with_id(TaskId::from("t-42"), "Pay rent", 1_704_067_200_000).unwrap();
    task.due_date = Some("2024-01-01".to_string());
    task.priority = Priority::High;

    let value = serde_json::to_value(&task).unwrap();
    assert_eq!(
        value,
        json!({
            "id": "t-42",
            "text": "Pay rent",
            "completed": false,
            "createdAt": 1_704_067_200_000_i64,
            "dueDate": "2024-01-01",
            "priority": "high"
        })
    );

    let decoded: Task = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn absent_due_date_serializes_as_null() {
    let task = Task::with_id(TaskId::from("t-1"), "Buy milk", 1).unwrap();
    let value = serde_json::to_value(&task).unwrap();
    assert!(value["dueDate"].is_null());
}

#[test]
fn document_store_records_decode_with_defaults() {
    let decoded: Task = serde_json::from_value(json!({
        "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
        "text": "Water plants",
        "createdAt": 1_700_000_000_000_i64,
        "dueDate": "",
        "priority": "urgent"
    }))
    .unwrap();

    assert_eq!(decoded.id.as_str(), "65a1f0c2e4b0a1b2c3d4e5f6");
    assert!(!decoded.completed);
    assert_eq!(decoded.due_date, None);
    assert_eq!(decoded.priority, Priority::Medium);
}

#[test]
fn numeric_ids_and_null_priority_are_accepted() {
    let decoded: Task = serde_json::from_value(json!({
        "id": 1_700_000_000_123_i64,
        "text": "legacy",
        "completed": true,
        "createdAt": 1,
        "priority": null
    }))
    .unwrap();

    assert_eq!(decoded.id, TaskId::from("1700000000123"));
    assert!(decoded.completed);
    assert_eq!(decoded.priority, Priority::Medium);
}
