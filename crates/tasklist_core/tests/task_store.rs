use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use tasklist_core::db::open_db_in_memory;
use tasklist_core::{
    export_json, parse_import, Clock, FixedClock, LocalTaskPersistence, PersistError, PersistResult,
    Priority, StoreError, Task, TaskFilter, TaskId, TaskPatch, TaskPersistence, TaskRecord,
    TaskStore, TaskValidationError,
};

/// In-memory adapter that counts writes and can be told to fail.
#[derive(Default)]
struct RecordingPersistence {
    stored: RefCell<Vec<Task>>,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl RecordingPersistence {
    fn write(&self, snapshot: &[Task]) -> PersistResult<()> {
        if self.fail_writes.get() {
            return Err(PersistError::Transport {
                endpoint: "memory://tasks".to_string(),
                status: Some(503),
                message: "unavailable".to_string(),
            });
        }
        self.writes.set(self.writes.get() + 1);
        *self.stored.borrow_mut() = snapshot.to_vec();
        Ok(())
    }
}

impl TaskPersistence for RecordingPersistence {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn load_tasks(&self) -> PersistResult<Vec<TaskRecord>> {
        Ok(self
            .stored
            .borrow()
            .iter()
            .cloned()
            .map(TaskRecord::from)
            .collect())
    }

    fn task_created(&self, task: &Task, snapshot: &[Task]) -> PersistResult<Task> {
        self.write(snapshot)?;
        Ok(task.clone())
    }

    fn task_updated(
        &self,
        task: &Task,
        _patch: &TaskPatch,
        snapshot: &[Task],
    ) -> PersistResult<Task> {
        self.write(snapshot)?;
        Ok(task.clone())
    }

    fn task_removed(&self, _id: &TaskId, snapshot: &[Task]) -> PersistResult<()> {
        self.write(snapshot)
    }

    fn tasks_reordered(&self, snapshot: &[Task]) -> PersistResult<()> {
        self.write(snapshot)
    }

    fn tasks_cleared(&self, _removed: &[Task]) -> PersistResult<()> {
        self.write(&[])
    }

    fn tasks_imported(&self, added: &[Task], snapshot: &[Task]) -> PersistResult<Vec<Task>> {
        self.write(snapshot)?;
        Ok(added.to_vec())
    }
}

fn clock() -> FixedClock {
    FixedClock::new(
        1_700_000_000_000,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    )
}

fn recording_store() -> TaskStore<RecordingPersistence, FixedClock> {
    TaskStore::new(RecordingPersistence::default(), clock())
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.id.as_str()).collect()
}

#[test]
fn add_inserts_trimmed_task_at_head_and_writes_once() {
    let mut store = recording_store();
    let first = store.add("first", None, None).unwrap();
    let second = store
        .add("  Pay rent ", Some("2024-01-01"), Some(Priority::High))
        .unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.list()[0], second);
    assert_eq!(store.list()[1], first);
    assert_eq!(second.text, "Pay rent");
    assert!(!second.completed);
    assert_eq!(second.priority, Priority::High);
    assert_eq!(second.due_date.as_deref(), Some("2024-01-01"));
    assert_eq!(first.priority, Priority::Medium);
    assert_eq!(store.persistence().writes.get(), 2);
    assert_eq!(*store.persistence().stored.borrow(), store.list());
}

#[test]
fn add_rejects_blank_text_without_writing() {
    let mut store = recording_store();
    store.add("keep", None, None).unwrap();

    for blank in ["", "   "] {
        let err = store.add(blank, None, None).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(TaskValidationError::EmptyText)
        ));
    }
    assert_eq!(store.len(), 1);
    assert_eq!(store.persistence().writes.get(), 1);
}

#[test]
fn add_rejects_malformed_due_date() {
    let mut store = recording_store();
    let err = store.add("call mom", Some("next friday"), None).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(TaskValidationError::InvalidDueDate(_))
    ));
    assert!(store.is_empty());
}

#[test]
fn update_merges_fields_and_reports_missing_ids() {
    let mut store = recording_store();
    let task = store.add("draft", None, None).unwrap();

    let patch = TaskPatch {
        text: Some(" final ".to_string()),
        due_date: Some(Some("2024-02-29".to_string())),
        priority: Some(Priority::Low),
        ..TaskPatch::default()
    };
    let updated = store.update(&task.id, &patch).unwrap();
    assert_eq!(updated.text, "final");
    assert_eq!(updated.due_date.as_deref(), Some("2024-02-29"));
    assert_eq!(updated.priority, Priority::Low);
    assert_eq!(updated.created_at, task.created_at);

    let cleared = store
        .update(&task.id, &TaskPatch::due_date(None))
        .unwrap();
    assert_eq!(cleared.due_date, None);

    let missing = TaskId::from("missing");
    let err = store.update(&missing, &TaskPatch::completed(true)).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == missing));

    let err = store.update(&task.id, &TaskPatch::text("  ")).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.get(&task.id).unwrap().text, "final");
}

#[test]
fn remove_deletes_and_missing_id_leaves_collection_unchanged() {
    let mut store = recording_store();
    let keep = store.add("keep", None, None).unwrap();
    let gone = store.add("gone", None, None).unwrap();

    store.remove(&gone.id).unwrap();
    assert!(store.get(&gone.id).is_none());
    assert_eq!(ids(store.list()), vec![keep.id.as_str()]);

    let writes_before = store.persistence().writes.get();
    let err = store.remove(&gone.id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(store.len(), 1);
    assert_eq!(store.persistence().writes.get(), writes_before);
}

#[test]
fn reorder_moves_task_before_target_exactly_once() {
    let mut store = recording_store();
    let c = store.add("c", None, None).unwrap();
    let b = store.add("b", None, None).unwrap();
    let a = store.add("a", None, None).unwrap();
    // Collection order is [a, b, c].

    assert!(store.reorder(&c.id, &a.id).unwrap());
    assert_eq!(
        ids(store.list()),
        vec![c.id.as_str(), a.id.as_str(), b.id.as_str()]
    );

    assert!(store.reorder(&c.id, &b.id).unwrap());
    assert_eq!(
        ids(store.list()),
        vec![a.id.as_str(), c.id.as_str(), b.id.as_str()]
    );
    assert_eq!(store.len(), 3);
}

#[test]
fn reorder_with_missing_or_same_id_is_a_no_op() {
    let mut store = recording_store();
    let b = store.add("b", None, None).unwrap();
    let a = store.add("a", None, None).unwrap();
    let writes_before = store.persistence().writes.get();

    assert!(!store.reorder(&a.id, &TaskId::from("ghost")).unwrap());
    assert!(!store.reorder(&TaskId::from("ghost"), &a.id).unwrap());
    assert!(!store.reorder(&a.id, &a.id).unwrap());
    // Already directly before the target.
    assert!(!store.reorder(&a.id, &b.id).unwrap());

    assert_eq!(ids(store.list()), vec![a.id.as_str(), b.id.as_str()]);
    assert_eq!(store.persistence().writes.get(), writes_before);
}

#[test]
fn toggled_task_is_the_only_completed_one() {
    let mut store = recording_store();
    store.add("one", None, None).unwrap();
    let target = store.add("two", None, None).unwrap();
    store.add("three", None, None).unwrap();

    let toggled = store.toggle(&target.id).unwrap();
    assert!(toggled.completed);

    let today = store.clock().today();
    let completed: Vec<&Task> = store
        .list()
        .iter()
        .filter(|task| TaskFilter::Completed.matches(task, today))
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, target.id);

    assert!(!store.toggle(&target.id).unwrap().completed);
}

#[test]
fn clear_empties_collection() {
    let mut store = recording_store();
    store.add("a", None, None).unwrap();
    store.add("b", None, None).unwrap();

    assert_eq!(store.clear().unwrap(), 2);
    assert!(store.is_empty());
    assert!(store.persistence().stored.borrow().is_empty());
}

#[test]
fn failed_writes_leave_state_unchanged() {
    let mut store = recording_store();
    let a = store.add("a", None, None).unwrap();
    let b = store.add("b", None, None).unwrap();
    let before = store.list().to_vec();

    store.persistence().fail_writes.set(true);

    assert!(matches!(
        store.add("c", None, None),
        Err(StoreError::Transport(_))
    ));
    assert!(store.update(&a.id, &TaskPatch::completed(true)).is_err());
    assert!(store.remove(&a.id).is_err());
    assert!(store.reorder(&a.id, &b.id).is_err());
    assert!(store.clear().is_err());
    assert!(store
        .import(parse_import(r#"[{"text": "imported"}]"#).unwrap())
        .is_err());

    assert_eq!(store.list(), before.as_slice());
}

#[test]
fn import_assigns_missing_ids_and_skips_known_ones() {
    let mut store = recording_store();
    let existing = store.add("existing", None, None).unwrap();

    let payload = format!(
        r#"[
            {{"id": "{}", "text": "conflicting copy", "completed": true}},
            {{"text": "fresh one", "priority": "high"}},
            {{"id": "dup", "text": "first dup"}},
            {{"id": "dup", "text": "second dup"}}
        ]"#,
        existing.id
    );
    let report = store.import(parse_import(&payload).unwrap()).unwrap();

    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(store.len(), 3);

    let kept = store.get(&existing.id).unwrap();
    assert_eq!(kept.text, "existing");
    assert!(!kept.completed);

    let fresh = &store.list()[1];
    assert_eq!(fresh.text, "fresh one");
    assert_eq!(fresh.priority, Priority::High);
    assert!(!fresh.id.is_blank());
    assert_eq!(store.list()[2].text, "first dup");
}

#[test]
fn import_with_invalid_entry_imports_nothing() {
    let mut store = recording_store();
    let records = parse_import(r#"[{"text": "ok"}, {"text": "bad date", "dueDate": "soon"}]"#)
        .unwrap();

    let err = store.import(records).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(TaskValidationError::InvalidDueDate(_))
    ));
    assert!(store.is_empty());
    assert_eq!(store.persistence().writes.get(), 0);
}

#[test]
fn export_then_import_into_empty_store_reproduces_collection() {
    let mut source = recording_store();
    source.add("Buy milk", None, None).unwrap();
    let rent = source
        .add("Pay rent", Some("2024-01-01"), Some(Priority::High))
        .unwrap();
    source.toggle(&rent.id).unwrap();
    let exported = export_json(source.list()).unwrap();

    let conn = open_db_in_memory().unwrap();
    let mut target = TaskStore::new(LocalTaskPersistence::new(&conn), clock());
    let report = target.import(parse_import(&exported).unwrap()).unwrap();

    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(target.list(), source.list());

    let reopened = TaskStore::open(LocalTaskPersistence::new(&conn), clock()).unwrap();
    assert_eq!(reopened.list(), source.list());
}

#[test]
fn created_at_follows_clock_once_it_moves_past_the_last_stamp() {
    let mut store = recording_store();
    let first = store.add("first", None, None).unwrap();
    let second = store.add("second", None, None).unwrap();
    assert_eq!(second.created_at, first.created_at + 1);

    store.clock().advance_millis(60_000);
    let third = store.add("third", None, None).unwrap();
    assert_eq!(third.created_at, first.created_at + 60_000);
}
