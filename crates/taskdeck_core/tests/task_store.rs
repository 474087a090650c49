use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use std::sync::Arc;
use taskdeck_core::{
    Clock, FilterMode, KvRepository, ManualClock, MemoryKvRepository, Priority, RepoError,
    RepoResult, SqliteKvRepository, Task, TaskPatch, TaskStore, TaskStoreError,
    TaskValidationError,
};

const TASKS_KEY: &str = "tasks";

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start()))
}

fn start() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-04-01T09:00:00+00:00").unwrap()
}

fn in_hours(clock: &ManualClock, hours: i64) -> NaiveDateTime {
    clock.now().naive_local() + Duration::hours(hours)
}

fn ids(tasks: &[Task]) -> Vec<u64> {
    tasks.iter().map(|task| task.id).collect()
}

/// Repository whose writes always fail.
#[derive(Default)]
struct ReadOnlyRepo {
    inner: MemoryKvRepository,
}

impl KvRepository for ReadOnlyRepo {
    fn get_value(&self, key: &str) -> RepoResult<Option<String>> {
        self.inner.get_value(key)
    }

    fn set_value(&mut self, _key: &str, _value: &str) -> RepoResult<()> {
        Err(RepoError::MissingRequiredTable("kv_entries"))
    }
}

#[test]
fn add_toggle_delete_scenario() {
    let clock = clock();
    let mut store = TaskStore::open(MemoryKvRepository::new(), clock.clone());

    let milk = store
        .add("  Buy milk ", Priority::High, Some(in_hours(&clock, 1)))
        .unwrap();
    assert_eq!(milk.id, 1);
    assert_eq!(milk.text, "Buy milk");
    assert!(!milk.completed);
    assert!(!milk.notified_due_soon);
    assert!(!milk.notified_overdue);
    assert_eq!(milk.created_at, start().with_timezone(&Utc));

    let report = store
        .add("Write report", Priority::Low, Some(in_hours(&clock, 3)))
        .unwrap();
    assert_eq!(report.id, 2);
    assert_eq!(ids(store.all()), vec![2, 1]);

    let toggled = store.toggle_completed(1).unwrap().unwrap();
    assert!(toggled.completed);
    let stats = store.stats();
    assert_eq!((stats.total, stats.pending, stats.completed), (2, 1, 1));
    assert_eq!(stats.progress_percent, 50);

    let untoggled = store.toggle_completed(1).unwrap().unwrap();
    assert!(!untoggled.completed);

    let removed = store.delete(2).unwrap().unwrap();
    assert_eq!(removed.text, "Write report");
    assert_eq!(ids(store.all()), vec![1]);
}

#[test]
fn new_ids_follow_current_maximum() {
    let clock = clock();
    let mut store = TaskStore::open(MemoryKvRepository::new(), clock.clone());
    for text in ["a", "b", "c"] {
        store
            .add(text, Priority::Medium, Some(in_hours(&clock, 2)))
            .unwrap();
    }

    store.delete(2).unwrap();
    let next = store.add("d", Priority::Medium, Some(in_hours(&clock, 2))).unwrap();
    assert_eq!(next.id, 4);

    store.delete(4).unwrap();
    store.delete(3).unwrap();
    let reused = store.add("e", Priority::Medium, Some(in_hours(&clock, 2))).unwrap();
    assert_eq!(reused.id, 2);
    assert_eq!(ids(store.all()), vec![2, 1]);
}

#[test]
fn invalid_add_leaves_collection_and_storage_untouched() {
    let clock = clock();
    let mut store = TaskStore::open(MemoryKvRepository::new(), clock.clone());

    let err = store
        .add("   ", Priority::High, Some(in_hours(&clock, 1)))
        .unwrap_err();
    assert!(matches!(
        err,
        TaskStoreError::Validation(TaskValidationError::EmptyText)
    ));

    let err = store.add("no date", Priority::High, None).unwrap_err();
    assert!(matches!(
        err,
        TaskStoreError::Validation(TaskValidationError::MissingDueDate)
    ));

    let err = store
        .add("past", Priority::High, Some(in_hours(&clock, -1)))
        .unwrap_err();
    assert!(matches!(
        err,
        TaskStoreError::Validation(TaskValidationError::DueDateNotInFuture { .. })
    ));

    let err = store
        .add("right now", Priority::High, Some(clock.now().naive_local()))
        .unwrap_err();
    assert!(matches!(
        err,
        TaskStoreError::Validation(TaskValidationError::DueDateNotInFuture { .. })
    ));

    assert!(store.is_empty());
}

#[test]
fn unknown_ids_are_silent_no_ops() {
    let clock = clock();
    let mut store = TaskStore::open(MemoryKvRepository::new(), clock.clone());
    store
        .add("keep", Priority::Low, Some(in_hours(&clock, 1)))
        .unwrap();

    assert!(store.toggle_completed(42).unwrap().is_none());
    assert!(store.delete(42).unwrap().is_none());
    let patch = TaskPatch {
        text: Some("renamed".to_string()),
        ..TaskPatch::default()
    };
    assert!(store.update(42, patch).unwrap().is_none());

    assert_eq!(store.len(), 1);
    assert_eq!(store.all()[0].text, "keep");
}

#[test]
fn update_validates_before_looking_up_the_id() {
    let clock = clock();
    let mut store = TaskStore::open(MemoryKvRepository::new(), clock.clone());

    let patch = TaskPatch {
        text: Some(" ".to_string()),
        ..TaskPatch::default()
    };
    let err = store.update(99, patch).unwrap_err();
    assert!(matches!(
        err,
        TaskStoreError::Validation(TaskValidationError::EmptyText)
    ));
}

#[test]
fn update_rearms_reminders_only_for_schedule_edits() {
    let clock = clock();
    let mut task = Task::new(
        1,
        "prepare slides",
        Priority::Medium,
        start().with_timezone(&Utc),
        Some(in_hours(&clock, 1)),
    );
    task.notified_due_soon = true;
    task.notified_overdue = true;
    let stored = serde_json::to_string(&vec![task]).unwrap();
    let repo = MemoryKvRepository::new().with_value(TASKS_KEY, stored);
    let mut store = TaskStore::open(repo, clock.clone());

    let renamed = store
        .update(
            1,
            TaskPatch {
                text: Some("prepare keynote".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(renamed.text, "prepare keynote");
    assert!(renamed.notified_due_soon);
    assert!(renamed.notified_overdue);

    let rescheduled = store
        .update(
            1,
            TaskPatch {
                priority: Some(Priority::High),
                due_date: Some(in_hours(&clock, 5)),
                ..TaskPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(rescheduled.priority, Priority::High);
    assert_eq!(rescheduled.due_date, Some(in_hours(&clock, 5)));
    assert!(!rescheduled.notified_due_soon);
    assert!(!rescheduled.notified_overdue);
}

#[test]
fn priority_only_edit_rearms_both_reminders() {
    let clock = clock();
    let mut task = Task::new(
        1,
        "renew passport",
        Priority::Low,
        start().with_timezone(&Utc),
        Some(in_hours(&clock, 1)),
    );
    task.notified_due_soon = true;
    task.notified_overdue = true;
    let stored = serde_json::to_string(&vec![task.clone()]).unwrap();
    let mut store = TaskStore::open(
        MemoryKvRepository::new().with_value(TASKS_KEY, stored),
        clock.clone(),
    );

    let updated = store
        .update(
            1,
            TaskPatch {
                priority: Some(Priority::High),
                ..TaskPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.due_date, task.due_date);
    assert_eq!(updated.text, task.text);
    assert!(!updated.notified_due_soon);
    assert!(!updated.notified_overdue);
}

#[test]
fn update_rejects_past_due_date_without_changes() {
    let clock = clock();
    let mut store = TaskStore::open(MemoryKvRepository::new(), clock.clone());
    let task = store
        .add("call bank", Priority::Low, Some(in_hours(&clock, 2)))
        .unwrap();

    let err = store
        .update(
            task.id,
            TaskPatch {
                due_date: Some(in_hours(&clock, -2)),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TaskStoreError::Validation(TaskValidationError::DueDateNotInFuture { .. })
    ));
    assert_eq!(store.get(task.id), Some(&task));
}

#[test]
fn collection_round_trips_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskdeck.sqlite3");
    let clock = clock();

    let expected = {
        let repo = SqliteKvRepository::open(&path).unwrap();
        let mut store = TaskStore::open(repo, clock.clone());
        store
            .add("first", Priority::Low, Some(in_hours(&clock, 1)))
            .unwrap();
        let second = store
            .add("second", Priority::High, Some(in_hours(&clock, 2)))
            .unwrap();
        store.toggle_completed(second.id).unwrap();
        store.all().to_vec()
    };

    let reopened = TaskStore::open(SqliteKvRepository::open(&path).unwrap(), clock.clone());
    assert_eq!(reopened.all(), expected.as_slice());
    assert_eq!(
        ids(&reopened.filtered_view(FilterMode::Completed)),
        vec![2]
    );
}

#[test]
fn unreadable_storage_yields_empty_collection() {
    for raw in [
        "not json",
        r#"{"tasks": []}"#,
        r#"[{"id":1,"text":"x","priority":"urgent","completed":false,"createdAt":"2026-04-01T09:00:00Z","dueDate":""}]"#,
    ] {
        let repo = MemoryKvRepository::new().with_value(TASKS_KEY, raw);
        let store = TaskStore::open(repo, clock());
        assert!(store.is_empty(), "expected empty collection for {raw}");
    }
}

#[test]
fn legacy_records_load_with_default_flags() {
    let raw = r#"[
        {"id":5,"text":"old","priority":"medium","completed":true,"createdAt":"2026-03-30T08:00:00.000Z","dueDate":"2026-03-31T10:00"},
        {"id":2,"text":"older","priority":"low","completed":false,"createdAt":"2026-03-29T08:00:00.000Z","dueDate":""}
    ]"#;
    let clock = clock();
    let mut store = TaskStore::open(MemoryKvRepository::new().with_value(TASKS_KEY, raw), clock.clone());

    assert_eq!(ids(store.all()), vec![5, 2]);
    assert_eq!(store.get(2).unwrap().due_date, None);
    assert!(!store.get(5).unwrap().notified_overdue);

    let next = store
        .add("new", Priority::High, Some(in_hours(&clock, 1)))
        .unwrap();
    assert_eq!(next.id, 6);
}

#[test]
fn failed_write_keeps_previous_state() {
    let clock = clock();
    let task = Task::new(
        1,
        "stable",
        Priority::Medium,
        start().with_timezone(&Utc),
        Some(in_hours(&clock, 1)),
    );
    let mut repo = ReadOnlyRepo::default();
    repo.inner
        .set_value(TASKS_KEY, &serde_json::to_string(&vec![task.clone()]).unwrap())
        .unwrap();
    let mut store = TaskStore::open(repo, clock.clone());

    let err = store
        .add("lost", Priority::High, Some(in_hours(&clock, 2)))
        .unwrap_err();
    assert!(matches!(err, TaskStoreError::Repo(_)));
    assert!(store.toggle_completed(1).is_err());
    assert!(store.delete(1).is_err());

    assert_eq!(store.all(), &[task]);
}
