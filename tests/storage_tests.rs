use std::fs;

use chrono::NaiveDate;
use tasker::models::{Category, DailyTemplate, Priority, Task, TaskId};
use tasker::storage::{TaskStore, TASKS_KEY};
use tasker::tasks::delete_task;
use tasker::TaskerError;
use tempfile::tempdir;

fn sample_tasks() -> Vec<Task> {
    let mut a = Task::new("a", "Dentist", Category::Event);
    a.date = Some("2030-01-01T09:00".into());
    a.location = Some("Main Street".into());
    let mut b = Task::new(1_700_000_000_000i64, "Ship it", Category::Project);
    b.due_date = Some("2030-02-01".into());
    b.priority = Some(Priority::High);
    let c = Task::new("c", "Stretch", Category::Daily);
    vec![a, b, c]
}

#[test]
fn test_missing_store_loads_empty() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path().join("never-created"));
    assert!(store.load().is_empty());
    assert!(store.load_templates().is_empty());
    assert_eq!(store.last_processed(), None);
}

#[test]
fn test_malformed_store_loads_empty() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    fs::write(store.path_for(TASKS_KEY), "{ not json").unwrap();
    assert!(store.load().is_empty());

    fs::write(store.path_for(TASKS_KEY), r#"{"id": "not-an-array"}"#).unwrap();
    assert!(store.load().is_empty());

    fs::write(store.path_for(TASKS_KEY), "").unwrap();
    assert!(store.load().is_empty());
}

#[test]
fn test_save_then_load() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    let tasks = sample_tasks();
    store.save(&tasks).unwrap();

    let loaded = store.load();
    assert_eq!(loaded, tasks);
    assert_eq!(loaded[1].id, TaskId::Number(1_700_000_000_000));
}

#[test]
fn test_save_of_load_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    store.save(&sample_tasks()).unwrap();
    let first = store.get(TASKS_KEY).unwrap().unwrap();

    store.save(&store.load()).unwrap();
    let second = store.get(TASKS_KEY).unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_legacy_records_settle_after_one_save() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    fs::write(
        store.path_for(TASKS_KEY),
        r#"[{"title":"no id","category":"personal","created":"2024-01-01T00:00:00Z"}]"#,
    )
    .unwrap();

    let loaded = store.load();
    assert_eq!(loaded.len(), 1);
    store.save(&loaded).unwrap();

    let reloaded = store.load();
    assert_eq!(reloaded, loaded);
    assert_eq!(reloaded[0].created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
}

#[test]
fn test_append_rejects_duplicate_ids() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    store.append(Task::new("a", "first", Category::Personal)).unwrap();
    store.append(Task::new("b", "second", Category::Personal)).unwrap();

    let err = store
        .append(Task::new("a", "again", Category::Personal))
        .unwrap_err();
    assert!(matches!(err, TaskerError::DuplicateId(ref id) if id == "a"));
    assert_eq!(store.load().len(), 2);
}

#[test]
fn test_delete_removes_exactly_one() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    store.save(&sample_tasks()).unwrap();

    let mut tasks = store.load();
    let removed = delete_task(&mut tasks, &TaskId::Number(1_700_000_000_000)).unwrap();
    store.save(&tasks).unwrap();

    assert_eq!(removed.title, "Ship it");
    let left: Vec<String> = store.load().iter().map(|t| t.id.to_string()).collect();
    assert_eq!(left, vec!["a", "c"]);

    assert!(delete_task(&mut tasks, &TaskId::from("zzz")).is_err());
    assert_eq!(tasks.len(), 2);
}

#[test]
fn test_templates_and_last_processed() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    let templates = vec![DailyTemplate {
        title: "Stretch".into(),
        details: None,
        time: Some("7:00 AM".into()),
        priority: Some(Priority::Low),
    }];
    store.save_templates(&templates).unwrap();
    assert_eq!(store.load_templates(), templates);

    let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    store.mark_processed(day).unwrap();
    assert_eq!(store.last_processed(), Some(day));
}

#[test]
fn test_reset_removes_everything() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    store.save(&sample_tasks()).unwrap();
    store
        .mark_processed(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        .unwrap();

    store.reset().unwrap();
    assert!(store.load().is_empty());
    assert_eq!(store.last_processed(), None);
    assert!(!store.path_for(TASKS_KEY).exists());
}

#[test]
fn test_bad_record_does_not_hide_good_ones() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    fs::write(
        store.path_for(TASKS_KEY),
        r#"[
            {"id":1,"title":"Essay","category":"project","dueDate":"2099-01-01"},
            {"id":2,"title":"No category","category":""},
            {"id":3,"title":{"not":"a string"}},
            {"id":4,"title":"Gym","category":"daily","priority":"high"}
        ]"#,
    )
    .unwrap();

    let loaded = store.load_checked();
    assert!(!loaded.intact);
    let ids: Vec<String> = loaded.items.iter().map(|t| t.id.to_string()).collect();
    assert_eq!(ids, vec!["1", "2", "4"]);
    assert_eq!(loaded.items[1].category, Category::Personal);
    assert_eq!(loaded.items[2].priority, Some(Priority::High));

    assert_eq!(store.load(), loaded.items);
}

#[test]
fn test_clean_store_loads_intact() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    assert!(store.load_checked().intact);

    store.save(&sample_tasks()).unwrap();
    let loaded = store.load_checked();
    assert!(loaded.intact);
    assert_eq!(loaded.items, sample_tasks());

    fs::write(store.path_for(TASKS_KEY), "{ not json").unwrap();
    assert!(!store.load_checked().intact);
}
