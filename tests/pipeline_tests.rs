use chrono::{NaiveDate, NaiveDateTime};
use tasker::config::Config;
use tasker::models::{Category, Priority, Status, Task, TaskId};
use tasker::pipeline::{auto_close_past_events, effective_date, normalize, refresh};
use tasker::storage::TaskStore;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

fn task(id: &str, category: Category, date: Option<&str>) -> Task {
    let mut t = Task::new(id, id, category);
    match category {
        Category::Project => t.due_date = date.map(String::from),
        _ => t.date = date.map(String::from),
    }
    t
}

fn ids(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|t| t.id.to_string()).collect()
}

#[test]
fn test_expired_tasks_are_dropped() {
    let tasks: Vec<Task> = serde_json::from_str(
        r#"[{"id":1,"date":"2020-01-01"},{"id":2,"date":"2099-01-01"},{"id":3}]"#,
    )
    .unwrap();

    let out = normalize(tasks, date(2024, 6, 1));
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].id, TaskId::Number(2));
    assert_eq!(out[1].id, TaskId::Number(3));
}

#[test]
fn test_today_is_kept_yesterday_is_not() {
    let today = date(2024, 6, 1);
    let tasks = vec![
        task("yesterday", Category::Personal, Some("2024-05-31")),
        task("today", Category::Event, Some("2024-06-01T08:00")),
        task("deadline", Category::Project, Some("2024-06-01")),
    ];
    let out = normalize(tasks, today);
    assert_eq!(ids(&out), vec!["today", "deadline"]);
}

#[test]
fn test_sorted_by_date_with_undated_last() {
    let today = date(2024, 6, 1);
    let tasks = vec![
        task("undated", Category::Personal, None),
        task("july", Category::Project, Some("2024-07-01")),
        task("daily", Category::Daily, None),
        task("june", Category::Event, Some("2024-06-15")),
        task("garbage", Category::Personal, Some("someday")),
    ];
    let out = normalize(tasks, today);
    assert_eq!(ids(&out), vec!["daily", "june", "july", "undated", "garbage"]);

    let dates: Vec<Option<NaiveDate>> = out.iter().map(|t| effective_date(t, today)).collect();
    let dated: Vec<NaiveDate> = dates.iter().flatten().copied().collect();
    assert!(dated.windows(2).all(|w| w[0] <= w[1]));
    let first_undated = dates.iter().position(|d| d.is_none()).unwrap();
    assert!(dates[first_undated..].iter().all(|d| d.is_none()));
}

#[test]
fn test_daily_tasks_are_never_expired() {
    let mut daily = task("standup", Category::Daily, None);
    daily.date = Some("2001-01-01".into());
    let out = normalize(vec![daily], date(2024, 6, 1));
    assert_eq!(out.len(), 1);
    assert_eq!(effective_date(&out[0], date(2024, 6, 1)), Some(date(2024, 6, 1)));
}

#[test]
fn test_same_date_sorted_by_priority_then_time() {
    let today = date(2024, 6, 1);
    let mut low = task("low", Category::Personal, Some("2024-06-10"));
    low.priority = Some(Priority::Low);
    let mut high = task("high", Category::Personal, Some("2024-06-10"));
    high.priority = Some(Priority::High);
    let unset = task("unset", Category::Personal, Some("2024-06-10"));
    let mut medium_late = task("medium-late", Category::Event, Some("2024-06-10"));
    medium_late.priority = Some(Priority::Medium);
    medium_late.time = Some("8:00 PM".into());
    let mut medium_early = task("medium-early", Category::Event, Some("2024-06-10"));
    medium_early.priority = Some(Priority::Medium);
    medium_early.time = Some("7:00 AM".into());

    let out = normalize(vec![low, medium_late, unset, high, medium_early], today);
    assert_eq!(
        ids(&out),
        vec!["high", "medium-early", "medium-late", "unset", "low"]
    );
}

#[test]
fn test_normalize_is_idempotent() {
    let today = date(2024, 6, 1);
    let tasks = vec![
        task("b", Category::Project, Some("2024-08-01")),
        task("a", Category::Personal, None),
        task("c", Category::Event, Some("2023-01-01")),
        task("d", Category::Daily, None),
    ];
    let once = normalize(tasks, today);
    let twice = normalize(once.clone(), today);
    assert_eq!(once, twice);
}

#[test]
fn test_auto_close_past_events() {
    let now = at(2024, 6, 1, 10, 0);
    let mut morning = task("morning", Category::Event, Some("2024-06-01T08:00"));
    morning.status = Some(Status::NotStarted);
    let mut with_time = task("with-time", Category::Event, Some("2024-06-01"));
    with_time.time = Some("9:00 AM".into());
    let date_only = task("date-only", Category::Event, Some("2024-06-01"));
    let later = task("later", Category::Event, Some("2024-06-01T12:00"));
    let not_event = task("personal", Category::Personal, Some("2024-06-01T08:00"));

    let mut tasks = vec![morning, with_time, date_only, later, not_event];
    assert!(auto_close_past_events(&mut tasks, now));

    let closed: Vec<&str> = tasks
        .iter()
        .filter(|t| t.is_completed())
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(closed, vec!["morning", "with-time"]);
    assert!(tasks[0].completed_at.is_some());

    assert!(!auto_close_past_events(&mut tasks, now));
}

#[test]
fn test_refresh_persists_result() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    let config = Config::default();
    store
        .save(&[
            task("old", Category::Personal, Some("2020-01-01")),
            task("later", Category::Project, Some("2099-01-01")),
            task("soon", Category::Personal, Some("2024-06-02")),
        ])
        .unwrap();

    let now = at(2024, 6, 1, 9, 0);
    let shown = refresh(&store, &config, now).unwrap();
    assert_eq!(ids(&shown), vec!["soon", "later"]);
    assert_eq!(store.load(), shown);

    let again = refresh(&store, &config, now).unwrap();
    assert_eq!(again, shown);
}

#[test]
fn test_refresh_respects_auto_close_setting() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    store
        .save(&[task("meeting", Category::Event, Some("2024-06-01T08:00"))])
        .unwrap();
    let now = at(2024, 6, 1, 9, 0);

    let config = Config {
        auto_close_events: false,
        ..Config::default()
    };
    let shown = refresh(&store, &config, now).unwrap();
    assert!(!shown[0].is_completed());

    let shown = refresh(&store, &Config::default(), now).unwrap();
    assert!(shown[0].is_completed());
}

#[test]
fn test_refresh_keeps_tasks_next_to_an_empty_category() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    std::fs::write(
        store.path_for(tasker::storage::TASKS_KEY),
        r#"[{"id":1,"category":"project","dueDate":"2099-01-01"},{"id":2,"category":""}]"#,
    )
    .unwrap();

    let shown = refresh(&store, &Config::default(), at(2024, 6, 1, 9, 0)).unwrap();
    assert_eq!(ids(&shown), vec!["1", "2"]);
    assert_eq!(ids(&store.load()), vec!["1", "2"]);
}

#[test]
fn test_refresh_does_not_write_back_unreadable_records() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    let path = store.path_for(tasker::storage::TASKS_KEY);
    let raw = r#"[{"id":"ok","title":"fine"},{"id":"broken","title":42}]"#;
    std::fs::write(&path, raw).unwrap();

    let shown = refresh(&store, &Config::default(), at(2024, 6, 1, 9, 0)).unwrap();
    assert_eq!(ids(&shown), vec!["ok"]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
}
