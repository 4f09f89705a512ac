use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tasker::models::{Category, DailyTemplate, Priority, Status, Task};
use tasker::rollover::{check_rollover, needs_rollover, run_rollover, RolloverReport, RolloverTimer};
use tasker::storage::TaskStore;
use tempfile::tempdir;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn template(title: &str, time: Option<&str>) -> DailyTemplate {
    DailyTemplate {
        title: title.into(),
        details: None,
        time: time.map(String::from),
        priority: None,
    }
}

fn seeded_store(dir: &std::path::Path) -> TaskStore {
    let store = TaskStore::new(dir);
    let mut done = Task::new("old-daily", "Stretch", Category::Daily);
    done.status = Some(Status::Completed);
    store
        .save(&[done, Task::new("proj", "Ship it", Category::Project)])
        .unwrap();
    store
        .save_templates(&[
            template("Stretch", Some("7:00 AM")),
            DailyTemplate {
                priority: Some(Priority::High),
                ..template("Read", None)
            },
        ])
        .unwrap();
    store
}

#[test]
fn test_rollover_regenerates_daily_tasks() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());
    let now = at(2024, 6, 2, 0, 0);

    let report = run_rollover(&store, now).unwrap();
    assert_eq!(report, RolloverReport { removed: 1, created: 2 });

    let tasks = store.load();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0].title, "Ship it");

    let daily: Vec<&Task> = tasks.iter().filter(|t| t.category == Category::Daily).collect();
    assert_eq!(daily.len(), 2);
    assert!(daily.iter().all(|t| t.status() == Status::NotStarted));
    assert!(daily.iter().all(|t| t.id.to_string() != "old-daily"));
    assert!(daily.iter().all(|t| t.created_at.is_some()));
    assert_ne!(daily[0].id, daily[1].id);
    assert_eq!(daily[0].time.as_deref(), Some("7:00 AM"));
    assert_eq!(daily[0].priority, Some(Priority::Medium));
    assert_eq!(daily[1].priority, Some(Priority::High));

    assert_eq!(store.last_processed(), Some(now.date()));
}

#[test]
fn test_check_rollover_runs_once_per_day() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());
    let morning = at(2024, 6, 2, 8, 0);

    assert!(needs_rollover(&store, morning.date()));
    assert!(check_rollover(&store, morning).unwrap().is_some());
    assert!(!needs_rollover(&store, morning.date()));

    let first_ids: Vec<String> = store.load().iter().map(|t| t.id.to_string()).collect();
    assert!(check_rollover(&store, at(2024, 6, 2, 18, 0)).unwrap().is_none());
    let same_ids: Vec<String> = store.load().iter().map(|t| t.id.to_string()).collect();
    assert_eq!(first_ids, same_ids);

    let report = check_rollover(&store, at(2024, 6, 3, 0, 5)).unwrap().unwrap();
    assert_eq!(report.removed, 2);
    assert_eq!(report.created, 2);
}

#[test]
fn test_rollover_without_templates_clears_daily_tasks() {
    let dir = tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    store
        .save(&[
            Task::new("d", "Water plants", Category::Daily),
            Task::new("p", "Call mom", Category::Personal),
        ])
        .unwrap();

    let report = run_rollover(&store, at(2024, 6, 2, 0, 0)).unwrap();
    assert_eq!(report, RolloverReport { removed: 1, created: 0 });
    let titles: Vec<String> = store.load().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["Call mom"]);
}

#[test]
fn test_timer_fires_at_midnight_and_reschedules() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());
    let mut timer = RolloverTimer::new(at(2024, 6, 1, 23, 59));

    assert_eq!(timer.deadline(), at(2024, 6, 2, 0, 0));
    assert_eq!(timer.remaining(at(2024, 6, 1, 23, 59)), Duration::from_secs(60));
    assert!(!timer.is_due(at(2024, 6, 1, 23, 59)));
    assert!(timer.fire_if_due(&store, at(2024, 6, 1, 23, 59)).unwrap().is_none());

    let fired = timer.fire_if_due(&store, at(2024, 6, 2, 0, 0)).unwrap();
    assert_eq!(fired, Some(RolloverReport { removed: 1, created: 2 }));
    assert_eq!(timer.deadline(), at(2024, 6, 3, 0, 0));
    assert_eq!(timer.remaining(at(2024, 6, 3, 0, 1)), Duration::ZERO);
}

#[test]
fn test_timer_skips_rollover_already_done_today() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());
    let mut timer = RolloverTimer::new(at(2024, 6, 1, 22, 0));

    check_rollover(&store, at(2024, 6, 2, 0, 0)).unwrap();
    let mut tasks = store.load();
    let stretch = tasks.iter_mut().find(|t| t.title == "Stretch").unwrap();
    stretch.status = Some(Status::Completed);
    store.save(&tasks).unwrap();

    let fired = timer.fire_if_due(&store, at(2024, 6, 2, 0, 1)).unwrap();
    assert_eq!(fired, None);
    assert_eq!(timer.deadline(), at(2024, 6, 3, 0, 0));

    let tasks = store.load();
    let stretch = tasks.iter().find(|t| t.title == "Stretch").unwrap();
    assert!(stretch.is_completed());
}
