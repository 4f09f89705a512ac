//! The normalization pipeline applied whenever the task list is shown:
//! load, close past events, drop expired tasks, sort, and persist back.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::Config;
use crate::dates::{parse_date, parse_datetime, parse_time_of_day, timestamp};
use crate::error::Result;
use crate::models::{Category, Status, Task};
use crate::storage::TaskStore;

/// Date fields consulted for a category, most specific first.
fn date_fields(task: &Task) -> [Option<&str>; 2] {
    let date = task.date.as_deref();
    let due = task.due_date.as_deref();
    match task.category {
        Category::Project => [due, date],
        _ => [date, due],
    }
}

/// The date a task is filtered and sorted by.
///
/// Daily tasks are always due `today`; other categories use their scheduled
/// date or deadline. `None` means the task is undated.
pub fn effective_date(task: &Task, today: NaiveDate) -> Option<NaiveDate> {
    if task.category == Category::Daily {
        return Some(today);
    }
    date_fields(task).into_iter().flatten().find_map(parse_date)
}

/// Time of day used to order tasks sharing a date.
pub fn time_of_day(task: &Task) -> Option<NaiveTime> {
    if let Some(t) = task.time.as_deref().and_then(parse_time_of_day) {
        return Some(t);
    }
    date_fields(task)
        .into_iter()
        .flatten()
        .find_map(parse_datetime)
        .map(|dt| dt.time())
}

/// The moment an event takes place, if it carries a time at all.
pub fn scheduled_at(task: &Task) -> Option<NaiveDateTime> {
    let fields = date_fields(task);
    if let Some(dt) = fields.into_iter().flatten().find_map(parse_datetime) {
        return Some(dt);
    }
    let day = fields.into_iter().flatten().find_map(parse_date)?;
    let time = task.time.as_deref().and_then(parse_time_of_day)?;
    Some(day.and_time(time))
}

/// `None` sorts after every `Some`.
fn cmp_present_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Orders by effective date (undated last), then priority, then time of day.
///
/// A task without a priority ranks as medium.
pub fn compare_tasks(a: &Task, b: &Task, today: NaiveDate) -> Ordering {
    cmp_present_first(effective_date(a, today), effective_date(b, today))
        .then_with(|| a.priority.unwrap_or_default().cmp(&b.priority.unwrap_or_default()))
        .then_with(|| cmp_present_first(time_of_day(a), time_of_day(b)))
}

/// Drops tasks whose effective date is before `today` and sorts the rest.
///
/// The sort is stable, so tasks that compare equal keep their stored order.
pub fn normalize(mut tasks: Vec<Task>, today: NaiveDate) -> Vec<Task> {
    tasks.retain(|t| effective_date(t, today).map_or(true, |d| d >= today));
    tasks.sort_by(|a, b| compare_tasks(a, b, today));
    tasks
}

/// Marks events whose scheduled time has passed as completed.
///
/// Returns whether any task changed.
pub fn auto_close_past_events(tasks: &mut [Task], now: NaiveDateTime) -> bool {
    let mut changed = false;
    for t in tasks.iter_mut() {
        if t.category != Category::Event || t.is_completed() {
            continue;
        }
        if scheduled_at(t).is_some_and(|at| at < now) {
            let stamp = timestamp(now);
            t.status = Some(Status::Completed);
            t.completed_at = Some(stamp.clone());
            t.modified_at = Some(stamp);
            log::info!("closed past event {} ({})", t.id, t.title);
            changed = true;
        }
    }
    changed
}

/// Loads, cleans and sorts the stored tasks, saving the result back.
///
/// If some stored records could not be read, nothing is written so they stay
/// on disk for the user to repair.
pub fn refresh(store: &TaskStore, config: &Config, now: NaiveDateTime) -> Result<Vec<Task>> {
    let loaded = store.load_checked();
    let mut tasks = loaded.items;
    let before = tasks.len();
    if config.auto_close_events {
        auto_close_past_events(&mut tasks, now);
    }
    let tasks = normalize(tasks, now.date());
    if tasks.len() != before {
        log::info!("dropped {} expired tasks", before - tasks.len());
    }
    if loaded.intact {
        store.save(&tasks)?;
    } else {
        log::warn!("stored tasks are partly unreadable, not writing them back");
    }
    Ok(tasks)
}
