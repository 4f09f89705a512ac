//! Daily rollover: at each local midnight the day's daily tasks are thrown
//! away and regenerated from the daily templates.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use crate::dates::{next_midnight, timestamp};
use crate::error::Result;
use crate::models::{Category, DailyTemplate, Status, Task, TaskId};
use crate::storage::TaskStore;

/// What a rollover did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverReport {
    pub removed: usize,
    pub created: usize,
}

/// Whether the rollover has not yet run for `today`.
pub fn needs_rollover(store: &TaskStore, today: NaiveDate) -> bool {
    store.last_processed() != Some(today)
}

/// A fresh daily task built from `template`.
pub fn task_from_template(template: &DailyTemplate, now: NaiveDateTime) -> Task {
    let stamp = timestamp(now);
    let mut task = Task::new(TaskId::generate(), template.title.clone(), Category::Daily);
    task.details = template.details.clone();
    task.time = template.time.clone();
    task.priority = Some(template.priority.unwrap_or_default());
    task.status = Some(Status::NotStarted);
    task.created_at = Some(stamp.clone());
    task.modified_at = Some(stamp);
    task
}

/// Replaces every daily task with one fresh task per template and records
/// `now`'s date as processed.
pub fn run_rollover(store: &TaskStore, now: NaiveDateTime) -> Result<RolloverReport> {
    let mut tasks = store.load();
    let before = tasks.len();
    tasks.retain(|t| t.category != Category::Daily);
    let removed = before - tasks.len();

    let templates = store.load_templates();
    for tmpl in &templates {
        tasks.push(task_from_template(tmpl, now));
    }
    store.save(&tasks)?;
    store.mark_processed(now.date())?;

    let report = RolloverReport {
        removed,
        created: templates.len(),
    };
    log::info!(
        "rollover for {}: removed {} daily tasks, created {}",
        now.date(),
        report.removed,
        report.created
    );
    Ok(report)
}

/// Runs the rollover if a day boundary was crossed since the last run.
pub fn check_rollover(store: &TaskStore, now: NaiveDateTime) -> Result<Option<RolloverReport>> {
    if needs_rollover(store, now.date()) {
        run_rollover(store, now).map(Some)
    } else {
        Ok(None)
    }
}

/// One-shot deadline at the next local midnight.
///
/// The owner polls [`RolloverTimer::is_due`] and calls
/// [`RolloverTimer::reschedule`] after each firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverTimer {
    deadline: NaiveDateTime,
}

impl RolloverTimer {
    pub fn new(now: NaiveDateTime) -> RolloverTimer {
        RolloverTimer {
            deadline: next_midnight(now),
        }
    }

    pub fn deadline(&self) -> NaiveDateTime {
        self.deadline
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.deadline
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self, now: NaiveDateTime) -> Duration {
        (self.deadline - now).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn reschedule(&mut self, now: NaiveDateTime) {
        self.deadline = next_midnight(now);
    }

    /// Reschedules once the deadline has passed and runs the rollover unless
    /// another process already ran it today.
    pub fn fire_if_due(&mut self, store: &TaskStore, now: NaiveDateTime) -> Result<Option<RolloverReport>> {
        if !self.is_due(now) {
            return Ok(None);
        }
        self.reschedule(now);
        check_rollover(store, now)
    }
}
