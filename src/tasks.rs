//! Operations on an in-memory task list.
//!
//! These functions only mutate the list they are given; callers decide when
//! to persist it through [`crate::storage::TaskStore`].

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDateTime;

use crate::dates::timestamp;
use crate::error::{Result, TaskerError};
use crate::models::{Category, Field, Priority, Status, Task, TaskId};

const MAX_LOCATION_LEN: usize = 100;

/// Input for [`create_task`].
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub category: Category,
    pub details: Option<String>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub priority: Option<Priority>,
}

/// Changes for [`update_task`]. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub details: Option<String>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.details.is_none()
            && self.date.is_none()
            && self.due_date.is_none()
            && self.time.is_none()
            && self.location.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }
}

/// Cleans up a location: collapses whitespace and splits camel case words.
pub fn format_location(location: &str) -> String {
    let collapsed = location.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = collapsed.chars().collect();
    let mut out = String::with_capacity(collapsed.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_lower) {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// Formats and length-checks a location. Empty input yields `None`.
pub fn validate_location(location: &str) -> Result<Option<String>> {
    let formatted = format_location(location);
    if formatted.is_empty() {
        return Ok(None);
    }
    if formatted.chars().count() > MAX_LOCATION_LEN {
        return Err(TaskerError::validation(format!(
            "location must be {} characters or less",
            MAX_LOCATION_LEN
        )));
    }
    Ok(Some(formatted))
}

/// Keeps `value` only if `category` declares `field`. Blank values become `None`.
fn gate(category: Category, field: Field, value: Option<String>) -> Option<String> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    if category.allows(field) {
        Some(value)
    } else {
        log::warn!(
            "ignoring {} for a {} task",
            field.label().to_lowercase(),
            category
        );
        None
    }
}

fn unique_id(tasks: &[Task]) -> TaskId {
    loop {
        let id = TaskId::generate();
        if !tasks.iter().any(|t| t.id == id) {
            return id;
        }
    }
}

/// Creates a task, appends it to `tasks` and returns a copy of it.
pub fn create_task(tasks: &mut Vec<Task>, new: NewTask, now: NaiveDateTime) -> Result<Task> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(TaskerError::validation("title is required"));
    }
    let category = new.category;
    let location = match gate(category, Field::Location, new.location) {
        Some(l) => validate_location(&l)?,
        None => None,
    };
    let stamp = timestamp(now);

    let mut task = Task::new(unique_id(tasks), title, category);
    task.details = gate(category, Field::Details, new.details);
    task.date = gate(category, Field::Date, new.date);
    task.due_date = gate(category, Field::DueDate, new.due_date);
    task.time = gate(category, Field::Time, new.time);
    task.location = location;
    task.priority = Some(new.priority.unwrap_or_default());
    task.status = Some(Status::NotStarted);
    task.created_at = Some(stamp.clone());
    task.modified_at = Some(stamp);

    log::debug!("created {} task {}", category, task.id);
    tasks.push(task.clone());
    Ok(task)
}

/// Resolves a user-typed id against `tasks`.
///
/// An exact match wins. Otherwise a string id may be given by a unique prefix,
/// so the short ids shown in tables can be typed back.
pub fn resolve_id(tasks: &[Task], query: &str) -> Result<TaskId> {
    let query = query.trim();
    if let Some(t) = tasks.iter().find(|t| t.id.to_string() == query) {
        return Ok(t.id.clone());
    }
    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| matches!(&t.id, TaskId::Text(s) if !query.is_empty() && s.starts_with(query)))
        .collect();
    match matches.as_slice() {
        [t] => Ok(t.id.clone()),
        [] => Err(TaskerError::not_found(format!("task {}", query))),
        _ => Err(TaskerError::validation(format!(
            "id prefix '{}' matches {} tasks",
            query,
            matches.len()
        ))),
    }
}

fn position(tasks: &[Task], id: &TaskId) -> Result<usize> {
    tasks
        .iter()
        .position(|t| t.id == *id)
        .ok_or_else(|| TaskerError::not_found(format!("task {}", id)))
}

pub fn find_task<'a>(tasks: &'a [Task], id: &TaskId) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == *id)
}

/// Like [`gate`] for edits: `None` leaves the field alone, a blank value
/// clears it.
fn gate_edit(category: Category, field: Field, value: Option<String>) -> Option<Option<String>> {
    let value = value?;
    if value.trim().is_empty() {
        return Some(None);
    }
    gate(category, field, Some(value)).map(Some)
}

/// Clears the fields `task`'s category does not declare.
fn drop_undeclared(task: &mut Task) {
    let category = task.category;
    let mut dropped = Vec::new();
    let mut clear = |field: Field, slot: &mut Option<String>| {
        if !category.allows(field) && slot.take().is_some() && !dropped.contains(&field) {
            dropped.push(field);
        }
    };
    clear(Field::Details, &mut task.details);
    clear(Field::Date, &mut task.date);
    clear(Field::DueDate, &mut task.due_date);
    clear(Field::Time, &mut task.time);
    clear(Field::Location, &mut task.location);
    clear(Field::Image, &mut task.image_data);
    clear(Field::Image, &mut task.image_url);
    if !dropped.is_empty() {
        let names: Vec<String> = dropped.iter().map(|f| f.label().to_lowercase()).collect();
        log::warn!(
            "task {} is now a {} task, dropped its {}",
            task.id,
            category,
            names.join(", ")
        );
    }
}

/// Applies `update` to the task with `id` and bumps its modification time.
///
/// A blank value clears a field. Changing the category drops the fields the
/// new category does not declare.
pub fn update_task<'a>(
    tasks: &'a mut [Task],
    id: &TaskId,
    update: TaskUpdate,
    now: NaiveDateTime,
) -> Result<&'a Task> {
    let idx = position(tasks, id)?;
    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            return Err(TaskerError::validation("title is required"));
        }
    }
    let category = update.category.unwrap_or(tasks[idx].category);
    let location = match gate_edit(category, Field::Location, update.location) {
        Some(Some(l)) => Some(validate_location(&l)?),
        other => other,
    };

    let t = &mut tasks[idx];
    let recategorized = t.category != category;
    t.category = category;
    if let Some(title) = update.title {
        t.title = title.trim().to_string();
    }
    if let Some(d) = gate_edit(category, Field::Details, update.details) {
        t.details = d;
    }
    if let Some(d) = gate_edit(category, Field::Date, update.date) {
        t.date = d;
    }
    if let Some(d) = gate_edit(category, Field::DueDate, update.due_date) {
        t.due_date = d;
    }
    if let Some(time) = gate_edit(category, Field::Time, update.time) {
        t.time = time;
    }
    if let Some(l) = location {
        t.location = l;
    }
    if recategorized {
        drop_undeclared(t);
    }
    if let Some(p) = update.priority {
        t.priority = Some(p);
    }
    if let Some(s) = update.status {
        apply_status(t, s, now);
    }
    t.modified_at = Some(timestamp(now));
    Ok(&tasks[idx])
}

fn apply_status(task: &mut Task, status: Status, now: NaiveDateTime) {
    task.status = Some(status);
    task.completed_at = if status == Status::Completed {
        Some(timestamp(now))
    } else {
        None
    };
}

/// Sets the status of a task, keeping `completedAt` consistent with it.
pub fn set_status<'a>(
    tasks: &'a mut [Task],
    id: &TaskId,
    status: Status,
    now: NaiveDateTime,
) -> Result<&'a Task> {
    let idx = position(tasks, id)?;
    let t = &mut tasks[idx];
    apply_status(t, status, now);
    t.modified_at = Some(timestamp(now));
    Ok(&tasks[idx])
}

/// Marks a task as completed.
///
/// Daily tasks are not copied forward here; the next rollover regenerates
/// them from the daily templates.
pub fn complete_task<'a>(tasks: &'a mut [Task], id: &TaskId, now: NaiveDateTime) -> Result<&'a Task> {
    set_status(tasks, id, Status::Completed, now)
}

/// Removes exactly the task with `id` and returns it.
pub fn delete_task(tasks: &mut Vec<Task>, id: &TaskId) -> Result<Task> {
    let idx = position(tasks, id)?;
    Ok(tasks.remove(idx))
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Encodes an image file as a `data:` URL.
pub fn image_data_url(path: &Path) -> Result<String> {
    let mime = image_mime(path).ok_or_else(|| {
        TaskerError::validation(format!("{} is not a supported image", path.display()))
    })?;
    let bytes = fs::read(path)?;
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Embeds the image at `path` into an event task.
pub fn attach_image<'a>(
    tasks: &'a mut [Task],
    id: &TaskId,
    path: &Path,
    now: NaiveDateTime,
) -> Result<&'a Task> {
    let idx = position(tasks, id)?;
    if !tasks[idx].category.allows(Field::Image) {
        return Err(TaskerError::validation(format!(
            "images can only be attached to event tasks, {} is a {} task",
            id, tasks[idx].category
        )));
    }
    let url = image_data_url(path)?;
    let t = &mut tasks[idx];
    t.image_data = Some(url);
    t.modified_at = Some(timestamp(now));
    Ok(&tasks[idx])
}
