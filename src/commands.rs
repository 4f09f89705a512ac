use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::backup::{export_tasks, import_tasks};
use crate::config::{Config, ImportMode};
use crate::dates::now_local;
use crate::error::{Result, TaskerError};
use crate::models::{Category, DailyTemplate, Priority, Status, Task};
use crate::pipeline::{effective_date, refresh};
use crate::rollover::{check_rollover, run_rollover};
use crate::storage::TaskStore;
use crate::tasks::{
    attach_image, complete_task, create_task, delete_task, find_task, resolve_id, set_status,
    update_task, NewTask, TaskUpdate,
};

/// Runs the rollover if it has not run today yet.
///
/// Every entry point calls this before touching tasks, otherwise a delayed
/// rollover would later wipe daily tasks created in the meantime.
fn catch_up(store: &TaskStore, now: NaiveDateTime) -> Result<()> {
    if let Some(report) = check_rollover(store, now)? {
        log::debug!("startup rollover: {:?}", report);
    }
    Ok(())
}

/// Catches up on a missed rollover, then runs the normalization pipeline.
///
/// This is what every view of the task list goes through.
pub fn load_current(store: &TaskStore, config: &Config, now: NaiveDateTime) -> Result<Vec<Task>> {
    catch_up(store, now)?;
    refresh(store, config, now)
}

/// Catches up on a missed rollover, then loads the stored tasks for a change.
pub fn load_for_change(store: &TaskStore, now: NaiveDateTime) -> Result<Vec<Task>> {
    catch_up(store, now)?;
    Ok(store.load())
}

/// Human readable distance from `today`.
pub fn relative_day(day: NaiveDate, today: NaiveDate) -> String {
    match (day - today).num_days() {
        d if d < 0 => format!("{}d ago", d.abs()),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        d => format!("in {}d", d),
    }
}

fn priority_color(p: Option<Priority>) -> Color {
    match p {
        Some(Priority::High) => Color::Red,
        Some(Priority::Low) => Color::Green,
        _ => Color::Yellow,
    }
}

fn category_color(c: Category) -> Color {
    match c {
        Category::Event => Color::Blue,
        Category::Daily => Color::Magenta,
        Category::Project => Color::DarkYellow,
        Category::Personal => Color::Cyan,
    }
}

/// Adds a new task, optionally with an image attached.
pub fn cmd_add(store: &TaskStore, new: NewTask, image: Option<PathBuf>) -> Result<()> {
    let now = now_local();
    let mut tasks = load_for_change(store, now)?;
    let task = create_task(&mut tasks, new, now)?;
    if let Some(path) = image {
        attach_image(&mut tasks, &task.id, &path, now)?;
    }
    store.save(&tasks)?;
    println!("Task added (id = {})", task.id);
    Ok(())
}

/// Lists tasks in a formatted table, in pipeline order.
///
/// By default, hides completed tasks unless `all` is true.
pub fn cmd_list(store: &TaskStore, config: &Config, all: bool, category: Option<Category>) -> Result<()> {
    let now = now_local();
    let mut tasks = load_current(store, config, now)?;
    if !all {
        tasks.retain(|t| !t.is_completed());
    }
    if let Some(c) = category {
        tasks.retain(|t| t.category == c);
    }
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("When").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let today = now.date();
    for t in &tasks {
        let when = effective_date(t, today)
            .map(|d| relative_day(d, today))
            .unwrap_or_else(|| "-".to_string());
        let status_color = match t.status() {
            Status::Completed => Color::Green,
            Status::InProgress => Color::Yellow,
            Status::NotStarted => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(t.id.short()),
            Cell::new(&t.title),
            Cell::new(t.category).fg(category_color(t.category)),
            Cell::new(when),
            Cell::new(t.time.clone().unwrap_or_default()),
            Cell::new(t.priority.map(|p| p.to_string()).unwrap_or_default())
                .fg(priority_color(t.priority)),
            Cell::new(t.status().label()).fg(status_color),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Prints every field of one task.
pub fn cmd_show(store: &TaskStore, id: &str) -> Result<()> {
    let tasks = load_for_change(store, now_local())?;
    let id = resolve_id(&tasks, id)?;
    let Some(t) = find_task(&tasks, &id) else {
        return Err(TaskerError::not_found(format!("task {}", id)));
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Field", "Value"]);
    let mut row = |name: &str, value: Option<String>| {
        if let Some(v) = value {
            table.add_row(vec![name.to_string(), v]);
        }
    };
    row("ID", Some(t.id.to_string()));
    row("Title", Some(t.title.clone()));
    row("Category", Some(t.category.to_string()));
    row("Details", t.details.clone());
    row("Date", t.date.clone());
    row("Due Date", t.due_date.clone());
    row("Time", t.time.clone());
    row("Location", t.location.clone());
    row("Priority", t.priority.map(|p| p.to_string()));
    row("Status", Some(t.status().label().to_string()));
    row("Image", t.image_url.clone());
    row("Image Data", t.image_data.as_ref().map(|d| format!("embedded ({} bytes)", d.len())));
    row("Created", t.created_at.clone());
    row("Modified", t.modified_at.clone());
    row("Completed", t.completed_at.clone());
    println!("{table}");
    Ok(())
}

/// Edits an existing task's details.
pub fn cmd_edit(store: &TaskStore, id: &str, update: TaskUpdate) -> Result<()> {
    if update.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    let now = now_local();
    let mut tasks = load_for_change(store, now)?;
    let id = resolve_id(&tasks, id)?;
    update_task(&mut tasks, &id, update, now)?;
    store.save(&tasks)?;
    println!("Task {} updated.", id);
    Ok(())
}

/// Marks a task as complete.
pub fn cmd_complete(store: &TaskStore, id: &str) -> Result<()> {
    let now = now_local();
    let mut tasks = load_for_change(store, now)?;
    let id = resolve_id(&tasks, id)?;
    let task = complete_task(&mut tasks, &id, now)?;
    if task.category == Category::Daily {
        println!("Task {} marked as complete. It comes back tomorrow if it has a template.", id);
    } else {
        println!("Task {} marked as complete.", id);
    }
    store.save(&tasks)?;
    Ok(())
}

pub fn cmd_status(store: &TaskStore, id: &str, status: Status) -> Result<()> {
    let now = now_local();
    let mut tasks = load_for_change(store, now)?;
    let id = resolve_id(&tasks, id)?;
    set_status(&mut tasks, &id, status, now)?;
    store.save(&tasks)?;
    println!("Task {} is now {}.", id, status.label().to_lowercase());
    Ok(())
}

/// Removes a task from the store by id.
pub fn cmd_remove(store: &TaskStore, id: &str) -> Result<()> {
    let mut tasks = load_for_change(store, now_local())?;
    let id = resolve_id(&tasks, id)?;
    let removed = delete_task(&mut tasks, &id)?;
    store.save(&tasks)?;
    println!("Task {} ({}) removed.", id, removed.title);
    Ok(())
}

/// Embeds an image file into an event task.
pub fn cmd_image(store: &TaskStore, id: &str, path: &Path) -> Result<()> {
    let now = now_local();
    let mut tasks = load_for_change(store, now)?;
    let id = resolve_id(&tasks, id)?;
    attach_image(&mut tasks, &id, path, now)?;
    store.save(&tasks)?;
    println!("Image attached to task {}.", id);
    Ok(())
}

/// Writes the stored tasks to `tasker-backup-<date>.json` in `dir`.
pub fn cmd_export(store: &TaskStore, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| PathBuf::from("."));
    let tasks = store.load();
    let path = export_tasks(&tasks, &dir, now_local().date())?;
    println!("Exported {} tasks to {}", tasks.len(), path.display());
    Ok(())
}

/// Imports a backup file. `merge` overrides the configured import mode.
pub fn cmd_import(store: &TaskStore, config: &Config, file: &Path, merge: bool) -> Result<()> {
    let mode = if merge { ImportMode::Merge } else { config.import_mode };
    catch_up(store, now_local())?;
    let report = import_tasks(store, file, mode)?;
    println!(
        "Imported {} tasks ({} in store).",
        report.imported, report.total
    );
    Ok(())
}

/// Adds a daily template.
pub fn cmd_template_add(store: &TaskStore, template: DailyTemplate) -> Result<()> {
    if template.title.trim().is_empty() {
        return Err(TaskerError::validation("title is required"));
    }
    let mut templates = store.load_templates();
    if templates.iter().any(|t| t.title == template.title) {
        return Err(TaskerError::validation(format!(
            "template '{}' already exists",
            template.title
        )));
    }
    let title = template.title.clone();
    templates.push(template);
    store.save_templates(&templates)?;
    println!("Template '{}' added. It is created every day at midnight.", title);
    Ok(())
}

/// Lists all daily templates.
pub fn cmd_template_list(store: &TaskStore) -> Result<()> {
    let templates = store.load_templates();
    if templates.is_empty() {
        println!("No templates found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Title", "Time", "Priority", "Details"]);
    for t in templates {
        table.add_row(vec![
            t.title,
            t.time.unwrap_or_else(|| "-".into()),
            t.priority.unwrap_or_default().to_string(),
            t.details.unwrap_or_default(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Removes a daily template. Tasks already created from it stay until the
/// next rollover.
pub fn cmd_template_remove(store: &TaskStore, title: &str) -> Result<()> {
    let mut templates = store.load_templates();
    let len_before = templates.len();
    templates.retain(|t| t.title != title);
    if templates.len() == len_before {
        return Err(TaskerError::not_found(format!("template '{}'", title)));
    }
    store.save_templates(&templates)?;
    println!("Template '{}' removed.", title);
    Ok(())
}

/// Runs the daily rollover now. Without `force` it only runs once per day.
pub fn cmd_rollover(store: &TaskStore, force: bool) -> Result<()> {
    let now = now_local();
    let report = if force {
        Some(run_rollover(store, now)?)
    } else {
        check_rollover(store, now)?
    };
    match report {
        Some(r) => println!(
            "Rollover done: removed {} daily tasks, created {}.",
            r.removed, r.created
        ),
        None => println!("Rollover already ran today. Use --force to run it again."),
    }
    Ok(())
}

/// Deletes all tasks, templates and rollover state.
pub fn cmd_reset(store: &TaskStore, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks and templates? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    store.reset()?;
    println!("Store reset successfully.");
    Ok(())
}
