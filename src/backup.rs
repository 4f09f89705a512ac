//! JSON backup files: export the task list, import it back.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::ImportMode;
use crate::error::{Result, TaskerError};
use crate::models::Task;
use crate::storage::TaskStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Tasks read from the file.
    pub imported: usize,
    /// Tasks in the store afterwards.
    pub total: usize,
}

/// `tasker-backup-YYYY-MM-DD.json`
pub fn backup_file_name(day: NaiveDate) -> String {
    format!("tasker-backup-{}.json", day.format("%Y-%m-%d"))
}

/// Writes `tasks` to a dated backup file inside `dir` and returns its path.
pub fn export_tasks(tasks: &[Task], dir: &Path, day: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(backup_file_name(day));
    let s = serde_json::to_string_pretty(tasks)?;
    fs::write(&path, s)?;
    log::info!("exported {} tasks to {}", tasks.len(), path.display());
    Ok(path)
}

/// Parses backup content. Repeated ids keep their first occurrence.
pub fn parse_backup(content: &str) -> Result<Vec<Task>> {
    let tasks: Vec<Task> =
        serde_json::from_str(content).map_err(|e| TaskerError::import(e.to_string()))?;
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(tasks.len());
    for t in tasks {
        if seen.insert(t.id.clone()) {
            unique.push(t);
        } else {
            log::warn!("skipping duplicate task id {} in backup", t.id);
        }
    }
    Ok(unique)
}

/// Upserts `incoming` into `existing` by id; incoming records win.
pub fn merge_tasks(mut existing: Vec<Task>, incoming: Vec<Task>) -> Vec<Task> {
    for t in incoming {
        match existing.iter_mut().find(|e| e.id == t.id) {
            Some(slot) => *slot = t,
            None => existing.push(t),
        }
    }
    existing
}

/// Imports a backup file into the store.
///
/// The file is fully parsed before anything is written, so a bad file leaves
/// the store unchanged.
pub fn import_tasks(store: &TaskStore, path: &Path, mode: ImportMode) -> Result<ImportReport> {
    let content = fs::read_to_string(path)
        .map_err(|e| TaskerError::import(format!("cannot read {}: {}", path.display(), e)))?;
    let incoming = parse_backup(&content)?;
    let imported = incoming.len();

    let tasks = match mode {
        ImportMode::Replace => incoming,
        ImportMode::Merge => merge_tasks(store.load(), incoming),
    };
    store.save(&tasks)?;
    log::info!("imported {} tasks from {} ({:?})", imported, path.display(), mode);
    Ok(ImportReport {
        imported,
        total: tasks.len(),
    })
}
