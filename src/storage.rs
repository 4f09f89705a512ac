use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Result, TaskerError};
use crate::models::{DailyTemplate, Task};

/// Key holding the JSON array of tasks.
pub const TASKS_KEY: &str = "tasks";
/// Key holding the JSON array of daily templates.
pub const TEMPLATES_KEY: &str = "dailyTemplates";
/// Key holding the last day the rollover ran for.
pub const LAST_PROCESSED_KEY: &str = "lastProcessed";

const ALL_KEYS: [&str; 3] = [TASKS_KEY, TEMPLATES_KEY, LAST_PROCESSED_KEY];

/// Records read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    /// False when the stored value, or some record in it, could not be read.
    /// Writing `items` back would then lose data.
    pub intact: bool,
}

impl<T> Loaded<T> {
    fn complete(items: Vec<T>) -> Loaded<T> {
        Loaded { items, intact: true }
    }

    fn partial(items: Vec<T>) -> Loaded<T> {
        Loaded { items, intact: false }
    }
}

/// Key-value store backed by one JSON file per key in a data directory.
///
/// Every write replaces the whole value; there is no merging and the last
/// writer wins.
#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
}

impl TaskStore {
    /// A store over `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> TaskStore {
        TaskStore { dir: dir.into() }
    }

    /// Opens the store configured in `config`, creating its directory.
    pub fn open(config: &Config) -> Result<TaskStore> {
        let store = TaskStore::new(config.data_dir());
        fs::create_dir_all(&store.dir)?;
        log::debug!("using task store at {}", store.dir.display());
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Reads the raw value stored under `key`, `None` if it was never written.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let mut f = OpenOptions::new().read(true).open(&path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        Ok(Some(s))
    }

    /// Overwrites the value stored under `key`.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.path_for(key))?;
        f.write_all(value.as_bytes())?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Reads a JSON array stored under `key`, one record at a time.
    ///
    /// Missing data yields an empty list. Unreadable or malformed data yields
    /// an empty list too, and records that fail to parse are skipped; both
    /// cases are logged and reported through `Loaded::intact`.
    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Loaded<T> {
        let raw = match self.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Loaded::complete(Vec::new()),
            Err(e) => {
                log::warn!("cannot read '{}', starting empty: {}", key, e);
                return Loaded::partial(Vec::new());
            }
        };
        if raw.trim().is_empty() {
            return Loaded::complete(Vec::new());
        }
        let records: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("malformed data under '{}', starting empty: {}", key, e);
                return Loaded::partial(Vec::new());
            }
        };

        let total = records.len();
        let items: Vec<T> = records
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| match serde_json::from_value(record) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("skipping record {} under '{}': {}", i, key, e);
                    None
                }
            })
            .collect();
        if items.len() == total {
            Loaded::complete(items)
        } else {
            Loaded::partial(items)
        }
    }

    fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let s = serde_json::to_string_pretty(items)?;
        self.set(key, &s)?;
        log::debug!("saved {} items under '{}'", items.len(), key);
        Ok(())
    }

    /// Loads all tasks. Never fails: unreadable records are left out.
    pub fn load(&self) -> Vec<Task> {
        self.load_list(TASKS_KEY).items
    }

    /// Like [`TaskStore::load`], but also tells whether anything was left out.
    pub fn load_checked(&self) -> Loaded<Task> {
        self.load_list(TASKS_KEY)
    }

    /// Saves the given list of tasks, overwriting the stored collection.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        self.save_list(TASKS_KEY, tasks)
    }

    /// Adds one task to the stored collection.
    ///
    /// Fails with [`TaskerError::DuplicateId`] if the id is already taken.
    pub fn append(&self, task: Task) -> Result<()> {
        let mut tasks = self.load();
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(TaskerError::DuplicateId(task.id.to_string()));
        }
        tasks.push(task);
        self.save(&tasks)
    }

    pub fn load_templates(&self) -> Vec<DailyTemplate> {
        self.load_list(TEMPLATES_KEY).items
    }

    pub fn save_templates(&self, templates: &[DailyTemplate]) -> Result<()> {
        self.save_list(TEMPLATES_KEY, templates)
    }

    /// The last day the daily rollover was applied.
    pub fn last_processed(&self) -> Option<NaiveDate> {
        let raw = self.get(LAST_PROCESSED_KEY).ok().flatten()?;
        let s: String = serde_json::from_str(&raw).ok()?;
        NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
    }

    pub fn mark_processed(&self, day: NaiveDate) -> Result<()> {
        let s = serde_json::to_string(&day.format("%Y-%m-%d").to_string())?;
        self.set(LAST_PROCESSED_KEY, &s)
    }

    /// Deletes every key of the store.
    pub fn reset(&self) -> Result<()> {
        for key in ALL_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }
}
