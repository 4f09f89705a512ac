use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How `import` combines a backup file with the stored tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Stored tasks are replaced by the file's tasks.
    #[default]
    Replace,
    /// File tasks are upserted by id, other stored tasks are kept.
    Merge,
}

/// Application configuration, read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the task store. Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Logger filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub import_mode: ImportMode,
    /// Mark events as completed once their scheduled time has passed.
    #[serde(default = "default_true")]
    pub auto_close_events: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: default_log_level(),
            import_mode: ImportMode::default(),
            auto_close_events: true,
        }
    }
}

impl Config {
    /// Loads the configuration file and applies environment overrides.
    ///
    /// The file is looked up in this order:
    /// 1. `TASKER_CONFIG` environment variable.
    /// 2. `~/.config/tasker/config.toml` (on Linux).
    ///
    /// A missing file yields the defaults. `TASKER_DATA_DIR` overrides `data_dir`.
    pub fn load() -> Result<Config> {
        let path = config_path();
        let mut config = match path {
            Some(p) if p.exists() => Config::from_file(&p)?,
            _ => Config::default(),
        };
        if let Ok(dir) = std::env::var("TASKER_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        Config::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }

    /// The directory holding the task store.
    ///
    /// 1. `data_dir` from the file or `TASKER_DATA_DIR`.
    /// 2. `~/.local/share/tasker` (on Linux).
    /// 3. `./tasker` (fallback).
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push("tasker");
            p
        })
    }

    /// Log file used while the TUI owns the terminal.
    pub fn log_file(&self) -> PathBuf {
        self.data_dir().join("tasker.log")
    }

    /// Opens the log file for appending, creating the data directory first.
    pub fn open_log_file(&self) -> Result<File> {
        fs::create_dir_all(self.data_dir())?;
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_file())?;
        Ok(f)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("TASKER_CONFIG") {
        return Some(PathBuf::from(p));
    }
    dirs::config_dir().map(|p| p.join("tasker").join("config.toml"))
}
