//! Error type shared by the library and the CLI.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskerError {
    /// Filesystem errors (data directory, backup files, images).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected user input (empty title, oversized location, ...).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The import file could not be used; the store was left untouched.
    #[error("Import failed: {0}")]
    Import(String),

    #[error("Duplicate task id: {0}")]
    DuplicateId(String),
}

pub type Result<T> = std::result::Result<T, TaskerError>;

impl TaskerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TaskerError::not_found("task 7");
        assert_eq!(err.to_string(), "Not found: task 7");

        let err = TaskerError::validation("title is required");
        assert_eq!(err.to_string(), "Invalid input: title is required");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: TaskerError = io_err.into();
        assert!(matches!(err, TaskerError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        let err: TaskerError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
