//! Library behind the `tasker` binary: the task model, the key-value task
//! store, the normalization pipeline, daily rollover and JSON backups.

pub mod backup;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rollover;
pub mod storage;
pub mod tasks;

pub use error::{Result, TaskerError};
