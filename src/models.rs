use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::TaskerError;

/// Identifier of a stored task.
///
/// Older data uses numeric timestamps, newer data uses UUID strings. Both are
/// accepted and written back in the form they were read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl TaskId {
    /// A fresh random id for a new task.
    pub fn generate() -> TaskId {
        TaskId::Text(Uuid::new_v4().to_string())
    }

    /// Short form for table output: UUIDs are cut to their first block.
    pub fn short(&self) -> String {
        match self {
            TaskId::Number(n) => n.to_string(),
            TaskId::Text(s) => s.chars().take(8).collect(),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId::Text(s.to_string())
    }
}

impl From<i64> for TaskId {
    fn from(n: i64) -> Self {
        TaskId::Number(n)
    }
}

/// The kind of a task. Decides which optional fields mean anything.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Event,
    Daily,
    Project,
    #[default]
    Personal,
}

/// Optional task fields that a category may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Details,
    Date,
    DueDate,
    Time,
    Image,
    Location,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Details => "Details",
            Field::Date => "Date",
            Field::DueDate => "Due Date",
            Field::Time => "Time",
            Field::Image => "Image",
            Field::Location => "Location",
        }
    }
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Event,
        Category::Daily,
        Category::Project,
        Category::Personal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Event => "event",
            Category::Daily => "daily",
            Category::Project => "project",
            Category::Personal => "personal",
        }
    }

    /// The fields the add/edit forms offer for this category.
    pub fn fields(&self) -> &'static [Field] {
        match self {
            Category::Event => &[Field::Details, Field::Date, Field::Time, Field::Image, Field::Location],
            Category::Daily => &[Field::Details, Field::Time],
            Category::Project => &[Field::Details, Field::DueDate],
            Category::Personal => &[Field::Details, Field::Date],
        }
    }

    pub fn allows(&self, field: Field) -> bool {
        self.fields().contains(&field)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TaskerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "event" | "e" => Ok(Category::Event),
            "daily" | "d" => Ok(Category::Daily),
            "project" | "p" => Ok(Category::Project),
            "personal" => Ok(Category::Personal),
            other => Err(TaskerError::validation(format!(
                "unknown category '{}'. Supported: event, daily, project, personal",
                other
            ))),
        }
    }
}

/// Task priority. Ordered so that `High < Medium < Low`, which is also the
/// display order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            other => Err(TaskerError::validation(format!(
                "unknown priority '{}'. Supported: high, medium, low",
                other
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotStarted => "not_started",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::NotStarted => "Not started",
            Status::InProgress => "In progress",
            Status::Completed => "Done",
        }
    }

    /// Next status in the TUI's cycle.
    pub fn next(&self) -> Status {
        match self {
            Status::NotStarted => Status::InProgress,
            Status::InProgress => Status::Completed,
            Status::Completed => Status::NotStarted,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TaskerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "not_started" | "todo" => Ok(Status::NotStarted),
            "in_progress" | "doing" => Ok(Status::InProgress),
            "completed" | "done" => Ok(Status::Completed),
            other => Err(TaskerError::validation(format!(
                "unknown status '{}'. Supported: not_started, in_progress, completed",
                other
            ))),
        }
    }
}

/// Reads an enum stored as a string. Empty, unknown and non-string values
/// become the default instead of failing the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    Ok(lenient_opt(deserializer)?.unwrap_or_default())
}

fn lenient_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => match s.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("ignoring unknown value '{}' in stored task", s);
                None
            }
        },
        _ => None,
    })
}

/// Represents a single task.
///
/// Field names follow the stored JSON (camelCase). Date and timestamp fields
/// are kept as the strings they were read as, see [`crate::dates`] for how
/// they are interpreted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier. Records without one get a fresh UUID on load.
    #[serde(default = "TaskId::generate")]
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Category,
    #[serde(default, alias = "description", skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Event or personal date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Project deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Free-form time of day, e.g. "9:00 AM".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Embedded image as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, alias = "created", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Task {
    /// A bare task with only the required fields set.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>, category: Category) -> Task {
        Task {
            id: id.into(),
            title: title.into(),
            category,
            details: None,
            date: None,
            due_date: None,
            time: None,
            location: None,
            priority: None,
            status: None,
            image_url: None,
            image_data: None,
            created_at: None,
            modified_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status.unwrap_or_default()
    }

    pub fn is_completed(&self) -> bool {
        self.status() == Status::Completed
    }

    pub fn has_image(&self) -> bool {
        self.image_data.is_some() || self.image_url.is_some()
    }
}

/// Blueprint for a daily task, regenerated every day at rollover.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTemplate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}
