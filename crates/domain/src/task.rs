//! Release tasks and their activity trail.

use chrono::{DateTime, NaiveDate, Utc};
use mixdown_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workstream types attached to a release. At most one task of each type
/// exists per release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Delivery to streaming and download platforms.
    Distribution,
    /// Final mix mastering.
    Mastering,
    /// Cover artwork production.
    Artwork,
    /// Music video production.
    MusicVideo,
    /// Marketing and promotion.
    Marketing,
    /// Any other workstream.
    Generic,
}

impl TaskType {
    /// Returns a stable storage value for this task type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distribution => "distribution",
            Self::Mastering => "mastering",
            Self::Artwork => "artwork",
            Self::MusicVideo => "music_video",
            Self::Marketing => "marketing",
            Self::Generic => "generic",
        }
    }

    /// Returns all known task types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[TaskType] = &[
            TaskType::Distribution,
            TaskType::Mastering,
            TaskType::Artwork,
            TaskType::MusicVideo,
            TaskType::Marketing,
            TaskType::Generic,
        ];

        ALL
    }

    /// Parses a storage string into a task type.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "distribution" => Ok(Self::Distribution),
            "mastering" => Ok(Self::Mastering),
            "artwork" => Ok(Self::Artwork),
            "music_video" => Ok(Self::MusicVideo),
            "marketing" => Ok(Self::Marketing),
            "generic" => Ok(Self::Generic),
            _ => Err(AppError::Validation(format!("unknown task type '{value}'"))),
        }
    }
}

/// Progress of a release task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Outstanding,
    /// Being worked on.
    InProgress,
    /// Done.
    Complete,
}

impl TaskStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outstanding => "outstanding",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }

    /// Parses a storage string into a status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "outstanding" => Ok(Self::Outstanding),
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            _ => Err(AppError::Validation(format!(
                "unknown task status '{value}'"
            ))),
        }
    }
}

/// A workstream attached to a release.
///
/// `distributor` is meaningful for distribution tasks; `asset_url` carries
/// the delivered file or link for mastering, artwork, and music video tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseTask {
    /// Task identifier.
    pub id: Uuid,
    /// Release the task belongs to.
    pub release_id: Uuid,
    /// Workstream type, unique per release.
    pub task_type: TaskType,
    /// Progress status.
    pub status: TaskStatus,
    /// Subjects of members assigned to the task.
    pub assignee_subjects: Vec<String>,
    /// Optional deadline.
    pub due_date: Option<NaiveDate>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Distribution partner, for distribution tasks.
    pub distributor: Option<String>,
    /// Delivered asset link, for mastering/artwork/music video tasks.
    pub asset_url: Option<String>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task last changed.
    pub updated_at: DateTime<Utc>,
}

/// Kind of activity recorded on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventType {
    /// The task was created.
    Created,
    /// A field of the task changed.
    Updated,
    /// A member left a comment.
    Comment,
}

impl TaskEventType {
    /// Returns a stable storage value for this event type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Comment => "comment",
        }
    }

    /// Parses a storage string into an event type.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "comment" => Ok(Self::Comment),
            _ => Err(AppError::Validation(format!(
                "unknown task event type '{value}'"
            ))),
        }
    }
}

/// One append-only activity record on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Event identifier.
    pub id: Uuid,
    /// Task the event belongs to.
    pub task_id: Uuid,
    /// Subject of the member who caused the event.
    pub actor: String,
    /// Kind of activity.
    pub event_type: TaskEventType,
    /// Human-readable description, or the comment body.
    pub summary: String,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{TaskStatus, TaskType};

    #[test]
    fn task_type_roundtrip_storage_value() {
        for task_type in TaskType::all() {
            let parsed = TaskType::parse(task_type.as_str());
            assert!(parsed.is_ok());
            assert_eq!(parsed.unwrap_or(TaskType::Generic), *task_type);
        }
    }

    #[test]
    fn unknown_task_type_is_rejected() {
        assert!(TaskType::parse("catering").is_err());
    }

    #[test]
    fn status_roundtrip_storage_value() {
        for status in [
            TaskStatus::Outstanding,
            TaskStatus::InProgress,
            TaskStatus::Complete,
        ] {
            let parsed = TaskStatus::parse(status.as_str());
            assert!(parsed.is_ok());
            assert_eq!(parsed.unwrap_or(TaskStatus::Outstanding), status);
        }
    }
}
