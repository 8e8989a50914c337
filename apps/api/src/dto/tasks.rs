use chrono::NaiveDate;

use mixdown_application::{CreateTaskInput, UpdateTaskInput};
use mixdown_core::AppError;
use mixdown_domain::{ReleaseTask, TaskEvent, TaskStatus, TaskType};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of one release workstream.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/task-response.ts"
)]
pub struct TaskResponse {
    pub task_id: String,
    pub release_id: String,
    pub task_type: String,
    pub status: String,
    pub assignee_subjects: Vec<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub distributor: Option<String>,
    pub asset_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// API representation of one task activity record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/task-event-response.ts"
)]
pub struct TaskEventResponse {
    pub event_id: String,
    pub task_id: String,
    pub actor: String,
    pub event_type: String,
    pub summary: String,
    pub created_at: String,
}

/// Incoming payload for adding a workstream to a release.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-task-request.ts"
)]
pub struct CreateTaskRequest {
    pub task_type: String,
    pub status: Option<String>,
    pub assignee_subjects: Vec<String>,
    /// Deadline in `YYYY-MM-DD` form.
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub distributor: Option<String>,
    pub asset_url: Option<String>,
}

/// Incoming payload replacing the mutable fields of a workstream.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-task-request.ts"
)]
pub struct UpdateTaskRequest {
    pub status: String,
    pub assignee_subjects: Vec<String>,
    /// Deadline in `YYYY-MM-DD` form.
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub distributor: Option<String>,
    pub asset_url: Option<String>,
}

/// Incoming payload for commenting on a workstream.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/add-comment-request.ts"
)]
pub struct AddCommentRequest {
    pub body: String,
}

impl From<ReleaseTask> for TaskResponse {
    fn from(value: ReleaseTask) -> Self {
        Self {
            task_id: value.id.to_string(),
            release_id: value.release_id.to_string(),
            task_type: value.task_type.as_str().to_owned(),
            status: value.status.as_str().to_owned(),
            assignee_subjects: value.assignee_subjects,
            due_date: value.due_date.map(|date| date.to_string()),
            notes: value.notes,
            distributor: value.distributor,
            asset_url: value.asset_url,
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

impl From<TaskEvent> for TaskEventResponse {
    fn from(value: TaskEvent) -> Self {
        Self {
            event_id: value.id.to_string(),
            task_id: value.task_id.to_string(),
            actor: value.actor,
            event_type: value.event_type.as_str().to_owned(),
            summary: value.summary,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

impl TryFrom<CreateTaskRequest> for CreateTaskInput {
    type Error = AppError;

    fn try_from(value: CreateTaskRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            task_type: TaskType::parse(&value.task_type)?,
            status: value
                .status
                .as_deref()
                .map(TaskStatus::parse)
                .transpose()?,
            assignee_subjects: value.assignee_subjects,
            due_date: parse_due_date(value.due_date)?,
            notes: value.notes,
            distributor: value.distributor,
            asset_url: value.asset_url,
        })
    }
}

impl TryFrom<UpdateTaskRequest> for UpdateTaskInput {
    type Error = AppError;

    fn try_from(value: UpdateTaskRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            status: TaskStatus::parse(&value.status)?,
            assignee_subjects: value.assignee_subjects,
            due_date: parse_due_date(value.due_date)?,
            notes: value.notes,
            distributor: value.distributor,
            asset_url: value.asset_url,
        })
    }
}

fn parse_due_date(value: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    value
        .map(|date| {
            date.parse::<NaiveDate>()
                .map_err(|_| AppError::Validation("due date must be YYYY-MM-DD".to_owned()))
        })
        .transpose()
}
