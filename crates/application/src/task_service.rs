use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use mixdown_core::{AppError, AppResult, NonEmptyString, UserIdentity, WorkspaceId};
use mixdown_domain::{
    Permission, ReleaseTask, TaskEvent, TaskEventType, TaskStatus, TaskType,
};

use crate::{AccessService, ReleaseRepository};

/// Input payload for opening a workstream on a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskInput {
    /// Workstream type, unique per release.
    pub task_type: TaskType,
    /// Initial status; defaults to outstanding.
    pub status: Option<TaskStatus>,
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
}

/// Input payload replacing the mutable fields of a task. The workstream
/// type itself never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskInput {
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
}

/// Repository port for release tasks and their activity trail.
#[async_trait]
pub trait ReleaseTaskRepository: Send + Sync {
    /// Lists tasks of a release in workspace scope.
    async fn list_tasks(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
    ) -> AppResult<Vec<ReleaseTask>>;

    /// Finds the task of a given workstream type on a release.
    async fn find_task_by_type(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: TaskType,
    ) -> AppResult<Option<ReleaseTask>>;

    /// Persists a new task.
    async fn create_task(&self, task: &ReleaseTask) -> AppResult<()>;

    /// Applies new field values, returning the updated record.
    async fn update_task(&self, task: &ReleaseTask) -> AppResult<ReleaseTask>;

    /// Deletes a task and its events in workspace and release scope.
    async fn delete_task(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_id: Uuid,
    ) -> AppResult<()>;

    /// Lists a task's activity, newest first.
    async fn list_events(&self, task_id: Uuid) -> AppResult<Vec<TaskEvent>>;

    /// Appends one activity record.
    async fn append_event(&self, event: &TaskEvent) -> AppResult<()>;
}

/// Application service for release workstreams.
#[derive(Clone)]
pub struct TaskService {
    access: AccessService,
    releases: Arc<dyn ReleaseRepository>,
    tasks: Arc<dyn ReleaseTaskRepository>,
}

impl TaskService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        access: AccessService,
        releases: Arc<dyn ReleaseRepository>,
        tasks: Arc<dyn ReleaseTaskRepository>,
    ) -> Self {
        Self {
            access,
            releases,
            tasks,
        }
    }

    /// Lists the tasks of a release.
    pub async fn list_tasks(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
    ) -> AppResult<Vec<ReleaseTask>> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewReleases])
            .await?;

        self.require_release(workspace_id, release_id).await?;
        self.tasks.list_tasks(workspace_id, release_id).await
    }

    /// Returns the task of a given workstream type.
    pub async fn get_task(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: TaskType,
    ) -> AppResult<ReleaseTask> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewReleases])
            .await?;

        self.require_task(workspace_id, release_id, task_type).await
    }

    /// Opens a workstream on a release. Each release holds at most one task
    /// of each type.
    pub async fn create_task(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        input: CreateTaskInput,
    ) -> AppResult<ReleaseTask> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateReleases])
            .await?;

        self.require_release(workspace_id, release_id).await?;
        if self
            .tasks
            .find_task_by_type(workspace_id, release_id, input.task_type)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "a task of that type already exists for this release".to_owned(),
            ));
        }

        self.require_member_assignees(workspace_id, &input.assignee_subjects)
            .await?;

        let now = Utc::now();
        let task = ReleaseTask {
            id: Uuid::new_v4(),
            release_id,
            task_type: input.task_type,
            status: input.status.unwrap_or(TaskStatus::Outstanding),
            assignee_subjects: input.assignee_subjects,
            due_date: input.due_date,
            notes: optional_text(input.notes),
            distributor: optional_text(input.distributor),
            asset_url: optional_text(input.asset_url),
            created_at: now,
            updated_at: now,
        };
        self.tasks.create_task(&task).await?;
        self.tasks
            .append_event(&TaskEvent {
                id: Uuid::new_v4(),
                task_id: task.id,
                actor: actor.subject().to_owned(),
                event_type: TaskEventType::Created,
                summary: "created this task".to_owned(),
                created_at: now,
            })
            .await?;

        Ok(task)
    }

    /// Replaces a task's mutable fields and records one activity event per
    /// field that actually changed.
    pub async fn update_task(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: TaskType,
        input: UpdateTaskInput,
    ) -> AppResult<ReleaseTask> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateReleases])
            .await?;

        let stored = self.require_task(workspace_id, release_id, task_type).await?;

        self.require_member_assignees(workspace_id, &input.assignee_subjects)
            .await?;

        let mut updated = stored.clone();
        updated.status = input.status;
        updated.assignee_subjects = input.assignee_subjects;
        updated.due_date = input.due_date;
        updated.notes = optional_text(input.notes);
        updated.distributor = optional_text(input.distributor);
        updated.asset_url = optional_text(input.asset_url);

        let summaries = change_summaries(&stored, &updated);
        if summaries.is_empty() {
            return Ok(stored);
        }

        updated.updated_at = Utc::now();
        let updated = self.tasks.update_task(&updated).await?;
        for summary in summaries {
            self.tasks
                .append_event(&TaskEvent {
                    id: Uuid::new_v4(),
                    task_id: updated.id,
                    actor: actor.subject().to_owned(),
                    event_type: TaskEventType::Updated,
                    summary,
                    created_at: updated.updated_at,
                })
                .await?;
        }

        Ok(updated)
    }

    /// Removes a workstream from a release.
    pub async fn delete_task(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: TaskType,
    ) -> AppResult<()> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateReleases])
            .await?;

        let task = self.require_task(workspace_id, release_id, task_type).await?;

        self.tasks
            .delete_task(workspace_id, release_id, task.id)
            .await
    }

    /// Lists a task's activity, newest first.
    pub async fn list_events(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: TaskType,
    ) -> AppResult<Vec<TaskEvent>> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewReleases])
            .await?;

        let task = self.require_task(workspace_id, release_id, task_type).await?;

        self.tasks.list_events(task.id).await
    }

    /// Leaves a comment on a task's activity trail.
    pub async fn add_comment(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: TaskType,
        body: &str,
    ) -> AppResult<TaskEvent> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateReleases])
            .await?;

        let task = self.require_task(workspace_id, release_id, task_type).await?;

        let body = NonEmptyString::new(body)?;
        let event = TaskEvent {
            id: Uuid::new_v4(),
            task_id: task.id,
            actor: actor.subject().to_owned(),
            event_type: TaskEventType::Comment,
            summary: body.into(),
            created_at: Utc::now(),
        };
        self.tasks.append_event(&event).await?;

        Ok(event)
    }

    async fn require_release(&self, workspace_id: WorkspaceId, release_id: Uuid) -> AppResult<()> {
        self.releases
            .find_release(workspace_id, release_id)
            .await?
            .ok_or_else(|| AppError::NotFound("release not found".to_owned()))?;
        Ok(())
    }

    async fn require_task(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: TaskType,
    ) -> AppResult<ReleaseTask> {
        self.tasks
            .find_task_by_type(workspace_id, release_id, task_type)
            .await?
            .ok_or_else(|| AppError::NotFound("task not found".to_owned()))
    }

    async fn require_member_assignees(
        &self,
        workspace_id: WorkspaceId,
        subjects: &[String],
    ) -> AppResult<()> {
        for subject in subjects {
            if self.access.member(workspace_id, subject).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "assignee '{subject}' is not a member of this workspace"
                )));
            }
        }
        Ok(())
    }
}

/// One human-readable summary per field that differs between the two tasks.
fn change_summaries(before: &ReleaseTask, after: &ReleaseTask) -> Vec<String> {
    let mut summaries = Vec::new();

    if before.status != after.status {
        summaries.push(format!(
            "changed status from {} to {}",
            before.status.as_str(),
            after.status.as_str()
        ));
    }
    if before.assignee_subjects != after.assignee_subjects {
        summaries.push("changed the assignees".to_owned());
    }
    match (before.due_date, after.due_date) {
        (None, Some(date)) => summaries.push(format!("set the due date to {date}")),
        (Some(_), None) => summaries.push("cleared the due date".to_owned()),
        (Some(from), Some(to)) if from != to => {
            summaries.push(format!("moved the due date from {from} to {to}"));
        }
        _ => {}
    }
    if before.notes != after.notes {
        summaries.push(match (&before.notes, &after.notes) {
            (None, Some(_)) => "added notes".to_owned(),
            (Some(_), None) => "cleared the notes".to_owned(),
            _ => "updated the notes".to_owned(),
        });
    }
    if before.distributor != after.distributor {
        summaries.push(match (&before.distributor, &after.distributor) {
            (None, Some(distributor)) => format!("set the distributor to {distributor}"),
            (Some(_), None) => "cleared the distributor".to_owned(),
            (_, Some(distributor)) => format!("changed the distributor to {distributor}"),
            // Unreachable: this match is guarded by `before.distributor != after.distributor`.
            (None, None) => unreachable!(),
        });
    }
    if before.asset_url != after.asset_url {
        summaries.push(match (&before.asset_url, &after.asset_url) {
            (None, Some(_)) => "attached a delivered asset".to_owned(),
            (Some(_), None) => "removed the delivered asset".to_owned(),
            _ => "replaced the delivered asset".to_owned(),
        });
    }

    summaries
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
