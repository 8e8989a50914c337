use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use mixdown_application::ReleaseTaskRepository;
use mixdown_core::{AppError, AppResult, WorkspaceId};
use mixdown_domain::{ReleaseTask, TaskEvent, TaskEventType, TaskStatus, TaskType};

/// PostgreSQL-backed repository for release tasks and their activity trail.
#[derive(Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_tasks(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: Option<&str>,
    ) -> AppResult<Vec<ReleaseTask>> {
        let query = r#"
            SELECT
                release_tasks.id,
                release_tasks.release_id,
                release_tasks.task_type,
                release_tasks.status,
                release_tasks.due_date,
                release_tasks.notes,
                release_tasks.distributor,
                release_tasks.asset_url,
                release_tasks.created_at,
                release_tasks.updated_at,
                COALESCE(
                    array_agg(release_task_assignees.subject ORDER BY release_task_assignees.subject)
                        FILTER (WHERE release_task_assignees.subject IS NOT NULL),
                    '{}'
                ) AS assignee_subjects
            FROM release_tasks
            INNER JOIN releases
                ON releases.id = release_tasks.release_id
            LEFT JOIN release_task_assignees
                ON release_task_assignees.task_id = release_tasks.id
            WHERE releases.workspace_id = $1
                AND release_tasks.release_id = $2
                AND ($3::TEXT IS NULL OR release_tasks.task_type = $3)
            GROUP BY release_tasks.id
            ORDER BY release_tasks.created_at
            "#;

        let rows = sqlx::query_as::<_, TaskRow>(query)
            .bind(workspace_id.as_uuid())
            .bind(release_id)
            .bind(task_type)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list tasks: {error}")))?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    release_id: Uuid,
    task_type: String,
    status: String,
    due_date: Option<NaiveDate>,
    notes: Option<String>,
    distributor: Option<String>,
    asset_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assignee_subjects: Vec<String>,
}

impl TaskRow {
    fn into_task(self) -> AppResult<ReleaseTask> {
        let task_type = TaskType::parse(self.task_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored task type for task '{}': {error}",
                self.id
            ))
        })?;
        let status = TaskStatus::parse(self.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored task status for task '{}': {error}",
                self.id
            ))
        })?;

        Ok(ReleaseTask {
            id: self.id,
            release_id: self.release_id,
            task_type,
            status,
            assignee_subjects: self.assignee_subjects,
            due_date: self.due_date,
            notes: self.notes,
            distributor: self.distributor,
            asset_url: self.asset_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    task_id: Uuid,
    actor: String,
    event_type: String,
    summary: String,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> AppResult<TaskEvent> {
        let event_type = TaskEventType::parse(self.event_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored event type for event '{}': {error}",
                self.id
            ))
        })?;

        Ok(TaskEvent {
            id: self.id,
            task_id: self.task_id,
            actor: self.actor,
            event_type,
            summary: self.summary,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl ReleaseTaskRepository for PostgresTaskRepository {
    async fn list_tasks(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
    ) -> AppResult<Vec<ReleaseTask>> {
        self.fetch_tasks(workspace_id, release_id, None).await
    }

    async fn find_task_by_type(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_type: TaskType,
    ) -> AppResult<Option<ReleaseTask>> {
        let tasks = self
            .fetch_tasks(workspace_id, release_id, Some(task_type.as_str()))
            .await?;
        Ok(tasks.into_iter().next())
    }

    async fn create_task(&self, task: &ReleaseTask) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO release_tasks
                (id, release_id, task_type, status, due_date, notes, distributor, asset_url,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(task.id)
        .bind(task.release_id)
        .bind(task.task_type.as_str())
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.notes.as_deref())
        .bind(task.distributor.as_deref())
        .bind(task.asset_url.as_deref())
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(map_task_insert_error)?;

        for subject in &task.assignee_subjects {
            sqlx::query(
                r#"
                INSERT INTO release_task_assignees (task_id, subject)
                VALUES ($1, $2)
                ON CONFLICT (task_id, subject) DO NOTHING
                "#,
            )
            .bind(task.id)
            .bind(subject)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist task assignees: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn update_task(&self, task: &ReleaseTask) -> AppResult<ReleaseTask> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let row = sqlx::query_as::<_, UpdatedTaskRow>(
            r#"
            UPDATE release_tasks
            SET status = $3, due_date = $4, notes = $5, distributor = $6, asset_url = $7,
                updated_at = $8
            WHERE release_id = $1 AND id = $2
            RETURNING id, release_id, task_type, status, due_date, notes, distributor,
                asset_url, created_at, updated_at
            "#,
        )
        .bind(task.release_id)
        .bind(task.id)
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.notes.as_deref())
        .bind(task.distributor.as_deref())
        .bind(task.asset_url.as_deref())
        .bind(task.updated_at)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update task: {error}")))?
        .ok_or_else(|| AppError::NotFound("task not found".to_owned()))?;

        sqlx::query(
            r#"
            DELETE FROM release_task_assignees
            WHERE task_id = $1
            "#,
        )
        .bind(task.id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear task assignees: {error}"))
        })?;

        for subject in &task.assignee_subjects {
            sqlx::query(
                r#"
                INSERT INTO release_task_assignees (task_id, subject)
                VALUES ($1, $2)
                ON CONFLICT (task_id, subject) DO NOTHING
                "#,
            )
            .bind(task.id)
            .bind(subject)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist task assignees: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        let mut assignee_subjects = task.assignee_subjects.clone();
        assignee_subjects.sort();
        assignee_subjects.dedup();

        TaskRow {
            id: row.id,
            release_id: row.release_id,
            task_type: row.task_type,
            status: row.status,
            due_date: row.due_date,
            notes: row.notes,
            distributor: row.distributor,
            asset_url: row.asset_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            assignee_subjects,
        }
        .into_task()
    }

    async fn delete_task(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        task_id: Uuid,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM release_tasks
            WHERE id = $3
                AND release_id = $2
                AND release_id IN (SELECT id FROM releases WHERE workspace_id = $1)
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(release_id)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete task: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound("task not found".to_owned()));
        }

        Ok(())
    }

    async fn list_events(&self, task_id: Uuid) -> AppResult<Vec<TaskEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, task_id, actor, event_type, summary, created_at
            FROM release_task_events
            WHERE task_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list task events: {error}")))?;

        rows.into_iter().map(EventRow::into_event).collect()
    }

    async fn append_event(&self, event: &TaskEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO release_task_events (id, task_id, actor, event_type, summary, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(event.task_id)
        .bind(event.actor.as_str())
        .bind(event.event_type.as_str())
        .bind(event.summary.as_str())
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append task event: {error}")))?;

        Ok(())
    }
}

/// Row shape for the UPDATE RETURNING query, which cannot aggregate assignees.
#[derive(Debug, FromRow)]
struct UpdatedTaskRow {
    id: Uuid,
    release_id: Uuid,
    task_type: String,
    status: String,
    due_date: Option<NaiveDate>,
    notes: Option<String>,
    distributor: Option<String>,
    asset_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn map_task_insert_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        if database_error.code().as_deref() == Some("23505") {
            return AppError::Conflict(
                "a task of that type already exists for this release".to_owned(),
            );
        }
    }

    AppError::Internal(format!("failed to create task: {error}"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use mixdown_core::AppError;

    use super::TaskRow;

    #[test]
    fn unknown_stored_status_is_an_internal_error() {
        let row = TaskRow {
            id: Uuid::new_v4(),
            release_id: Uuid::new_v4(),
            task_type: "mastering".to_owned(),
            status: "paused".to_owned(),
            due_date: None,
            notes: None,
            distributor: None,
            asset_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            assignee_subjects: Vec::new(),
        };

        let result = row.into_task();
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn stored_row_folds_into_a_task() {
        let row = TaskRow {
            id: Uuid::new_v4(),
            release_id: Uuid::new_v4(),
            task_type: "distribution".to_owned(),
            status: "in_progress".to_owned(),
            due_date: None,
            notes: Some("ship before the weekend".to_owned()),
            distributor: Some("DistroKid".to_owned()),
            asset_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            assignee_subjects: vec!["auth0|alice".to_owned()],
        };

        let task = row.into_task();
        assert!(task.is_ok());
    }
}
