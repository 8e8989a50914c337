use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use mixdown_application::WorkspaceRepository;
use mixdown_core::{AppError, AppResult, WorkspaceId};
use mixdown_domain::{Plan, Subscription, UserProfile, Workspace};

use crate::postgres_membership_repository::seed_workspace_roles;

/// PostgreSQL-backed workspace repository.
#[derive(Clone)]
pub struct PostgresWorkspaceRepository {
    pool: PgPool,
}

impl PostgresWorkspaceRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WorkspaceRow {
    id: Uuid,
    name: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl WorkspaceRow {
    fn into_workspace(self) -> Workspace {
        Workspace {
            id: WorkspaceId::from_uuid(self.id),
            name: self.name,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRow {
    workspace_id: Uuid,
    plan: String,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl WorkspaceRepository for PostgresWorkspaceRepository {
    async fn find_workspace(&self, workspace_id: WorkspaceId) -> AppResult<Option<Workspace>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(
            r#"
            SELECT id, name, image_url, created_at
            FROM workspaces
            WHERE id = $1
            "#,
        )
        .bind(workspace_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load workspace: {error}")))?;

        Ok(row.map(WorkspaceRow::into_workspace))
    }

    async fn update_workspace(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
        image_url: Option<&str>,
    ) -> AppResult<Workspace> {
        let row = sqlx::query_as::<_, WorkspaceRow>(
            r#"
            UPDATE workspaces
            SET name = $2, image_url = $3
            WHERE id = $1
            RETURNING id, name, image_url, created_at
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(name)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update workspace: {error}")))?
        .ok_or_else(|| AppError::NotFound("workspace not found".to_owned()))?;

        Ok(row.into_workspace())
    }

    async fn delete_workspace(&self, workspace_id: WorkspaceId) -> AppResult<()> {
        let rows_affected = sqlx::query("DELETE FROM workspaces WHERE id = $1")
            .bind(workspace_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete workspace: {error}"))
            })?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound("workspace not found".to_owned()));
        }

        Ok(())
    }

    async fn subscription(&self, workspace_id: WorkspaceId) -> AppResult<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT workspace_id, plan, updated_at
            FROM workspace_subscriptions
            WHERE workspace_id = $1
            "#,
        )
        .bind(workspace_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load subscription: {error}")))?;

        match row {
            Some(row) => Ok(Some(Subscription {
                workspace_id: WorkspaceId::from_uuid(row.workspace_id),
                plan: Plan::parse(row.plan.as_str())?,
                updated_at: row.updated_at,
            })),
            None => Ok(None),
        }
    }

    async fn workspaces_for_subject(&self, subject: &str) -> AppResult<Vec<Workspace>> {
        let rows = sqlx::query_as::<_, WorkspaceRow>(
            r#"
            SELECT workspaces.id, workspaces.name, workspaces.image_url, workspaces.created_at
            FROM workspaces
            INNER JOIN workspace_members
                ON workspace_members.workspace_id = workspaces.id
            WHERE workspace_members.subject = $1
            ORDER BY workspaces.created_at
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list workspaces for subject: {error}"))
        })?;

        Ok(rows.into_iter().map(WorkspaceRow::into_workspace).collect())
    }

    async fn ensure_workspace_for_subject(
        &self,
        profile: &UserProfile,
    ) -> AppResult<WorkspaceId> {
        sqlx::query(
            r#"
            INSERT INTO users (subject, display_name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (subject) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                email = EXCLUDED.email,
                updated_at = now()
            "#,
        )
        .bind(profile.subject.as_str())
        .bind(profile.display_name.as_str())
        .bind(profile.email.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert user: {error}")))?;

        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT workspace_id
            FROM workspace_members
            WHERE subject = $1
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(profile.subject.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve memberships: {error}"))
        })?;
        if let Some(workspace_id) = existing {
            return Ok(WorkspaceId::from_uuid(workspace_id));
        }

        let workspace_id = WorkspaceId::new();
        let workspace_name = format!("{}'s Workspace", profile.display_name);

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO workspaces (id, name)
            VALUES ($1, $2)
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(workspace_name)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create workspace: {error}")))?;

        seed_workspace_roles(&mut transaction, workspace_id).await?;

        let member_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO workspace_members (workspace_id, subject)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(profile.subject.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create membership: {error}")))?;

        let admin_role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE workspace_id = $1 AND name = 'Admin'
            "#,
        )
        .bind(workspace_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve seeded admin role: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO member_roles (member_id, role_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(member_id)
        .bind(admin_role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to assign the admin role: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO workspace_subscriptions (workspace_id, plan)
            VALUES ($1, $2)
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(Plan::Artist.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create subscription: {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(workspace_id)
    }
}
