use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use mixdown_application::InviteRepository;
use mixdown_core::{AppError, AppResult, WorkspaceId};
use mixdown_domain::{EmailAddress, Invite};

/// PostgreSQL-backed invite repository.
#[derive(Clone)]
pub struct PostgresInviteRepository {
    pool: PgPool,
}

impl PostgresInviteRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_invites(
        &self,
        filter: InviteFilter<'_>,
    ) -> AppResult<Vec<Invite>> {
        let query = r#"
            SELECT
                invites.id,
                invites.workspace_id,
                invites.email,
                invites.invited_by,
                invites.created_at,
                COALESCE(
                    array_agg(invite_roles.role_name ORDER BY invite_roles.role_name)
                        FILTER (WHERE invite_roles.role_name IS NOT NULL),
                    '{}'
                ) AS role_names
            FROM invites
            LEFT JOIN invite_roles
                ON invite_roles.invite_id = invites.id
            WHERE ($1::UUID IS NULL OR invites.workspace_id = $1)
                AND ($2::TEXT IS NULL OR lower(invites.email) = lower($2))
                AND ($3::UUID IS NULL OR invites.id = $3)
            GROUP BY invites.id
            ORDER BY invites.created_at
            "#;

        let rows = sqlx::query_as::<_, InviteRow>(query)
            .bind(filter.workspace_id.map(|workspace_id| workspace_id.as_uuid()))
            .bind(filter.email)
            .bind(filter.invite_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list invites: {error}")))?;

        rows.into_iter().map(InviteRow::into_invite).collect()
    }
}

struct InviteFilter<'a> {
    workspace_id: Option<WorkspaceId>,
    email: Option<&'a str>,
    invite_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
struct InviteRow {
    id: Uuid,
    workspace_id: Uuid,
    email: String,
    invited_by: String,
    created_at: DateTime<Utc>,
    role_names: Vec<String>,
}

impl InviteRow {
    fn into_invite(self) -> AppResult<Invite> {
        let email = EmailAddress::new(self.email.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored invite email for invite '{}': {error}",
                self.id
            ))
        })?;

        Ok(Invite {
            id: self.id,
            workspace_id: WorkspaceId::from_uuid(self.workspace_id),
            email,
            role_names: self.role_names,
            invited_by: self.invited_by,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl InviteRepository for PostgresInviteRepository {
    async fn list_for_workspace(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Invite>> {
        self.fetch_invites(InviteFilter {
            workspace_id: Some(workspace_id),
            email: None,
            invite_id: None,
        })
        .await
    }

    async fn list_for_email(&self, email: &str) -> AppResult<Vec<Invite>> {
        self.fetch_invites(InviteFilter {
            workspace_id: None,
            email: Some(email),
            invite_id: None,
        })
        .await
    }

    async fn find_by_id(&self, invite_id: Uuid) -> AppResult<Option<Invite>> {
        let invites = self
            .fetch_invites(InviteFilter {
                workspace_id: None,
                email: None,
                invite_id: Some(invite_id),
            })
            .await?;
        Ok(invites.into_iter().next())
    }

    async fn find_pending(
        &self,
        workspace_id: WorkspaceId,
        email: &str,
    ) -> AppResult<Option<Invite>> {
        let invites = self
            .fetch_invites(InviteFilter {
                workspace_id: Some(workspace_id),
                email: Some(email),
                invite_id: None,
            })
            .await?;
        Ok(invites.into_iter().next())
    }

    async fn create_invite(&self, invite: &Invite) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO invites (id, workspace_id, email, invited_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(invite.id)
        .bind(invite.workspace_id.as_uuid())
        .bind(invite.email.as_str())
        .bind(invite.invited_by.as_str())
        .bind(invite.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(map_invite_conflict)?;

        for role_name in &invite.role_names {
            sqlx::query(
                r#"
                INSERT INTO invite_roles (invite_id, role_name)
                VALUES ($1, $2)
                ON CONFLICT (invite_id, role_name) DO NOTHING
                "#,
            )
            .bind(invite.id)
            .bind(role_name)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist invite roles: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn delete_invite(&self, workspace_id: WorkspaceId, invite_id: Uuid) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM invites
            WHERE workspace_id = $1 AND id = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(invite_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete invite: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound("invite not found".to_owned()));
        }

        Ok(())
    }
}

fn map_invite_conflict(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        if database_error.code().as_deref() == Some("23505") {
            return AppError::Conflict(
                "an invite for that email is already pending".to_owned(),
            );
        }
    }

    AppError::Internal(format!("failed to create invite: {error}"))
}
