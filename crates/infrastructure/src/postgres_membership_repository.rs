use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use mixdown_application::MembershipRepository;
use mixdown_core::{AppError, AppResult, WorkspaceId};
use mixdown_domain::{Permission, Role, WorkspaceMember, seeded_role_catalog};

/// PostgreSQL-backed membership and role-catalog repository.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_members(
        &self,
        workspace_id: WorkspaceId,
        subject: Option<&str>,
    ) -> AppResult<Vec<WorkspaceMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT
                members.id AS member_id,
                members.workspace_id,
                members.subject,
                users.display_name,
                users.email,
                members.created_at AS member_created_at,
                roles.id AS role_id,
                roles.name AS role_name,
                roles.is_system,
                role_permissions.permission
            FROM workspace_members AS members
            LEFT JOIN users
                ON users.subject = members.subject
            LEFT JOIN member_roles
                ON member_roles.member_id = members.id
            LEFT JOIN roles
                ON roles.id = member_roles.role_id
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            WHERE members.workspace_id = $1
                AND ($2::TEXT IS NULL OR members.subject = $2)
            ORDER BY members.subject, roles.name, role_permissions.permission
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list members: {error}")))?;

        aggregate_members(rows)
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    member_id: Uuid,
    workspace_id: Uuid,
    subject: String,
    display_name: Option<String>,
    email: Option<String>,
    member_created_at: DateTime<Utc>,
    role_id: Option<Uuid>,
    role_name: Option<String>,
    is_system: Option<bool>,
    permission: Option<String>,
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: Uuid,
    role_name: String,
    is_system: bool,
    permission: Option<String>,
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn member_with_roles(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
    ) -> AppResult<Option<WorkspaceMember>> {
        let members = self.fetch_members(workspace_id, Some(subject)).await?;
        Ok(members.into_iter().next())
    }

    async fn list_members(&self, workspace_id: WorkspaceId) -> AppResult<Vec<WorkspaceMember>> {
        self.fetch_members(workspace_id, None).await
    }

    async fn list_roles(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.is_system,
                role_permissions.permission
            FROM roles
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            WHERE roles.workspace_id = $1
            ORDER BY roles.name, role_permissions.permission
            "#,
        )
        .bind(workspace_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    async fn create_member(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
        role_names: &[String],
    ) -> AppResult<WorkspaceMember> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let member_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO workspace_members (workspace_id, subject)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(subject)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_member_insert_error(error, subject))?;

        let role_ids = resolve_role_ids(&mut transaction, workspace_id, role_names).await?;
        for role_id in role_ids {
            sqlx::query(
                r#"
                INSERT INTO member_roles (member_id, role_id)
                VALUES ($1, $2)
                ON CONFLICT (member_id, role_id) DO NOTHING
                "#,
            )
            .bind(member_id)
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to assign member role: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.member_with_roles(workspace_id, subject)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "membership for '{subject}' was not persisted"
                ))
            })
    }

    async fn set_member_roles(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
        role_names: &[String],
    ) -> AppResult<WorkspaceMember> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let member_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM workspace_members
            WHERE workspace_id = $1 AND subject = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(subject)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve member: {error}")))?
        .ok_or_else(|| AppError::NotFound("member not found".to_owned()))?;

        let role_ids = resolve_role_ids(&mut transaction, workspace_id, role_names).await?;

        sqlx::query("DELETE FROM member_roles WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear member roles: {error}"))
            })?;

        for role_id in role_ids {
            sqlx::query(
                r#"
                INSERT INTO member_roles (member_id, role_id)
                VALUES ($1, $2)
                ON CONFLICT (member_id, role_id) DO NOTHING
                "#,
            )
            .bind(member_id)
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to assign member role: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.member_with_roles(workspace_id, subject)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "membership for '{subject}' disappeared during role update"
                ))
            })
    }

    async fn remove_member(&self, workspace_id: WorkspaceId, subject: &str) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM workspace_members
            WHERE workspace_id = $1 AND subject = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(subject)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove member: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound("member not found".to_owned()));
        }

        Ok(())
    }
}

fn map_member_insert_error(error: sqlx::Error, subject: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        if database_error.code().as_deref() == Some("23505") {
            return AppError::Conflict(format!("'{subject}' is already a member"));
        }
        if database_error.code().as_deref() == Some("23503") {
            return AppError::Validation(format!(
                "'{subject}' has no user record; the user must sign in first"
            ));
        }
    }

    AppError::Internal(format!("failed to create membership: {error}"))
}

async fn resolve_role_ids(
    transaction: &mut Transaction<'_, Postgres>,
    workspace_id: WorkspaceId,
    role_names: &[String],
) -> AppResult<Vec<Uuid>> {
    let mut role_ids = Vec::with_capacity(role_names.len());
    for name in role_names {
        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE workspace_id = $1 AND name = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(name)
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .ok_or_else(|| AppError::Validation(format!("unknown role '{name}'")))?;

        role_ids.push(role_id);
    }

    Ok(role_ids)
}

fn aggregate_members(rows: Vec<MemberRow>) -> AppResult<Vec<WorkspaceMember>> {
    let mut members: Vec<WorkspaceMember> = Vec::new();
    let mut member_index: HashMap<Uuid, usize> = HashMap::new();
    let mut role_index: HashMap<(Uuid, Uuid), usize> = HashMap::new();

    for row in rows {
        let member_position = match member_index.get(&row.member_id) {
            Some(position) => *position,
            None => {
                member_index.insert(row.member_id, members.len());
                members.push(WorkspaceMember {
                    id: row.member_id,
                    workspace_id: WorkspaceId::from_uuid(row.workspace_id),
                    subject: row.subject,
                    display_name: row.display_name,
                    email: row.email,
                    roles: Vec::new(),
                    created_at: row.member_created_at,
                });
                members.len() - 1
            }
        };
        let member = &mut members[member_position];

        let Some(role_id) = row.role_id else {
            continue;
        };
        let role_position = match role_index.get(&(row.member_id, role_id)) {
            Some(position) => *position,
            None => {
                member.roles.push(Role {
                    id: role_id,
                    name: row.role_name.unwrap_or_default(),
                    is_system: row.is_system.unwrap_or(false),
                    permissions: BTreeSet::new(),
                });
                role_index.insert((row.member_id, role_id), member.roles.len() - 1);
                member.roles.len() - 1
            }
        };

        if let Some(permission_value) = row.permission {
            let permission = Permission::from_str(permission_value.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored permission '{permission_value}': {error}"
                ))
            })?;
            member.roles[role_position].permissions.insert(permission);
        }
    }

    Ok(members)
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    let mut roles: Vec<Role> = Vec::new();
    let mut role_index: HashMap<Uuid, usize> = HashMap::new();

    for row in rows {
        let role_position = match role_index.get(&row.role_id) {
            Some(position) => *position,
            None => {
                role_index.insert(row.role_id, roles.len());
                roles.push(Role {
                    id: row.role_id,
                    name: row.role_name,
                    is_system: row.is_system,
                    permissions: BTreeSet::new(),
                });
                roles.len() - 1
            }
        };

        if let Some(permission_value) = row.permission {
            let permission = Permission::from_str(permission_value.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored permission '{permission_value}': {error}"
                ))
            })?;
            roles[role_position].permissions.insert(permission);
        }
    }

    Ok(roles)
}

/// Seeds the system role catalog into a new workspace.
pub(crate) async fn seed_workspace_roles(
    transaction: &mut Transaction<'_, Postgres>,
    workspace_id: WorkspaceId,
) -> AppResult<()> {
    for (name, permissions) in seeded_role_catalog() {
        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO roles (workspace_id, name, is_system)
            VALUES ($1, $2, true)
            ON CONFLICT (workspace_id, name) DO UPDATE
            SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(name)
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to seed role: {error}")))?;

        for permission in permissions {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission.as_str())
            .execute(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to seed role permission: {error}"))
            })?;
        }
    }

    Ok(())
}
