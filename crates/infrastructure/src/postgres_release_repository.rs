use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use mixdown_application::ReleaseRepository;
use mixdown_core::{AppError, AppResult, WorkspaceId};
use mixdown_domain::{Release, ReleaseQuery, ReleaseSortField, ReleaseType, SortDirection};

/// PostgreSQL-backed release planner repository.
#[derive(Clone)]
pub struct PostgresReleaseRepository {
    pool: PgPool,
}

impl PostgresReleaseRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReleaseRow {
    id: Uuid,
    workspace_id: Uuid,
    artist_id: Uuid,
    name: String,
    release_type: String,
    target_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl ReleaseRow {
    fn into_release(self) -> AppResult<Release> {
        let release_type = ReleaseType::parse(self.release_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored release type for release '{}': {error}",
                self.id
            ))
        })?;

        Ok(Release {
            id: self.id,
            workspace_id: WorkspaceId::from_uuid(self.workspace_id),
            artist_id: self.artist_id,
            name: self.name,
            release_type,
            target_date: self.target_date,
            created_at: self.created_at,
        })
    }
}

fn order_clause(query: &ReleaseQuery) -> &'static str {
    let field = query.sort_by.unwrap_or(ReleaseSortField::Name);
    let direction = query.sort_direction.unwrap_or(SortDirection::Asc);

    match (field, direction) {
        (ReleaseSortField::Name, SortDirection::Asc) => " ORDER BY lower(name)",
        (ReleaseSortField::Name, SortDirection::Desc) => " ORDER BY lower(name) DESC",
        (ReleaseSortField::TargetDate, SortDirection::Asc) => " ORDER BY target_date",
        (ReleaseSortField::TargetDate, SortDirection::Desc) => " ORDER BY target_date DESC",
        (ReleaseSortField::ReleaseType, SortDirection::Asc) => " ORDER BY release_type",
        (ReleaseSortField::ReleaseType, SortDirection::Desc) => " ORDER BY release_type DESC",
    }
}

#[async_trait]
impl ReleaseRepository for PostgresReleaseRepository {
    async fn list_releases(
        &self,
        workspace_id: WorkspaceId,
        query: ReleaseQuery,
    ) -> AppResult<Vec<Release>> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT id, workspace_id, artist_id, name, release_type, target_date, created_at \
             FROM releases WHERE workspace_id = ",
        );
        builder.push_bind(workspace_id.as_uuid());

        if let Some(search) = query.search.as_deref() {
            let term = search.trim();
            if !term.is_empty() {
                builder.push(" AND name ILIKE ");
                builder.push_bind(format!("%{term}%"));
            }
        }

        builder.push(order_clause(&query));

        let rows = builder
            .build_query_as::<ReleaseRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list releases: {error}")))?;

        rows.into_iter().map(ReleaseRow::into_release).collect()
    }

    async fn find_release(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
    ) -> AppResult<Option<Release>> {
        let row = sqlx::query_as::<_, ReleaseRow>(
            r#"
            SELECT id, workspace_id, artist_id, name, release_type, target_date, created_at
            FROM releases
            WHERE workspace_id = $1 AND id = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(release_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load release: {error}")))?;

        row.map(ReleaseRow::into_release).transpose()
    }

    async fn create_release(&self, release: &Release) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO releases (id, workspace_id, artist_id, name, release_type, target_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(release.id)
        .bind(release.workspace_id.as_uuid())
        .bind(release.artist_id)
        .bind(release.name.as_str())
        .bind(release.release_type.as_str())
        .bind(release.target_date)
        .bind(release.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_release_insert_error)?;

        Ok(())
    }

    async fn update_release(&self, release: &Release) -> AppResult<Release> {
        let row = sqlx::query_as::<_, ReleaseRow>(
            r#"
            UPDATE releases
            SET artist_id = $3, name = $4, release_type = $5, target_date = $6
            WHERE workspace_id = $1 AND id = $2
            RETURNING id, workspace_id, artist_id, name, release_type, target_date, created_at
            "#,
        )
        .bind(release.workspace_id.as_uuid())
        .bind(release.id)
        .bind(release.artist_id)
        .bind(release.name.as_str())
        .bind(release.release_type.as_str())
        .bind(release.target_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_release_insert_error)?;

        row.map(ReleaseRow::into_release)
            .transpose()?
            .ok_or_else(|| AppError::NotFound("release not found".to_owned()))
    }

    async fn delete_release(&self, workspace_id: WorkspaceId, release_id: Uuid) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM releases
            WHERE workspace_id = $1 AND id = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(release_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete release: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound("release not found".to_owned()));
        }

        Ok(())
    }
}

fn map_release_insert_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        if database_error.code().as_deref() == Some("23503") {
            return AppError::Validation("unknown artist for this workspace".to_owned());
        }
    }

    AppError::Internal(format!("failed to persist release: {error}"))
}
