use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use mixdown_application::ArtistRepository;
use mixdown_core::{AppError, AppResult, WorkspaceId};
use mixdown_domain::Artist;

/// PostgreSQL-backed artist catalog repository.
#[derive(Clone)]
pub struct PostgresArtistRepository {
    pool: PgPool,
}

impl PostgresArtistRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ArtistRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    legal_name: Option<String>,
    spotify_url: Option<String>,
    instagram_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl ArtistRow {
    fn into_artist(self) -> Artist {
        Artist {
            id: self.id,
            workspace_id: WorkspaceId::from_uuid(self.workspace_id),
            name: self.name,
            legal_name: self.legal_name,
            spotify_url: self.spotify_url,
            instagram_url: self.instagram_url,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl ArtistRepository for PostgresArtistRepository {
    async fn list_artists(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Artist>> {
        let rows = sqlx::query_as::<_, ArtistRow>(
            r#"
            SELECT id, workspace_id, name, legal_name, spotify_url, instagram_url, created_at
            FROM artists
            WHERE workspace_id = $1
            ORDER BY lower(name)
            "#,
        )
        .bind(workspace_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list artists: {error}")))?;

        Ok(rows.into_iter().map(ArtistRow::into_artist).collect())
    }

    async fn find_artist(
        &self,
        workspace_id: WorkspaceId,
        artist_id: Uuid,
    ) -> AppResult<Option<Artist>> {
        let row = sqlx::query_as::<_, ArtistRow>(
            r#"
            SELECT id, workspace_id, name, legal_name, spotify_url, instagram_url, created_at
            FROM artists
            WHERE workspace_id = $1 AND id = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(artist_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load artist: {error}")))?;

        Ok(row.map(ArtistRow::into_artist))
    }

    async fn count_artists(&self, workspace_id: WorkspaceId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM artists
            WHERE workspace_id = $1
            "#,
        )
        .bind(workspace_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count artists: {error}")))?;

        u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid artist count value: {error}")))
    }

    async fn create_artist(&self, artist: &Artist) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO artists (id, workspace_id, name, legal_name, spotify_url, instagram_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(artist.id)
        .bind(artist.workspace_id.as_uuid())
        .bind(artist.name.as_str())
        .bind(artist.legal_name.as_deref())
        .bind(artist.spotify_url.as_deref())
        .bind(artist.instagram_url.as_deref())
        .bind(artist.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create artist: {error}")))?;

        Ok(())
    }

    async fn update_artist(&self, artist: &Artist) -> AppResult<Artist> {
        let row = sqlx::query_as::<_, ArtistRow>(
            r#"
            UPDATE artists
            SET name = $3, legal_name = $4, spotify_url = $5, instagram_url = $6
            WHERE workspace_id = $1 AND id = $2
            RETURNING id, workspace_id, name, legal_name, spotify_url, instagram_url, created_at
            "#,
        )
        .bind(artist.workspace_id.as_uuid())
        .bind(artist.id)
        .bind(artist.name.as_str())
        .bind(artist.legal_name.as_deref())
        .bind(artist.spotify_url.as_deref())
        .bind(artist.instagram_url.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update artist: {error}")))?;

        row.map(ArtistRow::into_artist)
            .ok_or_else(|| AppError::NotFound("artist not found".to_owned()))
    }

    async fn delete_artist(&self, workspace_id: WorkspaceId, artist_id: Uuid) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM artists
            WHERE workspace_id = $1 AND id = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(artist_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete artist: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound("artist not found".to_owned()));
        }

        Ok(())
    }
}
