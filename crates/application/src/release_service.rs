use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use mixdown_core::{AppError, AppResult, NonEmptyString, UserIdentity, WorkspaceId};
use mixdown_domain::{Artist, Permission, Release, ReleaseQuery, ReleaseTask, ReleaseType};

use crate::{AccessService, ArtistRepository, ReleaseTaskRepository};

/// Input payload for planning or editing a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInput {
    /// Artist the release is credited to.
    pub artist_id: Uuid,
    /// Release title.
    pub name: String,
    /// Release format.
    pub release_type: ReleaseType,
    /// Planned release date.
    pub target_date: NaiveDate,
}

/// A release enriched with its artist credit and workstreams, for the
/// release detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDetail {
    /// The release record itself.
    pub release: Release,
    /// Artist the release is credited to.
    pub artist: Artist,
    /// Workstreams attached to the release.
    pub tasks: Vec<ReleaseTask>,
}

/// Repository port for releases.
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
    /// Lists releases in workspace scope, filtered and sorted by the query.
    async fn list_releases(
        &self,
        workspace_id: WorkspaceId,
        query: ReleaseQuery,
    ) -> AppResult<Vec<Release>>;

    /// Finds a release by id in workspace scope.
    async fn find_release(
        &self,
        workspace_id: WorkspaceId,
        release_id: Uuid,
    ) -> AppResult<Option<Release>>;

    /// Persists a new release.
    async fn create_release(&self, release: &Release) -> AppResult<()>;

    /// Applies new field values, returning the updated record.
    async fn update_release(&self, release: &Release) -> AppResult<Release>;

    /// Deletes a release and its tasks in workspace scope.
    async fn delete_release(&self, workspace_id: WorkspaceId, release_id: Uuid) -> AppResult<()>;
}

/// Application service for the release planner.
#[derive(Clone)]
pub struct ReleaseService {
    access: AccessService,
    releases: Arc<dyn ReleaseRepository>,
    artists: Arc<dyn ArtistRepository>,
    tasks: Arc<dyn ReleaseTaskRepository>,
}

impl ReleaseService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        access: AccessService,
        releases: Arc<dyn ReleaseRepository>,
        artists: Arc<dyn ArtistRepository>,
        tasks: Arc<dyn ReleaseTaskRepository>,
    ) -> Self {
        Self {
            access,
            releases,
            artists,
            tasks,
        }
    }

    /// Lists releases matching the query.
    pub async fn list_releases(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        query: ReleaseQuery,
    ) -> AppResult<Vec<Release>> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewReleases])
            .await?;

        self.releases.list_releases(workspace_id, query).await
    }

    /// Returns a single release.
    pub async fn get_release(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
    ) -> AppResult<Release> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewReleases])
            .await?;

        self.releases
            .find_release(workspace_id, release_id)
            .await?
            .ok_or_else(|| AppError::NotFound("release not found".to_owned()))
    }

    /// Returns a release together with its artist and workstreams.
    pub async fn release_detail(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
    ) -> AppResult<ReleaseDetail> {
        let release = self.get_release(actor, workspace_id, release_id).await?;

        let artist = self
            .artists
            .find_artist(workspace_id, release.artist_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "artist missing for release '{}'",
                    release.id
                ))
            })?;
        let tasks = self.tasks.list_tasks(workspace_id, release_id).await?;

        Ok(ReleaseDetail {
            release,
            artist,
            tasks,
        })
    }

    /// Plans a new release for an artist in the workspace.
    pub async fn create_release(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        input: ReleaseInput,
    ) -> AppResult<Release> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::CreateReleases])
            .await?;

        let name = NonEmptyString::new(input.name)?;
        self.require_workspace_artist(workspace_id, input.artist_id)
            .await?;

        let release = Release {
            id: Uuid::new_v4(),
            workspace_id,
            artist_id: input.artist_id,
            name: name.into(),
            release_type: input.release_type,
            target_date: input.target_date,
            created_at: Utc::now(),
        };
        self.releases.create_release(&release).await?;

        Ok(release)
    }

    /// Edits a release's details.
    pub async fn update_release(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
        input: ReleaseInput,
    ) -> AppResult<Release> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateReleases])
            .await?;

        let name = NonEmptyString::new(input.name)?;
        self.require_workspace_artist(workspace_id, input.artist_id)
            .await?;

        let mut release = self
            .releases
            .find_release(workspace_id, release_id)
            .await?
            .ok_or_else(|| AppError::NotFound("release not found".to_owned()))?;

        release.artist_id = input.artist_id;
        release.name = name.into();
        release.release_type = input.release_type;
        release.target_date = input.target_date;

        self.releases.update_release(&release).await
    }

    /// Deletes a release and everything attached to it.
    pub async fn delete_release(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        release_id: Uuid,
    ) -> AppResult<()> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::DeleteReleases])
            .await?;

        self.releases
            .find_release(workspace_id, release_id)
            .await?
            .ok_or_else(|| AppError::NotFound("release not found".to_owned()))?;

        self.releases.delete_release(workspace_id, release_id).await
    }

    async fn require_workspace_artist(
        &self,
        workspace_id: WorkspaceId,
        artist_id: Uuid,
    ) -> AppResult<()> {
        self.artists
            .find_artist(workspace_id, artist_id)
            .await?
            .ok_or_else(|| AppError::Validation("unknown artist for this workspace".to_owned()))?;
        Ok(())
    }
}
