use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use mixdown_core::{AppError, AppResult, NonEmptyString, UserIdentity, WorkspaceId};
use mixdown_domain::{Artist, Permission, artist_limit_for, can_add_another_artist};

use crate::{AccessService, WorkspaceRepository};

/// Input payload for adding or editing a catalog artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistInput {
    /// Stage name.
    pub name: String,
    /// Legal name, when it differs from the stage name.
    pub legal_name: Option<String>,
    /// Spotify profile URL.
    pub spotify_url: Option<String>,
    /// Instagram profile URL.
    pub instagram_url: Option<String>,
}

/// Repository port for the artist catalog.
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Lists artists in workspace scope, ordered by name.
    async fn list_artists(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Artist>>;

    /// Finds an artist by id in workspace scope.
    async fn find_artist(
        &self,
        workspace_id: WorkspaceId,
        artist_id: Uuid,
    ) -> AppResult<Option<Artist>>;

    /// Counts artists in workspace scope.
    async fn count_artists(&self, workspace_id: WorkspaceId) -> AppResult<u64>;

    /// Persists a new artist.
    async fn create_artist(&self, artist: &Artist) -> AppResult<()>;

    /// Applies new field values, returning the updated record.
    async fn update_artist(&self, artist: &Artist) -> AppResult<Artist>;

    /// Deletes an artist in workspace scope.
    async fn delete_artist(&self, workspace_id: WorkspaceId, artist_id: Uuid) -> AppResult<()>;
}

/// Application service for the artist catalog.
#[derive(Clone)]
pub struct ArtistService {
    access: AccessService,
    artists: Arc<dyn ArtistRepository>,
    workspaces: Arc<dyn WorkspaceRepository>,
}

impl ArtistService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        access: AccessService,
        artists: Arc<dyn ArtistRepository>,
        workspaces: Arc<dyn WorkspaceRepository>,
    ) -> Self {
        Self {
            access,
            artists,
            workspaces,
        }
    }

    /// Lists the workspace's artists.
    pub async fn list_artists(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
    ) -> AppResult<Vec<Artist>> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewArtists])
            .await?;

        self.artists.list_artists(workspace_id).await
    }

    /// Returns a single artist.
    pub async fn get_artist(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        artist_id: Uuid,
    ) -> AppResult<Artist> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewArtists])
            .await?;

        self.artists
            .find_artist(workspace_id, artist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("artist not found".to_owned()))
    }

    /// Adds an artist, enforcing the catalog cap of the workspace plan.
    pub async fn create_artist(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        input: ArtistInput,
    ) -> AppResult<Artist> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::CreateArtists])
            .await?;

        let name = NonEmptyString::new(input.name)?;
        let count = self.artists.count_artists(workspace_id).await?;
        let subscription = self.workspaces.subscription(workspace_id).await?;
        if !can_add_another_artist(count, subscription.as_ref()) {
            // The unlimited plan never trips the guard, so a limit exists here.
            let limit = artist_limit_for(subscription.as_ref()).unwrap_or(0);
            return Err(AppError::Validation(format!(
                "the current plan allows at most {limit} artists"
            )));
        }

        let artist = Artist {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.into(),
            legal_name: optional_text(input.legal_name),
            spotify_url: optional_text(input.spotify_url),
            instagram_url: optional_text(input.instagram_url),
            created_at: Utc::now(),
        };
        self.artists.create_artist(&artist).await?;

        Ok(artist)
    }

    /// Edits an artist's details.
    pub async fn update_artist(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        artist_id: Uuid,
        input: ArtistInput,
    ) -> AppResult<Artist> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateArtists])
            .await?;

        let name = NonEmptyString::new(input.name)?;
        let mut artist = self
            .artists
            .find_artist(workspace_id, artist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("artist not found".to_owned()))?;

        artist.name = name.into();
        artist.legal_name = optional_text(input.legal_name);
        artist.spotify_url = optional_text(input.spotify_url);
        artist.instagram_url = optional_text(input.instagram_url);

        self.artists.update_artist(&artist).await
    }

    /// Removes an artist from the catalog.
    pub async fn delete_artist(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        artist_id: Uuid,
    ) -> AppResult<()> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::DeleteArtists])
            .await?;

        self.artists
            .find_artist(workspace_id, artist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("artist not found".to_owned()))?;

        self.artists.delete_artist(workspace_id, artist_id).await
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use mixdown_core::{AppError, AppResult, UserIdentity, WorkspaceId};
    use mixdown_domain::{
        Artist, Permission, Plan, Role, Subscription, Workspace, WorkspaceMember,
    };

    use crate::{AccessService, MembershipRepository, WorkspaceRepository};

    use super::{ArtistInput, ArtistRepository, ArtistService};

    struct FakeMembershipRepository {
        members: Vec<WorkspaceMember>,
    }

    #[async_trait]
    impl MembershipRepository for FakeMembershipRepository {
        async fn member_with_roles(
            &self,
            workspace_id: WorkspaceId,
            subject: &str,
        ) -> AppResult<Option<WorkspaceMember>> {
            Ok(self
                .members
                .iter()
                .find(|member| member.workspace_id == workspace_id && member.subject == subject)
                .cloned())
        }

        async fn list_members(
            &self,
            _workspace_id: WorkspaceId,
        ) -> AppResult<Vec<WorkspaceMember>> {
            Ok(self.members.clone())
        }

        async fn list_roles(&self, _workspace_id: WorkspaceId) -> AppResult<Vec<Role>> {
            Ok(Vec::new())
        }

        async fn create_member(
            &self,
            _workspace_id: WorkspaceId,
            _subject: &str,
            _role_names: &[String],
        ) -> AppResult<WorkspaceMember> {
            Err(AppError::Internal("not used in this test".to_owned()))
        }

        async fn set_member_roles(
            &self,
            _workspace_id: WorkspaceId,
            _subject: &str,
            _role_names: &[String],
        ) -> AppResult<WorkspaceMember> {
            Err(AppError::Internal("not used in this test".to_owned()))
        }

        async fn remove_member(
            &self,
            _workspace_id: WorkspaceId,
            _subject: &str,
        ) -> AppResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeArtistRepository {
        artists: Mutex<Vec<Artist>>,
    }

    #[async_trait]
    impl ArtistRepository for FakeArtistRepository {
        async fn list_artists(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Artist>> {
            Ok(self
                .artists
                .lock()
                .await
                .iter()
                .filter(|artist| artist.workspace_id == workspace_id)
                .cloned()
                .collect())
        }

        async fn find_artist(
            &self,
            workspace_id: WorkspaceId,
            artist_id: Uuid,
        ) -> AppResult<Option<Artist>> {
            Ok(self
                .artists
                .lock()
                .await
                .iter()
                .find(|artist| artist.workspace_id == workspace_id && artist.id == artist_id)
                .cloned())
        }

        async fn count_artists(&self, workspace_id: WorkspaceId) -> AppResult<u64> {
            Ok(self
                .artists
                .lock()
                .await
                .iter()
                .filter(|artist| artist.workspace_id == workspace_id)
                .count() as u64)
        }

        async fn create_artist(&self, artist: &Artist) -> AppResult<()> {
            self.artists.lock().await.push(artist.clone());
            Ok(())
        }

        async fn update_artist(&self, artist: &Artist) -> AppResult<Artist> {
            let mut artists = self.artists.lock().await;
            let stored = artists
                .iter_mut()
                .find(|stored| {
                    stored.workspace_id == artist.workspace_id && stored.id == artist.id
                })
                .ok_or_else(|| AppError::NotFound("artist not found".to_owned()))?;
            *stored = artist.clone();
            Ok(stored.clone())
        }

        async fn delete_artist(
            &self,
            workspace_id: WorkspaceId,
            artist_id: Uuid,
        ) -> AppResult<()> {
            self.artists
                .lock()
                .await
                .retain(|artist| !(artist.workspace_id == workspace_id && artist.id == artist_id));
            Ok(())
        }
    }

    struct FakeWorkspaceRepository {
        subscription: Option<Subscription>,
    }

    #[async_trait]
    impl WorkspaceRepository for FakeWorkspaceRepository {
        async fn find_workspace(
            &self,
            _workspace_id: WorkspaceId,
        ) -> AppResult<Option<Workspace>> {
            Ok(None)
        }

        async fn update_workspace(
            &self,
            _workspace_id: WorkspaceId,
            _name: &str,
            _image_url: Option<&str>,
        ) -> AppResult<Workspace> {
            Err(AppError::Internal("not used in this test".to_owned()))
        }

        async fn delete_workspace(&self, _workspace_id: WorkspaceId) -> AppResult<()> {
            Ok(())
        }

        async fn subscription(
            &self,
            _workspace_id: WorkspaceId,
        ) -> AppResult<Option<Subscription>> {
            Ok(self.subscription.clone())
        }

        async fn workspaces_for_subject(&self, _subject: &str) -> AppResult<Vec<Workspace>> {
            Ok(Vec::new())
        }

        async fn ensure_workspace_for_subject(
            &self,
            _profile: &mixdown_domain::UserProfile,
        ) -> AppResult<WorkspaceId> {
            Err(AppError::Internal("not used in this test".to_owned()))
        }
    }

    fn member(
        workspace_id: WorkspaceId,
        subject: &str,
        permissions: &[Permission],
    ) -> WorkspaceMember {
        WorkspaceMember {
            id: Uuid::new_v4(),
            workspace_id,
            subject: subject.to_owned(),
            display_name: None,
            email: None,
            roles: vec![Role {
                id: Uuid::new_v4(),
                name: "Test".to_owned(),
                is_system: false,
                permissions: permissions.iter().copied().collect(),
            }],
            created_at: Utc::now(),
        }
    }

    fn artist(workspace_id: WorkspaceId, name: &str) -> Artist {
        Artist {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.to_owned(),
            legal_name: None,
            spotify_url: None,
            instagram_url: None,
            created_at: Utc::now(),
        }
    }

    fn input(name: &str) -> ArtistInput {
        ArtistInput {
            name: name.to_owned(),
            legal_name: None,
            spotify_url: None,
            instagram_url: None,
        }
    }

    fn service(
        members: Vec<WorkspaceMember>,
        artists: Vec<Artist>,
        subscription: Option<Subscription>,
    ) -> ArtistService {
        ArtistService::new(
            AccessService::new(Arc::new(FakeMembershipRepository { members })),
            Arc::new(FakeArtistRepository {
                artists: Mutex::new(artists),
            }),
            Arc::new(FakeWorkspaceRepository { subscription }),
        )
    }

    #[tokio::test]
    async fn create_requires_create_permission() {
        let workspace_id = WorkspaceId::new();
        let service = service(
            vec![member(workspace_id, "alice", &[Permission::ViewArtists])],
            Vec::new(),
            None,
        );

        let result = service
            .create_artist(&UserIdentity::new("alice", "alice", None), workspace_id, input("Vega"))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn entry_plan_caps_the_catalog_at_two() {
        let workspace_id = WorkspaceId::new();
        let service = service(
            vec![member(workspace_id, "alice", &[Permission::CreateArtists])],
            vec![artist(workspace_id, "Vega"), artist(workspace_id, "Iris")],
            None,
        );

        let result = service
            .create_artist(&UserIdentity::new("alice", "alice", None), workspace_id, input("Nomad"))
            .await;

        match result {
            Err(AppError::Validation(message)) => {
                assert!(message.contains("2"), "cap missing from '{message}'");
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn label_plan_has_no_catalog_cap() {
        let workspace_id = WorkspaceId::new();
        let service = service(
            vec![member(workspace_id, "alice", &[Permission::CreateArtists])],
            vec![artist(workspace_id, "Vega"), artist(workspace_id, "Iris")],
            Some(Subscription {
                workspace_id,
                plan: Plan::Label,
                updated_at: Utc::now(),
            }),
        );

        let result = service
            .create_artist(&UserIdentity::new("alice", "alice", None), workspace_id, input("Nomad"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn create_trims_optional_fields_to_none() {
        let workspace_id = WorkspaceId::new();
        let service = service(
            vec![member(workspace_id, "alice", &[Permission::CreateArtists])],
            Vec::new(),
            None,
        );

        let result = service
            .create_artist(
                &UserIdentity::new("alice", "alice", None),
                workspace_id,
                ArtistInput {
                    name: "Vega".to_owned(),
                    legal_name: Some("   ".to_owned()),
                    spotify_url: Some(" https://open.spotify.com/artist/1 ".to_owned()),
                    instagram_url: None,
                },
            )
            .await;

        assert!(result.is_ok());
        let created = result.unwrap_or_else(|_| unreachable!());
        assert_eq!(created.legal_name, None);
        assert_eq!(
            created.spotify_url.as_deref(),
            Some("https://open.spotify.com/artist/1")
        );
    }

    #[tokio::test]
    async fn get_artist_is_scoped_to_the_workspace() {
        let workspace_id = WorkspaceId::new();
        let other_workspace = WorkspaceId::new();
        let foreign = artist(other_workspace, "Vega");
        let foreign_id = foreign.id;
        let service = service(
            vec![member(workspace_id, "alice", &[Permission::ViewArtists])],
            vec![foreign],
            None,
        );

        let result = service
            .get_artist(&UserIdentity::new("alice", "alice", None), workspace_id, foreign_id)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_requires_delete_permission() {
        let workspace_id = WorkspaceId::new();
        let stored = artist(workspace_id, "Vega");
        let artist_id = stored.id;
        let service = service(
            vec![member(workspace_id, "alice", &[Permission::UpdateArtists])],
            vec![stored],
            None,
        );

        let result = service
            .delete_artist(&UserIdentity::new("alice", "alice", None), workspace_id, artist_id)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
