use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use mixdown_core::{AppError, AppResult, NonEmptyString, UserIdentity, WorkspaceId};
use mixdown_domain::{
    EmailAddress, Invite, Permission, Role, Subscription, UserProfile, Workspace,
    WorkspaceMember,
};

use crate::{AccessService, EmailService, MembershipRepository};

/// Everything the workspace settings screen needs in one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceOverview {
    /// The workspace record itself.
    pub workspace: Workspace,
    /// Current members with their resolved roles.
    pub members: Vec<WorkspaceMember>,
    /// Invites that have not been accepted yet.
    pub invites: Vec<Invite>,
    /// Stored billing plan, when one exists.
    pub subscription: Option<Subscription>,
}

/// Input payload for renaming a workspace or changing its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateWorkspaceInput {
    /// New workspace name.
    pub name: String,
    /// New image URL; blank clears the stored value.
    pub image_url: Option<String>,
}

/// Input payload for inviting an email address into a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInviteInput {
    /// Email address the invite is bound to.
    pub email: String,
    /// Catalog role names granted when the invite is accepted.
    pub role_names: Vec<String>,
}

/// Repository port for workspace records and their stored subscription.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Finds a workspace by id.
    async fn find_workspace(&self, workspace_id: WorkspaceId) -> AppResult<Option<Workspace>>;

    /// Applies a new name and image URL, returning the updated record.
    async fn update_workspace(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
        image_url: Option<&str>,
    ) -> AppResult<Workspace>;

    /// Deletes a workspace and everything scoped to it.
    async fn delete_workspace(&self, workspace_id: WorkspaceId) -> AppResult<()>;

    /// Returns the stored subscription, if the workspace has one.
    async fn subscription(&self, workspace_id: WorkspaceId) -> AppResult<Option<Subscription>>;

    /// Lists the workspaces a subject is a member of.
    async fn workspaces_for_subject(&self, subject: &str) -> AppResult<Vec<Workspace>>;

    /// Creates the user row, a personal workspace with seeded roles, an
    /// admin membership, and an entry-tier subscription on first sign-in.
    /// Returns the workspace id, reusing an existing membership when the
    /// subject already has one.
    async fn ensure_workspace_for_subject(&self, profile: &UserProfile)
    -> AppResult<WorkspaceId>;
}

/// Repository port for pending invites.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Lists pending invites in workspace scope.
    async fn list_for_workspace(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Invite>>;

    /// Lists pending invites addressed to an email, across workspaces.
    async fn list_for_email(&self, email: &str) -> AppResult<Vec<Invite>>;

    /// Finds an invite by id.
    async fn find_by_id(&self, invite_id: Uuid) -> AppResult<Option<Invite>>;

    /// Finds a pending invite for an email in workspace scope.
    async fn find_pending(
        &self,
        workspace_id: WorkspaceId,
        email: &str,
    ) -> AppResult<Option<Invite>>;

    /// Persists a new invite.
    async fn create_invite(&self, invite: &Invite) -> AppResult<()>;

    /// Deletes an invite in workspace scope.
    async fn delete_invite(&self, workspace_id: WorkspaceId, invite_id: Uuid) -> AppResult<()>;
}

/// Application service for workspace settings, members, and invites.
#[derive(Clone)]
pub struct WorkspaceService {
    access: AccessService,
    workspaces: Arc<dyn WorkspaceRepository>,
    members: Arc<dyn MembershipRepository>,
    invites: Arc<dyn InviteRepository>,
    email: Arc<dyn EmailService>,
}

impl WorkspaceService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        access: AccessService,
        workspaces: Arc<dyn WorkspaceRepository>,
        members: Arc<dyn MembershipRepository>,
        invites: Arc<dyn InviteRepository>,
        email: Arc<dyn EmailService>,
    ) -> Self {
        Self {
            access,
            workspaces,
            members,
            invites,
            email,
        }
    }

    /// Returns the settings overview for members who can view the team.
    pub async fn overview(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
    ) -> AppResult<WorkspaceOverview> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewTeam])
            .await?;

        let workspace = self
            .workspaces
            .find_workspace(workspace_id)
            .await?
            .ok_or_else(|| AppError::NotFound("workspace not found".to_owned()))?;
        let members = self.members.list_members(workspace_id).await?;
        let invites = self.invites.list_for_workspace(workspace_id).await?;
        let subscription = self.workspaces.subscription(workspace_id).await?;

        Ok(WorkspaceOverview {
            workspace,
            members,
            invites,
            subscription,
        })
    }

    /// Renames a workspace or changes its image.
    pub async fn update_workspace(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        input: UpdateWorkspaceInput,
    ) -> AppResult<Workspace> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateTeam])
            .await?;

        let name = NonEmptyString::new(&input.name)?;
        let image_url = input
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        self.workspaces
            .update_workspace(workspace_id, name.as_str(), image_url)
            .await
    }

    /// Deletes a workspace and everything scoped to it.
    pub async fn delete_workspace(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
    ) -> AppResult<()> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::DeleteTeam])
            .await?;

        self.workspaces.delete_workspace(workspace_id).await
    }

    /// Lists members with their resolved roles.
    pub async fn list_members(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
    ) -> AppResult<Vec<WorkspaceMember>> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewTeam])
            .await?;

        self.members.list_members(workspace_id).await
    }

    /// Lists the workspace role catalog.
    pub async fn list_roles(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
    ) -> AppResult<Vec<Role>> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewTeam])
            .await?;

        self.members.list_roles(workspace_id).await
    }

    /// Replaces a member's roles with the named catalog roles.
    pub async fn set_member_roles(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        subject: &str,
        role_names: &[String],
    ) -> AppResult<WorkspaceMember> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateTeam])
            .await?;

        self.require_known_roles(workspace_id, role_names).await?;
        self.members
            .set_member_roles(workspace_id, subject, role_names)
            .await
    }

    /// Removes a member from the workspace.
    pub async fn remove_member(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        subject: &str,
    ) -> AppResult<()> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::UpdateTeam])
            .await?;

        self.members.remove_member(workspace_id, subject).await
    }

    /// Invites an email address and notifies it.
    pub async fn create_invite(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        input: CreateInviteInput,
    ) -> AppResult<Invite> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::InviteMembers])
            .await?;

        let email = EmailAddress::new(&input.email)?;
        let workspace = self
            .workspaces
            .find_workspace(workspace_id)
            .await?
            .ok_or_else(|| AppError::NotFound("workspace not found".to_owned()))?;

        self.require_known_roles(workspace_id, &input.role_names)
            .await?;

        let members = self.members.list_members(workspace_id).await?;
        let already_member = members.iter().any(|member| {
            member
                .email
                .as_deref()
                .is_some_and(|existing| existing.eq_ignore_ascii_case(email.as_str()))
        });
        if already_member {
            return Err(AppError::Conflict(
                "that email already belongs to a member".to_owned(),
            ));
        }

        if self
            .invites
            .find_pending(workspace_id, email.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "an invite for that email is already pending".to_owned(),
            ));
        }

        let invite = Invite {
            id: Uuid::new_v4(),
            workspace_id,
            email,
            role_names: input.role_names,
            invited_by: actor.subject().to_owned(),
            created_at: Utc::now(),
        };
        self.invites.create_invite(&invite).await?;

        let subject = format!("You have been invited to {}", workspace.name);
        let text_body = format!(
            "{inviter} invited you to join the {workspace} workspace on Mixdown.\n\n\
             Sign in with this email address to accept the invite.",
            inviter = actor.display_name(),
            workspace = workspace.name,
        );
        let html_body = format!(
            "<p>{inviter} invited you to join the <strong>{workspace}</strong> workspace on Mixdown.</p>\
             <p>Sign in with this email address to accept the invite.</p>",
            inviter = actor.display_name(),
            workspace = workspace.name,
        );
        self.email
            .send_email(invite.email.as_str(), &subject, &text_body, Some(&html_body))
            .await?;

        Ok(invite)
    }

    /// Withdraws a pending invite.
    pub async fn delete_invite(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
        invite_id: Uuid,
    ) -> AppResult<()> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::DeleteInvites])
            .await?;

        self.invites.delete_invite(workspace_id, invite_id).await
    }

    /// Lists invites addressed to the caller's own session email.
    pub async fn invites_for_caller(&self, actor: &UserIdentity) -> AppResult<Vec<Invite>> {
        let Some(email) = actor.email() else {
            return Ok(Vec::new());
        };

        self.invites
            .list_for_email(email.trim().to_lowercase().as_str())
            .await
    }

    /// Accepts an invite addressed to the caller's session email and joins
    /// the workspace with the invite's roles.
    pub async fn accept_invite(
        &self,
        actor: &UserIdentity,
        invite_id: Uuid,
    ) -> AppResult<WorkspaceMember> {
        let invite = self
            .invites
            .find_by_id(invite_id)
            .await?
            .ok_or_else(|| AppError::NotFound("invite not found".to_owned()))?;

        let email_matches = actor
            .email()
            .is_some_and(|email| email.trim().eq_ignore_ascii_case(invite.email.as_str()));
        if !email_matches {
            return Err(AppError::Forbidden(
                "invite was issued to a different email address".to_owned(),
            ));
        }

        if self
            .members
            .member_with_roles(invite.workspace_id, actor.subject())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "already a member of this workspace".to_owned(),
            ));
        }

        let member = self
            .members
            .create_member(invite.workspace_id, actor.subject(), &invite.role_names)
            .await?;
        self.invites
            .delete_invite(invite.workspace_id, invite.id)
            .await?;

        Ok(member)
    }

    /// Returns the stored subscription for members who can view the team.
    pub async fn subscription(
        &self,
        actor: &UserIdentity,
        workspace_id: WorkspaceId,
    ) -> AppResult<Option<Subscription>> {
        self.access
            .require_any_permission(workspace_id, actor.subject(), &[Permission::ViewTeam])
            .await?;

        self.workspaces.subscription(workspace_id).await
    }

    /// Lists the workspaces the caller belongs to.
    pub async fn workspaces_for_caller(&self, actor: &UserIdentity) -> AppResult<Vec<Workspace>> {
        self.workspaces.workspaces_for_subject(actor.subject()).await
    }

    async fn require_known_roles(
        &self,
        workspace_id: WorkspaceId,
        role_names: &[String],
    ) -> AppResult<()> {
        let catalog = self.members.list_roles(workspace_id).await?;
        for name in role_names {
            if !catalog.iter().any(|role| &role.name == name) {
                return Err(AppError::Validation(format!("unknown role '{name}'")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use mixdown_core::{AppError, AppResult, UserIdentity, WorkspaceId};
    use mixdown_domain::{
        EmailAddress, Invite, Permission, Role, Subscription, Workspace, WorkspaceMember,
    };

    use crate::{AccessService, EmailService, MembershipRepository};

    use super::{
        CreateInviteInput, InviteRepository, UpdateWorkspaceInput, WorkspaceRepository,
        WorkspaceService,
    };

    struct FakeMembershipRepository {
        catalog: Vec<Role>,
        members: Mutex<Vec<WorkspaceMember>>,
    }

    impl FakeMembershipRepository {
        fn new(catalog: Vec<Role>, members: Vec<WorkspaceMember>) -> Self {
            Self {
                catalog,
                members: Mutex::new(members),
            }
        }
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
                .lock()
                .await
                .iter()
                .find(|member| member.workspace_id == workspace_id && member.subject == subject)
                .cloned())
        }

        async fn list_members(
            &self,
            workspace_id: WorkspaceId,
        ) -> AppResult<Vec<WorkspaceMember>> {
            Ok(self
                .members
                .lock()
                .await
                .iter()
                .filter(|member| member.workspace_id == workspace_id)
                .cloned()
                .collect())
        }

        async fn list_roles(&self, _workspace_id: WorkspaceId) -> AppResult<Vec<Role>> {
            Ok(self.catalog.clone())
        }

        async fn create_member(
            &self,
            workspace_id: WorkspaceId,
            subject: &str,
            role_names: &[String],
        ) -> AppResult<WorkspaceMember> {
            let roles = self
                .catalog
                .iter()
                .filter(|role| role_names.contains(&role.name))
                .cloned()
                .collect();
            let member = WorkspaceMember {
                id: Uuid::new_v4(),
                workspace_id,
                subject: subject.to_owned(),
                display_name: None,
                email: None,
                roles,
                created_at: Utc::now(),
            };
            self.members.lock().await.push(member.clone());
            Ok(member)
        }

        async fn set_member_roles(
            &self,
            workspace_id: WorkspaceId,
            subject: &str,
            role_names: &[String],
        ) -> AppResult<WorkspaceMember> {
            let mut members = self.members.lock().await;
            let member = members
                .iter_mut()
                .find(|member| member.workspace_id == workspace_id && member.subject == subject)
                .ok_or_else(|| AppError::NotFound("member not found".to_owned()))?;
            member.roles = self
                .catalog
                .iter()
                .filter(|role| role_names.contains(&role.name))
                .cloned()
                .collect();
            Ok(member.clone())
        }

        async fn remove_member(
            &self,
            workspace_id: WorkspaceId,
            subject: &str,
        ) -> AppResult<()> {
            self.members.lock().await.retain(|member| {
                !(member.workspace_id == workspace_id && member.subject == subject)
            });
            Ok(())
        }
    }

    struct FakeWorkspaceRepository {
        workspaces: Mutex<Vec<Workspace>>,
    }

    #[async_trait]
    impl WorkspaceRepository for FakeWorkspaceRepository {
        async fn find_workspace(
            &self,
            workspace_id: WorkspaceId,
        ) -> AppResult<Option<Workspace>> {
            Ok(self
                .workspaces
                .lock()
                .await
                .iter()
                .find(|workspace| workspace.id == workspace_id)
                .cloned())
        }

        async fn update_workspace(
            &self,
            workspace_id: WorkspaceId,
            name: &str,
            image_url: Option<&str>,
        ) -> AppResult<Workspace> {
            let mut workspaces = self.workspaces.lock().await;
            let workspace = workspaces
                .iter_mut()
                .find(|workspace| workspace.id == workspace_id)
                .ok_or_else(|| AppError::NotFound("workspace not found".to_owned()))?;
            workspace.name = name.to_owned();
            workspace.image_url = image_url.map(str::to_owned);
            Ok(workspace.clone())
        }

        async fn delete_workspace(&self, workspace_id: WorkspaceId) -> AppResult<()> {
            self.workspaces
                .lock()
                .await
                .retain(|workspace| workspace.id != workspace_id);
            Ok(())
        }

        async fn subscription(
            &self,
            _workspace_id: WorkspaceId,
        ) -> AppResult<Option<Subscription>> {
            Ok(None)
        }

        async fn workspaces_for_subject(&self, _subject: &str) -> AppResult<Vec<Workspace>> {
            Ok(self.workspaces.lock().await.clone())
        }

        async fn ensure_workspace_for_subject(
            &self,
            _profile: &mixdown_domain::UserProfile,
        ) -> AppResult<WorkspaceId> {
            Err(AppError::Internal("not used in this test".to_owned()))
        }
    }

    #[derive(Default)]
    struct FakeInviteRepository {
        invites: Mutex<Vec<Invite>>,
    }

    #[async_trait]
    impl InviteRepository for FakeInviteRepository {
        async fn list_for_workspace(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Invite>> {
            Ok(self
                .invites
                .lock()
                .await
                .iter()
                .filter(|invite| invite.workspace_id == workspace_id)
                .cloned()
                .collect())
        }

        async fn list_for_email(&self, email: &str) -> AppResult<Vec<Invite>> {
            Ok(self
                .invites
                .lock()
                .await
                .iter()
                .filter(|invite| invite.email.as_str().eq_ignore_ascii_case(email))
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, invite_id: Uuid) -> AppResult<Option<Invite>> {
            Ok(self
                .invites
                .lock()
                .await
                .iter()
                .find(|invite| invite.id == invite_id)
                .cloned())
        }

        async fn find_pending(
            &self,
            workspace_id: WorkspaceId,
            email: &str,
        ) -> AppResult<Option<Invite>> {
            Ok(self
                .invites
                .lock()
                .await
                .iter()
                .find(|invite| {
                    invite.workspace_id == workspace_id
                        && invite.email.as_str().eq_ignore_ascii_case(email)
                })
                .cloned())
        }

        async fn create_invite(&self, invite: &Invite) -> AppResult<()> {
            self.invites.lock().await.push(invite.clone());
            Ok(())
        }

        async fn delete_invite(
            &self,
            workspace_id: WorkspaceId,
            invite_id: Uuid,
        ) -> AppResult<()> {
            let mut invites = self.invites.lock().await;
            let before = invites.len();
            invites.retain(|invite| {
                !(invite.workspace_id == workspace_id && invite.id == invite_id)
            });
            if invites.len() == before {
                return Err(AppError::NotFound("invite not found".to_owned()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingEmailService {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EmailService for RecordingEmailService {
        async fn send_email(
            &self,
            to: &str,
            subject: &str,
            _text_body: &str,
            _html_body: Option<&str>,
        ) -> AppResult<()> {
            self.sent
                .lock()
                .await
                .push((to.to_owned(), subject.to_owned()));
            Ok(())
        }
    }

    fn catalog() -> Vec<Role> {
        vec![
            Role {
                id: Uuid::new_v4(),
                name: "Editor".to_owned(),
                is_system: true,
                permissions: BTreeSet::from([
                    Permission::ViewTeam,
                    Permission::InviteMembers,
                    Permission::UpdateReleases,
                ]),
            },
            Role {
                id: Uuid::new_v4(),
                name: "Viewer".to_owned(),
                is_system: true,
                permissions: BTreeSet::from([Permission::ViewTeam]),
            },
        ]
    }

    fn member(
        workspace_id: WorkspaceId,
        subject: &str,
        email: Option<&str>,
        permissions: &[Permission],
    ) -> WorkspaceMember {
        WorkspaceMember {
            id: Uuid::new_v4(),
            workspace_id,
            subject: subject.to_owned(),
            display_name: Some(subject.to_owned()),
            email: email.map(str::to_owned),
            roles: vec![Role {
                id: Uuid::new_v4(),
                name: "Test".to_owned(),
                is_system: false,
                permissions: permissions.iter().copied().collect(),
            }],
            created_at: Utc::now(),
        }
    }

    fn workspace(workspace_id: WorkspaceId) -> Workspace {
        Workspace {
            id: workspace_id,
            name: "Night Shift Records".to_owned(),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    fn actor(subject: &str, email: Option<&str>) -> UserIdentity {
        UserIdentity::new(subject, subject, email.map(str::to_owned))
    }

    struct Harness {
        service: WorkspaceService,
        invites: Arc<FakeInviteRepository>,
        email: Arc<RecordingEmailService>,
    }

    fn harness(
        workspaces: Vec<Workspace>,
        members: Vec<WorkspaceMember>,
        invites: Vec<Invite>,
    ) -> Harness {
        let membership = Arc::new(FakeMembershipRepository::new(catalog(), members));
        let invite_repository = Arc::new(FakeInviteRepository {
            invites: Mutex::new(invites),
        });
        let email = Arc::new(RecordingEmailService::default());
        let service = WorkspaceService::new(
            AccessService::new(membership.clone()),
            Arc::new(FakeWorkspaceRepository {
                workspaces: Mutex::new(workspaces),
            }),
            membership,
            invite_repository.clone(),
            email.clone(),
        );
        Harness {
            service,
            invites: invite_repository,
            email,
        }
    }

    fn pending_invite(workspace_id: WorkspaceId, email: &str) -> Invite {
        Invite {
            id: Uuid::new_v4(),
            workspace_id,
            email: EmailAddress::new(email).unwrap_or_else(|_| unreachable!()),
            role_names: vec!["Viewer".to_owned()],
            invited_by: "alice".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn overview_requires_view_team() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![member(workspace_id, "alice", None, &[])],
            Vec::new(),
        );

        let result = harness
            .service
            .overview(&actor("alice", None), workspace_id)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn overview_returns_members_and_invites() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![member(workspace_id, "alice", None, &[Permission::ViewTeam])],
            vec![pending_invite(workspace_id, "drummer@example.com")],
        );

        let result = harness
            .service
            .overview(&actor("alice", None), workspace_id)
            .await;

        assert!(result.is_ok());
        let overview = result.unwrap_or_else(|_| unreachable!());
        assert_eq!(overview.members.len(), 1);
        assert_eq!(overview.invites.len(), 1);
    }

    #[tokio::test]
    async fn update_rejects_blank_name() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![member(workspace_id, "alice", None, &[Permission::UpdateTeam])],
            Vec::new(),
        );

        let result = harness
            .service
            .update_workspace(
                &actor("alice", None),
                workspace_id,
                UpdateWorkspaceInput {
                    name: "   ".to_owned(),
                    image_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_requires_delete_team() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![member(workspace_id, "alice", None, &[Permission::UpdateTeam])],
            Vec::new(),
        );

        let result = harness
            .service
            .delete_workspace(&actor("alice", None), workspace_id)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn set_member_roles_rejects_unknown_role() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![
                member(workspace_id, "alice", None, &[Permission::UpdateTeam]),
                member(workspace_id, "bob", None, &[]),
            ],
            Vec::new(),
        );

        let result = harness
            .service
            .set_member_roles(
                &actor("alice", None),
                workspace_id,
                "bob",
                &["Superuser".to_owned()],
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_invite_rejects_existing_member_email() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![
                member(
                    workspace_id,
                    "alice",
                    Some("alice@example.com"),
                    &[Permission::InviteMembers],
                ),
                member(workspace_id, "bob", Some("bob@example.com"), &[]),
            ],
            Vec::new(),
        );

        let result = harness
            .service
            .create_invite(
                &actor("alice", None),
                workspace_id,
                CreateInviteInput {
                    email: "Bob@Example.com".to_owned(),
                    role_names: vec!["Viewer".to_owned()],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_invite_rejects_duplicate_pending_invite() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![member(
                workspace_id,
                "alice",
                None,
                &[Permission::InviteMembers],
            )],
            vec![pending_invite(workspace_id, "drummer@example.com")],
        );

        let result = harness
            .service
            .create_invite(
                &actor("alice", None),
                workspace_id,
                CreateInviteInput {
                    email: "drummer@example.com".to_owned(),
                    role_names: vec!["Viewer".to_owned()],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_invite_notifies_the_invited_email() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![member(
                workspace_id,
                "alice",
                None,
                &[Permission::InviteMembers],
            )],
            Vec::new(),
        );

        let result = harness
            .service
            .create_invite(
                &actor("alice", None),
                workspace_id,
                CreateInviteInput {
                    email: "Drummer@Example.com".to_owned(),
                    role_names: vec!["Editor".to_owned()],
                },
            )
            .await;

        assert!(result.is_ok());
        let sent = harness.email.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "drummer@example.com");
    }

    #[tokio::test]
    async fn accept_invite_rejects_a_different_email() {
        let workspace_id = WorkspaceId::new();
        let invite = pending_invite(workspace_id, "drummer@example.com");
        let invite_id = invite.id;
        let harness = harness(vec![workspace(workspace_id)], Vec::new(), vec![invite]);

        let result = harness
            .service
            .accept_invite(&actor("carol", Some("carol@example.com")), invite_id)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn accept_invite_joins_with_invited_roles() {
        let workspace_id = WorkspaceId::new();
        let invite = pending_invite(workspace_id, "drummer@example.com");
        let invite_id = invite.id;
        let harness = harness(vec![workspace(workspace_id)], Vec::new(), vec![invite]);

        let result = harness
            .service
            .accept_invite(&actor("carol", Some("Drummer@Example.com")), invite_id)
            .await;

        assert!(result.is_ok());
        let member = result.unwrap_or_else(|_| unreachable!());
        assert_eq!(member.workspace_id, workspace_id);
        assert_eq!(member.roles.len(), 1);
        assert_eq!(member.roles[0].name, "Viewer");
        assert!(harness.invites.invites.lock().await.is_empty());
    }

    #[tokio::test]
    async fn accept_invite_conflicts_for_existing_member() {
        let workspace_id = WorkspaceId::new();
        let invite = pending_invite(workspace_id, "drummer@example.com");
        let invite_id = invite.id;
        let harness = harness(
            vec![workspace(workspace_id)],
            vec![member(workspace_id, "carol", None, &[])],
            vec![invite],
        );

        let result = harness
            .service
            .accept_invite(&actor("carol", Some("drummer@example.com")), invite_id)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn invites_for_caller_without_email_is_empty() {
        let workspace_id = WorkspaceId::new();
        let harness = harness(
            vec![workspace(workspace_id)],
            Vec::new(),
            vec![pending_invite(workspace_id, "drummer@example.com")],
        );

        let result = harness.service.invites_for_caller(&actor("carol", None)).await;

        assert!(result.is_ok());
        assert!(result.unwrap_or_default().is_empty());
    }
}
