use std::sync::Arc;

use async_trait::async_trait;
use mixdown_core::{AppError, AppResult, WorkspaceId};
use mixdown_domain::{Permission, Role, WorkspaceMember, has_required_permissions};

/// Repository port for membership and role-catalog lookups.
///
/// Members are returned with roles and each role's permissions fully joined,
/// so gate evaluation never fetches.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Finds one member of a workspace by subject.
    async fn member_with_roles(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
    ) -> AppResult<Option<WorkspaceMember>>;

    /// Lists all members of a workspace.
    async fn list_members(&self, workspace_id: WorkspaceId) -> AppResult<Vec<WorkspaceMember>>;

    /// Lists the workspace's role catalog.
    async fn list_roles(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Role>>;

    /// Creates a membership carrying the named catalog roles.
    ///
    /// Fails with a validation error when a role name is not in the catalog
    /// and with a conflict when the subject is already a member.
    async fn create_member(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
        role_names: &[String],
    ) -> AppResult<WorkspaceMember>;

    /// Replaces a member's assigned roles with the named catalog roles.
    async fn set_member_roles(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
        role_names: &[String],
    ) -> AppResult<WorkspaceMember>;

    /// Removes a membership and its role links.
    async fn remove_member(&self, workspace_id: WorkspaceId, subject: &str) -> AppResult<()>;
}

/// Application service enforcing the permission gate for workspace operations.
#[derive(Clone)]
pub struct AccessService {
    members: Arc<dyn MembershipRepository>,
}

impl AccessService {
    /// Creates a new access service from a membership repository.
    #[must_use]
    pub fn new(members: Arc<dyn MembershipRepository>) -> Self {
        Self { members }
    }

    /// Loads the caller's membership in a workspace, if any.
    pub async fn member(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
    ) -> AppResult<Option<WorkspaceMember>> {
        self.members.member_with_roles(workspace_id, subject).await
    }

    /// Ensures the subject holds at least one of the required permissions in
    /// the workspace, returning the resolved membership.
    ///
    /// A missing membership denies exactly like a membership whose roles lack
    /// every required permission. The error carries no hint of which
    /// permission was required.
    pub async fn require_any_permission(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
        required: &[Permission],
    ) -> AppResult<WorkspaceMember> {
        let member = self.members.member_with_roles(workspace_id, subject).await?;

        if !has_required_permissions(required, member.as_ref()) {
            return Err(AppError::Forbidden(
                "operation not permitted in this workspace".to_owned(),
            ));
        }

        member.ok_or_else(|| {
            AppError::Forbidden("operation not permitted in this workspace".to_owned())
        })
    }
}
