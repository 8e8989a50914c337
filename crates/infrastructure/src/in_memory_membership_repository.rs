use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use mixdown_application::MembershipRepository;
use mixdown_core::{AppError, AppResult, WorkspaceId};
use mixdown_domain::{Role, WorkspaceMember, seeded_role_catalog};

/// In-memory membership repository implementation.
///
/// Each workspace receives the seeded role catalog on first use. Useful for
/// tests and local development without a database.
#[derive(Debug, Default)]
pub struct InMemoryMembershipRepository {
    roles: RwLock<HashMap<WorkspaceId, Vec<Role>>>,
    members: RwLock<HashMap<(WorkspaceId, String), WorkspaceMember>>,
}

impl InMemoryMembershipRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
            members: RwLock::new(HashMap::new()),
        }
    }

    async fn catalog_for(&self, workspace_id: WorkspaceId) -> Vec<Role> {
        let mut roles = self.roles.write().await;
        roles
            .entry(workspace_id)
            .or_insert_with(|| {
                seeded_role_catalog()
                    .into_iter()
                    .map(|(name, permissions)| Role {
                        id: Uuid::new_v4(),
                        name: name.to_owned(),
                        is_system: true,
                        permissions,
                    })
                    .collect()
            })
            .clone()
    }

    async fn resolve_roles(
        &self,
        workspace_id: WorkspaceId,
        role_names: &[String],
    ) -> AppResult<Vec<Role>> {
        let catalog = self.catalog_for(workspace_id).await;

        role_names
            .iter()
            .map(|name| {
                catalog
                    .iter()
                    .find(|role| role.name == *name)
                    .cloned()
                    .ok_or_else(|| AppError::Validation(format!("unknown role '{name}'")))
            })
            .collect()
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn member_with_roles(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
    ) -> AppResult<Option<WorkspaceMember>> {
        Ok(self
            .members
            .read()
            .await
            .get(&(workspace_id, subject.to_owned()))
            .cloned())
    }

    async fn list_members(&self, workspace_id: WorkspaceId) -> AppResult<Vec<WorkspaceMember>> {
        let members = self.members.read().await;

        let mut listed: Vec<WorkspaceMember> = members
            .iter()
            .filter_map(|((stored_workspace_id, _), member)| {
                (stored_workspace_id == &workspace_id).then_some(member.clone())
            })
            .collect();
        listed.sort_by(|left, right| left.subject.cmp(&right.subject));

        Ok(listed)
    }

    async fn list_roles(&self, workspace_id: WorkspaceId) -> AppResult<Vec<Role>> {
        let mut catalog = self.catalog_for(workspace_id).await;
        catalog.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(catalog)
    }

    async fn create_member(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
        role_names: &[String],
    ) -> AppResult<WorkspaceMember> {
        let roles = self.resolve_roles(workspace_id, role_names).await?;
        let key = (workspace_id, subject.to_owned());
        let mut members = self.members.write().await;

        if members.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "'{subject}' is already a member"
            )));
        }

        let member = WorkspaceMember {
            id: Uuid::new_v4(),
            workspace_id,
            subject: subject.to_owned(),
            display_name: None,
            email: None,
            roles,
            created_at: Utc::now(),
        };
        members.insert(key, member.clone());

        Ok(member)
    }

    async fn set_member_roles(
        &self,
        workspace_id: WorkspaceId,
        subject: &str,
        role_names: &[String],
    ) -> AppResult<WorkspaceMember> {
        let roles = self.resolve_roles(workspace_id, role_names).await?;
        let mut members = self.members.write().await;

        let member = members
            .get_mut(&(workspace_id, subject.to_owned()))
            .ok_or_else(|| AppError::NotFound("member not found".to_owned()))?;
        member.roles = roles;

        Ok(member.clone())
    }

    async fn remove_member(&self, workspace_id: WorkspaceId, subject: &str) -> AppResult<()> {
        let removed = self
            .members
            .write()
            .await
            .remove(&(workspace_id, subject.to_owned()));

        if removed.is_none() {
            return Err(AppError::NotFound("member not found".to_owned()));
        }

        Ok(())
    }
}
