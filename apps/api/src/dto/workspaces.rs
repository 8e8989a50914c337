use mixdown_application::{CreateInviteInput, UpdateWorkspaceInput, WorkspaceOverview};
use mixdown_domain::{Invite, Role, Subscription, Workspace, WorkspaceMember};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a workspace.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/workspace-response.ts"
)]
pub struct WorkspaceResponse {
    pub workspace_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

/// API representation of a catalog role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub is_system: bool,
    pub permissions: Vec<String>,
}

/// API representation of a workspace member with resolved roles.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/member-response.ts"
)]
pub struct MemberResponse {
    pub member_id: String,
    pub subject: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<RoleResponse>,
    pub created_at: String,
}

/// API representation of a pending invite.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/invite-response.ts"
)]
pub struct InviteResponse {
    pub invite_id: String,
    pub workspace_id: String,
    pub email: String,
    pub role_names: Vec<String>,
    pub invited_by: String,
    pub created_at: String,
}

/// API representation of the stored billing plan.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/subscription-response.ts"
)]
pub struct SubscriptionResponse {
    pub workspace_id: String,
    pub plan: String,
    pub updated_at: String,
}

/// Workspace settings screen payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/workspace-overview-response.ts"
)]
pub struct WorkspaceOverviewResponse {
    pub workspace: WorkspaceResponse,
    pub members: Vec<MemberResponse>,
    pub invites: Vec<InviteResponse>,
    pub subscription: Option<SubscriptionResponse>,
}

/// Incoming payload for workspace settings updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-workspace-request.ts"
)]
pub struct UpdateWorkspaceRequest {
    pub name: String,
    pub image_url: Option<String>,
}

/// Incoming payload replacing a member's role set.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/set-member-roles-request.ts"
)]
pub struct SetMemberRolesRequest {
    pub role_names: Vec<String>,
}

/// Incoming payload for inviting an email address.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-invite-request.ts"
)]
pub struct CreateInviteRequest {
    pub email: String,
    pub role_names: Vec<String>,
}

impl From<Workspace> for WorkspaceResponse {
    fn from(value: Workspace) -> Self {
        Self {
            workspace_id: value.id.to_string(),
            name: value.name,
            image_url: value.image_url,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.id.to_string(),
            name: value.name,
            is_system: value.is_system,
            permissions: value
                .permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

impl From<WorkspaceMember> for MemberResponse {
    fn from(value: WorkspaceMember) -> Self {
        Self {
            member_id: value.id.to_string(),
            subject: value.subject,
            display_name: value.display_name,
            email: value.email,
            roles: value.roles.into_iter().map(RoleResponse::from).collect(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

impl From<Invite> for InviteResponse {
    fn from(value: Invite) -> Self {
        Self {
            invite_id: value.id.to_string(),
            workspace_id: value.workspace_id.to_string(),
            email: value.email.into(),
            role_names: value.role_names,
            invited_by: value.invited_by,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

impl From<Subscription> for SubscriptionResponse {
    fn from(value: Subscription) -> Self {
        Self {
            workspace_id: value.workspace_id.to_string(),
            plan: value.plan.as_str().to_owned(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

impl From<WorkspaceOverview> for WorkspaceOverviewResponse {
    fn from(value: WorkspaceOverview) -> Self {
        Self {
            workspace: WorkspaceResponse::from(value.workspace),
            members: value
                .members
                .into_iter()
                .map(MemberResponse::from)
                .collect(),
            invites: value
                .invites
                .into_iter()
                .map(InviteResponse::from)
                .collect(),
            subscription: value.subscription.map(SubscriptionResponse::from),
        }
    }
}

impl From<UpdateWorkspaceRequest> for UpdateWorkspaceInput {
    fn from(value: UpdateWorkspaceRequest) -> Self {
        Self {
            name: value.name,
            image_url: value.image_url,
        }
    }
}

impl From<CreateInviteRequest> for CreateInviteInput {
    fn from(value: CreateInviteRequest) -> Self {
        Self {
            email: value.email,
            role_names: value.role_names,
        }
    }
}
