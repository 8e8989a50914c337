use mixdown_core::UserIdentity;
use serde::Serialize;
use ts_rs::TS;

use super::workspaces::WorkspaceResponse;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    /// Workspaces where the authenticated user holds a membership.
    pub workspaces: Vec<WorkspaceResponse>,
}

impl UserIdentityResponse {
    /// Creates a response from the identity and its resolved memberships.
    #[must_use]
    pub fn from_identity_with_workspaces(
        identity: UserIdentity,
        workspaces: Vec<WorkspaceResponse>,
    ) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
            workspaces,
        }
    }
}

