//! Workspaces, invites, and the stored billing plan.

use chrono::{DateTime, Utc};
use mixdown_core::{AppError, AppResult, WorkspaceId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::EmailAddress;

/// A tenant boundary grouping members, resources, and a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Workspace identifier.
    pub id: WorkspaceId,
    /// Workspace name.
    pub name: String,
    /// Optional logo or avatar URL.
    pub image_url: Option<String>,
    /// When the workspace was created.
    pub created_at: DateTime<Utc>,
}

/// A pending invitation to join a workspace.
///
/// Acceptance is bound to the invited email: the accepting user's session
/// email must match (case-insensitively) before a membership is created with
/// the invite's roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Invite identifier.
    pub id: Uuid,
    /// Workspace the invite grants membership to.
    pub workspace_id: WorkspaceId,
    /// Invited email address.
    pub email: EmailAddress,
    /// Names of catalog roles granted on acceptance.
    pub role_names: Vec<String>,
    /// Subject of the member who sent the invite.
    pub invited_by: String,
    /// When the invite was created.
    pub created_at: DateTime<Utc>,
}

/// Billing tier stored for a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Entry tier for individual artists.
    Artist,
    /// Mid tier for managers handling several acts.
    Manager,
    /// Label tier without catalog caps.
    Label,
}

impl Plan {
    /// Returns a stable storage value for this plan.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Manager => "manager",
            Self::Label => "label",
        }
    }

    /// Parses a storage string into a plan.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "artist" => Ok(Self::Artist),
            "manager" => Ok(Self::Manager),
            "label" => Ok(Self::Label),
            _ => Err(AppError::Validation(format!("unknown plan '{value}'"))),
        }
    }
}

/// The stored subscription record for a workspace.
///
/// Billing flows live with the external payment provider; only the resulting
/// plan is persisted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Workspace the subscription belongs to.
    pub workspace_id: WorkspaceId,
    /// Billing tier.
    pub plan: Plan,
    /// Last time the stored record changed.
    pub updated_at: DateTime<Utc>,
}

/// Returns the artist-catalog cap for an optionally-present subscription.
///
/// `None` means unlimited. A workspace without a stored subscription gets the
/// entry-tier cap.
#[must_use]
pub fn artist_limit_for(subscription: Option<&Subscription>) -> Option<u32> {
    match subscription.map(|subscription| subscription.plan) {
        Some(Plan::Manager) => Some(50),
        Some(Plan::Label) => None,
        Some(Plan::Artist) | None => Some(2),
    }
}

/// Whether a workspace with `count` artists may add another under its plan.
#[must_use]
pub fn can_add_another_artist(count: u64, subscription: Option<&Subscription>) -> bool {
    match artist_limit_for(subscription) {
        Some(limit) => count < u64::from(limit),
        None => true,
    }
}
