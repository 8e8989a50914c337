//! Artists in a workspace's catalog.

use chrono::{DateTime, Utc};
use mixdown_core::WorkspaceId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An artist managed inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// Artist identifier.
    pub id: Uuid,
    /// Workspace the artist belongs to.
    pub workspace_id: WorkspaceId,
    /// Stage name.
    pub name: String,
    /// Legal name, when it differs from the stage name.
    pub legal_name: Option<String>,
    /// Spotify profile URL.
    pub spotify_url: Option<String>,
    /// Instagram profile URL.
    pub instagram_url: Option<String>,
    /// When the artist was added to the catalog.
    pub created_at: DateTime<Utc>,
}
