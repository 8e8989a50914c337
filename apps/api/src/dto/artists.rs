use mixdown_application::ArtistInput;
use mixdown_domain::Artist;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a catalog artist.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/artist-response.ts"
)]
pub struct ArtistResponse {
    pub artist_id: String,
    pub workspace_id: String,
    pub name: String,
    pub legal_name: Option<String>,
    pub spotify_url: Option<String>,
    pub instagram_url: Option<String>,
    pub created_at: String,
}

/// Incoming payload for artist create/update.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-artist-request.ts"
)]
pub struct SaveArtistRequest {
    pub name: String,
    pub legal_name: Option<String>,
    pub spotify_url: Option<String>,
    pub instagram_url: Option<String>,
}

impl From<Artist> for ArtistResponse {
    fn from(value: Artist) -> Self {
        Self {
            artist_id: value.id.to_string(),
            workspace_id: value.workspace_id.to_string(),
            name: value.name,
            legal_name: value.legal_name,
            spotify_url: value.spotify_url,
            instagram_url: value.instagram_url,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

impl From<SaveArtistRequest> for ArtistInput {
    fn from(value: SaveArtistRequest) -> Self {
        Self {
            name: value.name,
            legal_name: value.legal_name,
            spotify_url: value.spotify_url,
            instagram_url: value.instagram_url,
        }
    }
}
