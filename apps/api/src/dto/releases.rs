use chrono::NaiveDate;
use uuid::Uuid;

use mixdown_application::{ReleaseDetail, ReleaseInput};
use mixdown_core::AppError;
use mixdown_domain::{Release, ReleaseType};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::artists::ArtistResponse;
use super::tasks::TaskResponse;

/// API representation of a planned release.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/release-response.ts"
)]
pub struct ReleaseResponse {
    pub release_id: String,
    pub workspace_id: String,
    pub artist_id: String,
    pub name: String,
    pub release_type: String,
    pub target_date: String,
    pub created_at: String,
}

/// Release detail screen payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/release-detail-response.ts"
)]
pub struct ReleaseDetailResponse {
    pub release: ReleaseResponse,
    pub artist: ArtistResponse,
    pub tasks: Vec<TaskResponse>,
}

/// Incoming payload for release create/update.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-release-request.ts"
)]
pub struct SaveReleaseRequest {
    pub artist_id: String,
    pub name: String,
    pub release_type: String,
    /// Planned date in `YYYY-MM-DD` form.
    pub target_date: String,
}

impl From<Release> for ReleaseResponse {
    fn from(value: Release) -> Self {
        Self {
            release_id: value.id.to_string(),
            workspace_id: value.workspace_id.to_string(),
            artist_id: value.artist_id.to_string(),
            name: value.name,
            release_type: value.release_type.as_str().to_owned(),
            target_date: value.target_date.to_string(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

impl From<ReleaseDetail> for ReleaseDetailResponse {
    fn from(value: ReleaseDetail) -> Self {
        Self {
            release: ReleaseResponse::from(value.release),
            artist: ArtistResponse::from(value.artist),
            tasks: value.tasks.into_iter().map(TaskResponse::from).collect(),
        }
    }
}

impl TryFrom<SaveReleaseRequest> for ReleaseInput {
    type Error = AppError;

    fn try_from(value: SaveReleaseRequest) -> Result<Self, Self::Error> {
        let artist_id = value
            .artist_id
            .parse::<Uuid>()
            .map_err(|_| AppError::Validation("invalid artist id".to_owned()))?;
        let target_date = value
            .target_date
            .parse::<NaiveDate>()
            .map_err(|_| AppError::Validation("target date must be YYYY-MM-DD".to_owned()))?;

        Ok(Self {
            artist_id,
            name: value.name,
            release_type: ReleaseType::parse(&value.release_type)?,
            target_date,
        })
    }
}
