//! Releases and the query shape used to list them.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use mixdown_core::{AppError, AppResult, WorkspaceId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    /// A single track.
    Single,
    /// An extended play.
    Ep,
    /// A full-length album.
    Album,
}

impl ReleaseType {
    /// Returns a stable storage value for this release type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Ep => "ep",
            Self::Album => "album",
        }
    }

    /// Parses a storage string into a release type.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "single" => Ok(Self::Single),
            "ep" => Ok(Self::Ep),
            "album" => Ok(Self::Album),
            _ => Err(AppError::Validation(format!(
                "unknown release type '{value}'"
            ))),
        }
    }
}

/// A planned or published release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release identifier.
    pub id: Uuid,
    /// Workspace the release belongs to.
    pub workspace_id: WorkspaceId,
    /// Artist the release is credited to.
    pub artist_id: Uuid,
    /// Release title.
    pub name: String,
    /// Release format.
    pub release_type: ReleaseType,
    /// Planned release date.
    pub target_date: NaiveDate,
    /// When the release record was created.
    pub created_at: DateTime<Utc>,
}

/// Sort direction for release listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns a stable transport value for this direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parses a transport string into a direction.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }
}

/// Sortable fields of a release listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseSortField {
    /// Sort by release title.
    Name,
    /// Sort by planned release date.
    TargetDate,
    /// Sort by release format.
    ReleaseType,
}

impl ReleaseSortField {
    /// Returns a stable transport value for this field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::TargetDate => "target_date",
            Self::ReleaseType => "release_type",
        }
    }

    /// Parses a transport string into a sort field.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "name" => Ok(Self::Name),
            "target_date" => Ok(Self::TargetDate),
            "release_type" => Ok(Self::ReleaseType),
            _ => Err(AppError::Validation(format!(
                "unknown release sort field '{value}'"
            ))),
        }
    }

    /// Compares two releases on this field, ascending.
    #[must_use]
    pub fn compare(&self, left: &Release, right: &Release) -> Ordering {
        match self {
            Self::Name => left.name.to_lowercase().cmp(&right.name.to_lowercase()),
            Self::TargetDate => left.target_date.cmp(&right.target_date),
            Self::ReleaseType => left
                .release_type
                .as_str()
                .cmp(right.release_type.as_str()),
        }
    }
}

/// Listing parameters for releases.
///
/// The search term matches case-insensitive substrings of the release name.
/// Sorting defaults to name ascending when unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseQuery {
    /// Optional name filter.
    pub search: Option<String>,
    /// Field to sort by.
    pub sort_by: Option<ReleaseSortField>,
    /// Direction to sort in.
    pub sort_direction: Option<SortDirection>,
}

impl ReleaseQuery {
    /// Whether a release name satisfies the search filter.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        match self.search.as_deref() {
            Some(search) if !search.trim().is_empty() => name
                .to_lowercase()
                .contains(search.trim().to_lowercase().as_str()),
            _ => true,
        }
    }

    /// Sorts a release listing in place according to the query.
    pub fn sort(&self, releases: &mut [Release]) {
        let field = self.sort_by.unwrap_or(ReleaseSortField::Name);
        let direction = self.sort_direction.unwrap_or(SortDirection::Asc);

        releases.sort_by(|left, right| {
            let ordering = field.compare(left, right);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}
