use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use mixdown_core::{UserIdentity, WorkspaceId};
use mixdown_domain::{ReleaseQuery, ReleaseSortField, SortDirection};

use crate::dto::{ReleaseDetailResponse, ReleaseResponse, SaveReleaseRequest};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct ReleaseListQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

pub async fn list_releases_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<ReleaseListQuery>,
) -> ApiResult<Json<Vec<ReleaseResponse>>> {
    let query = ReleaseQuery {
        search: query.search,
        sort_by: query
            .sort_by
            .as_deref()
            .map(ReleaseSortField::parse)
            .transpose()?,
        sort_direction: query
            .sort_direction
            .as_deref()
            .map(SortDirection::parse)
            .transpose()?,
    };

    let releases = state
        .release_service
        .list_releases(&user, WorkspaceId::from_uuid(workspace_id), query)
        .await?
        .into_iter()
        .map(ReleaseResponse::from)
        .collect();

    Ok(Json(releases))
}

pub async fn get_release_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ReleaseDetailResponse>> {
    let detail = state
        .release_service
        .release_detail(&user, WorkspaceId::from_uuid(workspace_id), release_id)
        .await?;

    Ok(Json(ReleaseDetailResponse::from(detail)))
}

pub async fn create_release_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<SaveReleaseRequest>,
) -> ApiResult<(StatusCode, Json<ReleaseResponse>)> {
    let release = state
        .release_service
        .create_release(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            payload.try_into()?,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReleaseResponse::from(release))))
}

pub async fn update_release_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SaveReleaseRequest>,
) -> ApiResult<Json<ReleaseResponse>> {
    let release = state
        .release_service
        .update_release(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            release_id,
            payload.try_into()?,
        )
        .await?;

    Ok(Json(ReleaseResponse::from(release)))
}

pub async fn delete_release_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .release_service
        .delete_release(&user, WorkspaceId::from_uuid(workspace_id), release_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
