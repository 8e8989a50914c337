use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use mixdown_core::{UserIdentity, WorkspaceId};

use crate::dto::{ArtistResponse, SaveArtistRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_artists_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ArtistResponse>>> {
    let artists = state
        .artist_service
        .list_artists(&user, WorkspaceId::from_uuid(workspace_id))
        .await?
        .into_iter()
        .map(ArtistResponse::from)
        .collect();

    Ok(Json(artists))
}

pub async fn get_artist_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, artist_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ArtistResponse>> {
    let artist = state
        .artist_service
        .get_artist(&user, WorkspaceId::from_uuid(workspace_id), artist_id)
        .await?;

    Ok(Json(ArtistResponse::from(artist)))
}

pub async fn create_artist_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<SaveArtistRequest>,
) -> ApiResult<(StatusCode, Json<ArtistResponse>)> {
    let artist = state
        .artist_service
        .create_artist(&user, WorkspaceId::from_uuid(workspace_id), payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ArtistResponse::from(artist))))
}

pub async fn update_artist_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, artist_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SaveArtistRequest>,
) -> ApiResult<Json<ArtistResponse>> {
    let artist = state
        .artist_service
        .update_artist(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            artist_id,
            payload.into(),
        )
        .await?;

    Ok(Json(ArtistResponse::from(artist)))
}

pub async fn delete_artist_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, artist_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .artist_service
        .delete_artist(&user, WorkspaceId::from_uuid(workspace_id), artist_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
