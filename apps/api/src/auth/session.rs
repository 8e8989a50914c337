use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use mixdown_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::{UserIdentityResponse, WorkspaceResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

/// Reads the authenticated identity stored in the session cookie.
pub async fn session_identity(session: &Session) -> Result<UserIdentity, AppError> {
    session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session_identity(&session).await?;

    let workspaces = state
        .workspace_service
        .workspaces_for_caller(&identity)
        .await?
        .into_iter()
        .map(WorkspaceResponse::from)
        .collect();

    Ok(Json(UserIdentityResponse::from_identity_with_workspaces(
        identity, workspaces,
    )))
}
