use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use mixdown_core::{AppError, UserIdentity};
use mixdown_domain::{EmailAddress, UserProfile};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub token: String,
    pub subject: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Trades a deploy-time shared token for a session cookie.
///
/// The identity provider in front of the API verifies the user; this endpoint
/// only binds the verified subject to a session and provisions a personal
/// workspace on first login.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let email = EmailAddress::new(payload.email)?;
    let display_name = payload
        .display_name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| payload.subject.clone());
    let profile = UserProfile {
        subject: payload.subject,
        display_name,
        email,
    };

    state
        .workspace_repository
        .ensure_workspace_for_subject(&profile)
        .await?;

    let identity = UserIdentity::new(
        profile.subject,
        profile.display_name,
        Some(String::from(profile.email)),
    );

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    Ok(StatusCode::NO_CONTENT)
}
