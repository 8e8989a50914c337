use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use mixdown_core::AppError;
use tower_sessions::Session;

use crate::auth::session_identity;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the session identity and stores it as a request extension for
/// handlers to extract.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session_identity(&session).await?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Blocks state-changing requests that do not come from the configured
/// frontend origin. Browser fetch metadata is checked first, then the
/// Origin and Referer values.
pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if mutates_state(request.method()) {
        if let Some(error) = cross_origin_rejection(request.headers(), &state.frontend_url) {
            return Err(error.into());
        }
    }

    Ok(next.run(request).await)
}

fn mutates_state(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn cross_origin_rejection(headers: &HeaderMap, allowed_origin: &str) -> Option<AppError> {
    if header_str(headers, "sec-fetch-site") == Some("cross-site") {
        return Some(AppError::Unauthorized(
            "cross-site request blocked".to_owned(),
        ));
    }

    let origin_matches = header_str(headers, header::ORIGIN.as_str()) == Some(allowed_origin);
    let referer_matches = header_str(headers, header::REFERER.as_str())
        .is_some_and(|referer| referer.starts_with(allowed_origin));

    if origin_matches || referer_matches {
        None
    } else {
        Some(AppError::Unauthorized("origin validation failed".to_owned()))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
