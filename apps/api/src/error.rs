use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mixdown_core::AppError;
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal failures carry detail we log but never hand to clients.
        let message = match &self.0 {
            AppError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use mixdown_core::AppError;

    use super::ApiError;

    async fn body_message(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|value| value["message"].as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    #[test]
    fn status_codes_follow_the_error_kind() {
        let cases = [
            (AppError::Validation("v".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("n".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("c".to_owned()), StatusCode::CONFLICT),
            (
                AppError::Unauthorized("u".to_owned()),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::Forbidden("f".to_owned()), StatusCode::FORBIDDEN),
            (
                AppError::Internal("i".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let response = ApiError(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let response =
            ApiError(AppError::Internal("database exploded".to_owned())).into_response();

        assert_eq!(body_message(response).await, "internal server error");
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let response =
            ApiError(AppError::Validation("name must not be empty".to_owned())).into_response();

        assert_eq!(body_message(response).await, "name must not be empty");
    }
}
