use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tellina_client::ApiError;
use tellina_core::error::CoreError;
use tellina_widget::WidgetError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`ApiError`] for failures of the
/// annotation backend, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `tellina_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The annotation backend could not complete the request.
    #[error(transparent)]
    Backend(#[from] ApiError),

    /// The request does not identify a viewer.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<WidgetError> for AppError {
    fn from(err: WidgetError) -> Self {
        match err {
            WidgetError::Core(e) => Self::Core(e),
            WidgetError::Backend(e) => Self::Backend(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Annotation backend ---
            AppError::Backend(err) => classify_backend_error(err),

            // --- HTTP-specific errors ---
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a backend failure into an HTTP status, error code, and message.
///
/// - No usable response (connect failure, timeout) maps to 502 `BACKEND_UNAVAILABLE`.
/// - A response reporting failure maps to 502 `BACKEND_ERROR`.
fn classify_backend_error(err: &ApiError) -> (StatusCode, &'static str, String) {
    tracing::warn!(error = %err, "Annotation backend error");
    if err.is_transport() {
        (
            StatusCode::BAD_GATEWAY,
            "BACKEND_UNAVAILABLE",
            "The annotation backend could not be reached".to_string(),
        )
    } else {
        (StatusCode::BAD_GATEWAY, "BACKEND_ERROR", err.to_string())
    }
}
