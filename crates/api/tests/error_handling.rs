//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use tellina_api::error::AppError;
use tellina_client::ApiError;
use tellina_core::error::CoreError;
use tellina_core::update::REJECTION_COMMENT_TOO_SHORT;
use tellina_widget::WidgetError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError variants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Annotation",
        id: "A123".to_string(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Annotation with id A123 not found");
}

#[tokio::test]
async fn validation_error_returns_400_with_alert_text() {
    let err = AppError::from(WidgetError::Core(CoreError::Validation(
        REJECTION_COMMENT_TOO_SHORT.to_string(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], REJECTION_COMMENT_TOO_SHORT);
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("Update U7 is not open".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Update U7 is not open");
}

#[tokio::test]
async fn forbidden_error_returns_403() {
    let err = AppError::Core(CoreError::Forbidden(
        "Only the proposer can retract an update".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[test]
fn widget_errors_keep_their_layer() {
    assert_matches!(
        AppError::from(WidgetError::Core(CoreError::Forbidden("no".into()))),
        AppError::Core(CoreError::Forbidden(_))
    );
    assert_matches!(
        AppError::from(WidgetError::Backend(ApiError::MissingField {
            endpoint: "submit_annotation_update",
            field: "update_id",
        })),
        AppError::Backend(ApiError::MissingField { field: "update_id", .. })
    );
}

// ---------------------------------------------------------------------------
// Test: backend failures map to 502
// ---------------------------------------------------------------------------

#[tokio::test]
async fn backend_error_returns_502() {
    let err = AppError::from(WidgetError::Backend(ApiError::ApiError {
        status: 500,
        body: "boom".into(),
    }));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "BACKEND_ERROR");
    assert!(json["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn unexpected_backend_status_returns_502() {
    let err = AppError::Backend(ApiError::UnexpectedStatus {
        endpoint: "retract_update",
        expected: "RETRACT_UPDATE_SUCCESS",
        actual: Some("RETRACT_UPDATE_FAILED".into()),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "BACKEND_ERROR");
}

// ---------------------------------------------------------------------------
// Test: HTTP-specific variants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Unauthorized("Missing access code".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::from(WidgetError::Core(CoreError::Internal(
        "Widget operation aborted: task panicked".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
