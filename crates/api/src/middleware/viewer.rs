//! Viewer identification extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tellina_core::types::AccessCode;

use crate::error::AppError;

/// Cookie carrying the viewer's access code, as set by the annotation site.
pub const ACCESS_CODE_COOKIE: &str = "access_code";

/// Header accepted in place of the cookie by non-browser clients.
pub const ACCESS_CODE_HEADER: &str = "x-access-code";

/// The viewer a request acts for, identified by access code.
///
/// Read from the `access_code` cookie, falling back to the `x-access-code`
/// header:
///
/// ```ignore
/// async fn my_handler(viewer: Viewer) -> AppResult<Json<()>> {
///     tracing::info!(viewer = %viewer.access_code, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Viewer {
    pub access_code: AccessCode,
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let access_code = cookie_access_code(&parts.headers)
            .or_else(|| {
                parts
                    .headers
                    .get(ACCESS_CODE_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                AppError::Unauthorized(format!(
                    "Missing '{ACCESS_CODE_COOKIE}' cookie or '{ACCESS_CODE_HEADER}' header"
                ))
            })?;

        Ok(Viewer { access_code })
    }
}

/// Find a non-empty `access_code` value across all `Cookie` headers.
fn cookie_access_code(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_CODE_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
