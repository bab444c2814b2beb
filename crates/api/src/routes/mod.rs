pub mod annotation;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /annotations                                     mount, per-annotation widget actions
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/annotations", annotation::router())
}
