//! Route definitions for the annotation update widget.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::annotation;
use crate::state::AppState;

/// Widget routes mounted at `/annotations`.
///
/// ```text
/// POST   /                                  -> mount_annotation
/// GET    /{id}                              -> get_annotation
/// DELETE /{id}                              -> unmount_annotation
/// GET    /{id}/html                         -> get_annotation_html
/// POST   /{id}/edit                         -> open_edit_panel
/// PUT    /{id}/edit                         -> submit_edit
/// DELETE /{id}/edit                         -> cancel_edit_panel
/// DELETE /{id}/notice                       -> dismiss_notice
/// POST   /{id}/entries/{index}/reject       -> open_rejection_panel
/// PUT    /{id}/entries/{index}/reject       -> submit_rejection
/// DELETE /{id}/entries/{index}/reject       -> cancel_rejection_panel
/// POST   /{id}/entries/{index}/accept       -> accept_update
/// POST   /{id}/entries/{index}/retract      -> retract_update
/// POST   /{id}/entries/{index}/refresh      -> refresh_entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(annotation::mount_annotation))
        .route(
            "/{id}",
            get(annotation::get_annotation).delete(annotation::unmount_annotation),
        )
        .route("/{id}/html", get(annotation::get_annotation_html))
        .route(
            "/{id}/edit",
            post(annotation::open_edit_panel)
                .put(annotation::submit_edit)
                .delete(annotation::cancel_edit_panel),
        )
        .route("/{id}/notice", delete(annotation::dismiss_notice))
        .route(
            "/{id}/entries/{index}/reject",
            post(annotation::open_rejection_panel)
                .put(annotation::submit_rejection)
                .delete(annotation::cancel_rejection_panel),
        )
        .route(
            "/{id}/entries/{index}/accept",
            post(annotation::accept_update),
        )
        .route(
            "/{id}/entries/{index}/retract",
            post(annotation::retract_update),
        )
        .route(
            "/{id}/entries/{index}/refresh",
            post(annotation::refresh_entry),
        )
}
