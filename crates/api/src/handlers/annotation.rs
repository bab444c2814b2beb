//! Handlers for the annotation update widget.
//!
//! Every handler acts for the [`Viewer`] of the request on one mounted
//! annotation. Successful operations answer with the annotation's fresh
//! snapshot; failed ones answer with the error while the widget keeps a
//! notice describing it, visible on the next snapshot.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};

use tellina_core::error::CoreError;
use tellina_core::panel::EditTarget;
use tellina_core::render::render_annotation;
use tellina_core::thread::EntryControls;
use tellina_core::types::{AnnotationId, EntryIndex};
use tellina_core::update::{UpdateStatus, EDIT_PLACEHOLDER};
use tellina_core::view::AnnotationView;
use tellina_widget::{AnnotationHandle, EditOutcome};

use crate::error::{AppError, AppResult};
use crate::middleware::viewer::Viewer;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
   Request bodies
   -------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
pub struct MountAnnotation {
    pub annotation_id: AnnotationId,
    /// Text the annotation currently displays.
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenEditPanel {
    /// `nl` (default) or `cmd`.
    pub target: Option<String>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitEdit {
    pub edited: String,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitComment {
    pub comment: String,
}

/* --------------------------------------------------------------------------
   Response bodies
   -------------------------------------------------------------------------- */

/// Controls one visible entry offers to the viewer.
#[derive(Debug, Serialize)]
pub struct EntryControlsItem {
    pub entry: EntryIndex,
    #[serde(flatten)]
    pub controls: EntryControls,
}

/// State of a mounted annotation plus its rendered markup.
#[derive(Debug, Serialize)]
pub struct AnnotationSnapshot {
    pub annotation: AnnotationView,
    pub controls: Vec<EntryControlsItem>,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct EditSubmitted {
    /// `unchanged` or `submitted`.
    pub outcome: &'static str,
    pub entry: Option<EntryIndex>,
    pub annotation: AnnotationSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ReplySubmitted {
    pub entry: EntryIndex,
    pub annotation: AnnotationSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ControlsRefreshed {
    /// `None` when the backend reported an unknown status.
    pub status: Option<UpdateStatus>,
    pub annotation: AnnotationSnapshot,
}

/* --------------------------------------------------------------------------
   Helpers
   -------------------------------------------------------------------------- */

async fn lookup(state: &AppState, viewer: &Viewer, annotation_id: &str) -> AppResult<AnnotationHandle> {
    Ok(state
        .widget
        .handle(&viewer.access_code, annotation_id)
        .await?)
}

async fn snapshot(handle: &AnnotationHandle) -> AnnotationSnapshot {
    let view = handle.snapshot().await;
    let html = render_annotation(&view);
    let controls = view
        .thread
        .visible_entries()
        .map(|entry| EntryControlsItem {
            entry: entry.index,
            controls: view.controls(entry),
        })
        .collect();
    AnnotationSnapshot {
        annotation: view,
        controls,
        html,
    }
}

async fn snapshot_response(handle: &AnnotationHandle) -> Json<DataResponse<AnnotationSnapshot>> {
    Json(DataResponse {
        data: snapshot(handle).await,
    })
}

/* --------------------------------------------------------------------------
   Mounting
   -------------------------------------------------------------------------- */

/// POST /annotations
///
/// Mount an annotation for the viewer and load its existing updates.
pub async fn mount_annotation(
    viewer: Viewer,
    State(state): State<AppState>,
    Json(input): Json<MountAnnotation>,
) -> AppResult<impl IntoResponse> {
    if input.annotation_id.trim().is_empty() {
        return Err(AppError::BadRequest("annotation_id must not be empty".into()));
    }
    let handle = state
        .widget
        .mount(&viewer.access_code, &input.annotation_id, &input.text)
        .await;
    Ok((StatusCode::CREATED, snapshot_response(&handle).await))
}

/// GET /annotations/{id}
pub async fn get_annotation(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(annotation_id): Path<AnnotationId>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    Ok(snapshot_response(&handle).await)
}

/// GET /annotations/{id}/html
pub async fn get_annotation_html(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(annotation_id): Path<AnnotationId>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    Ok(Html(handle.render().await))
}

/// DELETE /annotations/{id}
pub async fn unmount_annotation(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(annotation_id): Path<AnnotationId>,
) -> AppResult<StatusCode> {
    if state
        .widget
        .unmount(&viewer.access_code, &annotation_id)
        .await
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Annotation",
            id: annotation_id,
        }))
    }
}

/* --------------------------------------------------------------------------
   Change-and-comment
   -------------------------------------------------------------------------- */

/// POST /annotations/{id}/edit
pub async fn open_edit_panel(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(annotation_id): Path<AnnotationId>,
    Json(input): Json<OpenEditPanel>,
) -> AppResult<impl IntoResponse> {
    let target = match input.target.as_deref() {
        Some(t) => EditTarget::from_str(t)?,
        None => EditTarget::Nl,
    };
    let placeholder = input.placeholder.as_deref().unwrap_or(EDIT_PLACEHOLDER);
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    handle
        .open_change_and_comment_panel(target, placeholder)
        .await?;
    Ok(snapshot_response(&handle).await)
}

/// PUT /annotations/{id}/edit
pub async fn submit_edit(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(annotation_id): Path<AnnotationId>,
    Json(input): Json<SubmitEdit>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    let outcome = handle
        .submit_change_and_comment(&input.edited, &input.comment)
        .await?;
    let (outcome, entry) = match outcome {
        EditOutcome::Unchanged => ("unchanged", None),
        EditOutcome::Submitted(index) => ("submitted", Some(index)),
    };
    Ok(Json(DataResponse {
        data: EditSubmitted {
            outcome,
            entry,
            annotation: snapshot(&handle).await,
        },
    }))
}

/// DELETE /annotations/{id}/edit
pub async fn cancel_edit_panel(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(annotation_id): Path<AnnotationId>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    handle.cancel_change_and_comment().await;
    Ok(snapshot_response(&handle).await)
}

/* --------------------------------------------------------------------------
   Entry actions
   -------------------------------------------------------------------------- */

/// POST /annotations/{id}/entries/{index}/reject
///
/// Opens the rejection panel; the rejection is sent on submit.
pub async fn open_rejection_panel(
    viewer: Viewer,
    State(state): State<AppState>,
    Path((annotation_id, index)): Path<(AnnotationId, EntryIndex)>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    handle.reject_update(index).await?;
    Ok(snapshot_response(&handle).await)
}

/// PUT /annotations/{id}/entries/{index}/reject
pub async fn submit_rejection(
    viewer: Viewer,
    State(state): State<AppState>,
    Path((annotation_id, index)): Path<(AnnotationId, EntryIndex)>,
    Json(input): Json<SubmitComment>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    let entry = handle.submit_comment_panel(index, &input.comment).await?;
    Ok(Json(DataResponse {
        data: ReplySubmitted {
            entry,
            annotation: snapshot(&handle).await,
        },
    }))
}

/// DELETE /annotations/{id}/entries/{index}/reject
pub async fn cancel_rejection_panel(
    viewer: Viewer,
    State(state): State<AppState>,
    Path((annotation_id, index)): Path<(AnnotationId, EntryIndex)>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    handle.cancel_comment_panel(index).await?;
    Ok(snapshot_response(&handle).await)
}

/// POST /annotations/{id}/entries/{index}/accept
pub async fn accept_update(
    viewer: Viewer,
    State(state): State<AppState>,
    Path((annotation_id, index)): Path<(AnnotationId, EntryIndex)>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    handle.accept_update(index).await?;
    Ok(snapshot_response(&handle).await)
}

/// POST /annotations/{id}/entries/{index}/retract
pub async fn retract_update(
    viewer: Viewer,
    State(state): State<AppState>,
    Path((annotation_id, index)): Path<(AnnotationId, EntryIndex)>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    handle.retract_update(index).await?;
    Ok(snapshot_response(&handle).await)
}

/// POST /annotations/{id}/entries/{index}/refresh
///
/// Re-run the status lookup of an entry.
pub async fn refresh_entry(
    viewer: Viewer,
    State(state): State<AppState>,
    Path((annotation_id, index)): Path<(AnnotationId, EntryIndex)>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    let status = handle.initialize_comment_controls(index).await?;
    Ok(Json(DataResponse {
        data: ControlsRefreshed {
            status,
            annotation: snapshot(&handle).await,
        },
    }))
}

/// DELETE /annotations/{id}/notice
pub async fn dismiss_notice(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(annotation_id): Path<AnnotationId>,
) -> AppResult<impl IntoResponse> {
    let handle = lookup(&state, &viewer, &annotation_id).await?;
    handle.dismiss_notice().await;
    Ok(snapshot_response(&handle).await)
}
