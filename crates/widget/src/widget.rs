//! Annotation update widget.
//!
//! [`AnnotationUpdateWidget`] owns the mounted annotations and hands out
//! [`AnnotationHandle`]s. Every mutating operation on a handle runs in three
//! steps: validate against a read snapshot of the view, talk to the backend
//! with no view lock held, then apply the confirmed transition under a short
//! write lock. The annotation's operation queue is held throughout, so two
//! operations on one annotation never interleave while rendering stays
//! available.
//!
//! Operations that talk to the backend run on a task of their own. Dropping
//! the caller's future (a request timeout, a client gone away) leaves the
//! operation running until its outcome is applied to the view.
//!
//! Failed operations leave the view untouched apart from a notice describing
//! the failure, and return the error to the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tellina_client::messages::{RelevantUpdate, SubmitUpdate};
use tellina_client::UpdateBackend;
use tellina_core::error::CoreError;
use tellina_core::panel::{EditTarget, PanelKey};
use tellina_core::render::render_annotation;
use tellina_core::thread::{EntryTag, NewEntry};
use tellina_core::types::{AccessCode, EntryIndex, UpdateId};
use tellina_core::update::{
    is_vacuous_edit, validate_comment, CommentPurpose, UpdateAction, UpdateStatus,
    REJECT_PLACEHOLDER,
};
use tellina_core::view::AnnotationView;

use crate::error::WidgetError;
use crate::registry::{AnnotationSlot, SlotKey, WidgetRegistry};

/// Result of submitting a change-and-comment panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edited text equals the current text; nothing was sent.
    Unchanged,
    /// The edit was saved and appended at this index.
    Submitted(EntryIndex),
}

pub struct AnnotationUpdateWidget {
    backend: Arc<dyn UpdateBackend>,
    registry: WidgetRegistry,
}

impl AnnotationUpdateWidget {
    pub fn new(backend: Arc<dyn UpdateBackend>) -> Self {
        Self {
            backend,
            registry: WidgetRegistry::new(),
        }
    }

    /// Mount an annotation for `viewer` and load its existing updates.
    ///
    /// Mounting an annotation that is already mounted resets its view to
    /// `text` and reloads the thread. A failed load leaves an empty thread
    /// and a notice on the view.
    pub async fn mount(&self, viewer: &str, annotation_id: &str, text: &str) -> AnnotationHandle {
        let slot = self
            .registry
            .get_or_insert_with(SlotKey::new(viewer, annotation_id), || {
                AnnotationView::new(annotation_id, viewer, text)
            })
            .await;
        let handle = AnnotationHandle {
            slot,
            backend: Arc::clone(&self.backend),
        };

        let fresh = AnnotationView::new(annotation_id, viewer, text);
        let loaded = handle
            .detached(move |this| async move {
                *this.slot.view.write().await = fresh;
                this.load_thread().await
            })
            .await;
        match loaded {
            Ok(count) => {
                tracing::info!(annotation_id, viewer, entries = count, "Annotation mounted");
            }
            Err(e) => {
                tracing::warn!(annotation_id, viewer, error = %e, "Thread load failed");
            }
        }
        handle
    }

    /// Handle of an already mounted annotation.
    pub async fn handle(
        &self,
        viewer: &str,
        annotation_id: &str,
    ) -> Result<AnnotationHandle, WidgetError> {
        let slot = self
            .registry
            .get(&SlotKey::new(viewer, annotation_id))
            .await
            .ok_or_else(|| CoreError::NotFound {
                entity: "Annotation",
                id: annotation_id.to_string(),
            })?;
        Ok(AnnotationHandle {
            slot,
            backend: Arc::clone(&self.backend),
        })
    }

    /// Forget a mounted annotation. Returns whether it was mounted.
    pub async fn unmount(&self, viewer: &str, annotation_id: &str) -> bool {
        let removed = self
            .registry
            .remove(&SlotKey::new(viewer, annotation_id))
            .await;
        if removed {
            tracing::info!(annotation_id, viewer, "Annotation unmounted");
        }
        removed
    }

    /// Unmount annotations no request has touched for `max_idle`. Returns
    /// how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let evicted = self.registry.evict_idle(max_idle).await;
        for key in &evicted {
            tracing::debug!(
                annotation_id = %key.annotation_id,
                viewer = %key.viewer,
                "Idle annotation evicted"
            );
        }
        evicted.len()
    }

    pub async fn mounted_count(&self) -> usize {
        self.registry.len().await
    }
}

/// Operations on one mounted annotation.
#[derive(Clone)]
pub struct AnnotationHandle {
    slot: Arc<AnnotationSlot>,
    backend: Arc<dyn UpdateBackend>,
}

impl std::fmt::Debug for AnnotationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationHandle").finish_non_exhaustive()
    }
}

impl AnnotationHandle {
    /// Copy of the current view. Never waits on an in-flight operation.
    pub async fn snapshot(&self) -> AnnotationView {
        self.slot.view.read().await.clone()
    }

    pub async fn render(&self) -> String {
        render_annotation(&*self.slot.view.read().await)
    }

    // -----------------------------------------------------------------------
    // Rejection panel
    // -----------------------------------------------------------------------

    /// Open the rejection panel on an entry, replacing any panel already
    /// open on it.
    pub async fn open_comment_panel(
        &self,
        index: EntryIndex,
        placeholder: &str,
    ) -> Result<(), WidgetError> {
        let _queue = self.slot.ops.lock().await;
        let result = self
            .slot
            .view
            .write()
            .await
            .open_rejection_panel(index, placeholder)
            .map_err(WidgetError::from);
        self.settle(result).await
    }

    /// The Reject control.
    pub async fn reject_update(&self, index: EntryIndex) -> Result<(), WidgetError> {
        self.open_comment_panel(index, REJECT_PLACEHOLDER).await
    }

    pub async fn cancel_comment_panel(&self, index: EntryIndex) -> Result<(), WidgetError> {
        let _queue = self.slot.ops.lock().await;
        let result = self
            .slot
            .view
            .write()
            .await
            .cancel_rejection_panel(index)
            .map_err(WidgetError::from);
        self.settle(result).await
    }

    /// Submit the rejection panel of an entry.
    ///
    /// Rejects the entry's update and saves the comment as a new update
    /// answering it. Returns the index of the appended entry.
    pub async fn submit_comment_panel(
        &self,
        index: EntryIndex,
        comment: &str,
    ) -> Result<EntryIndex, WidgetError> {
        let comment = comment.to_string();
        self.detached(move |this| async move { this.submit_rejection(index, &comment).await })
            .await
    }

    async fn submit_rejection(
        &self,
        index: EntryIndex,
        comment: &str,
    ) -> Result<EntryIndex, WidgetError> {
        let (viewer, target, request) = {
            let view = self.slot.view.read().await;
            view.panels.require(PanelKey::Entry(index))?;
            let entry = view.actionable_entry(index, UpdateAction::Reject)?;
            validate_comment(comment, CommentPurpose::Rejection)?;
            let request = SubmitUpdate {
                annotation_id: view.annotation_id.clone(),
                update: view.text.clone(),
                comment: comment.to_string(),
                update_id: Some(entry.backend_id.clone()),
            };
            (view.viewer.clone(), entry.backend_id.clone(), request)
        };

        let (rejected, saved) = tokio::join!(
            self.backend.reject_update(&viewer, &target),
            self.backend.submit_annotation_update(&viewer, &request),
        );
        let saved = saved?;

        let new_index = {
            let mut view = self.slot.view.write().await;
            let new_index = view.apply_rejection_reply(
                index,
                NewEntry {
                    backend_id: saved.update_id.clone(),
                    proposer_id: saved.access_code,
                    submission_time: saved.submission_time,
                    text: request.update,
                    comment: request.comment,
                    tag: EntryTag::ByAuthor,
                },
            )?;
            if let Err(e) = rejected {
                tracing::warn!(
                    annotation_id = %view.annotation_id,
                    update_id = %target,
                    error = %e,
                    "Reply saved but reject_update failed"
                );
                let err = WidgetError::from(e);
                view.raise(
                    err.notice_kind(),
                    format!("The reply was saved but update {target} was not marked rejected: {err}"),
                );
            }
            tracing::info!(
                annotation_id = %view.annotation_id,
                update_id = %target,
                reply_id = %saved.update_id,
                entry_index = new_index,
                "Update rejected with reply"
            );
            new_index
        };

        self.initialize_after_append(new_index).await;
        Ok(new_index)
    }

    // -----------------------------------------------------------------------
    // Change-and-comment panel
    // -----------------------------------------------------------------------

    /// Switch the annotation into inline editing and open its comment panel.
    ///
    /// Refused while an edit proposed from this view awaits review.
    pub async fn open_change_and_comment_panel(
        &self,
        target: EditTarget,
        placeholder: &str,
    ) -> Result<(), WidgetError> {
        let _queue = self.slot.ops.lock().await;
        let result = self
            .slot
            .view
            .write()
            .await
            .open_edit_panel(target, placeholder)
            .map_err(WidgetError::from);
        self.settle(result).await
    }

    /// Submit an edit of the annotation text with its explanation.
    pub async fn submit_change_and_comment(
        &self,
        edited: &str,
        comment: &str,
    ) -> Result<EditOutcome, WidgetError> {
        let edited = edited.to_string();
        let comment = comment.to_string();
        self.detached(move |this| async move { this.submit_edit(&edited, &comment).await })
            .await
    }

    async fn submit_edit(&self, edited: &str, comment: &str) -> Result<EditOutcome, WidgetError> {
        let (viewer, request) = {
            let view = self.slot.view.read().await;
            view.panels.require(PanelKey::Annotation)?;
            if is_vacuous_edit(&view.text, edited) {
                return Ok(EditOutcome::Unchanged);
            }
            validate_comment(comment, CommentPurpose::Edit)?;
            let request = SubmitUpdate {
                annotation_id: view.annotation_id.clone(),
                update: edited.to_string(),
                comment: comment.to_string(),
                update_id: None,
            };
            (view.viewer.clone(), request)
        };

        let saved = self
            .backend
            .submit_annotation_update(&viewer, &request)
            .await?;

        let new_index = {
            let mut view = self.slot.view.write().await;
            let new_index = view.apply_edit_submitted(NewEntry {
                backend_id: saved.update_id.clone(),
                proposer_id: saved.access_code,
                submission_time: saved.submission_time,
                text: request.update,
                comment: request.comment,
                tag: EntryTag::ByJudger,
            });
            tracing::info!(
                annotation_id = %view.annotation_id,
                update_id = %saved.update_id,
                entry_index = new_index,
                "Edit proposed"
            );
            new_index
        };

        self.initialize_after_append(new_index).await;
        Ok(EditOutcome::Submitted(new_index))
    }

    /// Leave inline editing without sending anything.
    pub async fn cancel_change_and_comment(&self) {
        let _queue = self.slot.ops.lock().await;
        self.slot.view.write().await.cancel_edit_panel();
    }

    // -----------------------------------------------------------------------
    // Entry controls
    // -----------------------------------------------------------------------

    /// Look up an entry's status so its controls can be derived.
    ///
    /// Returns `None` when the backend reports a status this widget does not
    /// know; the entry then stays inert.
    pub async fn initialize_comment_controls(
        &self,
        index: EntryIndex,
    ) -> Result<Option<UpdateStatus>, WidgetError> {
        self.detached(move |this| async move { this.lookup_status(index).await })
            .await
    }

    async fn lookup_status(&self, index: EntryIndex) -> Result<Option<UpdateStatus>, WidgetError> {
        let (viewer, update_id) = {
            let view = self.slot.view.read().await;
            let entry = view.entry(index)?;
            (view.viewer.clone(), entry.backend_id.clone())
        };
        let raw = self.backend.get_update_status(&viewer, &update_id).await?;
        let status = parse_status(&update_id, &raw);
        if let Some(status) = status {
            self.slot.view.write().await.thread.set_status(index, status)?;
        }
        Ok(status)
    }

    /// Status lookup right after an append. The submission already
    /// succeeded, so a failure here only raises a notice.
    async fn initialize_after_append(&self, index: EntryIndex) {
        let result = self.lookup_status(index).await;
        if let Err(e) = self.settle(result).await {
            tracing::warn!(entry_index = index, error = %e, "Control initialisation failed");
        }
    }

    /// Accept an entry's update, replacing the annotation text.
    pub async fn accept_update(&self, index: EntryIndex) -> Result<(), WidgetError> {
        self.detached(move |this| async move { this.accept(index).await })
            .await
    }

    async fn accept(&self, index: EntryIndex) -> Result<(), WidgetError> {
        let (viewer, update_id) = self.actionable(index, UpdateAction::Accept).await?;
        let accepted = self.backend.accept_update(&viewer, &update_id).await?;

        let mut view = self.slot.view.write().await;
        view.apply_accept(index, accepted.updated_str, accepted.old_annotation_nl)?;
        tracing::info!(
            annotation_id = %view.annotation_id,
            update_id = %update_id,
            entry_index = index,
            "Update accepted"
        );
        Ok(())
    }

    /// Withdraw the viewer's own open update.
    pub async fn retract_update(&self, index: EntryIndex) -> Result<(), WidgetError> {
        self.detached(move |this| async move { this.retract(index).await })
            .await
    }

    async fn retract(&self, index: EntryIndex) -> Result<(), WidgetError> {
        let (viewer, update_id) = self.actionable(index, UpdateAction::Retract).await?;
        self.backend.retract_update(&viewer, &update_id).await?;

        let mut view = self.slot.view.write().await;
        view.apply_retract(index)?;
        tracing::info!(
            annotation_id = %view.annotation_id,
            update_id = %update_id,
            entry_index = index,
            "Update retracted"
        );
        Ok(())
    }

    pub async fn dismiss_notice(&self) {
        self.slot.view.write().await.dismiss_notice();
    }

    // -----------------------------------------------------------------------
    // Thread loading
    // -----------------------------------------------------------------------

    /// Append the annotation's existing updates and look up their statuses
    /// concurrently. Returns the number of entries appended.
    ///
    /// Caller holds the operation queue.
    async fn load_thread(&self) -> Result<usize, WidgetError> {
        let (viewer, annotation_id) = {
            let view = self.slot.view.read().await;
            (view.viewer.clone(), view.annotation_id.clone())
        };
        let updates = self
            .backend
            .get_relevant_updates(&viewer, &annotation_id)
            .await?;

        let appended: Vec<(EntryIndex, UpdateId)> = {
            let mut view = self.slot.view.write().await;
            updates
                .into_iter()
                .map(|update| {
                    let update_id = update.update_id.clone();
                    (view.thread.append_comment_entry(loaded_entry(update)), update_id)
                })
                .collect()
        };

        let lookups = appended.iter().map(|(index, update_id)| {
            let viewer = &viewer;
            async move {
                let result = self.backend.get_update_status(viewer, update_id).await;
                (*index, update_id.as_str(), result)
            }
        });
        let results = join_all(lookups).await;

        let mut view = self.slot.view.write().await;
        let mut first_error = None;
        for (index, update_id, result) in results {
            match result {
                Ok(raw) => {
                    if let Some(status) = parse_status(update_id, &raw) {
                        view.thread.set_status(index, status)?;
                    }
                }
                Err(e) => {
                    tracing::warn!(update_id = %update_id, error = %e, "Status lookup failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(appended.len()),
        }
    }

    // ---- private helpers ----

    /// Run `op` behind the operation queue on its own task and settle its
    /// result there. The task outlives the caller's future.
    async fn detached<T, F, Fut>(&self, op: F) -> Result<T, WidgetError>
    where
        T: Send + 'static,
        F: FnOnce(AnnotationHandle) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, WidgetError>> + Send + 'static,
    {
        let this = self.clone();
        let task = tokio::spawn(async move {
            let _queue = this.slot.ops.lock().await;
            let result = op(this.clone()).await;
            this.settle(result).await
        });
        match task.await {
            Ok(result) => result,
            Err(e) => {
                let err = CoreError::Internal(format!("Widget operation aborted: {e}"));
                self.settle(Err(err.into())).await
            }
        }
    }

    /// Viewer and backend id of an entry the viewer may apply `action` to.
    async fn actionable(
        &self,
        index: EntryIndex,
        action: UpdateAction,
    ) -> Result<(AccessCode, UpdateId), WidgetError> {
        let view = self.slot.view.read().await;
        let entry = view.actionable_entry(index, action)?;
        Ok((view.viewer.clone(), entry.backend_id.clone()))
    }

    /// Surface a failed operation as a notice on the view.
    async fn settle<T>(&self, result: Result<T, WidgetError>) -> Result<T, WidgetError> {
        if let Err(e) = &result {
            let mut view = self.slot.view.write().await;
            tracing::warn!(
                annotation_id = %view.annotation_id,
                error = %e,
                "Widget operation failed"
            );
            view.raise(e.notice_kind(), e.notice_message());
        }
        result
    }
}

/// Thread entry for an update loaded from the backend.
fn loaded_entry(update: RelevantUpdate) -> NewEntry {
    let tag = if update.access_code == update.annotation_access_code {
        EntryTag::ByAuthor
    } else {
        EntryTag::ByJudger
    };
    NewEntry {
        backend_id: update.update_id,
        proposer_id: update.access_code,
        submission_time: update.submission_time,
        text: update.update_str,
        comment: update.comment_str,
        tag,
    }
}

fn parse_status(update_id: &str, raw: &str) -> Option<UpdateStatus> {
    match UpdateStatus::from_str(raw) {
        Ok(status) => Some(status),
        Err(_) => {
            tracing::warn!(update_id, status = raw, "Unknown update status; entry left inert");
            None
        }
    }
}
