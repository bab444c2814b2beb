//! Per-annotation view state.
//!
//! [`AnnotationView`] is the single source of truth the renderer reads.
//! Every method here is a confirmed transition: callers invoke them only
//! after the backend has acknowledged the corresponding request, so a
//! failed request leaves the view exactly as it was.

use serde::Serialize;

use crate::error::CoreError;
use crate::panel::{ComposePanel, EditTarget, PanelKey, PanelKind, PanelSet};
use crate::thread::{authorize, controls_for, CommentThread, EntryControls, NewEntry, ThreadEntry};
use crate::types::{AccessCode, AnnotationId, EntryIndex};
use crate::update::UpdateAction;

/// Whether the annotation text is displayed or being edited inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DisplayMode {
    Viewing,
    Editing { draft: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Local validation failure; nothing was sent.
    Alert,
    /// The request never got a usable response.
    Transport,
    /// The backend answered with a failure.
    Server,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Transport => "transport",
            Self::Server => "server",
        }
    }
}

/// A dismissible message shown above the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationView {
    pub annotation_id: AnnotationId,
    pub viewer: AccessCode,
    /// Text currently displayed for the annotation.
    pub text: String,
    /// Text replaced by the most recent accepted update.
    pub previous_text: Option<String>,
    pub display: DisplayMode,
    /// Whether the inline edit controls are offered.
    pub edit_pair_visible: bool,
    pub thread: CommentThread,
    pub panels: PanelSet,
    pub notice: Option<Notice>,
}

impl AnnotationView {
    pub fn new(
        annotation_id: impl Into<AnnotationId>,
        viewer: impl Into<AccessCode>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            annotation_id: annotation_id.into(),
            viewer: viewer.into(),
            text: text.into(),
            previous_text: None,
            display: DisplayMode::Viewing,
            edit_pair_visible: true,
            thread: CommentThread::new(),
            panels: PanelSet::default(),
            notice: None,
        }
    }

    pub fn entry(&self, index: EntryIndex) -> Result<&ThreadEntry, CoreError> {
        self.thread.get(index)
    }

    /// Controls of an entry for this view's viewer.
    pub fn controls(&self, entry: &ThreadEntry) -> EntryControls {
        controls_for(
            entry,
            &self.viewer,
            self.panels.is_open(PanelKey::Entry(entry.index)),
        )
    }

    /// Look up an entry and check the viewer may apply `action` to it.
    pub fn actionable_entry(
        &self,
        index: EntryIndex,
        action: UpdateAction,
    ) -> Result<&ThreadEntry, CoreError> {
        let entry = self.thread.get(index)?;
        if !entry.is_open() || entry.hidden {
            return Err(CoreError::Conflict(format!(
                "Update {} is not open",
                entry.backend_id
            )));
        }
        authorize(entry, &self.viewer, action)?;
        Ok(entry)
    }

    // ---- panels ----

    /// Open the rejection panel on an open entry the viewer did not propose.
    pub fn open_rejection_panel(
        &mut self,
        index: EntryIndex,
        placeholder: impl Into<String>,
    ) -> Result<(), CoreError> {
        self.actionable_entry(index, UpdateAction::Reject)?;
        self.panels.open(ComposePanel {
            key: PanelKey::Entry(index),
            kind: PanelKind::Rejection,
            placeholder: placeholder.into(),
        });
        Ok(())
    }

    pub fn cancel_rejection_panel(&mut self, index: EntryIndex) -> Result<(), CoreError> {
        let key = PanelKey::Entry(index);
        self.panels.require(key)?;
        self.panels.close(key);
        Ok(())
    }

    /// Switch to inline editing, pre-filled with the current text, and open
    /// the annotation-level panel.
    ///
    /// Refused while a proposed edit awaits review.
    pub fn open_edit_panel(
        &mut self,
        target: EditTarget,
        placeholder: impl Into<String>,
    ) -> Result<(), CoreError> {
        if !self.edit_pair_visible {
            return Err(CoreError::Conflict(
                "An edit of this annotation is already awaiting review".to_string(),
            ));
        }
        self.display = DisplayMode::Editing {
            draft: self.text.clone(),
        };
        self.panels.open(ComposePanel {
            key: PanelKey::Annotation,
            kind: PanelKind::ChangeAndComment { target },
            placeholder: placeholder.into(),
        });
        Ok(())
    }

    /// Drop the edit input and panel, restoring the original display.
    pub fn cancel_edit_panel(&mut self) {
        self.display = DisplayMode::Viewing;
        self.panels.close(PanelKey::Annotation);
    }

    // ---- confirmed transitions ----

    /// A change-and-comment submission was saved.
    pub fn apply_edit_submitted(&mut self, entry: NewEntry) -> EntryIndex {
        self.display = DisplayMode::Viewing;
        self.edit_pair_visible = false;
        self.panels.close(PanelKey::Annotation);
        self.thread.append_comment_entry(entry)
    }

    /// A rejection reply was saved for entry `index`.
    pub fn apply_rejection_reply(
        &mut self,
        index: EntryIndex,
        reply: NewEntry,
    ) -> Result<EntryIndex, CoreError> {
        self.thread.mark_rejected(index)?;
        self.display = DisplayMode::Viewing;
        self.panels.close(PanelKey::Entry(index));
        Ok(self.thread.append_comment_entry(reply))
    }

    /// Entry `index` was accepted; the backend reported the new text.
    pub fn apply_accept(
        &mut self,
        index: EntryIndex,
        updated_text: String,
        old_text: Option<String>,
    ) -> Result<(), CoreError> {
        self.thread.mark_accepted(index)?;
        let replaced = std::mem::replace(&mut self.text, updated_text);
        self.previous_text = Some(old_text.unwrap_or(replaced));
        self.edit_pair_visible = true;
        self.panels.close(PanelKey::Entry(index));
        Ok(())
    }

    /// Entry `index` was retracted by its proposer.
    pub fn apply_retract(&mut self, index: EntryIndex) -> Result<ThreadEntry, CoreError> {
        let removed = self.thread.remove_retracted(index)?;
        self.edit_pair_visible = true;
        self.panels.close(PanelKey::Entry(index));
        Ok(removed)
    }

    // ---- notices ----

    pub fn raise(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            message: message.into(),
        });
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}
