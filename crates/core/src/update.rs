//! Annotation update lifecycle: status values, transitions, and the
//! client-side checks that gate a submission.
//!
//! An update is a proposed replacement for an annotation's text. It is
//! `open` until it is accepted, rejected (which spawns a fresh open update
//! carrying the rejection comment), or retracted by its proposer.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum number of characters in the comment attached to an update.
pub const MIN_COMMENT_LENGTH: usize = 10;

/// Status string returned by `submit_annotation_update` on success.
pub const STATUS_SAVE_SUCCESS: &str = "ANNOTATION_UPDATE_SAVE_SUCCESS";

/// Status string returned by `accept_update` on success.
pub const STATUS_ACCEPT_SUCCESS: &str = "ACCEPT_UPDATE_SUCCESS";

/// Status string returned by `reject_update` on success.
pub const STATUS_REJECT_SUCCESS: &str = "REJECT_UPDATE_SUCCESS";

/// Status string returned by `retract_update` on success.
pub const STATUS_RETRACT_SUCCESS: &str = "RETRACT_UPDATE_SUCCESS";

/// Alert shown when a rejection comment is too short.
pub const REJECTION_COMMENT_TOO_SHORT: &str =
    "Please explain your rejection of the modification in more detail.";

/// Alert shown when an edit justification is too short.
pub const EDIT_COMMENT_TOO_SHORT: &str =
    "Please explain your edits in more detail for the reference of others.";

/// Placeholder of the compose panel opened by the Reject control.
pub const REJECT_PLACEHOLDER: &str = "Leave a comment for rejecting the modification request...";

/// Placeholder of the compose panel opened for an inline edit.
pub const EDIT_PLACEHOLDER: &str = "Explain your edits for the reference of others...";

/// All valid status strings.
const VALID_STATUS_STRINGS: &[&str] = &["open", "accepted", "rejected", "retracted"];

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

/// Server-side status of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Open,
    Accepted,
    Rejected,
    Retracted,
}

/// Reviewer or proposer action applied to an open update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAction {
    Accept,
    Reject,
    Retract,
}

impl UpdateStatus {
    /// Return the status as the lowercase string used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Retracted => "retracted",
        }
    }

    /// Parse a status from the backend's `update_status` string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "open" => Ok(Self::Open),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "retracted" => Ok(Self::Retracted),
            _ => Err(CoreError::Validation(format!(
                "Invalid update status '{s}'. Must be one of: {}",
                VALID_STATUS_STRINGS.join(", ")
            ))),
        }
    }

    /// Whether the update still accepts actions.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Apply an action, returning the resulting status.
    ///
    /// Only an open update can transition; every terminal status rejects
    /// all actions with [`CoreError::Conflict`].
    pub fn apply(self, action: UpdateAction) -> Result<Self, CoreError> {
        match (self, action) {
            (Self::Open, UpdateAction::Accept) => Ok(Self::Accepted),
            (Self::Open, UpdateAction::Reject) => Ok(Self::Rejected),
            (Self::Open, UpdateAction::Retract) => Ok(Self::Retracted),
            (Self::Accepted | Self::Rejected | Self::Retracted, _) => {
                Err(CoreError::Conflict(format!(
                    "Cannot {} an update that is already {}",
                    action.as_str(),
                    self.as_str()
                )))
            }
        }
    }
}

impl UpdateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Retract => "retract",
        }
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Which compose flow a comment belongs to; selects the alert text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentPurpose {
    Rejection,
    Edit,
}

/// Validate that a comment is long enough to be submitted.
///
/// Length is counted in characters. Must be at least
/// [`MIN_COMMENT_LENGTH`].
pub fn validate_comment(comment: &str, purpose: CommentPurpose) -> Result<(), CoreError> {
    if comment.chars().count() < MIN_COMMENT_LENGTH {
        let msg = match purpose {
            CommentPurpose::Rejection => REJECTION_COMMENT_TOO_SHORT,
            CommentPurpose::Edit => EDIT_COMMENT_TOO_SHORT,
        };
        return Err(CoreError::Validation(msg.to_string()));
    }
    Ok(())
}

/// Whether an inline edit leaves the text unchanged.
pub fn is_vacuous_edit(current: &str, edited: &str) -> bool {
    current == edited
}
