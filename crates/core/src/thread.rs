//! Comment thread of an annotation: the ordered list of updates shown under
//! it, plus the rules deciding which controls each entry offers.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{AccessCode, EntryIndex, UpdateId};
use crate::update::{UpdateAction, UpdateStatus};

/// Who created a thread entry, used as the entry's style tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryTag {
    #[serde(rename = "by-author")]
    ByAuthor,
    #[serde(rename = "by-judger")]
    ByJudger,
}

impl EntryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ByAuthor => "by-author",
            Self::ByJudger => "by-judger",
        }
    }
}

/// Fields of an entry about to be appended. The display index is assigned
/// by [`CommentThread::append_comment_entry`].
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub backend_id: UpdateId,
    pub proposer_id: AccessCode,
    pub submission_time: String,
    pub text: String,
    pub comment: String,
    pub tag: EntryTag,
}

/// A single update as displayed in the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadEntry {
    pub index: EntryIndex,
    pub backend_id: UpdateId,
    pub proposer_id: AccessCode,
    pub submission_time: String,
    pub text: String,
    pub comment: String,
    pub tag: EntryTag,
    /// `None` until the status lookup has completed.
    pub status: Option<UpdateStatus>,
    pub hidden: bool,
}

impl ThreadEntry {
    pub fn is_open(&self) -> bool {
        self.status.is_some_and(|s| s.is_open())
    }
}

/// Controls rendered on a thread entry for a given viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryControls {
    /// Status unknown or resolved.
    Inert,
    /// Viewer is not the proposer.
    Review {
        reject_enabled: bool,
        change_enabled: bool,
    },
    /// Viewer proposed this update.
    Retract,
}

/// Append-only list of thread entries with a monotonic display counter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentThread {
    entries: Vec<ThreadEntry>,
    next_index: EntryIndex,
}

impl CommentThread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end of the thread and return its display index.
    ///
    /// Indices come from a counter that only grows, so an index is never
    /// handed out twice even after entries are removed.
    pub fn append_comment_entry(&mut self, entry: NewEntry) -> EntryIndex {
        let index = self.next_index;
        self.next_index += 1;
        self.entries.push(ThreadEntry {
            index,
            backend_id: entry.backend_id,
            proposer_id: entry.proposer_id,
            submission_time: entry.submission_time,
            text: entry.text,
            comment: entry.comment,
            tag: entry.tag,
            status: None,
            hidden: false,
        });
        index
    }

    pub fn entries(&self) -> &[ThreadEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index the next appended entry will receive.
    pub fn next_index(&self) -> EntryIndex {
        self.next_index
    }

    pub fn get(&self, index: EntryIndex) -> Result<&ThreadEntry, CoreError> {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .ok_or_else(|| entry_not_found(index))
    }

    fn get_mut(&mut self, index: EntryIndex) -> Result<&mut ThreadEntry, CoreError> {
        self.entries
            .iter_mut()
            .find(|e| e.index == index)
            .ok_or_else(|| entry_not_found(index))
    }

    /// Record the status reported by the backend for an entry.
    pub fn set_status(&mut self, index: EntryIndex, status: UpdateStatus) -> Result<(), CoreError> {
        self.get_mut(index)?.status = Some(status);
        Ok(())
    }

    /// Apply an action to an entry's status.
    ///
    /// An entry whose status has not been looked up yet cannot transition.
    pub fn transition(
        &mut self,
        index: EntryIndex,
        action: UpdateAction,
    ) -> Result<UpdateStatus, CoreError> {
        let entry = self.get_mut(index)?;
        let current = entry.status.ok_or_else(|| {
            CoreError::Conflict(format!(
                "Status of update {} is not known yet",
                entry.backend_id
            ))
        })?;
        let next = current.apply(action)?;
        entry.status = Some(next);
        Ok(next)
    }

    /// Mark an entry accepted and hide it. Sibling entries are untouched.
    pub fn mark_accepted(&mut self, index: EntryIndex) -> Result<(), CoreError> {
        self.transition(index, UpdateAction::Accept)?;
        self.get_mut(index)?.hidden = true;
        Ok(())
    }

    /// Mark an entry rejected; it stays visible but loses its controls.
    pub fn mark_rejected(&mut self, index: EntryIndex) -> Result<(), CoreError> {
        self.transition(index, UpdateAction::Reject)?;
        Ok(())
    }

    /// Retract an entry and remove it from the thread.
    pub fn remove_retracted(&mut self, index: EntryIndex) -> Result<ThreadEntry, CoreError> {
        self.transition(index, UpdateAction::Retract)?;
        let pos = self
            .entries
            .iter()
            .position(|e| e.index == index)
            .ok_or_else(|| entry_not_found(index))?;
        Ok(self.entries.remove(pos))
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = &ThreadEntry> {
        self.entries.iter().filter(|e| !e.hidden)
    }
}

fn entry_not_found(index: EntryIndex) -> CoreError {
    CoreError::NotFound {
        entity: "ThreadEntry",
        id: index.to_string(),
    }
}

/// Derive the controls an entry shows to `viewer`.
///
/// `panel_open` is whether a rejection panel is already open on the entry;
/// the Reject control is disabled while it is. The Change control is never
/// enabled.
pub fn controls_for(entry: &ThreadEntry, viewer: &str, panel_open: bool) -> EntryControls {
    if !entry.is_open() || entry.hidden {
        return EntryControls::Inert;
    }
    if entry.proposer_id == viewer {
        EntryControls::Retract
    } else {
        EntryControls::Review {
            reject_enabled: !panel_open,
            change_enabled: false,
        }
    }
}

/// Check that `viewer` may perform `action` on `entry`.
///
/// Retract is reserved to the proposer; accept and reject to everyone else.
pub fn authorize(entry: &ThreadEntry, viewer: &str, action: UpdateAction) -> Result<(), CoreError> {
    let is_proposer = entry.proposer_id == viewer;
    match action {
        UpdateAction::Retract if !is_proposer => Err(CoreError::Forbidden(
            "Only the proposer can retract an update".to_string(),
        )),
        UpdateAction::Accept | UpdateAction::Reject if is_proposer => Err(CoreError::Forbidden(
            format!("The proposer cannot {} their own update", action.as_str()),
        )),
        _ => Ok(()),
    }
}
