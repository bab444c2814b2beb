//! Shared helpers for widget integration tests.
//!
//! [`MockBackend`] is an in-memory annotation backend. It keeps update
//! statuses and texts the way the real backend does, records every call
//! together with the viewer that made it, and can be told to fail or stall
//! individual endpoints.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tellina_client::messages::{AcceptedUpdate, RelevantUpdate, SubmitUpdate, SubmittedUpdate};
use tellina_client::{ApiError, UpdateBackend};
use tellina_widget::AnnotationUpdateWidget;

pub const AUTHOR: &str = "author";
pub const JUDGE: &str = "judge";
pub const ANNOTATION: &str = "A123";
pub const ANNOTATION_TEXT: &str = "find files";
pub const LONG_COMMENT: &str = "This is a sufficiently long comment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Reject(String),
    Submit(SubmitUpdate),
    Status(String),
    Accept(String),
    Retract(String),
    Relevant(String),
}

#[derive(Default)]
struct MockState {
    author: String,
    updates: Vec<RelevantUpdate>,
    statuses: HashMap<String, String>,
    next_ids: VecDeque<String>,
    issued: u32,
    failing: HashSet<&'static str>,
    delay: Option<Duration>,
}

#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<(String, Call)>>,
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Backend whose annotations were written by `author`.
    pub fn new(author: &str) -> Arc<Self> {
        let backend = Self::default();
        backend.state().author = author.to_string();
        Arc::new(backend)
    }

    /// Add an existing update proposed by `proposer`.
    pub fn seed(&self, update_id: &str, proposer: &str, text: &str, status: &str) {
        let mut state = self.state();
        let author = state.author.clone();
        state.updates.push(RelevantUpdate {
            update_id: update_id.to_string(),
            annotation_access_code: author,
            access_code: proposer.to_string(),
            submission_time: "2026-01-01 09:00".to_string(),
            update_str: text.to_string(),
            comment_str: "the original misses the extension".to_string(),
        });
        state.statuses.insert(update_id.to_string(), status.to_string());
    }

    /// Id handed out by the next successful submission.
    pub fn next_update_id(&self, update_id: &str) {
        self.state().next_ids.push_back(update_id.to_string());
    }

    pub fn set_status(&self, update_id: &str, status: &str) {
        self.state()
            .statuses
            .insert(update_id.to_string(), status.to_string());
    }

    pub fn status(&self, update_id: &str) -> Option<String> {
        self.state().statuses.get(update_id).cloned()
    }

    /// Make `endpoint` answer with a server error.
    pub fn fail(&self, endpoint: &'static str) {
        self.state().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.state().failing.remove(endpoint);
    }

    /// Stall every mutating endpoint for `delay`.
    pub fn stall(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn calls_by(&self, viewer: &str) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(v, _)| v == viewer)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Calls other than status lookups and thread loads.
    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Status(_) | Call::Relevant(_)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn record(&self, viewer: &str, call: Call) {
        self.calls.lock().unwrap().push((viewer.to_string(), call));
    }

    async fn pause(&self) {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self, endpoint: &'static str) -> Result<(), ApiError> {
        if self.state().failing.contains(endpoint) {
            return Err(ApiError::ApiError {
                status: 500,
                body: format!("{endpoint} failed"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UpdateBackend for MockBackend {
    async fn reject_update(&self, viewer: &str, update_id: &str) -> Result<(), ApiError> {
        self.record(viewer, Call::Reject(update_id.to_string()));
        self.pause().await;
        self.check("reject_update")?;
        self.set_status(update_id, "rejected");
        Ok(())
    }

    async fn submit_annotation_update(
        &self,
        viewer: &str,
        request: &SubmitUpdate,
    ) -> Result<SubmittedUpdate, ApiError> {
        self.record(viewer, Call::Submit(request.clone()));
        self.pause().await;
        self.check("submit_annotation_update")?;

        let mut state = self.state();
        state.issued += 1;
        let issued = state.issued;
        let update_id = state
            .next_ids
            .pop_front()
            .unwrap_or_else(|| format!("U{}", 100 + issued));
        let submission_time = format!("2026-01-02 10:{issued:02}");
        let author = state.author.clone();
        state.updates.push(RelevantUpdate {
            update_id: update_id.clone(),
            annotation_access_code: author,
            access_code: viewer.to_string(),
            submission_time: submission_time.clone(),
            update_str: request.update.clone(),
            comment_str: request.comment.clone(),
        });
        state.statuses.insert(update_id.clone(), "open".to_string());

        Ok(SubmittedUpdate {
            update_id,
            access_code: viewer.to_string(),
            submission_time,
        })
    }

    async fn get_update_status(&self, viewer: &str, update_id: &str) -> Result<String, ApiError> {
        self.record(viewer, Call::Status(update_id.to_string()));
        self.check("get_update_status")?;
        Ok(self.status(update_id).unwrap_or_else(|| "open".to_string()))
    }

    async fn accept_update(&self, viewer: &str, update_id: &str) -> Result<AcceptedUpdate, ApiError> {
        self.record(viewer, Call::Accept(update_id.to_string()));
        self.pause().await;
        self.check("accept_update")?;
        self.set_status(update_id, "accepted");
        let updated_str = self
            .state()
            .updates
            .iter()
            .find(|u| u.update_id == update_id)
            .map(|u| u.update_str.clone())
            .unwrap_or_else(|| "accepted text".to_string());
        Ok(AcceptedUpdate {
            updated_str,
            old_annotation_nl: None,
        })
    }

    async fn retract_update(&self, viewer: &str, update_id: &str) -> Result<(), ApiError> {
        self.record(viewer, Call::Retract(update_id.to_string()));
        self.pause().await;
        self.check("retract_update")?;
        self.set_status(update_id, "retracted");
        Ok(())
    }

    async fn get_relevant_updates(
        &self,
        viewer: &str,
        annotation_id: &str,
    ) -> Result<Vec<RelevantUpdate>, ApiError> {
        self.record(viewer, Call::Relevant(annotation_id.to_string()));
        self.check("get_relevant_updates")?;
        let state = self.state();
        Ok(state
            .updates
            .iter()
            .filter(|u| state.statuses.get(&u.update_id).map(String::as_str) != Some("retracted"))
            .cloned()
            .collect())
    }
}

/// Widget over `backend`.
pub fn widget(backend: &Arc<MockBackend>) -> AnnotationUpdateWidget {
    AnnotationUpdateWidget::new(backend.clone())
}
