#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tellina_api::config::ServerConfig;
use tellina_api::router::build_app_router;
use tellina_api::state::AppState;
use tellina_client::messages::{AcceptedUpdate, RelevantUpdate, SubmitUpdate, SubmittedUpdate};
use tellina_client::{ApiError, UpdateBackend};
use tellina_widget::AnnotationUpdateWidget;

pub const AUTHOR: &str = "author";
pub const JUDGE: &str = "judge";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        backend_url: "http://backend.test".to_string(),
        backend_timeout_secs: 5,
        annotation_idle_secs: 3600,
    }
}

/// Build the full application router over `backend`, with the same
/// middleware stack production uses.
pub fn build_test_app(backend: Arc<StubBackend>) -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        widget: Arc::new(AnnotationUpdateWidget::new(backend)),
    };
    build_app_router(state, &config)
}

/// Send a request as `viewer` (via the `access_code` cookie), with an
/// optional JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    viewer: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(viewer) = viewer {
        builder = builder.header("cookie", format!("access_code={viewer}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// In-memory annotation backend for one annotation written by [`AUTHOR`].
#[derive(Default)]
pub struct StubBackend {
    updates: Mutex<Vec<RelevantUpdate>>,
    statuses: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<&'static str>>,
    submissions: Mutex<Vec<SubmitUpdate>>,
}

impl StubBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, update_id: &str, proposer: &str, text: &str) {
        self.updates.lock().unwrap().push(RelevantUpdate {
            update_id: update_id.to_string(),
            annotation_access_code: AUTHOR.to_string(),
            access_code: proposer.to_string(),
            submission_time: "2026-01-01 09:00".to_string(),
            update_str: text.to_string(),
            comment_str: "the original misses the extension".to_string(),
        });
        self.set_status(update_id, "open");
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn status(&self, update_id: &str) -> Option<String> {
        self.statuses.lock().unwrap().get(update_id).cloned()
    }

    pub fn submissions(&self) -> Vec<SubmitUpdate> {
        self.submissions.lock().unwrap().clone()
    }

    fn set_status(&self, update_id: &str, status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(update_id.to_string(), status.to_string());
    }

    fn check(&self, endpoint: &'static str) -> Result<(), ApiError> {
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(ApiError::ApiError {
                status: 500,
                body: format!("{endpoint} failed"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UpdateBackend for StubBackend {
    async fn reject_update(&self, _viewer: &str, update_id: &str) -> Result<(), ApiError> {
        self.check("reject_update")?;
        self.set_status(update_id, "rejected");
        Ok(())
    }

    async fn submit_annotation_update(
        &self,
        viewer: &str,
        request: &SubmitUpdate,
    ) -> Result<SubmittedUpdate, ApiError> {
        self.check("submit_annotation_update")?;
        let mut submissions = self.submissions.lock().unwrap();
        submissions.push(request.clone());
        let update_id = format!("U{}", 100 + submissions.len());
        drop(submissions);
        self.seed(&update_id, viewer, &request.update);
        Ok(SubmittedUpdate {
            update_id,
            access_code: viewer.to_string(),
            submission_time: "2026-01-02 10:00".to_string(),
        })
    }

    async fn get_update_status(&self, _viewer: &str, update_id: &str) -> Result<String, ApiError> {
        self.check("get_update_status")?;
        Ok(self.status(update_id).unwrap_or_else(|| "open".to_string()))
    }

    async fn accept_update(&self, _viewer: &str, update_id: &str) -> Result<AcceptedUpdate, ApiError> {
        self.check("accept_update")?;
        self.set_status(update_id, "accepted");
        let updated_str = self
            .updates
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.update_id == update_id)
            .map(|u| u.update_str.clone())
            .unwrap_or_default();
        Ok(AcceptedUpdate {
            updated_str,
            old_annotation_nl: None,
        })
    }

    async fn retract_update(&self, _viewer: &str, update_id: &str) -> Result<(), ApiError> {
        self.check("retract_update")?;
        self.set_status(update_id, "retracted");
        Ok(())
    }

    async fn get_relevant_updates(
        &self,
        _viewer: &str,
        _annotation_id: &str,
    ) -> Result<Vec<RelevantUpdate>, ApiError> {
        self.check("get_relevant_updates")?;
        Ok(self.updates.lock().unwrap().clone())
    }
}
