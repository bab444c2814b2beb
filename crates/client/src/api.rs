//! REST client for the annotation backend.
//!
//! Wraps the backend's GET endpoints (`submit_annotation_update`,
//! `accept_update`, `reject_update`, `retract_update`, `get_update_status`,
//! `get_relevant_updates`) using [`reqwest`]. The viewer is identified to the
//! backend by the `access_code` cookie.

use std::time::Duration;

use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tellina_core::update::{
    STATUS_ACCEPT_SUCCESS, STATUS_REJECT_SUCCESS, STATUS_RETRACT_SUCCESS, STATUS_SAVE_SUCCESS,
};

use crate::messages::{
    AcceptBody, AcceptedUpdate, RelevantUpdate, RelevantUpdatesBody, StatusBody, SubmitBody,
    SubmitUpdate, SubmittedUpdate, UpdateStatusBody,
};

/// HTTP client for one annotation backend.
#[derive(Debug, Clone)]
pub struct AnnotationApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the backend API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend answered 2xx but its `status` field did not report success.
    #[error("{endpoint} returned status {actual:?}, expected {expected}")]
    UnexpectedStatus {
        endpoint: &'static str,
        expected: &'static str,
        actual: Option<String>,
    },

    /// A success response lacked a field the widget relies on.
    #[error("{endpoint} response is missing '{field}'")]
    MissingField {
        endpoint: &'static str,
        field: &'static str,
    },
}

impl ApiError {
    /// Whether the failure happened before any usable response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

impl AnnotationApi {
    /// Create a client with a request timeout.
    ///
    /// * `base_url` - Backend root, e.g. `http://host:8000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET reject_update?update_id=..`
    ///
    /// The backend may omit `status`; only an explicit non-success status
    /// is treated as a failure.
    pub async fn reject_update(&self, viewer: &str, update_id: &str) -> Result<(), ApiError> {
        const ENDPOINT: &str = "reject_update";
        let body: StatusBody = self.get(ENDPOINT, viewer, &[("update_id", update_id)]).await?;
        if matches!(body.status.as_deref(), None | Some(STATUS_REJECT_SUCCESS)) {
            Ok(())
        } else {
            Err(unexpected(ENDPOINT, STATUS_REJECT_SUCCESS, body.status))
        }
    }

    /// `GET submit_annotation_update?annotation_id=..&update=..&comment=..[&update_id=..]`
    pub async fn submit_annotation_update(
        &self,
        viewer: &str,
        request: &SubmitUpdate,
    ) -> Result<SubmittedUpdate, ApiError> {
        const ENDPOINT: &str = "submit_annotation_update";
        let body: SubmitBody = self.get(ENDPOINT, viewer, request).await?;
        expect_status(ENDPOINT, STATUS_SAVE_SUCCESS, body.status)?;
        Ok(SubmittedUpdate {
            update_id: body.update_id.ok_or(missing(ENDPOINT, "update_id"))?,
            access_code: body.access_code.ok_or(missing(ENDPOINT, "access_code"))?,
            submission_time: body
                .submission_time
                .ok_or(missing(ENDPOINT, "submission_time"))?,
        })
    }

    /// `GET get_update_status?update_id=..`, returning the raw status string.
    pub async fn get_update_status(&self, viewer: &str, update_id: &str) -> Result<String, ApiError> {
        const ENDPOINT: &str = "get_update_status";
        let body: UpdateStatusBody = self.get(ENDPOINT, viewer, &[("update_id", update_id)]).await?;
        body.update_status.ok_or(missing(ENDPOINT, "update_status"))
    }

    /// `GET accept_update?update_id=..`
    pub async fn accept_update(&self, viewer: &str, update_id: &str) -> Result<AcceptedUpdate, ApiError> {
        const ENDPOINT: &str = "accept_update";
        let body: AcceptBody = self.get(ENDPOINT, viewer, &[("update_id", update_id)]).await?;
        expect_status(ENDPOINT, STATUS_ACCEPT_SUCCESS, body.status)?;
        Ok(AcceptedUpdate {
            updated_str: body.updated_str.ok_or(missing(ENDPOINT, "updated_str"))?,
            old_annotation_nl: body.old_annotation_nl,
        })
    }

    /// `GET retract_update?update_id=..`
    pub async fn retract_update(&self, viewer: &str, update_id: &str) -> Result<(), ApiError> {
        const ENDPOINT: &str = "retract_update";
        let body: StatusBody = self.get(ENDPOINT, viewer, &[("update_id", update_id)]).await?;
        expect_status(ENDPOINT, STATUS_RETRACT_SUCCESS, body.status)
    }

    /// `GET get_relevant_updates?annotation_id=..`
    pub async fn get_relevant_updates(
        &self,
        viewer: &str,
        annotation_id: &str,
    ) -> Result<Vec<RelevantUpdate>, ApiError> {
        const ENDPOINT: &str = "get_relevant_updates";
        let body: RelevantUpdatesBody = self
            .get(ENDPOINT, viewer, &[("annotation_id", annotation_id)])
            .await?;
        Ok(body.update_list)
    }

    // ---- private helpers ----

    async fn get<Q, T>(&self, endpoint: &'static str, viewer: &str, query: &Q) -> Result<T, ApiError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(endpoint, base_url = %self.base_url, "Calling annotation backend");
        let response = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .header(COOKIE, format!("access_code={viewer}"))
            .query(query)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn expect_status(
    endpoint: &'static str,
    expected: &'static str,
    actual: Option<String>,
) -> Result<(), ApiError> {
    if actual.as_deref() == Some(expected) {
        Ok(())
    } else {
        Err(unexpected(endpoint, expected, actual))
    }
}

fn unexpected(endpoint: &'static str, expected: &'static str, actual: Option<String>) -> ApiError {
    ApiError::UnexpectedStatus {
        endpoint,
        expected,
        actual,
    }
}

fn missing(endpoint: &'static str, field: &'static str) -> ApiError {
    ApiError::MissingField { endpoint, field }
}
