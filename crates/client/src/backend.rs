//! Object-safe seam between the widget and the annotation backend.
//!
//! The widget only talks to [`UpdateBackend`]; [`AnnotationApi`] is the
//! production implementation and tests substitute an in-memory one.

use async_trait::async_trait;

use crate::api::{AnnotationApi, ApiError};
use crate::messages::{AcceptedUpdate, RelevantUpdate, SubmitUpdate, SubmittedUpdate};

#[async_trait]
pub trait UpdateBackend: Send + Sync {
    async fn reject_update(&self, viewer: &str, update_id: &str) -> Result<(), ApiError>;

    async fn submit_annotation_update(
        &self,
        viewer: &str,
        request: &SubmitUpdate,
    ) -> Result<SubmittedUpdate, ApiError>;

    async fn get_update_status(&self, viewer: &str, update_id: &str) -> Result<String, ApiError>;

    async fn accept_update(&self, viewer: &str, update_id: &str)
        -> Result<AcceptedUpdate, ApiError>;

    async fn retract_update(&self, viewer: &str, update_id: &str) -> Result<(), ApiError>;

    async fn get_relevant_updates(
        &self,
        viewer: &str,
        annotation_id: &str,
    ) -> Result<Vec<RelevantUpdate>, ApiError>;
}

#[async_trait]
impl UpdateBackend for AnnotationApi {
    async fn reject_update(&self, viewer: &str, update_id: &str) -> Result<(), ApiError> {
        AnnotationApi::reject_update(self, viewer, update_id).await
    }

    async fn submit_annotation_update(
        &self,
        viewer: &str,
        request: &SubmitUpdate,
    ) -> Result<SubmittedUpdate, ApiError> {
        AnnotationApi::submit_annotation_update(self, viewer, request).await
    }

    async fn get_update_status(&self, viewer: &str, update_id: &str) -> Result<String, ApiError> {
        AnnotationApi::get_update_status(self, viewer, update_id).await
    }

    async fn accept_update(
        &self,
        viewer: &str,
        update_id: &str,
    ) -> Result<AcceptedUpdate, ApiError> {
        AnnotationApi::accept_update(self, viewer, update_id).await
    }

    async fn retract_update(&self, viewer: &str, update_id: &str) -> Result<(), ApiError> {
        AnnotationApi::retract_update(self, viewer, update_id).await
    }

    async fn get_relevant_updates(
        &self,
        viewer: &str,
        annotation_id: &str,
    ) -> Result<Vec<RelevantUpdate>, ApiError> {
        AnnotationApi::get_relevant_updates(self, viewer, annotation_id).await
    }
}
