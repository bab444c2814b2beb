//! HTTP client for the annotation backend.
//!
//! Provides the typed REST wrapper ([`api::AnnotationApi`]), its wire
//! messages, and the [`backend::UpdateBackend`] trait the widget is written
//! against.

pub mod api;
pub mod backend;
pub mod messages;

pub use api::{AnnotationApi, ApiError};
pub use backend::UpdateBackend;
