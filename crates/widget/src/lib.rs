//! Comment-and-review widget for annotation updates.
//!
//! Mounts annotations per viewer, drives the open / accept / reject /
//! retract workflow against an [`tellina_client::UpdateBackend`], and keeps
//! each annotation's view ready for rendering.

pub mod error;
pub mod registry;
pub mod widget;

pub use error::WidgetError;
pub use widget::{AnnotationHandle, AnnotationUpdateWidget, EditOutcome};
