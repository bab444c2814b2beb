use std::sync::Arc;

use tellina_widget::AnnotationUpdateWidget;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Mounted annotations and the backend they talk to.
    pub widget: Arc<AnnotationUpdateWidget>,
}
