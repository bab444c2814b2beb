use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tellina_api::config::ServerConfig;
use tellina_api::router::build_app_router;
use tellina_api::state::AppState;
use tellina_client::AnnotationApi;
use tellina_widget::AnnotationUpdateWidget;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tellina_api=debug,tellina_widget=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Annotation backend ---
    let backend = AnnotationApi::new(
        config.backend_url.as_str(),
        Duration::from_secs(config.backend_timeout_secs),
    )
    .expect("Failed to build annotation backend client");
    tracing::info!(backend_url = %backend.base_url(), "Annotation backend client created");

    let widget = Arc::new(AnnotationUpdateWidget::new(Arc::new(backend)));

    // Unmount annotations whose page has gone away (checks once a minute).
    let max_idle = Duration::from_secs(config.annotation_idle_secs);
    let sweeper_widget = Arc::clone(&widget);
    let sweeper_handle = tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            let evicted = sweeper_widget.evict_idle(max_idle).await;
            if evicted > 0 {
                tracing::info!(evicted, "Evicted idle annotations");
            }
        }
    });

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        widget,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse().expect("Invalid HOST"), config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    sweeper_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
