//! Router assembly and the listening loop.

use super::handlers;
use super::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Listener settings for [`serve`].
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 4000,
            max_upload_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Build the application router with every route nested under `/api`.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    // NOTE: Path params use `:param` syntax (axum 0.7).
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/:job_id", get(handlers::get_job))
        .route("/extract/tabular", post(handlers::extract_tabular))
        .route("/extract/legacy", post(handlers::extract_legacy))
        .route("/extract/remote", post(handlers::extract_remote))
        .route("/analyze/remote", post(handlers::analyze_remote))
        .route("/files", get(handlers::list_files))
        .route("/files/:filename", get(handlers::download_file))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C.
pub async fn serve(options: ServerOptions, state: AppState) -> std::io::Result<()> {
    let app = build_router(state, options.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind((options.host.as_str(), options.port)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}
