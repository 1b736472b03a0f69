//! HTTP server for CarbonTwin
//!
//! Routes are grouped into small routers and merged; the shared
//! `CarbonTwinService` is the router state.

mod error;
pub mod realtime;
pub mod routes;

pub use error::ApiError;

use crate::config::ServiceConfig;
use crate::service::{CarbonTwinService, ServiceError};
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub type AppState = Arc<CarbonTwinService>;

/// Errors that stop the server from starting or keep it from running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to initialise service: {0}")]
    Service(#[from] ServiceError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the full application router.
pub fn router(service: AppState) -> Router {
    Router::new()
        .merge(routes::service_routes())
        .merge(routes::twin_routes())
        .merge(routes::marketplace_routes())
        .route("/socket", get(realtime::socket_handler))
        .with_state(service)
        // Raise the extractor cap to match; axum's own default is 2 MB.
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Open storage, build the service and serve until interrupted.
pub async fn run(config: ServiceConfig) -> Result<(), ServerError> {
    let service = Arc::new(CarbonTwinService::from_config(&config)?);
    let app = router(service);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("CarbonTwin API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until the process is killed.
        std::future::pending::<()>().await;
    }
}
