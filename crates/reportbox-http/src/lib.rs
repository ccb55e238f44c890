//! Reportbox HTTP
//!
//! Thin axum adapter over the archive store. Route handlers only translate
//! between HTTP and [`reportbox_artifact::Store`]; validation, naming and
//! lookup all live in the store.
//!
//! Routes:
//! - POST /api/upload — multipart form with `file` and `reportId`
//! - GET  /api/download/{report_id} — first archive stored for the report
//! - GET  /health — liveness probe

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router.
///
/// `max_upload_bytes` caps the request body size for every route.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
  Router::new()
    .merge(routes::router())
    .layer(DefaultBodyLimit::max(max_upload_bytes))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Bind `addr` and serve the router until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after shutdown is signalled.
pub async fn serve<F>(addr: SocketAddr, app: Router, shutdown: F) -> std::io::Result<()>
where
  F: Future<Output = ()> + Send + 'static,
{
  let listener = TcpListener::bind(addr).await?;
  info!(addr = %listener.local_addr()?, "reportbox listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown)
    .await?;
  info!("reportbox stopped");
  Ok(())
}
