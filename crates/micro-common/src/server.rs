//! HTTP server bootstrap and error responses shared by both services.

use crate::{MicroError, Result};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Error returned by handlers, rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }
}

impl From<MicroError> for ApiError {
    fn from(err: MicroError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = rejection.body_text();
        warn!(status = rejection.status().as_u16(), error = %detail, "Rejected request body");
        Self::new(rejection.status(), detail)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let detail = rejection.body_text();
        warn!(status = rejection.status().as_u16(), error = %detail, "Rejected query string");
        Self::new(rejection.status(), detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// A server running in a background task.
pub struct RunningServer {
    /// The bound address; differs from the requested one when port 0 was asked for.
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl RunningServer {
    /// Wait until the server has shut down.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "Server task failed");
        }
    }

    /// Stop serving immediately.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Bind `host:port` and serve `router` until `shutdown` resolves.
pub async fn start_server<F>(
    router: Router,
    host: &str,
    port: u16,
    shutdown: F,
) -> Result<RunningServer>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| MicroError::Io {
            message: format!("Failed to bind {}:{}: {}", host, port, e),
            source: Some(e),
        })?;
    let addr = listener.local_addr()?;

    info!(%addr, "Server listening");

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!(error = %e, "Server error");
        }
    });

    Ok(RunningServer { addr, task })
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
