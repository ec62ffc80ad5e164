//! Router construction for the sender service.

use crate::dispatcher::MessageDispatcher;
use crate::handlers::{handle_health, handle_message_status, handle_root, handle_send_message};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
pub struct AppState {
    pub dispatcher: MessageDispatcher,
}

impl AppState {
    pub fn new(dispatcher: MessageDispatcher) -> Arc<Self> {
        Arc::new(Self { dispatcher })
    }

    /// App id this service runs as.
    pub fn service_id(&self) -> &str {
        self.dispatcher.service_id()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handle_health))
        .route("/", get(handle_root))
        .route("/send-message", post(handle_send_message))
        .route("/messages/status/:message_id", get(handle_message_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
