//! Router construction for the receiver service.

use crate::handlers::{
    handle_clear_messages, handle_delete_state, handle_echo, handle_get_message, handle_get_state,
    handle_health, handle_list_messages, handle_receive_message, handle_root,
};
use crate::message_log::MessageLog;
use crate::processor::MessageProcessor;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
pub struct AppState {
    pub processor: MessageProcessor,
    pub log: MessageLog,
    pub service_id: String,
}

impl AppState {
    pub fn new(processor: MessageProcessor, service_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            processor,
            log: MessageLog::new(),
            service_id: service_id.into(),
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handle_health))
        .route("/", get(handle_root))
        .route("/receive-message", post(handle_receive_message))
        .route("/messages", get(handle_list_messages).delete(handle_clear_messages))
        .route("/messages/:message_id", get(handle_get_message))
        .route("/echo", post(handle_echo))
        .route("/state/:message_id", get(handle_get_state).delete(handle_delete_state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
