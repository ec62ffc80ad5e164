//! HTTP handlers for the sender service.

use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use micro_common::config::{MessagingConfig, ServiceConfig};
use micro_common::server::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

fn default_recipient() -> String {
    MessagingConfig::DEFAULT_RECIPIENT.to_string()
}

/// Body of `POST /send-message`.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(default = "default_recipient")]
    pub recipient_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub status: String,
    pub message_id: String,
    pub sent_to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

pub async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.service_id().to_string(),
        version: ServiceConfig::VERSION.to_string(),
    })
}

pub async fn handle_root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": state.service_id(),
        "message": format!("Hello from {}! I'm ready to send messages.", state.service_id()),
        "endpoints": {
            "health": "/healthz",
            "send_message": "/send-message",
            "message_status": "/messages/status/{message_id}",
        },
    }))
}

/// Send a message to another service through the sidecar.
///
/// Any dispatcher failure is a 500; nothing is retried.
pub async fn handle_send_message(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<Json<SendMessageResponse>> {
    let Json(request) = request?;
    let message_id = uuid::Uuid::new_v4().to_string();

    info!(
        message_id = %message_id,
        recipient = %request.recipient_id,
        message_length = request.message.chars().count(),
        "Received message send request"
    );

    match state
        .dispatcher
        .send(&request.recipient_id, &request.message, &message_id)
        .await
    {
        Ok(reply) => {
            let response_status = reply.get("status").and_then(Value::as_str).unwrap_or("unknown");
            info!(
                message_id = %message_id,
                recipient = %request.recipient_id,
                response_status,
                "Message sent successfully"
            );
            Ok(Json(SendMessageResponse {
                status: "sent".to_string(),
                message_id,
                sent_to: request.recipient_id,
            }))
        }
        Err(e) => {
            error!(
                message_id = %message_id,
                recipient = %request.recipient_id,
                error = %e,
                "Failed to send message"
            );
            Err(ApiError::internal(format!("Failed to send message: {}", e)))
        }
    }
}

/// Delivery status of a sent message.
///
/// Stub: no status is tracked, so every id reports `delivered` with a fixed
/// placeholder timestamp.
pub async fn handle_message_status(Path(message_id): Path<String>) -> Json<Value> {
    Json(json!({
        "message_id": message_id,
        "status": "delivered",
        "timestamp": MessagingConfig::PLACEHOLDER_STATUS_TIMESTAMP,
    }))
}
