//! HTTP handlers for the receiver service.

use crate::message_log::MessagePage;
use crate::server::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use micro_common::config::{MessagingConfig, ServiceConfig};
use micro_common::models::now_iso8601;
use micro_common::server::{ApiError, ApiResult};
use micro_common::{MessageEnvelope, MessageRecord, MicroError, StoredMessageState};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub messages_received: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiveMessageResponse {
    pub status: String,
    pub message_id: String,
    pub processed_at: String,
    pub response_message: String,
}

fn default_limit() -> usize {
    MessagingConfig::DEFAULT_PAGE_LIMIT
}

/// Query of `GET /messages`.
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

pub async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.service_id.clone(),
        version: ServiceConfig::VERSION.to_string(),
        messages_received: state.log.len().await,
    })
}

pub async fn handle_root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": state.service_id,
        "message": format!("Hello from {}! I'm ready to receive messages.", state.service_id),
        "endpoints": {
            "health": "/healthz",
            "receive_message": "/receive-message",
            "messages": "/messages",
            "echo": "/echo",
        },
        "stats": {
            "messages_received": state.log.len().await,
        },
    }))
}

/// Sidecar invocation target for messages from micro-one.
///
/// Processing cannot fail; a failed state write only shows up in the logs.
pub async fn handle_receive_message(
    State(state): State<Arc<AppState>>,
    envelope: Result<Json<MessageEnvelope>, JsonRejection>,
) -> ApiResult<Json<ReceiveMessageResponse>> {
    let Json(envelope) = envelope?;

    info!(
        message_id = %envelope.message_id,
        sender = %envelope.sender,
        sent_at = %envelope.timestamp,
        "Received message"
    );

    let result = state
        .processor
        .process(&envelope.message, &envelope.message_id, &envelope.sender)
        .await;

    let total = state
        .log
        .append(MessageRecord {
            message_id: envelope.message_id.clone(),
            sender: envelope.sender,
            message: envelope.message,
            received_at: now_iso8601(),
            processed: true,
            response: result.response.clone(),
        })
        .await;

    info!(
        message_id = %result.message_id,
        total_messages = total,
        "Message processed successfully"
    );

    Ok(Json(ReceiveMessageResponse {
        status: "received".to_string(),
        message_id: result.message_id,
        processed_at: result.processed_at,
        response_message: result.response,
    }))
}

pub async fn handle_list_messages(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListMessagesQuery>, QueryRejection>,
) -> ApiResult<Json<MessagePage>> {
    let Query(query) = query?;
    Ok(Json(state.log.list(query.limit, query.offset).await))
}

pub async fn handle_get_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<MessageRecord>> {
    match state.log.get(&message_id).await {
        Some(record) => Ok(Json(record)),
        None => {
            warn!(message_id = %message_id, "Message not found in log");
            Err(MicroError::MessageNotFound { message_id }.into())
        }
    }
}

pub async fn handle_clear_messages(State(state): State<Arc<AppState>>) -> Json<Value> {
    let removed = state.log.clear().await;
    info!(messages_removed = removed, "Cleared message log");

    Json(json!({
        "status": "cleared",
        "messages_removed": removed,
    }))
}

/// Return the posted JSON object unchanged, keys in the order received.
pub async fn handle_echo(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(payload) = payload?;
    let echoed = Value::Object(payload.clone());
    info!(keys = payload.len(), payload = %echoed, "Echo request");

    Ok(Json(json!({
        "echo": payload,
        "service": state.service_id,
        "timestamp": now_iso8601(),
    })))
}

pub async fn handle_get_state(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<StoredMessageState>> {
    match state.processor.bridge().get(&message_id).await {
        Some(stored) => Ok(Json(stored)),
        None => {
            warn!(
                message_id = %message_id,
                store = state.processor.bridge().store_name(),
                "No stored state for message"
            );
            Err(ApiError::not_found(format!(
                "No state found for message {}",
                message_id
            )))
        }
    }
}

pub async fn handle_delete_state(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> Json<Value> {
    let deleted = state.processor.bridge().delete(&message_id).await;
    let status = if deleted { "deleted" } else { "failed" };

    Json(json!({
        "status": status,
        "message_id": message_id,
        "deleted": deleted,
    }))
}
