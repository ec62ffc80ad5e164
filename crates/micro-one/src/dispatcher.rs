//! Message dispatch to a recipient service through the sidecar.

use bytes::Bytes;
use micro_common::config::MessagingConfig;
use micro_common::models::now_iso8601;
use micro_common::network::{retry_async, RetryConfig};
use micro_common::sidecar::Method;
use micro_common::{DynSidecar, MessageEnvelope, Result};
use serde_json::{json, Value};
use tracing::{debug, error, info, info_span, Instrument};

/// Builds envelopes and delivers them via sidecar service invocation.
pub struct MessageDispatcher {
    sidecar: DynSidecar,
    service_id: String,
    backoff: RetryConfig,
}

impl MessageDispatcher {
    /// `service_id` is stamped into every envelope as the sender.
    pub fn new(sidecar: DynSidecar, service_id: impl Into<String>) -> Self {
        Self {
            sidecar,
            service_id: service_id.into(),
            backoff: RetryConfig::default(),
        }
    }

    /// Override the backoff used by [`send_with_retry`](Self::send_with_retry).
    /// Its `max_attempts` is ignored; callers pass `max_retries` per call.
    pub fn with_backoff(mut self, backoff: RetryConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn envelope(&self, message: &str, message_id: &str) -> MessageEnvelope {
        MessageEnvelope {
            message: message.to_string(),
            message_id: message_id.to_string(),
            sender: self.service_id.clone(),
            timestamp: now_iso8601(),
        }
    }

    /// Deliver one message to `recipient`'s receive method.
    ///
    /// Returns the recipient's JSON reply. Failures are logged and returned
    /// unchanged; nothing is retried here.
    pub async fn send(&self, recipient: &str, message: &str, message_id: &str) -> Result<Value> {
        let method = MessagingConfig::RECEIVE_METHOD;
        let payload = Bytes::from(serde_json::to_vec(&self.envelope(message, message_id))?);

        info!(
            recipient,
            message_id,
            method,
            "Sending message via sidecar service invocation"
        );

        let response = match self.sidecar.invoke(recipient, method, payload, Method::POST).await {
            Ok(response) => response,
            Err(e) => {
                error!(recipient, message_id, error = %e, "Failed to send message via sidecar");
                return Err(e);
            }
        };

        let reply = if response.is_empty() {
            json!({ "status": "success", "message": "No response data" })
        } else {
            serde_json::from_slice::<Value>(&response.data).map_err(|e| {
                error!(recipient, message_id, error = %e, "Recipient returned invalid JSON");
                e
            })?
        };

        let response_status = reply.get("status").and_then(Value::as_str).unwrap_or("unknown");
        info!(
            recipient,
            message_id,
            response_status,
            "Message sent successfully via sidecar"
        );

        Ok(reply)
    }

    /// [`send`](Self::send), attempted up to `max_retries + 1` times with
    /// exponential backoff between attempts. Every failure is retried; once
    /// attempts run out the last error is returned.
    ///
    /// No route calls this. It is a library capability only.
    pub async fn send_with_retry(
        &self,
        recipient: &str,
        message: &str,
        message_id: &str,
        max_retries: u32,
    ) -> Result<Value> {
        let config = self
            .backoff
            .clone()
            .with_max_attempts(max_retries.saturating_add(1));
        let span = info_span!("send_with_retry", recipient, message_id, max_retries);

        let (result, stats) = retry_async(
            &config,
            move || self.send(recipient, message, message_id),
            |_| true,
        )
        .instrument(span)
        .await;

        debug!(
            message_id,
            attempts = stats.attempts,
            total_delay_ms = stats.total_delay.as_millis() as u64,
            success = stats.success,
            "Retrying send finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use micro_common::sidecar::{InMemorySidecar, SidecarResponse};
    use micro_common::MicroError;
    use std::sync::Arc;
    use std::time::Duration;

    async fn sidecar_with_receiver() -> Arc<InMemorySidecar> {
        let sidecar = Arc::new(InMemorySidecar::new());
        sidecar
            .register("micro-two", |_, payload| async move {
                let envelope: MessageEnvelope = serde_json::from_slice(&payload)?;
                Ok::<_, MicroError>(SidecarResponse::new(serde_json::to_vec(&json!({
                    "status": "received",
                    "message_id": envelope.message_id,
                }))?))
            })
            .await;
        sidecar
    }

    fn fast_backoff() -> RetryConfig {
        RetryConfig::new()
            .with_base_delay(Duration::from_millis(10))
            .with_jitter(false)
    }

    #[tokio::test]
    async fn test_send_builds_envelope_and_parses_reply() {
        let sidecar = sidecar_with_receiver().await;
        let dispatcher = MessageDispatcher::new(sidecar.clone(), "micro-one");

        let reply = dispatcher.send("micro-two", "hello", "m-1").await.unwrap();
        assert_eq!(reply["status"], "received");
        assert_eq!(reply["message_id"], "m-1");

        let calls = sidecar.invocations().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].app_id, "micro-two");
        assert_eq!(calls[0].method, "receive-message");
        assert_eq!(calls[0].verb, Method::POST);

        let envelope: MessageEnvelope = serde_json::from_slice(&calls[0].payload).unwrap();
        assert_eq!(envelope.message, "hello");
        assert_eq!(envelope.message_id, "m-1");
        assert_eq!(envelope.sender, "micro-one");
        assert!(chrono::DateTime::parse_from_rfc3339(&envelope.timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_send_empty_reply_is_success_placeholder() {
        let sidecar = Arc::new(InMemorySidecar::new());
        sidecar
            .register("micro-two", |_, _| async { Ok(SidecarResponse::empty()) })
            .await;
        let dispatcher = MessageDispatcher::new(sidecar, "micro-one");

        let reply = dispatcher.send("micro-two", "hi", "m-2").await.unwrap();
        assert_eq!(reply, json!({ "status": "success", "message": "No response data" }));
    }

    #[tokio::test]
    async fn test_send_propagates_failure_without_retry() {
        let sidecar = sidecar_with_receiver().await;
        sidecar.fail_next_invokes(1);
        let dispatcher = MessageDispatcher::new(sidecar.clone(), "micro-one");

        let err = dispatcher.send("micro-two", "hi", "m-3").await.unwrap_err();
        assert!(matches!(err, MicroError::Sidecar { operation: "invoke", .. }));
        assert_eq!(sidecar.invocations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_invalid_reply_is_json_error() {
        let sidecar = Arc::new(InMemorySidecar::new());
        sidecar
            .register("micro-two", |_, _| async { Ok(SidecarResponse::new("<html>")) })
            .await;
        let dispatcher = MessageDispatcher::new(sidecar, "micro-one");

        let err = dispatcher.send("micro-two", "hi", "m-4").await.unwrap_err();
        assert!(matches!(err, MicroError::Json { .. }));
    }

    #[tokio::test]
    async fn test_send_with_retry_recovers() {
        let sidecar = sidecar_with_receiver().await;
        sidecar.fail_next_invokes(2);
        let dispatcher =
            MessageDispatcher::new(sidecar.clone(), "micro-one").with_backoff(fast_backoff());

        let reply = dispatcher
            .send_with_retry("micro-two", "hi", "m-5", 3)
            .await
            .unwrap();
        assert_eq!(reply["status"], "received");
        assert_eq!(sidecar.invocations().await.len(), 3);
    }

    #[tokio::test]
    async fn test_send_with_retry_exhausts_attempts() {
        let sidecar = sidecar_with_receiver().await;
        sidecar.set_invoke_failing(true);
        let dispatcher =
            MessageDispatcher::new(sidecar.clone(), "micro-one").with_backoff(fast_backoff());

        let err = dispatcher
            .send_with_retry("micro-two", "hi", "m-6", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, MicroError::Sidecar { .. }));
        assert_eq!(sidecar.invocations().await.len(), 3);
    }

    #[tokio::test]
    async fn test_send_with_zero_retries_tries_once() {
        let sidecar = sidecar_with_receiver().await;
        sidecar.set_invoke_failing(true);
        let dispatcher =
            MessageDispatcher::new(sidecar.clone(), "micro-one").with_backoff(fast_backoff());

        assert!(dispatcher.send_with_retry("micro-two", "hi", "m-7", 0).await.is_err());
        assert_eq!(sidecar.invocations().await.len(), 1);
    }
}
