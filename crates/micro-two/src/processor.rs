//! Message processing: analytics, canned reply and state persistence.

use crate::state_bridge::StateStoreBridge;
use micro_common::config::MessagingConfig;
use micro_common::models::now_iso8601;
use micro_common::{MessageAnalytics, ProcessingResult, ProcessingStatus};
use tracing::{info, warn};

pub struct MessageProcessor {
    bridge: StateStoreBridge,
}

impl MessageProcessor {
    pub fn new(bridge: StateStoreBridge) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &StateStoreBridge {
        &self.bridge
    }

    /// Process one message. Never fails: a state store write failure is
    /// logged and otherwise ignored.
    ///
    /// `processing_time_ms` in the result is the fixed
    /// [`MessagingConfig::SIMULATED_PROCESSING_TIME_MS`], not a measurement.
    pub async fn process(&self, message: &str, message_id: &str, sender: &str) -> ProcessingResult {
        info!(
            message_id,
            sender,
            message_length = message.chars().count(),
            "Processing message"
        );

        let processed_at = now_iso8601();
        let response = reply_text(sender, message, &processed_at);
        let analytics =
            MessageAnalytics::compute(message, MessagingConfig::SIMULATED_PROCESSING_TIME_MS);

        if !self
            .bridge
            .store(message_id, message, sender, &processed_at, &response)
            .await
        {
            warn!(
                message_id,
                store = self.bridge.store_name(),
                "Continuing without persisted state"
            );
        }

        info!(
            message_id,
            word_count = analytics.word_count,
            character_count = analytics.character_count,
            "Message processed"
        );

        ProcessingResult {
            status: ProcessingStatus::Processed,
            message_id: message_id.to_string(),
            sender: sender.to_string(),
            processed_at,
            response,
            analytics,
        }
    }
}

fn reply_text(sender: &str, message: &str, processed_at: &str) -> String {
    format!(
        "Hello {}! I received your message: '{}'. Processed at {}",
        sender, message, processed_at
    )
}
