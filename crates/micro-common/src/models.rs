//! Data types exchanged between the sender and receiver services.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Current UTC time as an ISO-8601 string with microsecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Message payload plus routing metadata, sent from micro-one to micro-two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub message: String,
    pub message_id: String,
    /// App id of the sending service.
    pub sender: String,
    /// ISO-8601 send time.
    pub timestamp: String,
}

/// Outcome status of a processed message. Only one value exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Processed,
}

/// Simple analytics computed over a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAnalytics {
    /// Whitespace-delimited token count.
    pub word_count: usize,
    /// Unicode scalar value count.
    pub character_count: usize,
    /// Simulated, see [`crate::config::MessagingConfig::SIMULATED_PROCESSING_TIME_MS`].
    pub processing_time_ms: i64,
}

impl MessageAnalytics {
    pub fn compute(message: &str, processing_time_ms: i64) -> Self {
        Self {
            word_count: message.split_whitespace().count(),
            character_count: message.chars().count(),
            processing_time_ms,
        }
    }
}

/// Result of processing one inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub status: ProcessingStatus,
    pub message_id: String,
    pub sender: String,
    pub processed_at: String,
    pub response: String,
    pub analytics: MessageAnalytics,
}

/// An entry in the receiver's in-memory message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: String,
    pub sender: String,
    pub message: String,
    pub received_at: String,
    pub processed: bool,
    pub response: String,
}

/// Value written to the state store under `message_<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessageState {
    pub message_id: String,
    pub original_message: String,
    pub sender: String,
    pub processed_at: String,
    pub response: String,
    /// App id of the service that processed the message.
    pub processor: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analytics_ascii() {
        let analytics = MessageAnalytics::compute("Hello from micro-one!", 42);
        assert_eq!(analytics.word_count, 3);
        assert_eq!(analytics.character_count, 21);
        assert_eq!(analytics.processing_time_ms, 42);
    }

    #[test]
    fn test_analytics_whitespace_runs_and_empty() {
        let analytics = MessageAnalytics::compute("  a \t b\n\nc  ", 0);
        assert_eq!(analytics.word_count, 3);
        assert_eq!(analytics.character_count, 12);

        let empty = MessageAnalytics::compute("", 0);
        assert_eq!(empty.word_count, 0);
        assert_eq!(empty.character_count, 0);
    }

    #[test]
    fn test_analytics_counts_chars_not_bytes() {
        let analytics = MessageAnalytics::compute("héllo wörld", 0);
        assert_eq!(analytics.word_count, 2);
        assert_eq!(analytics.character_count, 11);
    }

    #[test]
    fn test_processing_status_wire_name() {
        let value = serde_json::to_value(ProcessingStatus::Processed).unwrap();
        assert_eq!(value, serde_json::json!("processed"));
    }

    #[test]
    fn test_now_iso8601_parses() {
        let ts = now_iso8601();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
