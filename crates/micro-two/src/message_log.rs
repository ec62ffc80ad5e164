//! In-memory log of received messages.
//!
//! Records are kept in arrival order for the life of the process and are
//! never mutated after being appended. Duplicate message ids are kept as
//! separate records. All access goes through one lock, so `total_count`
//! always reflects every append that has completed.

use micro_common::MessageRecord;
use serde::Serialize;
use tokio::sync::RwLock;

/// One page of the log plus the size of the whole log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePage {
    pub messages: Vec<MessageRecord>,
    pub total_count: usize,
}

#[derive(Debug, Default)]
pub struct MessageLog {
    records: RwLock<Vec<MessageRecord>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; returns the log size after the append.
    pub async fn append(&self, record: MessageRecord) -> usize {
        let mut records = self.records.write().await;
        records.push(record);
        records.len()
    }

    /// Records `offset..offset + limit`, clamped to the log. An offset past
    /// the end gives an empty page.
    pub async fn list(&self, limit: usize, offset: usize) -> MessagePage {
        let records = self.records.read().await;
        let total_count = records.len();
        let start = offset.min(total_count);
        let end = start.saturating_add(limit).min(total_count);

        MessagePage {
            messages: records[start..end].to_vec(),
            total_count,
        }
    }

    /// First record with `message_id`, if any.
    pub async fn get(&self, message_id: &str) -> Option<MessageRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.message_id == message_id)
            .cloned()
    }

    /// Remove every record; returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut records = self.records.write().await;
        std::mem::take(&mut *records).len()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(id: &str, message: &str) -> MessageRecord {
        MessageRecord {
            message_id: id.to_string(),
            sender: "micro-one".to_string(),
            message: message.to_string(),
            received_at: "2024-01-01T00:00:00.000000Z".to_string(),
            processed: true,
            response: format!("reply to {}", message),
        }
    }

    async fn log_with(n: usize) -> MessageLog {
        let log = MessageLog::new();
        for i in 0..n {
            log.append(record(&format!("m{}", i), &format!("msg {}", i))).await;
        }
        log
    }

    fn ids(page: &MessagePage) -> Vec<&str> {
        page.messages.iter().map(|r| r.message_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_log_lists_nothing() {
        let log = MessageLog::new();
        let page = log.list(10, 0).await;
        assert!(page.messages.is_empty());
        assert_eq!(page.total_count, 0);
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_is_contiguous_in_append_order() {
        let log = log_with(5).await;

        assert_eq!(ids(&log.list(10, 0).await), ["m0", "m1", "m2", "m3", "m4"]);
        assert_eq!(ids(&log.list(2, 1).await), ["m1", "m2"]);
        assert_eq!(ids(&log.list(10, 3).await), ["m3", "m4"]);
        assert_eq!(log.list(2, 1).await.total_count, 5);
    }

    #[tokio::test]
    async fn test_out_of_range_offset_is_empty_page() {
        let log = log_with(3).await;

        let page = log.list(10, 3).await;
        assert!(page.messages.is_empty());
        assert_eq!(page.total_count, 3);

        let page = log.list(usize::MAX, usize::MAX).await;
        assert!(page.messages.is_empty());
    }

    #[tokio::test]
    async fn test_zero_limit() {
        let log = log_with(3).await;
        assert!(log.list(0, 0).await.messages.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_are_kept_and_first_wins() {
        let log = MessageLog::new();
        assert_eq!(log.append(record("dup", "first")).await, 1);
        assert_eq!(log.append(record("dup", "second")).await, 2);

        assert_eq!(log.len().await, 2);
        assert_eq!(log.get("dup").await.unwrap().message, "first");
    }

    #[tokio::test]
    async fn test_get_returns_exact_record_or_none() {
        let log = log_with(2).await;
        assert_eq!(log.get("m1").await, Some(record("m1", "msg 1")));
        assert_eq!(log.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_clear_returns_previous_size() {
        let log = log_with(4).await;
        assert_eq!(log.clear().await, 4);

        let page = log.list(10, 0).await;
        assert_eq!(page.total_count, 0);
        assert!(page.messages.is_empty());
        assert_eq!(log.clear().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_all_counted() {
        let log = Arc::new(MessageLog::new());

        let tasks: Vec<_> = (0..200)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.append(record(&format!("m{}", i), "x")).await })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        assert_eq!(log.list(1, 0).await.total_count, 200);
    }
}
