//! Best-effort persistence of processed messages in the sidecar state store.
//!
//! None of these operations fail their caller. Sidecar errors are logged and
//! turned into `false` or `None`.

use bytes::Bytes;
use micro_common::config::MessagingConfig;
use micro_common::{DynSidecar, StoredMessageState};
use tracing::{debug, error, info, warn};

/// State store key for a message id.
pub fn state_key(message_id: &str) -> String {
    format!("{}{}", MessagingConfig::STATE_KEY_PREFIX, message_id)
}

pub struct StateStoreBridge {
    sidecar: DynSidecar,
    store_name: String,
    processor_id: String,
}

impl StateStoreBridge {
    /// `processor_id` is written into every stored record as `processor`.
    pub fn new(
        sidecar: DynSidecar,
        store_name: impl Into<String>,
        processor_id: impl Into<String>,
    ) -> Self {
        Self {
            sidecar,
            store_name: store_name.into(),
            processor_id: processor_id.into(),
        }
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Save a processed message under `message_<id>`. Returns whether the
    /// write succeeded.
    pub async fn store(
        &self,
        message_id: &str,
        original_message: &str,
        sender: &str,
        processed_at: &str,
        response: &str,
    ) -> bool {
        let key = state_key(message_id);
        let record = StoredMessageState {
            message_id: message_id.to_string(),
            original_message: original_message.to_string(),
            sender: sender.to_string(),
            processed_at: processed_at.to_string(),
            response: response.to_string(),
            processor: self.processor_id.clone(),
        };

        let value = match serde_json::to_vec(&record) {
            Ok(value) => Bytes::from(value),
            Err(e) => {
                warn!(message_id, key = %key, error = %e, "Failed to encode message state");
                return false;
            }
        };

        match self.sidecar.save_state(&self.store_name, &key, value).await {
            Ok(()) => {
                info!(message_id, store = %self.store_name, key = %key, "Message state stored");
                true
            }
            Err(e) => {
                warn!(
                    message_id,
                    store = %self.store_name,
                    key = %key,
                    error = %e,
                    "Failed to store message state"
                );
                false
            }
        }
    }

    /// Stored state for `message_id`, or `None` when absent or unreadable.
    pub async fn get(&self, message_id: &str) -> Option<StoredMessageState> {
        let key = state_key(message_id);
        let response = match self.sidecar.get_state(&self.store_name, &key).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    message_id,
                    store = %self.store_name,
                    key = %key,
                    error = %e,
                    "Failed to read message state"
                );
                return None;
            }
        };

        if response.is_empty() {
            debug!(message_id, key = %key, "No state found");
            return None;
        }

        match serde_json::from_slice(&response.data) {
            Ok(state) => Some(state),
            Err(e) => {
                error!(message_id, key = %key, error = %e, "Stored message state is not valid");
                None
            }
        }
    }

    /// Delete the stored state for `message_id`. Returns whether the delete
    /// succeeded; deleting an absent key succeeds.
    pub async fn delete(&self, message_id: &str) -> bool {
        let key = state_key(message_id);
        match self.sidecar.delete_state(&self.store_name, &key).await {
            Ok(()) => {
                info!(message_id, key = %key, "Message state deleted");
                true
            }
            Err(e) => {
                error!(
                    message_id,
                    store = %self.store_name,
                    key = %key,
                    error = %e,
                    "Failed to delete message state"
                );
                false
            }
        }
    }
}
