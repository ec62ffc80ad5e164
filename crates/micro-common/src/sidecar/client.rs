//! Sidecar client trait.

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use std::sync::Arc;

/// Body returned by a sidecar call. Empty means "no data".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidecarResponse {
    pub data: Bytes,
}

impl SidecarResponse {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Service invocation and key-value state through an out-of-process sidecar.
///
/// Every call may fail with a transport-level error. Implementations do not
/// retry; callers decide what a failure means for them.
#[async_trait]
pub trait SidecarClient: Send + Sync {
    /// Invoke `method` on the app registered as `app_id`.
    ///
    /// A non-2xx answer from the target is an error.
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: Bytes,
        verb: Method,
    ) -> Result<SidecarResponse>;

    /// Save `value` under `key` in the named state store.
    async fn save_state(&self, store: &str, key: &str, value: Bytes) -> Result<()>;

    /// Read `key` from the named state store. A missing key yields an empty response.
    async fn get_state(&self, store: &str, key: &str) -> Result<SidecarResponse>;

    /// Delete `key` from the named state store.
    async fn delete_state(&self, store: &str, key: &str) -> Result<()>;
}

/// Shared handle to a sidecar client.
pub type DynSidecar = Arc<dyn SidecarClient>;
