//! In-process sidecar used by tests.
//!
//! Invocations are routed to async handlers registered per app id, state
//! lives in a map keyed by `(store, key)`, and failures can be injected for
//! invocation and for the state operations.

use super::client::{SidecarClient, SidecarResponse};
use crate::{MicroError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<SidecarResponse>> + Send>>;
type InvokeHandler = Arc<dyn Fn(String, Bytes) -> HandlerFuture + Send + Sync>;

/// One call seen by [`InMemorySidecar::invoke`].
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub app_id: String,
    pub method: String,
    pub verb: Method,
    pub payload: Bytes,
}

#[derive(Default)]
pub struct InMemorySidecar {
    handlers: RwLock<HashMap<String, InvokeHandler>>,
    state: RwLock<HashMap<(String, String), Bytes>>,
    invocations: RwLock<Vec<RecordedInvocation>>,
    failing_invokes: AtomicU32,
    invoke_failing: AtomicBool,
    state_failing: AtomicBool,
}

impl InMemorySidecar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route invocations of `app_id` to `handler(method, payload)`.
    pub async fn register<F, Fut>(&self, app_id: &str, handler: F)
    where
        F: Fn(String, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SidecarResponse>> + Send + 'static,
    {
        let handler: InvokeHandler =
            Arc::new(move |method, payload| Box::pin(handler(method, payload)));
        self.handlers.write().await.insert(app_id.to_string(), handler);
    }

    /// Fail the next `n` invocations, then behave normally.
    pub fn fail_next_invokes(&self, n: u32) {
        self.failing_invokes.store(n, Ordering::SeqCst);
    }

    /// Fail every invocation while set.
    pub fn set_invoke_failing(&self, failing: bool) {
        self.invoke_failing.store(failing, Ordering::SeqCst);
    }

    /// Fail every state operation while set.
    pub fn set_state_failing(&self, failing: bool) {
        self.state_failing.store(failing, Ordering::SeqCst);
    }

    pub async fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.read().await.clone()
    }

    pub async fn state_value(&self, store: &str, key: &str) -> Option<Bytes> {
        self.state
            .read()
            .await
            .get(&(store.to_string(), key.to_string()))
            .cloned()
    }

    /// Seed the store directly, bypassing failure injection.
    pub async fn put_state(&self, store: &str, key: &str, value: impl Into<Bytes>) {
        self.state
            .write()
            .await
            .insert((store.to_string(), key.to_string()), value.into());
    }

    fn injected(operation: &'static str, target: &str) -> MicroError {
        MicroError::Sidecar {
            operation,
            target: target.to_string(),
            status: None,
            message: "injected failure".to_string(),
        }
    }

    fn check_state(&self, operation: &'static str, store: &str, key: &str) -> Result<()> {
        if self.state_failing.load(Ordering::SeqCst) {
            return Err(Self::injected(operation, &format!("{}/{}", store, key)));
        }
        Ok(())
    }

    fn take_invoke_failure(&self) -> bool {
        if self.invoke_failing.load(Ordering::SeqCst) {
            return true;
        }
        self.failing_invokes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SidecarClient for InMemorySidecar {
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: Bytes,
        verb: Method,
    ) -> Result<SidecarResponse> {
        self.invocations.write().await.push(RecordedInvocation {
            app_id: app_id.to_string(),
            method: method.to_string(),
            verb,
            payload: payload.clone(),
        });

        if self.take_invoke_failure() {
            return Err(Self::injected("invoke", app_id));
        }

        let handler = self.handlers.read().await.get(app_id).cloned();
        match handler {
            Some(handler) => handler(method.to_string(), payload).await,
            None => Err(MicroError::Sidecar {
                operation: "invoke",
                target: app_id.to_string(),
                status: Some(500),
                message: format!("no app registered as {}", app_id),
            }),
        }
    }

    async fn save_state(&self, store: &str, key: &str, value: Bytes) -> Result<()> {
        self.check_state("save_state", store, key)?;
        self.put_state(store, key, value).await;
        Ok(())
    }

    async fn get_state(&self, store: &str, key: &str) -> Result<SidecarResponse> {
        self.check_state("get_state", store, key)?;
        Ok(self
            .state_value(store, key)
            .await
            .map(SidecarResponse::new)
            .unwrap_or_default())
    }

    async fn delete_state(&self, store: &str, key: &str) -> Result<()> {
        self.check_state("delete_state", store, key)?;
        self.state
            .write()
            .await
            .remove(&(store.to_string(), key.to_string()));
        Ok(())
    }
}
