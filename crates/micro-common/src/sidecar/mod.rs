//! Access to the sidecar that mediates service invocation and state storage.

mod client;
mod dapr;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use client::{DynSidecar, SidecarClient, SidecarResponse};
pub use dapr::DaprHttpClient;
pub use reqwest::Method;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{InMemorySidecar, RecordedInvocation};
