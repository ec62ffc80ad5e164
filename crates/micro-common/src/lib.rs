//! Shared plumbing for the micro-one (sender) and micro-two (receiver) services.
//!
//! Both services talk to each other and to a key-value store only through a
//! sidecar. This crate holds what they have in common:
//!
//! - [`sidecar`]: the [`SidecarClient`] trait and its Dapr HTTP implementation
//! - [`models`]: the message envelope, processing result and log record types
//! - [`network`]: retry with exponential backoff
//! - [`server`]: HTTP server bootstrap and the JSON error response
//! - [`config`] / [`logging`]: constants, CLI flag groups and tracing setup

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod network;
pub mod server;
pub mod sidecar;

pub use error::{MicroError, Result};
pub use models::{
    MessageAnalytics, MessageEnvelope, MessageRecord, ProcessingResult, ProcessingStatus,
    StoredMessageState,
};
pub use sidecar::{DaprHttpClient, DynSidecar, SidecarClient, SidecarResponse};
