//! micro-one: the sender service.
//!
//! Accepts `POST /send-message` and forwards the message to a recipient
//! service (micro-two by default) through the sidecar's service invocation.

pub mod dispatcher;
pub mod handlers;
pub mod server;

pub use dispatcher::MessageDispatcher;
pub use server::{build_router, AppState};
