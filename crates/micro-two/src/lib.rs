//! micro-two: the receiver service.
//!
//! Invoked by micro-one through the sidecar at `POST /receive-message`.
//! Each message is analysed, answered with a canned reply, saved to the
//! sidecar state store on a best-effort basis and appended to an
//! in-memory log that the `/messages` endpoints expose.

pub mod handlers;
pub mod message_log;
pub mod processor;
pub mod server;
pub mod state_bridge;

pub use message_log::{MessageLog, MessagePage};
pub use processor::MessageProcessor;
pub use server::{build_router, AppState};
pub use state_bridge::StateStoreBridge;
