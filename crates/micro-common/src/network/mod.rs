//! Network resilience helpers.

mod retry;

pub use retry::{retry_async, RetryConfig, RetryStats};
