//! Centralized configuration for the micro services.
//!
//! Holds the fixed protocol constants both services agree on, plus the
//! command-line argument groups each binary flattens into its own `Args`.

use clap::{Args, ValueEnum};
use std::time::Duration;

/// Service-level configuration.
pub struct ServiceConfig;

impl ServiceConfig {
    /// Version reported by the health endpoints.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
    pub const SENDER_ID: &'static str = "micro-one";
    pub const RECEIVER_ID: &'static str = "micro-two";
    pub const SENDER_PORT: u16 = 8001;
    pub const RECEIVER_PORT: u16 = 8002;
}

/// Message exchange protocol constants.
pub struct MessagingConfig;

impl MessagingConfig {
    /// Recipient used when a send request names none.
    pub const DEFAULT_RECIPIENT: &'static str = ServiceConfig::RECEIVER_ID;
    /// Method invoked on the recipient through the sidecar.
    pub const RECEIVE_METHOD: &'static str = "receive-message";
    /// Prefix of state store keys; the message id is appended.
    pub const STATE_KEY_PREFIX: &'static str = "message_";
    pub const DEFAULT_STATE_STORE: &'static str = "statestore";
    /// Stub value: processing time is simulated, not measured.
    pub const SIMULATED_PROCESSING_TIME_MS: i64 = 42;
    /// Stub value returned by the sender's status endpoint.
    pub const PLACEHOLDER_STATUS_TIMESTAMP: &'static str = "2024-01-01T00:00:00Z";
    pub const DEFAULT_PAGE_LIMIT: usize = 10;
}

/// Sidecar connection configuration.
pub struct SidecarConfig;

impl SidecarConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_HTTP_PORT: u16 = 3500;
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const API_TOKEN_HEADER: &'static str = "dapr-api-token";
}

/// Backoff used by the dispatcher's retry helper.
pub struct RetryDefaults;

impl RetryDefaults {
    pub const MAX_RETRIES: u32 = 3;
    pub const BASE_DELAY: Duration = Duration::from_millis(200);
    pub const MAX_DELAY: Duration = Duration::from_secs(5);
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable single-line output.
    Compact,
}

/// Logging flags shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct LoggingArgs {
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    pub debug: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

/// Sidecar connection flags shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct SidecarArgs {
    /// Host the sidecar HTTP API listens on
    #[arg(long, env = "DAPR_HOST", default_value = SidecarConfig::DEFAULT_HOST)]
    pub dapr_host: String,

    /// Port of the sidecar HTTP API
    #[arg(long, env = "DAPR_HTTP_PORT", default_value_t = SidecarConfig::DEFAULT_HTTP_PORT)]
    pub dapr_http_port: u16,

    /// API token sent to the sidecar, if it requires one
    #[arg(long, env = "DAPR_API_TOKEN")]
    pub dapr_api_token: Option<String>,

    /// Per-request timeout for sidecar calls, in seconds
    #[arg(
        long,
        env = "SIDECAR_TIMEOUT_SECS",
        default_value_t = SidecarConfig::REQUEST_TIMEOUT.as_secs()
    )]
    pub sidecar_timeout_secs: u64,
}

impl SidecarArgs {
    /// Base URL of the sidecar HTTP API.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.dapr_host, self.dapr_http_port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.sidecar_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestArgs {
        #[command(flatten)]
        sidecar: SidecarArgs,
        #[command(flatten)]
        logging: LoggingArgs,
    }

    #[test]
    fn test_sidecar_args_base_url() {
        let args = TestArgs::parse_from([
            "test",
            "--dapr-host",
            "10.0.0.5",
            "--dapr-http-port",
            "3600",
        ]);
        assert_eq!(args.sidecar.base_url(), "http://10.0.0.5:3600");
        assert_eq!(args.sidecar.timeout(), SidecarConfig::REQUEST_TIMEOUT);
        assert!(args.sidecar.dapr_api_token.is_none());
    }

    #[test]
    fn test_logging_args() {
        let args = TestArgs::parse_from(["test", "--debug", "--log-format", "compact"]);
        assert!(args.logging.debug);
        assert_eq!(args.logging.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_constants_are_reasonable() {
        assert_eq!(MessagingConfig::DEFAULT_RECIPIENT, "micro-two");
        assert!(RetryDefaults::BASE_DELAY <= RetryDefaults::MAX_DELAY);
        assert!(SidecarConfig::REQUEST_TIMEOUT > Duration::ZERO);
    }
}
