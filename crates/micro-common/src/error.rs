//! Error types shared by the micro-one and micro-two services.
//!
//! Sidecar failures, payload (de)serialization problems and lookups of
//! unknown messages all funnel into [`MicroError`]. The HTTP layer maps each
//! variant to a status code via [`MicroError::status_code`].

use thiserror::Error;

/// Main error type for the services.
#[derive(Debug, Error)]
pub enum MicroError {
    // Sidecar / transport errors
    #[error("Sidecar {operation} failed for {target}: {message}")]
    Sidecar {
        /// Sidecar operation, e.g. `invoke` or `save_state`.
        operation: &'static str,
        /// Target app id or `store/key`.
        target: String,
        /// HTTP status returned by the sidecar, if a response arrived.
        status: Option<u16>,
        message: String,
    },

    #[error("Sidecar {operation} timed out for {target}")]
    Timeout {
        operation: &'static str,
        target: String,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // IO errors (socket binding, signal handling)
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Validation errors
    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    // Lookup errors
    #[error("Message with ID {message_id} not found")]
    MessageNotFound { message_id: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, MicroError>;

impl From<std::io::Error> for MicroError {
    fn from(err: std::io::Error) -> Self {
        MicroError::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for MicroError {
    fn from(err: serde_json::Error) -> Self {
        MicroError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl MicroError {
    /// Build a sidecar error from a reqwest failure, separating out timeouts.
    pub fn from_reqwest(
        operation: &'static str,
        target: impl Into<String>,
        err: reqwest::Error,
    ) -> Self {
        let target = target.into();
        if err.is_timeout() {
            MicroError::Timeout { operation, target }
        } else {
            MicroError::Sidecar {
                operation,
                target,
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }

    /// HTTP status code for this error.
    ///
    /// Every core failure is fatal to the request that hit it, so anything
    /// that is not a lookup miss or a bad parameter maps to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            MicroError::MessageNotFound { .. } => 404,
            MicroError::InvalidParams { .. } => 400,
            _ => 500,
        }
    }

    /// Check if this error came from the transport and could succeed on retry.
    ///
    /// Informational only: `MessageDispatcher::send_with_retry` retries every
    /// failure regardless of this.
    pub fn is_retryable(&self) -> bool {
        match self {
            MicroError::Timeout { .. } => true,
            MicroError::Sidecar { status, .. } => status.map_or(true, |s| s >= 500),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MicroError::MessageNotFound {
            message_id: "abc".into(),
        };
        assert_eq!(err.to_string(), "Message with ID abc not found");

        let err = MicroError::Sidecar {
            operation: "invoke",
            target: "micro-two".into(),
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Sidecar invoke failed for micro-two: boom");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            MicroError::MessageNotFound {
                message_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            MicroError::InvalidParams {
                message: "bad".into()
            }
            .status_code(),
            400
        );
        assert_eq!(
            MicroError::Timeout {
                operation: "invoke",
                target: "micro-two".into()
            }
            .status_code(),
            500
        );
        assert_eq!(MicroError::Other("x".into()).status_code(), 500);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(MicroError::Timeout {
            operation: "invoke",
            target: "micro-two".into()
        }
        .is_retryable());
        assert!(MicroError::Sidecar {
            operation: "invoke",
            target: "micro-two".into(),
            status: None,
            message: "connection refused".into()
        }
        .is_retryable());
        assert!(!MicroError::Sidecar {
            operation: "invoke",
            target: "micro-two".into(),
            status: Some(404),
            message: "no such method".into()
        }
        .is_retryable());
        assert!(!MicroError::Other("x".into()).is_retryable());
    }
}
