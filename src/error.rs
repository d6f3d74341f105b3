//! Error types for order lookup.

/// Top-level error type for a lookup invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail host error: {0}")]
    MailHost(#[from] MailHostError),

    #[error("Order API error: {0}")]
    OrderApi(#[from] OrderApiError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the mail host collaborator.
#[derive(Debug, thiserror::Error)]
pub enum MailHostError {
    #[error("Message {id} not found")]
    MessageNotFound { id: String },

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Failed to load mailbox {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a single order API call.
///
/// Every variant is recoverable: the proxy path records it against the
/// identity and moves on, the direct path shows it to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderApiError {
    #[error("missing API credential {0}")]
    MissingCredential(String),

    #[error("order API call failed: {0}")]
    Transport(String),

    #[error("order API error {status} - {body}")]
    Status { status: u16, body: String },

    #[error("order API returned malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type alias for order lookup.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_carries_status_and_body() {
        let err = OrderApiError::Status {
            status: 403,
            body: "forbidden".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("forbidden"));
    }

    #[test]
    fn every_subsystem_error_converts_into_top_level() {
        fn config() -> Result<()> {
            Err(ConfigError::MissingEnvVar("ORDER_LOOKUP_SITE".into()))?
        }
        fn mailbox() -> Result<()> {
            Err(MailHostError::MessageNotFound { id: "m-1".into() })?
        }
        fn json() -> Result<()> {
            serde_json::from_str::<serde_json::Value>("{not json")?;
            Ok(())
        }

        assert!(matches!(config(), Err(Error::Config(ConfigError::MissingEnvVar(_)))));
        assert!(matches!(mailbox(), Err(Error::MailHost(MailHostError::MessageNotFound { .. }))));
        assert!(matches!(json(), Err(Error::Json(_))));
        assert!(mailbox().unwrap_err().to_string().contains("m-1"));
    }

    #[test]
    fn order_api_error_converts_into_top_level() {
        let err: Error = OrderApiError::Transport("connection refused".into()).into();
        assert!(matches!(err, Error::OrderApi(OrderApiError::Transport(_))));
        assert!(err.to_string().contains("connection refused"));
    }
}
