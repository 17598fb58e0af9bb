// Client error types
//
// Two kinds only: the request never produced a usable response (transport),
// or it did but the body was not JSON (protocol).

use reqwest::StatusCode;
use thiserror::Error;

/// Boxed source error for transport failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure, refused connection, or non-2xx status
    #[error("{operation} failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// Response arrived but its body is not valid JSON
    #[error("{operation} returned invalid JSON: {source}")]
    Protocol {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn transport(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn protocol(operation: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Protocol {
            operation: operation.into(),
            source,
        }
    }

    /// Stable code for scripts parsing CLI output
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "TRANSPORT_ERROR",
            ClientError::Protocol { .. } => "PROTOCOL_ERROR",
        }
    }

    /// Name of the operation that failed (e.g. "execute node foo.Bar")
    pub fn operation(&self) -> &str {
        match self {
            ClientError::Transport { operation, .. } | ClientError::Protocol { operation, .. } => {
                operation
            }
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, ClientError::Protocol { .. })
    }

    /// HTTP status, when the server answered with a non-success code
    pub fn status(&self) -> Option<StatusCode> {
        self.reqwest_source().and_then(reqwest::Error::status)
    }

    /// True when the server could not be reached at all
    pub fn is_connect(&self) -> bool {
        self.reqwest_source().is_some_and(reqwest::Error::is_connect)
    }

    fn reqwest_source(&self) -> Option<&reqwest::Error> {
        match self {
            ClientError::Transport { source, .. } => source.downcast_ref::<reqwest::Error>(),
            ClientError::Protocol { .. } => None,
        }
    }
}

/// Format a connection refused error with hints for the CLI
pub fn connection_refused_hint(address: &str) -> String {
    format!(
        "Could not connect to the automation API at {}\n\n\
        \x1b[1;33mPossible causes:\x1b[0m\n\
        • The API server is not running\n\
        • Wrong base address\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Pass the address explicitly:\n\
           \x1b[36mautotask --base-url http://host:8283 list-nodes\x1b[0m\n\n\
        2. Check your config file:\n\
           \x1b[36mcat ~/.autotask/config.toml\x1b[0m",
        address
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ClientError::transport("list nodes", "connection reset");
        assert_eq!(err.code(), "TRANSPORT_ERROR");
        assert!(err.is_transport());
        assert_eq!(err.operation(), "list nodes");
        assert_eq!(err.status(), None);

        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ClientError::protocol("describe node x", json_err);
        assert_eq!(err.code(), "PROTOCOL_ERROR");
        assert!(err.is_protocol());
        assert!(!err.is_connect());
    }

    #[test]
    fn test_error_display_names_operation() {
        let err = ClientError::transport("run workflow abc", "boom");
        assert_eq!(err.to_string(), "run workflow abc failed: boom");
    }

    #[test]
    fn test_connection_hint_mentions_address() {
        let hint = connection_refused_hint("http://localhost:8283");
        assert!(hint.contains("http://localhost:8283"));
        assert!(hint.contains("--base-url"));
    }
}
