use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::rpc::SubscriptionId;

/// Main error type for the actor bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Transport-level errors, propagated unmodified
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Protocol-level error responses
    #[error("Remote exception {exception_type}: {message}")]
    RemoteException {
        exception_type: String,
        message: String,
    },

    #[error("{message}")]
    Rpc { code: Option<i64>, message: String },

    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("Unknown error (HTTP status {status})")]
    UnknownRpcError { status: u16 },

    #[error("Protocol error: {reason}")]
    Protocol { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Business-logic failure reported by an error envelope
    #[error("{message}")]
    Remote { message: String },

    /// Caller-contract violations, detected before any network call
    #[error("Contract violation: {reason}")]
    ContractViolation { reason: String },

    #[error("Listener is already registered on actor '{actor}'")]
    ListenerAlreadyRegistered { actor: String },

    #[error("Subscription {id} already exists")]
    DuplicateSubscription { id: SubscriptionId },

    /// Configuration errors
    #[error("Unknown rpc type: {token}")]
    UnsupportedTransport { token: String },

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Subscription lifecycle errors
    #[error("Event channel for subscription {id} failed: {reason}")]
    ChannelFailed { id: SubscriptionId, reason: String },

    #[error("{failures} unsubscribe(s) failed, last error: {last}")]
    UnsubscribeFailed {
        failures: usize,
        #[source]
        last: Box<BridgeError>,
    },
}

impl BridgeError {
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    pub fn contract_violation(reason: impl Into<String>) -> Self {
        Self::ContractViolation {
            reason: reason.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Check if retrying the operation might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::WebSocket(_) | Self::ChannelFailed { .. }
        )
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) | Self::WebSocket(_) => "transport",
            Self::RemoteException { .. }
            | Self::Rpc { .. }
            | Self::Fault { .. }
            | Self::UnknownRpcError { .. }
            | Self::Protocol { .. }
            | Self::Serialization(_) => "protocol",
            Self::Remote { .. } => "remote",
            Self::ContractViolation { .. }
            | Self::ListenerAlreadyRegistered { .. }
            | Self::DuplicateSubscription { .. } => "contract",
            Self::UnsupportedTransport { .. } | Self::InvalidUrl(_) => "config",
            Self::ChannelFailed { .. } | Self::UnsubscribeFailed { .. } => "subscription",
        }
    }
}

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_message_is_verbatim() {
        let err = BridgeError::remote("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.category(), "remote");
    }

    #[test]
    fn test_remote_exception_names_type_and_message() {
        let err = BridgeError::RemoteException {
            exception_type: "Foo".to_string(),
            message: "bad".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("Foo"));
        assert!(text.contains("bad"));
    }

    #[test]
    fn test_unsubscribe_failed_keeps_last_error() {
        let err = BridgeError::UnsubscribeFailed {
            failures: 2,
            last: Box::new(BridgeError::remote("gone")),
        };
        assert!(err.to_string().contains("gone"));
        assert_eq!(err.category(), "subscription");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            BridgeError::UnsupportedTransport {
                token: "grpc".to_string()
            }
            .category(),
            "config"
        );
        assert_eq!(BridgeError::contract_violation("x").category(), "contract");
        assert_eq!(BridgeError::protocol("x").category(), "protocol");
    }
}
