use actor_bridge::BridgeError;
use thiserror::Error;

/// Main error type for the actor-bridge CLI
#[derive(Error, Debug)]
pub enum CliError {
    /// Anything the bridge library reports
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Invalid input: {field} = '{value}'. {suggestion}")]
    InvalidInput {
        field: String,
        value: String,
        suggestion: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create an invalid input error with helpful suggestions
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field: field.into(),
            value: value.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Get a user-friendly error message with potential solutions
    pub fn user_message(&self) -> String {
        match self {
            Self::Bridge(BridgeError::UnsupportedTransport { token }) => {
                format!(
                    "The endpoint path ends in '{}', which is not a known transport.\n\n\
                    Possible solutions:\n\
                    • Point the endpoint at .../jsonrpc or .../xmlrpc\n\
                    • Set it with --endpoint or ACTOR_BRIDGE_ENDPOINT",
                    token
                )
            }
            Self::Bridge(e) if e.category() == "transport" => {
                format!(
                    "Could not reach the actor server: {}\n\n\
                    Possible solutions:\n\
                    • Check the endpoint (--endpoint or ACTOR_BRIDGE_ENDPOINT)\n\
                    • Verify the server is running and accessible",
                    e
                )
            }
            Self::Bridge(BridgeError::Remote { message }) => {
                format!("The server rejected the request: {}", message)
            }
            Self::Bridge(BridgeError::ChannelFailed { id, reason }) => {
                format!(
                    "The event stream for subscription {} stopped: {}\n\n\
                    The subscription has been released; run the command again to resubscribe.",
                    id, reason
                )
            }
            Self::InvalidInput {
                field,
                value,
                suggestion,
            } => {
                format!("Invalid {}: '{}'\n\n{}", field, value, suggestion)
            }
            _ => self.to_string(),
        }
    }

    /// Check if this error suggests the user should retry
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Bridge(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Bridge(e) => e.category(),
            Self::InvalidInput { .. } => "validation",
            Self::Serialization(_) | Self::Io(_) => "internal",
        }
    }
}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;
