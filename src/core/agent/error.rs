//! Error types for the agent module.

/// Errors surfaced by the agent and its providers.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// No API key was available for the configured provider.
    #[error("API key missing")]
    ApiKeyMissing,

    /// The provider API returned a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The event stream ended in an unexpected state.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
