//! Error types for ContentGuard

use crate::types::ContentType;

/// Result type alias using ContentGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for moderation operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid caller input, e.g. a regex that does not compile
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing credentials, unknown provider type, bad config file
    #[error("configuration error: {0}")]
    Config(String),

    /// The provider has no API for this kind of content
    #[error("provider '{provider}' does not support {content_type} content")]
    UnsupportedContentType {
        provider: String,
        content_type: ContentType,
    },

    /// Network failure talking to a provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success HTTP status
    #[error("provider '{provider}' returned status {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// Provider response could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Provider returned an explicit error payload
    #[error("provider '{provider}' error {code}: {message}")]
    Provider {
        provider: String,
        code: String,
        message: String,
    },

    /// Asynchronous moderation task reported failure
    #[error("moderation task {task_id} failed")]
    TaskFailed { task_id: String },

    /// Asynchronous moderation task did not finish within the polling ceiling
    #[error("moderation task {task_id} timed out after {attempts} polls")]
    TaskTimeout { task_id: String, attempts: u32 },

    /// Caller-supplied deadline elapsed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Item rejected because the cache cannot hold it
    #[error("cache capacity of {max_entries} entries exceeded")]
    CapacityExceeded { max_entries: usize },

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an unsupported content type error
    pub fn unsupported(provider: impl Into<String>, content_type: ContentType) -> Self {
        Self::UnsupportedContentType {
            provider: provider.into(),
            content_type,
        }
    }

    /// True for errors raised by the task lifecycle of polling providers
    pub fn is_task_error(&self) -> bool {
        matches!(self, Self::TaskFailed { .. } | Self::TaskTimeout { .. })
    }
}
