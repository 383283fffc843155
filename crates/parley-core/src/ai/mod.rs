//! AI answering backend port.
//!
//! The bot relays ordinary user text to an external answering service and
//! sends the answer back. The backend keeps its own conversation memory,
//! correlated by an opaque reference that the engine stores on the session.

use thiserror::Error;

/// Answer returned by an [`AiBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct AiReply {
    pub answer: String,
    /// Correlation handle to pass on the next call, when the backend issued one.
    pub conversation_ref: Option<String>,
}

/// Errors from the AI backend.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI backend request failed: {0}")]
    Request(String),

    #[error("AI backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("AI backend timed out")]
    Timeout,

    #[error("invalid AI backend response: {0}")]
    InvalidResponse(String),
}

/// Trait for AI answering backends.
///
/// Implementations live in parley-infra (e.g., `DifyBackend`).
pub trait AiBackend: Send + Sync {
    /// Ask the backend to answer `query` for `user_key`, continuing the
    /// conversation identified by `conversation_ref` when present.
    fn chat(
        &self,
        conversation_ref: Option<&str>,
        user_key: &str,
        query: &str,
    ) -> impl std::future::Future<Output = Result<AiReply, AiError>> + Send;
}
