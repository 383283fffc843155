//! Outbound chat transport port.

use parley_types::conversation::OutboundTarget;
use thiserror::Error;

/// Errors from sending a message through the chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Request(String),

    #[error("transport rejected message with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Trait for delivering text messages to a remote chat party.
///
/// Implementations live in parley-infra (e.g., `WebhookSender`).
pub trait OutboundSender: Send + Sync {
    fn send_text(
        &self,
        target: &OutboundTarget,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
