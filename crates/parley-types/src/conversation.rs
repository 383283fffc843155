//! Conversation types shared between the engine, the transport and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

use crate::feedback::Rating;

/// Feedback-flow sub-state of a live conversation.
///
/// `Closed` is intentionally absent: a closed conversation has no session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Normal conversation; text is relayed to the AI backend.
    Active,
    /// The rating prompt was sent; waiting for a 1-5 answer.
    AwaitingRating,
    /// A rating was given; waiting for an optional comment.
    AwaitingComment { rating: Rating },
}

impl Phase {
    /// Whether the user is in the middle of the rating/comment flow.
    pub fn is_mid_feedback(&self) -> bool {
        !matches!(self, Phase::Active)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Active => write!(f, "active"),
            Phase::AwaitingRating => write!(f, "awaiting_rating"),
            Phase::AwaitingComment { rating } => write!(f, "awaiting_comment({rating})"),
        }
    }
}

/// Opaque transport-specific destination handle (e.g. a chat JID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutboundTarget(pub String);

impl fmt::Display for OutboundTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A text message event received from the chat transport gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender's raw phone number as delivered by the transport.
    pub from: String,
    /// Where replies should go; defaults to the sender when absent.
    #[serde(default)]
    pub chat: Option<OutboundTarget>,
    pub text: String,
    /// Messages echoed back from the bot's own account are ignored.
    #[serde(default)]
    pub from_me: bool,
}

impl InboundMessage {
    /// Reply destination: the explicit chat handle, or the sender.
    pub fn reply_target(&self) -> OutboundTarget {
        self.chat
            .clone()
            .unwrap_or_else(|| OutboundTarget(self.from.trim().to_string()))
    }
}

/// Read-only view of a live session, exposed over the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub user_key: String,
    pub flow_id: Uuid,
    pub user_name: String,
    #[serde(flatten)]
    pub phase: Phase,
    pub has_conversation_ref: bool,
    pub last_activity_at: DateTime<Utc>,
    pub feedback_prompt_sent_at: Option<DateTime<Utc>>,
    pub feedback_prompt_is_automatic: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serde_tagged() {
        let phase = Phase::AwaitingComment {
            rating: Rating::new(3).unwrap(),
        };
        let json = serde_json::to_value(phase).unwrap();
        assert_eq!(json["phase"], "awaiting_comment");
        assert_eq!(json["rating"], 3);

        let active = serde_json::to_value(Phase::Active).unwrap();
        assert_eq!(active["phase"], "active");
    }

    #[test]
    fn test_phase_mid_feedback() {
        assert!(!Phase::Active.is_mid_feedback());
        assert!(Phase::AwaitingRating.is_mid_feedback());
    }

    #[test]
    fn test_inbound_reply_target_defaults_to_sender() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"from":"628123456789","text":"hi"}"#).unwrap();
        assert_eq!(msg.reply_target(), OutboundTarget("628123456789".to_string()));
        assert!(!msg.from_me);

        let msg: InboundMessage = serde_json::from_str(
            r#"{"from":"628123456789","chat":"628123456789@s.whatsapp.net","text":"hi"}"#,
        )
        .unwrap();
        assert_eq!(msg.reply_target().0, "628123456789@s.whatsapp.net");
    }
}
