//! The in-memory record of one user's ongoing conversation.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use parley_types::conversation::{OutboundTarget, Phase, SessionSummary};
use parley_types::user::UserProfile;

/// Live conversation state for a single user key.
///
/// Sessions are owned by a [`SessionStore`](super::store::SessionStore) and
/// only ever handed out as clones; mutation happens through closures run
/// inside a single store call.
#[derive(Debug, Clone)]
pub struct Session {
    /// Normalized E.164 phone number of the remote party.
    pub user_key: String,
    /// Identifies this conversation flow; feedback is recorded against it.
    pub flow_id: Uuid,
    /// Profile captured when the session was created.
    pub user: UserProfile,
    /// AI backend correlation handle. Set once by the first reply that carries one.
    pub conversation_ref: Option<String>,
    pub last_activity_at: DateTime<Utc>,
    pub phase: Phase,
    pub feedback_prompt_sent_at: Option<DateTime<Utc>>,
    /// True when the sweeper (not an operator) issued the prompt.
    pub feedback_prompt_is_automatic: bool,
    /// Timestamps of recently accepted messages, oldest first.
    pub recent_messages: VecDeque<DateTime<Utc>>,
    pub outbound_target: OutboundTarget,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        user_key: impl Into<String>,
        user: UserProfile,
        outbound_target: OutboundTarget,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_key: user_key.into(),
            flow_id: Uuid::now_v7(),
            user,
            conversation_ref: None,
            last_activity_at: now,
            phase: Phase::Active,
            feedback_prompt_sent_at: None,
            feedback_prompt_is_automatic: false,
            recent_messages: VecDeque::new(),
            outbound_target,
            created_at: now,
        }
    }

    /// Record user activity.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    pub fn clear_prompt(&mut self) {
        self.feedback_prompt_sent_at = None;
        self.feedback_prompt_is_automatic = false;
    }

    pub fn mark_prompted(&mut self, now: DateTime<Utc>, automatic: bool) {
        self.feedback_prompt_sent_at = Some(now);
        self.feedback_prompt_is_automatic = automatic;
    }

    /// Move into the rating step. Pending inactivity prompts no longer apply.
    pub fn enter_rating(&mut self) {
        self.clear_prompt();
        self.phase = Phase::AwaitingRating;
    }

    pub fn is_prompted(&self) -> bool {
        self.feedback_prompt_sent_at.is_some()
    }

    /// Adopt the AI conversation handle unless one is already set.
    ///
    /// Returns whether the handle was stored.
    pub fn adopt_conversation_ref(&mut self, conversation_ref: &str) -> bool {
        if self.conversation_ref.is_some() || conversation_ref.is_empty() {
            return false;
        }
        self.conversation_ref = Some(conversation_ref.to_string());
        true
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            user_key: self.user_key.clone(),
            flow_id: self.flow_id,
            user_name: self.user.name.clone(),
            phase: self.phase,
            has_conversation_ref: self.conversation_ref.is_some(),
            last_activity_at: self.last_activity_at,
            feedback_prompt_sent_at: self.feedback_prompt_sent_at,
            feedback_prompt_is_automatic: self.feedback_prompt_is_automatic,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_profile(phone: &str, name: &str) -> UserProfile {
    let now = Utc::now();
    UserProfile {
        id: parley_types::user::UserId::new(),
        phone_number: phone.to_string(),
        name: name.to_string(),
        job_title: None,
        gender: None,
        date_of_birth: None,
        created_at: now,
        updated_at: now,
    }
}
