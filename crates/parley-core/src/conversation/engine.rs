//! The conversation state machine.
//!
//! Each inbound message is dispatched on the sender's session phase:
//!
//! - no session: authorize, create the session and greet.
//! - `AwaitingRating`: parse a 1-5 rating or ask again.
//! - `AwaitingComment`: finalize with the comment (or none on skip).
//! - `Active`: help and end commands, then the rate limiter, then the AI
//!   backend for ordinary text.
//!
//! Store calls never span I/O. Decisions are taken inside one store call and
//! the resulting sends and backend calls happen afterwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use parley_types::config::{BotConfig, ConversationConfig};
use parley_types::conversation::{InboundMessage, OutboundTarget, Phase, SessionSummary};
use parley_types::feedback::{FeedbackOrigin, MAX_COMMENT_CHARS, Rating};
use parley_types::user::normalize_phone;

use super::finalizer::{FeedbackFinalizer, FinalizeError};
use super::rate_limit::{RateDecision, RateLimiter};
use super::replies::Replies;
use super::session::Session;
use super::store::SessionStore;
use super::sweeper::ExpirySweeper;
use crate::ai::AiBackend;
use crate::repository::feedback::FeedbackRepository;
use crate::repository::user::UserRepository;
use crate::transport::OutboundSender;

/// What the engine did with an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
    /// Empty text, own echo, or a session that vanished mid-dispatch.
    Ignored,
    /// Sender is not a registered user; nothing was sent.
    Unauthorized,
    SessionStarted { flow_id: Uuid },
    HelpSent,
    RatingRequested,
    RatingAccepted(Rating),
    RatingRejected,
    CommentTooLong,
    FeedbackRecorded { feedback_id: Uuid },
    /// Persisting the feedback failed; the session is kept for a retry.
    FeedbackFailed,
    Throttled(RateDecision),
    Answered,
    AiFailed,
}

/// Result of an operator asking a user for feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackRequestOutcome {
    Sent,
    NoSession,
    /// The user is already rating or commenting.
    NotActive,
    AlreadyPrompted,
}

/// Per-message conversation state machine.
///
/// Generic over the session store and every port so that tests can run it
/// against in-memory fakes.
pub struct ConversationEngine<S, U, F, A, O>
where
    S: SessionStore,
    U: UserRepository,
    F: FeedbackRepository,
    A: AiBackend,
    O: OutboundSender,
{
    store: Arc<S>,
    users: Arc<U>,
    ai: Arc<A>,
    sender: Arc<O>,
    finalizer: Arc<FeedbackFinalizer<S, U, F>>,
    limiter: RateLimiter,
    replies: Replies,
    config: ConversationConfig,
}

impl<S, U, F, A, O> ConversationEngine<S, U, F, A, O>
where
    S: SessionStore,
    U: UserRepository,
    F: FeedbackRepository,
    A: AiBackend,
    O: OutboundSender,
{
    pub fn new(
        store: Arc<S>,
        users: Arc<U>,
        feedback: Arc<F>,
        ai: Arc<A>,
        sender: Arc<O>,
        config: &BotConfig,
    ) -> Self {
        let finalizer = Arc::new(FeedbackFinalizer::new(
            Arc::clone(&store),
            Arc::clone(&users),
            feedback,
        ));
        Self {
            store,
            users,
            ai,
            sender,
            finalizer,
            limiter: RateLimiter::new(&config.rate_limit),
            replies: Replies::new(&config.conversation, &config.rate_limit),
            config: config.conversation.clone(),
        }
    }

    /// Build the expiry sweeper sharing this engine's store, finalizer and sender.
    pub fn sweeper(&self) -> ExpirySweeper<S, U, F, O> {
        ExpirySweeper::new(
            Arc::clone(&self.store),
            Arc::clone(&self.finalizer),
            Arc::clone(&self.sender),
            &self.config,
            self.replies.clone(),
        )
    }

    /// Summaries of every live session, most recently active first.
    pub fn sessions(&self) -> Vec<SessionSummary> {
        let mut sessions: Vec<SessionSummary> =
            self.store.snapshot().iter().map(Session::summary).collect();
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        sessions
    }

    pub async fn handle_message(&self, message: &InboundMessage) -> HandleOutcome {
        self.handle_message_at(message, Utc::now()).await
    }

    /// Dispatch one inbound message as if it arrived at `now`.
    pub async fn handle_message_at(&self, message: &InboundMessage, now: DateTime<Utc>) -> HandleOutcome {
        if message.from_me {
            return HandleOutcome::Ignored;
        }
        let text = message.text.trim();
        let user_key = normalize_phone(&message.from);
        if text.is_empty() || user_key.is_empty() {
            return HandleOutcome::Ignored;
        }

        tracing::debug!(user_key = %user_key, len = text.len(), "inbound message");

        let Some(session) = self.store.get(&user_key) else {
            return self
                .start_session(&user_key, message.reply_target(), now)
                .await;
        };

        match session.phase {
            Phase::AwaitingRating => self.handle_rating(&session, text).await,
            Phase::AwaitingComment { rating } => self.handle_comment(&session, rating, text, now).await,
            Phase::Active => self.handle_active(&session, text, now).await,
        }
    }

    /// Operator-initiated feedback prompt for an active session.
    ///
    /// The prompt is marked manual: if it goes unanswered the sweeper closes
    /// the session without recording a rating.
    pub async fn request_feedback(&self, user_key: &str) -> FeedbackRequestOutcome {
        self.request_feedback_at(user_key, Utc::now()).await
    }

    pub async fn request_feedback_at(&self, user_key: &str, now: DateTime<Utc>) -> FeedbackRequestOutcome {
        let user_key = normalize_phone(user_key);
        let decision = self.store.update(&user_key, |s| {
            if s.phase.is_mid_feedback() {
                Err(FeedbackRequestOutcome::NotActive)
            } else if s.is_prompted() {
                Err(FeedbackRequestOutcome::AlreadyPrompted)
            } else {
                s.mark_prompted(now, false);
                Ok((s.user.clone(), s.outbound_target.clone()))
            }
        });

        match decision {
            None => FeedbackRequestOutcome::NoSession,
            Some(Err(outcome)) => outcome,
            Some(Ok((user, target))) => {
                let prompt = self.replies.feedback_prompt(&user, now, false);
                self.send(&target, &prompt).await;
                tracing::info!(user_key = %user_key, "feedback requested by operator");
                FeedbackRequestOutcome::Sent
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase handlers
    // -----------------------------------------------------------------------

    async fn start_session(&self, user_key: &str, target: OutboundTarget, now: DateTime<Utc>) -> HandleOutcome {
        let user = match self.users.find_by_phone(user_key).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(user_key = %user_key, "ignoring message from unregistered sender");
                return HandleOutcome::Unauthorized;
            }
            Err(e) => {
                tracing::error!(user_key = %user_key, error = %e, "failed to authorize sender");
                return HandleOutcome::Ignored;
            }
        };

        let (session, created) = self.store.get_or_create(user_key, || {
            Session::new(user_key, user.clone(), target.clone(), now)
        });
        if !created {
            // Another message from the same sender won the race and greeted.
            return HandleOutcome::Ignored;
        }

        tracing::info!(user_key = %user_key, flow_id = %session.flow_id, "conversation started");
        let welcome = self.replies.welcome(&user, now);
        self.send(&session.outbound_target, &welcome).await;
        HandleOutcome::SessionStarted {
            flow_id: session.flow_id,
        }
    }

    async fn handle_rating(&self, session: &Session, text: &str) -> HandleOutcome {
        let Ok(rating) = text.parse::<Rating>() else {
            self.send(&session.outbound_target, &self.replies.invalid_rating())
                .await;
            return HandleOutcome::RatingRejected;
        };

        let flow_id = session.flow_id;
        let accepted = self.store.update(&session.user_key, |s| {
            if s.flow_id == flow_id && s.phase == Phase::AwaitingRating {
                s.phase = Phase::AwaitingComment { rating };
                true
            } else {
                false
            }
        });
        if accepted != Some(true) {
            return HandleOutcome::Ignored;
        }

        tracing::debug!(user_key = %session.user_key, rating = %rating, "rating received");
        self.send(&session.outbound_target, &self.replies.rating_confirmation(rating))
            .await;
        HandleOutcome::RatingAccepted(rating)
    }

    async fn handle_comment(
        &self,
        session: &Session,
        rating: Rating,
        text: &str,
        now: DateTime<Utc>,
    ) -> HandleOutcome {
        let comment = if self.config.is_skip_command(text) {
            None
        } else {
            Some(text)
        };

        if comment.is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS) {
            self.send(&session.outbound_target, &self.replies.comment_too_long())
                .await;
            return HandleOutcome::CommentTooLong;
        }

        match self
            .finalizer
            .finalize_at(&session.user_key, rating, comment, FeedbackOrigin::User, now)
            .await
        {
            Ok(feedback) => {
                let goodbye = self
                    .replies
                    .goodbye(rating, feedback.comment.is_some(), now);
                self.send(&session.outbound_target, &goodbye).await;
                HandleOutcome::FeedbackRecorded {
                    feedback_id: feedback.id,
                }
            }
            Err(FinalizeError::Unauthorized(_)) => HandleOutcome::Unauthorized,
            Err(
                FinalizeError::SessionGone(_)
                | FinalizeError::Superseded(_)
                | FinalizeError::AlreadyRecorded(_),
            ) => {
                HandleOutcome::Ignored
            }
            Err(FinalizeError::Invalid(_)) => {
                self.send(&session.outbound_target, &self.replies.comment_too_long())
                    .await;
                HandleOutcome::CommentTooLong
            }
            Err(FinalizeError::Storage(_)) => {
                self.send(&session.outbound_target, &self.replies.save_failed())
                    .await;
                HandleOutcome::FeedbackFailed
            }
        }
    }

    async fn handle_active(&self, session: &Session, text: &str, now: DateTime<Utc>) -> HandleOutcome {
        let user_key = session.user_key.as_str();
        let flow_id = session.flow_id;

        if self.config.is_help_command(text) {
            self.send(&session.outbound_target, &self.replies.help()).await;
            return HandleOutcome::HelpSent;
        }

        if self.config.is_end_command(text) {
            let entered = self.store.update(user_key, |s| {
                if s.flow_id == flow_id && s.phase == Phase::Active {
                    s.enter_rating();
                    true
                } else {
                    false
                }
            });
            if entered != Some(true) {
                return HandleOutcome::Ignored;
            }
            tracing::debug!(user_key = %user_key, "user ended conversation, requesting rating");
            self.send(&session.outbound_target, &self.replies.rating_request())
                .await;
            return HandleOutcome::RatingRequested;
        }

        // Rate check and activity refresh in one store call: a throttled
        // message must not count as activity.
        let admitted = self.store.update(user_key, |s| {
            if s.flow_id != flow_id {
                return None;
            }
            let decision = self.limiter.check(&mut s.recent_messages, now);
            if decision.is_allowed() {
                s.clear_prompt();
                s.touch(now);
            }
            Some((decision, s.conversation_ref.clone()))
        });
        let Some(Some((decision, conversation_ref))) = admitted else {
            return HandleOutcome::Ignored;
        };

        match decision {
            RateDecision::Allowed => {}
            RateDecision::TooFast => {
                tracing::debug!(user_key = %user_key, "message sent too quickly");
                self.send(&session.outbound_target, &self.replies.too_fast())
                    .await;
                return HandleOutcome::Throttled(decision);
            }
            RateDecision::WindowFull => {
                tracing::debug!(user_key = %user_key, "message window full");
                self.send(&session.outbound_target, &self.replies.window_full())
                    .await;
                return HandleOutcome::Throttled(decision);
            }
        }

        match self
            .ai
            .chat(conversation_ref.as_deref(), user_key, text)
            .await
        {
            Ok(reply) => {
                if let Some(new_ref) = reply.conversation_ref.as_deref() {
                    self.store.update(user_key, |s| {
                        if s.flow_id == flow_id {
                            s.adopt_conversation_ref(new_ref);
                        }
                    });
                }
                self.send(&session.outbound_target, &reply.answer).await;
                HandleOutcome::Answered
            }
            Err(e) => {
                tracing::warn!(user_key = %user_key, error = %e, "AI backend failed");
                self.send(&session.outbound_target, &self.replies.ai_failed())
                    .await;
                HandleOutcome::AiFailed
            }
        }
    }

    async fn send(&self, target: &OutboundTarget, text: &str) {
        if let Err(e) = self.sender.send_text(target, text).await {
            tracing::warn!(to = %target, error = %e, "failed to send message");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use parley_types::user::UserProfile;

    use super::*;
    use crate::conversation::session::test_profile;
    use crate::conversation::store::InMemorySessionStore;
    use crate::conversation::test_support::{
        FakeAi, FakeFeedbackRepo, FakeUserRepo, KEY, RAW_FROM, RecordingSender,
    };

    type TestEngine =
        ConversationEngine<InMemorySessionStore, FakeUserRepo, FakeFeedbackRepo, FakeAi, RecordingSender>;

    struct Harness {
        engine: TestEngine,
        store: Arc<InMemorySessionStore>,
        users: Arc<FakeUserRepo>,
        feedback: Arc<FakeFeedbackRepo>,
        ai: Arc<FakeAi>,
        sender: Arc<RecordingSender>,
    }

    fn harness_with(feedback: FakeFeedbackRepo, ai: FakeAi) -> Harness {
        let store = Arc::new(InMemorySessionStore::new());
        let users = Arc::new(FakeUserRepo::with_default_user());
        let feedback = Arc::new(feedback);
        let ai = Arc::new(ai);
        let sender = Arc::new(RecordingSender::default());
        let engine = ConversationEngine::new(
            Arc::clone(&store),
            Arc::clone(&users),
            Arc::clone(&feedback),
            Arc::clone(&ai),
            Arc::clone(&sender),
            &BotConfig::default(),
        );
        Harness {
            engine,
            store,
            users,
            feedback,
            ai,
            sender,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeFeedbackRepo::default(), FakeAi::default())
    }

    fn msg(text: &str) -> InboundMessage {
        InboundMessage {
            from: RAW_FROM.to_string(),
            chat: None,
            text: text.to_string(),
            from_me: false,
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    impl Harness {
        async fn say(&self, text: &str, secs: i64) -> HandleOutcome {
            self.engine.handle_message_at(&msg(text), at(secs)).await
        }

        async fn start(&self) {
            let outcome = self.say("hello", 0).await;
            assert!(matches!(outcome, HandleOutcome::SessionStarted { .. }));
        }

        fn phase(&self) -> Option<Phase> {
            self.store.get(KEY).map(|s| s.phase)
        }
    }

    #[tokio::test]
    async fn test_first_message_creates_session_and_greets() {
        let h = harness();
        let outcome = h.say("hello", 0).await;

        let session = h.store.get(KEY).unwrap();
        assert_eq!(outcome, HandleOutcome::SessionStarted { flow_id: session.flow_id });
        assert_eq!(session.phase, Phase::Active);
        assert_eq!(session.outbound_target, OutboundTarget(RAW_FROM.to_string()));

        let sent = h.sender.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Sarah"));
        // The greeting message is not relayed to the AI backend
        assert!(h.ai.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_sender_is_dropped_silently() {
        let h = harness();
        let outcome = h
            .engine
            .handle_message_at(
                &InboundMessage {
                    from: "628999999999".to_string(),
                    chat: None,
                    text: "hi".to_string(),
                    from_me: false,
                },
                t0(),
            )
            .await;
        assert_eq!(outcome, HandleOutcome::Unauthorized);
        assert!(h.store.is_empty());
        assert!(h.sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_own_and_empty_messages_are_ignored() {
        let h = harness();
        let mut own = msg("hello");
        own.from_me = true;
        assert_eq!(h.engine.handle_message_at(&own, t0()).await, HandleOutcome::Ignored);
        assert_eq!(h.say("   ", 0).await, HandleOutcome::Ignored);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_ordinary_text_is_relayed_and_ref_stored_once() {
        let h = harness();
        h.start().await;

        assert_eq!(h.say("what are your hours?", 10).await, HandleOutcome::Answered);
        assert_eq!(h.sender.last_text().unwrap(), "echo: what are your hours?");
        assert_eq!(h.store.get(KEY).unwrap().conversation_ref.as_deref(), Some("conv-1"));

        assert_eq!(h.say("and on weekends?", 20).await, HandleOutcome::Answered);
        let calls = h.ai.calls();
        assert_eq!(calls[1].0.as_deref(), Some("conv-1"));
        // The second reply's ref does not overwrite the first
        assert_eq!(h.store.get(KEY).unwrap().conversation_ref.as_deref(), Some("conv-1"));
        assert_eq!(h.store.get(KEY).unwrap().last_activity_at, at(20));
    }

    #[tokio::test]
    async fn test_ai_failure_sends_apology_and_keeps_session() {
        let h = harness_with(FakeFeedbackRepo::default(), FakeAi::failing());
        h.start().await;

        assert_eq!(h.say("question", 10).await, HandleOutcome::AiFailed);
        assert!(h.sender.last_text().unwrap().starts_with("Sorry, I cannot process"));
        let session = h.store.get(KEY).unwrap();
        assert_eq!(session.phase, Phase::Active);
        assert!(session.conversation_ref.is_none());
    }

    #[tokio::test]
    async fn test_help_command_is_case_insensitive() {
        let h = harness();
        h.start().await;
        assert_eq!(h.say("/HELP", 5).await, HandleOutcome::HelpSent);
        assert!(h.sender.last_text().unwrap().contains("How to use"));
        assert!(h.ai.calls().is_empty());
    }

    #[tokio::test]
    async fn test_full_feedback_flow_with_comment() {
        let h = harness();
        h.start().await;
        let flow_id = h.store.get(KEY).unwrap().flow_id;

        assert_eq!(h.say("/selesai", 10).await, HandleOutcome::RatingRequested);
        assert_eq!(h.phase(), Some(Phase::AwaitingRating));

        let three = Rating::new(3).unwrap();
        assert_eq!(h.say("3", 20).await, HandleOutcome::RatingAccepted(three));
        assert_eq!(h.phase(), Some(Phase::AwaitingComment { rating: three }));

        let outcome = h.say("great", 30).await;
        assert!(matches!(outcome, HandleOutcome::FeedbackRecorded { .. }));
        assert!(h.store.get(KEY).is_none());

        let records = h.feedback.all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].flow_id, flow_id);
        assert_eq!(records[0].rating, three);
        assert_eq!(records[0].comment.as_deref(), Some("great"));
        assert_eq!(records[0].origin, FeedbackOrigin::User);
        assert!(h.sender.last_text().unwrap().contains("valuable"));
    }

    #[tokio::test]
    async fn test_skip_records_feedback_without_comment() {
        let h = harness();
        h.start().await;
        h.say("/end", 10).await;
        h.say("5", 20).await;

        let outcome = h.say("/SKIP", 30).await;
        assert!(matches!(outcome, HandleOutcome::FeedbackRecorded { .. }));
        let records = h.feedback.all();
        assert_eq!(records[0].comment, None);
        assert!(h.sender.last_text().unwrap().starts_with("Glad to hear"));
    }

    #[tokio::test]
    async fn test_invalid_ratings_keep_asking() {
        let h = harness();
        h.start().await;
        h.say("/selesai", 10).await;

        for input in ["0", "6", "abc", "4.5"] {
            assert_eq!(h.say(input, 20).await, HandleOutcome::RatingRejected);
            assert_eq!(h.phase(), Some(Phase::AwaitingRating));
        }
        assert!(h.sender.last_text().unwrap().contains("from 1 to 5"));
        assert!(h.ai.calls().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_comment_asks_again() {
        let h = harness();
        h.start().await;
        h.say("/selesai", 10).await;
        h.say("2", 20).await;

        let long = "x".repeat(MAX_COMMENT_CHARS + 1);
        assert_eq!(h.say(&long, 30).await, HandleOutcome::CommentTooLong);
        assert!(matches!(h.phase(), Some(Phase::AwaitingComment { .. })));
        assert!(h.feedback.all().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_session_for_retry() {
        let h = harness_with(FakeFeedbackRepo::failing(), FakeAi::default());
        h.start().await;
        h.say("/selesai", 10).await;
        h.say("4", 20).await;

        assert_eq!(h.say("nice", 30).await, HandleOutcome::FeedbackFailed);
        assert!(h.sender.last_text().unwrap().contains("saving your feedback"));
        assert!(matches!(h.phase(), Some(Phase::AwaitingComment { .. })));
    }

    #[tokio::test]
    async fn test_user_removed_mid_flow_drops_session() {
        let h = harness();
        h.start().await;
        h.say("/selesai", 10).await;
        h.say("4", 20).await;
        h.users.remove_phone(KEY);

        assert_eq!(h.say("nice", 30).await, HandleOutcome::Unauthorized);
        assert!(h.store.get(KEY).is_none());
        assert!(h.feedback.all().is_empty());
    }

    #[tokio::test]
    async fn test_rapid_messages_are_throttled_without_activity_update() {
        let h = harness();
        h.start().await;

        assert_eq!(h.say("one", 10).await, HandleOutcome::Answered);
        assert_eq!(
            h.say("two", 11).await,
            HandleOutcome::Throttled(RateDecision::TooFast)
        );
        assert_eq!(h.store.get(KEY).unwrap().last_activity_at, at(10));
        assert!(h.sender.last_text().unwrap().contains("wait a moment"));
    }

    #[tokio::test]
    async fn test_twenty_first_message_in_window_is_rejected() {
        let h = harness();
        h.start().await;

        for i in 1..=20 {
            assert_eq!(h.say("question", i * 5).await, HandleOutcome::Answered);
        }
        let before = h.store.get(KEY).unwrap().last_activity_at;
        assert_eq!(
            h.say("question", 21 * 5).await,
            HandleOutcome::Throttled(RateDecision::WindowFull)
        );
        assert_eq!(h.store.get(KEY).unwrap().last_activity_at, before);
        assert_eq!(h.ai.calls().len(), 20);
    }

    #[tokio::test]
    async fn test_ordinary_text_clears_pending_prompt() {
        let h = harness();
        h.start().await;
        h.store.update(KEY, |s| s.mark_prompted(at(5), true));

        h.say("still here", 10).await;
        let session = h.store.get(KEY).unwrap();
        assert!(!session.is_prompted());
        assert!(!session.feedback_prompt_is_automatic);
    }

    #[tokio::test]
    async fn test_request_feedback_marks_manual_prompt() {
        let h = harness();
        assert_eq!(
            h.engine.request_feedback_at(KEY, at(0)).await,
            FeedbackRequestOutcome::NoSession
        );

        h.start().await;
        assert_eq!(
            h.engine.request_feedback_at(RAW_FROM, at(30)).await,
            FeedbackRequestOutcome::Sent
        );
        let session = h.store.get(KEY).unwrap();
        assert_eq!(session.feedback_prompt_sent_at, Some(at(30)));
        assert!(!session.feedback_prompt_is_automatic);
        assert!(h.sender.last_text().unwrap().contains("/selesai"));

        assert_eq!(
            h.engine.request_feedback_at(KEY, at(40)).await,
            FeedbackRequestOutcome::AlreadyPrompted
        );

        h.say("/selesai", 50).await;
        assert_eq!(
            h.engine.request_feedback_at(KEY, at(60)).await,
            FeedbackRequestOutcome::NotActive
        );
    }

    #[tokio::test]
    async fn test_sessions_lists_summaries() {
        let h = harness();
        h.start().await;
        let mut other: UserProfile = test_profile("+628111111111", "Budi");
        other.job_title = Some("Analyst".to_string());
        h.users.insert(other);
        h.engine
            .handle_message_at(
                &InboundMessage {
                    from: "628111111111".to_string(),
                    chat: None,
                    text: "hi".to_string(),
                    from_me: false,
                },
                at(30),
            )
            .await;

        let sessions = h.engine.sessions();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].user_name, "Budi");
        assert_eq!(sessions[1].user_name, "Sarah");
    }
}
