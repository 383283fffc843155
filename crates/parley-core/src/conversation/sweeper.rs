//! Background sweep driving the time-based transitions of idle sessions.
//!
//! A sweep runs in three steps so that no I/O happens while the store is
//! locked:
//!
//! 1. Scan every session under its lock and decide what to do. Prompts are
//!    marked as sent right away so a session is never prompted twice.
//! 2. With no lock held, send prompts and auto-submit feedback. An
//!    auto-submit only goes through if the session is still active on the
//!    same prompt when the finalizer claims it; a user who replied or asked
//!    to rate in the meantime keeps their session.
//! 3. Remove every session that was auto-submitted or auto-closed, provided
//!    it is still the same flow with the same prompt as observed in step 1.
//!    This happens even when step 2 failed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use parley_types::config::ConversationConfig;
use parley_types::conversation::{OutboundTarget, Phase};
use parley_types::feedback::Rating;
use parley_types::user::UserProfile;

use super::finalizer::{FeedbackFinalizer, FinalizeError};
use super::rate_limit::to_chrono;
use super::replies::Replies;
use super::session::Session;
use super::store::SessionStore;
use crate::repository::feedback::FeedbackRepository;
use crate::repository::user::UserRepository;
use crate::transport::OutboundSender;

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub prompted: usize,
    pub auto_submitted: usize,
    pub auto_closed: usize,
    pub failures: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == SweepReport::default()
    }
}

#[derive(Debug)]
enum SweepAction {
    SendPrompt {
        user: UserProfile,
        target: OutboundTarget,
    },
    AutoSubmit {
        user_key: String,
        target: OutboundTarget,
        flow_id: Uuid,
        prompt_sent_at: DateTime<Utc>,
    },
    AutoClose {
        user_key: String,
        flow_id: Uuid,
        prompt_sent_at: DateTime<Utc>,
    },
}

/// Periodic inactivity sweeper.
pub struct ExpirySweeper<S, U, F, O>
where
    S: SessionStore,
    U: UserRepository,
    F: FeedbackRepository,
    O: OutboundSender,
{
    store: Arc<S>,
    finalizer: Arc<FeedbackFinalizer<S, U, F>>,
    sender: Arc<O>,
    replies: Replies,
    prompt_delay: Duration,
    expiry_timeout: Duration,
    interval: std::time::Duration,
    auto_rating: Rating,
}

impl<S, U, F, O> ExpirySweeper<S, U, F, O>
where
    S: SessionStore,
    U: UserRepository,
    F: FeedbackRepository,
    O: OutboundSender,
{
    pub fn new(
        store: Arc<S>,
        finalizer: Arc<FeedbackFinalizer<S, U, F>>,
        sender: Arc<O>,
        config: &ConversationConfig,
        replies: Replies,
    ) -> Self {
        Self {
            store,
            finalizer,
            sender,
            replies,
            prompt_delay: to_chrono(config.prompt_delay()),
            expiry_timeout: to_chrono(config.expiry_timeout()),
            interval: config.sweep_interval(),
            auto_rating: config.auto_rating(),
        }
    }

    /// Sweep every `sweep_interval` until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the first sweep
        // happens one interval after startup.
        ticker.tick().await;

        tracing::info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.sweep().await;
                    if !report.is_empty() {
                        tracing::info!(
                            prompted = report.prompted,
                            auto_submitted = report.auto_submitted,
                            auto_closed = report.auto_closed,
                            failures = report.failures,
                            "sweep complete"
                        );
                    }
                }
            }
        }
        tracing::info!("expiry sweeper stopped");
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Run one sweep as of `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let actions = self.collect_actions(now);
        let mut report = SweepReport::default();
        if actions.is_empty() {
            return report;
        }

        for action in &actions {
            self.perform(action, now, &mut report).await;
        }

        for action in &actions {
            let (user_key, flow_id, prompt_sent_at) = match action {
                SweepAction::SendPrompt { .. } => continue,
                SweepAction::AutoSubmit {
                    user_key,
                    flow_id,
                    prompt_sent_at,
                    ..
                }
                | SweepAction::AutoClose {
                    user_key,
                    flow_id,
                    prompt_sent_at,
                } => (user_key, *flow_id, *prompt_sent_at),
            };
            self.store.remove_if(user_key, |s| {
                s.flow_id == flow_id
                    && s.phase == Phase::Active
                    && s.feedback_prompt_sent_at == Some(prompt_sent_at)
            });
        }

        report
    }

    fn collect_actions(&self, now: DateTime<Utc>) -> Vec<SweepAction> {
        let mut actions = Vec::new();
        self.store.for_each_mut(|s| {
            if s.phase != Phase::Active {
                return;
            }
            match s.feedback_prompt_sent_at {
                None => {
                    if now - s.last_activity_at >= self.prompt_delay {
                        s.mark_prompted(now, true);
                        actions.push(SweepAction::SendPrompt {
                            user: s.user.clone(),
                            target: s.outbound_target.clone(),
                        });
                    }
                }
                Some(prompt_sent_at) if now - prompt_sent_at >= self.expiry_timeout => {
                    let user_key = s.user_key.clone();
                    let flow_id = s.flow_id;
                    if s.feedback_prompt_is_automatic {
                        actions.push(SweepAction::AutoSubmit {
                            user_key,
                            target: s.outbound_target.clone(),
                            flow_id,
                            prompt_sent_at,
                        });
                    } else {
                        actions.push(SweepAction::AutoClose {
                            user_key,
                            flow_id,
                            prompt_sent_at,
                        });
                    }
                }
                Some(_) => {}
            }
        });
        actions
    }

    async fn perform(&self, action: &SweepAction, now: DateTime<Utc>, report: &mut SweepReport) {
        match action {
            SweepAction::SendPrompt { user, target } => {
                tracing::info!(user_key = %user.phone_number, "sending feedback prompt after inactivity");
                let prompt = self.replies.feedback_prompt(user, now, true);
                match self.sender.send_text(target, &prompt).await {
                    Ok(()) => report.prompted += 1,
                    Err(e) => {
                        tracing::warn!(user_key = %user.phone_number, error = %e, "failed to send feedback prompt");
                        report.failures += 1;
                    }
                }
            }
            SweepAction::AutoSubmit {
                user_key,
                target,
                flow_id,
                prompt_sent_at,
            } => {
                // Only a session still idling on this very prompt may be
                // rated on the user's behalf.
                let flow_id = *flow_id;
                let prompt_sent_at = *prompt_sent_at;
                let pending = move |s: &Session| {
                    s.flow_id == flow_id
                        && s.phase == Phase::Active
                        && s.feedback_prompt_sent_at == Some(prompt_sent_at)
                };

                match self
                    .finalizer
                    .auto_submit_at(user_key, self.auto_rating, now, pending)
                    .await
                {
                    Ok(_) => {
                        tracing::info!(user_key = %user_key, rating = %self.auto_rating, "auto-submitted feedback after unanswered prompt");
                        report.auto_submitted += 1;
                        if let Err(e) = self
                            .sender
                            .send_text(target, &self.replies.auto_submitted())
                            .await
                        {
                            tracing::warn!(user_key = %user_key, error = %e, "failed to send auto-submit confirmation");
                        }
                    }
                    Err(FinalizeError::SessionGone(_) | FinalizeError::Superseded(_)) => {
                        tracing::debug!(user_key = %user_key, "session changed since scan, skipping auto-submit");
                    }
                    Err(e) => {
                        tracing::error!(user_key = %user_key, error = %e, "failed to auto-submit feedback");
                        report.failures += 1;
                    }
                }
            }
            SweepAction::AutoClose { user_key, .. } => {
                tracing::info!(user_key = %user_key, "closing session after unanswered operator prompt");
                report.auto_closed += 1;
            }
        }
    }
}
