//! Persists the outcome of a feedback flow and closes the session.
//!
//! Shared by the engine (user-supplied rating and comment) and the sweeper
//! (auto-submitted default rating). At most one feedback record exists per
//! flow: the finalizer checks before inserting and the repository enforces a
//! unique flow id.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use parley_types::error::{FeedbackError, RepositoryError};
use parley_types::feedback::{Feedback, FeedbackOrigin, Rating, normalize_comment, validate_comment};

use super::session::Session;
use super::store::SessionStore;
use crate::repository::feedback::FeedbackRepository;
use crate::repository::user::UserRepository;

/// Why a feedback flow could not be finalized.
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("no live session for {0}")]
    SessionGone(String),

    #[error("sender {0} is not a registered user")]
    Unauthorized(String),

    #[error("feedback already recorded for flow {0}")]
    AlreadyRecorded(Uuid),

    #[error("session for {0} changed before feedback was recorded")]
    Superseded(String),

    #[error(transparent)]
    Invalid(#[from] FeedbackError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Validates, persists and closes a completed feedback flow.
pub struct FeedbackFinalizer<S: SessionStore, U: UserRepository, F: FeedbackRepository> {
    store: Arc<S>,
    users: Arc<U>,
    feedback: Arc<F>,
}

impl<S: SessionStore, U: UserRepository, F: FeedbackRepository> FeedbackFinalizer<S, U, F> {
    pub fn new(store: Arc<S>, users: Arc<U>, feedback: Arc<F>) -> Self {
        Self {
            store,
            users,
            feedback,
        }
    }

    /// Record feedback for the live session of `user_key`.
    pub async fn finalize(
        &self,
        user_key: &str,
        rating: Rating,
        comment: Option<&str>,
        origin: FeedbackOrigin,
    ) -> Result<Feedback, FinalizeError> {
        self.finalize_at(user_key, rating, comment, origin, Utc::now())
            .await
    }

    /// Same as [`finalize`](Self::finalize) with an explicit clock.
    ///
    /// On success or a terminal rejection the session is removed, but only
    /// while it still belongs to the flow that was finalized. A storage
    /// failure leaves the session in place so the user can retry.
    pub async fn finalize_at(
        &self,
        user_key: &str,
        rating: Rating,
        comment: Option<&str>,
        origin: FeedbackOrigin,
        now: DateTime<Utc>,
    ) -> Result<Feedback, FinalizeError> {
        self.finalize_guarded(user_key, rating, comment, origin, now, |_| true, false)
            .await
    }

    /// Record a system-generated rating for a session that still satisfies
    /// `guard`.
    ///
    /// `guard` is checked against the live session before any lookup and
    /// again atomically when the session is claimed. Claiming removes the
    /// session before the insert, so a message that arrives while the record
    /// is written starts a new flow instead of joining this one. A session
    /// that stopped matching in between is left alone and yields
    /// `FinalizeError::Superseded`.
    pub async fn auto_submit_at<G>(
        &self,
        user_key: &str,
        rating: Rating,
        now: DateTime<Utc>,
        guard: G,
    ) -> Result<Feedback, FinalizeError>
    where
        G: Fn(&Session) -> bool + Send + Sync,
    {
        self.finalize_guarded(user_key, rating, None, FeedbackOrigin::Auto, now, guard, true)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn finalize_guarded<G>(
        &self,
        user_key: &str,
        rating: Rating,
        comment: Option<&str>,
        origin: FeedbackOrigin,
        now: DateTime<Utc>,
        guard: G,
        claim: bool,
    ) -> Result<Feedback, FinalizeError>
    where
        G: Fn(&Session) -> bool + Send + Sync,
    {
        let session = self
            .store
            .get(user_key)
            .ok_or_else(|| FinalizeError::SessionGone(user_key.to_string()))?;
        if !guard(&session) {
            return Err(FinalizeError::Superseded(user_key.to_string()));
        }
        let flow_id = session.flow_id;
        let current = |s: &Session| s.flow_id == flow_id && guard(s);

        let comment = normalize_comment(comment);
        validate_comment(comment.as_deref())?;

        let Some(user) = self.users.find_by_phone(user_key).await? else {
            tracing::debug!(user_key = %user_key, "sender no longer registered, dropping session");
            self.store.remove_if(user_key, |s| current(s));
            return Err(FinalizeError::Unauthorized(user_key.to_string()));
        };

        if self.feedback.exists_for_flow(&flow_id).await? {
            tracing::warn!(user_key = %user_key, flow_id = %flow_id, "feedback already recorded for flow");
            self.store.remove_if(user_key, |s| current(s));
            return Err(FinalizeError::AlreadyRecorded(flow_id));
        }

        // Last look at the session before writing. Claiming takes it out of
        // the store in the same call.
        let still_current = if claim {
            self.store.remove_if(user_key, |s| current(s)).is_some()
        } else {
            self.store.get(user_key).is_some_and(|s| current(&s))
        };
        if !still_current {
            tracing::debug!(user_key = %user_key, flow_id = %flow_id, "session changed during finalize, not recording");
            return Err(FinalizeError::Superseded(user_key.to_string()));
        }

        let feedback = Feedback {
            id: Uuid::now_v7(),
            flow_id,
            user_id: user.id,
            phone_number: user.phone_number.clone(),
            rating,
            comment,
            origin,
            created_at: now,
        };

        let feedback = match self.feedback.create(&feedback).await {
            Ok(saved) => saved,
            Err(RepositoryError::Conflict(_)) => {
                self.store.remove_if(user_key, |s| current(s));
                return Err(FinalizeError::AlreadyRecorded(flow_id));
            }
            Err(e) => {
                tracing::error!(user_key = %user_key, flow_id = %flow_id, error = %e, "failed to save feedback");
                return Err(FinalizeError::Storage(e));
            }
        };

        self.store.remove_if(user_key, |s| current(s));
        tracing::info!(
            user_key = %user_key,
            flow_id = %flow_id,
            rating = %feedback.rating,
            origin = %feedback.origin,
            "feedback recorded"
        );
        Ok(feedback)
    }
}
