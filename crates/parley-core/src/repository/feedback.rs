//! Feedback repository trait definition.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use parley_types::error::RepositoryError;
use parley_types::feedback::{Feedback, FeedbackMetrics, FeedbackOrigin, SatisfactionTrendPoint};

/// Filter criteria for listing feedback (newest first).
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub phone_number: Option<String>,
    pub min_rating: Option<u8>,
    pub max_rating: Option<u8>,
    pub origin: Option<FeedbackOrigin>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository trait for feedback persistence.
///
/// At most one feedback exists per conversation flow; `create` fails with
/// `Conflict` when the flow already has one.
pub trait FeedbackRepository: Send + Sync {
    fn create(
        &self,
        feedback: &Feedback,
    ) -> impl std::future::Future<Output = Result<Feedback, RepositoryError>> + Send;

    fn get(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Feedback>, RepositoryError>> + Send;

    /// Whether feedback has already been recorded for a flow.
    fn exists_for_flow(
        &self,
        flow_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    fn list(
        &self,
        filter: &FeedbackFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Feedback>, RepositoryError>> + Send;

    /// Count feedback matching the filter (pagination is ignored).
    fn count(
        &self,
        filter: &FeedbackFilter,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Aggregate metrics across all feedback.
    fn metrics(
        &self,
    ) -> impl std::future::Future<Output = Result<FeedbackMetrics, RepositoryError>> + Send;

    /// Daily average rating for feedback created at or after `since`, oldest day first.
    fn satisfaction_trend(
        &self,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<SatisfactionTrendPoint>, RepositoryError>> + Send;
}
