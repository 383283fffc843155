//! Topic repository trait definition.

use chrono::{DateTime, Utc};
use parley_types::error::RepositoryError;
use parley_types::topic::{HotTopic, NewTopic};

/// Repository trait for reported conversation topics.
pub trait TopicRepository: Send + Sync {
    /// Store a batch of reports in one transaction, all stamped `reported_at`.
    /// Returns the number of rows written.
    fn bulk_create(
        &self,
        topics: &[NewTopic],
        reported_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Titles reported at or after `since`, summed per title, highest count
    /// first (ties by title), at most `limit` entries.
    fn hot(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<HotTopic>, RepositoryError>> + Send;
}
