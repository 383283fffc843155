//! Read-side feedback service: listing, lookup and satisfaction metrics.

use chrono::{Duration, NaiveTime, Utc};
use uuid::Uuid;

use parley_types::error::FeedbackError;
use parley_types::feedback::{Feedback, FeedbackMetrics, Rating, SatisfactionTrendPoint};

use crate::repository::feedback::{FeedbackFilter, FeedbackRepository};

/// Default number of days covered by the satisfaction trend.
pub const DEFAULT_TREND_DAYS: u32 = 30;
/// Upper bound on the trend window.
pub const MAX_TREND_DAYS: u32 = 365;

pub struct FeedbackService<F: FeedbackRepository> {
    repo: F,
}

fn storage(err: impl std::fmt::Display) -> FeedbackError {
    FeedbackError::StorageError(err.to_string())
}

impl<F: FeedbackRepository> FeedbackService<F> {
    pub fn new(repo: F) -> Self {
        Self { repo }
    }

    /// List feedback (newest first) with the total matching count.
    pub async fn list(&self, filter: &FeedbackFilter) -> Result<(Vec<Feedback>, u64), FeedbackError> {
        for bound in [filter.min_rating, filter.max_rating].into_iter().flatten() {
            Rating::new(bound)?;
        }
        let items = self.repo.list(filter).await.map_err(storage)?;
        let total = self.repo.count(filter).await.map_err(storage)?;
        Ok((items, total))
    }

    pub async fn get(&self, id: &Uuid) -> Result<Feedback, FeedbackError> {
        self.repo
            .get(id)
            .await
            .map_err(storage)?
            .ok_or(FeedbackError::NotFound)
    }

    pub async fn metrics(&self) -> Result<FeedbackMetrics, FeedbackError> {
        self.repo.metrics().await.map_err(storage)
    }

    /// Daily average rating over the last `days` days, today included.
    pub async fn trend(&self, days: u32) -> Result<Vec<SatisfactionTrendPoint>, FeedbackError> {
        let days = days.clamp(1, MAX_TREND_DAYS);
        let start_day = Utc::now().date_naive() - Duration::days(i64::from(days) - 1);
        let since = start_day.and_time(NaiveTime::MIN).and_utc();
        self.repo.satisfaction_trend(since).await.map_err(storage)
    }
}
