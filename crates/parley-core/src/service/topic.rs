//! Hot-topic service: accepts topic reports and ranks them.

use chrono::{DateTime, Duration, Utc};

use parley_types::error::TopicError;
use parley_types::topic::{
    BulkCreateTopicsRequest, HOT_TOPIC_LIMIT, HOT_TOPIC_WINDOW_DAYS, HotTopic,
};

use crate::repository::topic::TopicRepository;

pub struct TopicService<T: TopicRepository> {
    repo: T,
}

fn storage(err: impl std::fmt::Display) -> TopicError {
    TopicError::StorageError(err.to_string())
}

impl<T: TopicRepository> TopicService<T> {
    pub fn new(repo: T) -> Self {
        Self { repo }
    }

    /// Validate and store a batch of topic reports. Nothing is stored when
    /// any entry is invalid.
    pub async fn bulk_create(&self, request: &BulkCreateTopicsRequest) -> Result<u64, TopicError> {
        self.bulk_create_at(request, Utc::now()).await
    }

    pub async fn bulk_create_at(
        &self,
        request: &BulkCreateTopicsRequest,
        now: DateTime<Utc>,
    ) -> Result<u64, TopicError> {
        let topics = request.validate()?;
        let written = self.repo.bulk_create(&topics, now).await.map_err(storage)?;
        tracing::info!(topics = written, "topic reports stored");
        Ok(written)
    }

    /// The most reported titles of the last 30 days.
    pub async fn hot_topics(&self) -> Result<Vec<HotTopic>, TopicError> {
        self.hot_topics_at(Utc::now()).await
    }

    pub async fn hot_topics_at(&self, now: DateTime<Utc>) -> Result<Vec<HotTopic>, TopicError> {
        let since = now - Duration::days(HOT_TOPIC_WINDOW_DAYS);
        self.repo.hot(since, HOT_TOPIC_LIMIT).await.map_err(storage)
    }
}
