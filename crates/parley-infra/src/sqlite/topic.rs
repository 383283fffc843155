//! SQLite topic repository implementation.

use chrono::{DateTime, Utc};
use parley_core::repository::topic::TopicRepository;
use parley_types::error::RepositoryError;
use parley_types::topic::{HotTopic, NewTopic};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

pub struct SqliteTopicRepository {
    pool: DatabasePool,
}

impl SqliteTopicRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl TopicRepository for SqliteTopicRepository {
    async fn bulk_create(
        &self,
        topics: &[NewTopic],
        reported_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let created_at = format_datetime(&reported_at);
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;
        for topic in topics {
            sqlx::query("INSERT INTO topics (title, count, created_at) VALUES (?, ?, ?)")
                .bind(&topic.title)
                .bind(i64::from(topic.count))
                .bind(&created_at)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }
        tx.commit().await.map_err(query_error)?;
        Ok(topics.len() as u64)
    }

    async fn hot(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<HotTopic>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT title, SUM(count) AS total, MAX(created_at) AS last_reported_at
             FROM topics
             WHERE created_at >= ?
             GROUP BY title
             ORDER BY total DESC, title ASC
             LIMIT ?",
        )
        .bind(format_datetime(&since))
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut hot = Vec::with_capacity(rows.len());
        for row in &rows {
            let total: i64 = row.try_get("total").map_err(query_error)?;
            let last: String = row.try_get("last_reported_at").map_err(query_error)?;
            hot.push(HotTopic {
                title: row.try_get("title").map_err(query_error)?,
                count: total.max(0) as u64,
                last_reported_at: parse_datetime(&last)?,
            });
        }
        Ok(hot)
    }
}
