//! SQLite feedback repository implementation.
//!
//! One row per conversation flow, enforced by `UNIQUE(flow_id)`.

use chrono::{DateTime, NaiveDate, Utc};
use parley_core::repository::feedback::{FeedbackFilter, FeedbackRepository};
use parley_types::error::RepositoryError;
use parley_types::feedback::{
    Feedback, FeedbackMetrics, FeedbackOrigin, Rating, RatingCount, SatisfactionTrendPoint,
};
use parley_types::user::UserId;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, query_error};

/// SQLite-backed implementation of `FeedbackRepository`.
pub struct SqliteFeedbackRepository {
    pool: DatabasePool,
}

impl SqliteFeedbackRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct FeedbackRow {
    id: String,
    flow_id: String,
    user_id: String,
    phone_number: String,
    rating: i64,
    comment: Option<String>,
    origin: String,
    created_at: String,
}

impl FeedbackRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            flow_id: row.try_get("flow_id")?,
            user_id: row.try_get("user_id")?,
            phone_number: row.try_get("phone_number")?,
            rating: row.try_get("rating")?,
            comment: row.try_get("comment")?,
            origin: row.try_get("origin")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_feedback(self) -> Result<Feedback, RepositoryError> {
        let parse_uuid = |value: &str, what: &str| {
            value
                .parse::<Uuid>()
                .map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
        };

        let rating = u8::try_from(self.rating)
            .map_err(|_| RepositoryError::Query(format!("invalid rating: {}", self.rating)))
            .and_then(|v| Rating::new(v).map_err(|e| RepositoryError::Query(e.to_string())))?;

        let origin = self
            .origin
            .parse::<FeedbackOrigin>()
            .map_err(RepositoryError::Query)?;

        Ok(Feedback {
            id: parse_uuid(&self.id, "feedback id")?,
            flow_id: parse_uuid(&self.flow_id, "flow id")?,
            user_id: UserId(parse_uuid(&self.user_id, "user id")?),
            phone_number: self.phone_number,
            rating,
            comment: self.comment,
            origin,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

enum FilterValue {
    Text(String),
    Int(i64),
}

/// WHERE clause and its bind values for a feedback filter.
fn filter_clause(filter: &FeedbackFilter) -> (String, Vec<FilterValue>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(ref phone) = filter.phone_number {
        conditions.push("phone_number = ?");
        values.push(FilterValue::Text(phone.clone()));
    }
    if let Some(min) = filter.min_rating {
        conditions.push("rating >= ?");
        values.push(FilterValue::Int(i64::from(min)));
    }
    if let Some(max) = filter.max_rating {
        conditions.push("rating <= ?");
        values.push(FilterValue::Int(i64::from(max)));
    }
    if let Some(origin) = filter.origin {
        conditions.push("origin = ?");
        values.push(FilterValue::Text(origin.to_string()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn bind_values<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    values: &'q [FilterValue],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for value in values {
        query = match value {
            FilterValue::Text(s) => query.bind(s.as_str()),
            FilterValue::Int(i) => query.bind(*i),
        };
    }
    query
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl FeedbackRepository for SqliteFeedbackRepository {
    async fn create(&self, feedback: &Feedback) -> Result<Feedback, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO feedback (id, flow_id, user_id, phone_number, rating, comment, origin, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(feedback.id.to_string())
        .bind(feedback.flow_id.to_string())
        .bind(feedback.user_id.to_string())
        .bind(&feedback.phone_number)
        .bind(i64::from(feedback.rating.value()))
        .bind(&feedback.comment)
        .bind(feedback.origin.to_string())
        .bind(format_datetime(&feedback.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(feedback.clone()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "feedback already recorded for flow {}",
                feedback.flow_id
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Feedback>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM feedback WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|row| FeedbackRow::from_row(&row).map_err(query_error)?.into_feedback())
            .transpose()
    }

    async fn exists_for_flow(&self, flow_id: &Uuid) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 FROM feedback WHERE flow_id = ?")
            .bind(flow_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(row.is_some())
    }

    async fn list(&self, filter: &FeedbackFilter) -> Result<Vec<Feedback>, RepositoryError> {
        let (clause, values) = filter_clause(filter);
        let mut sql = format!("SELECT * FROM feedback{clause} ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = filter.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        let rows = bind_values(sqlx::query(&sql), &values)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(FeedbackRow::from_row(row).map_err(query_error)?.into_feedback()?);
        }
        Ok(items)
    }

    async fn count(&self, filter: &FeedbackFilter) -> Result<u64, RepositoryError> {
        let (clause, values) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) AS total FROM feedback{clause}");
        let row = bind_values(sqlx::query(&sql), &values)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        let total: i64 = row.try_get("total").map_err(query_error)?;
        Ok(total.max(0) as u64)
    }

    async fn metrics(&self) -> Result<FeedbackMetrics, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total,
                    COALESCE(AVG(rating), 0.0) AS average,
                    COALESCE(SUM(CASE WHEN rating >= 4 THEN 1 ELSE 0 END), 0) AS satisfied,
                    COALESCE(SUM(CASE WHEN origin = 'auto' THEN 1 ELSE 0 END), 0) AS auto_submitted
             FROM feedback",
        )
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let total: i64 = row.try_get("total").map_err(query_error)?;
        let average: f64 = row.try_get("average").map_err(query_error)?;
        let satisfied: i64 = row.try_get("satisfied").map_err(query_error)?;
        let auto_submitted: i64 = row.try_get("auto_submitted").map_err(query_error)?;

        let rows = sqlx::query("SELECT rating, COUNT(*) AS n FROM feedback GROUP BY rating")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut distribution: Vec<RatingCount> = (Rating::MIN..=Rating::MAX)
            .map(|rating| RatingCount { rating, count: 0 })
            .collect();
        for row in &rows {
            let rating: i64 = row.try_get("rating").map_err(query_error)?;
            let n: i64 = row.try_get("n").map_err(query_error)?;
            if let Some(slot) = distribution.iter_mut().find(|c| i64::from(c.rating) == rating) {
                slot.count = n.max(0) as u64;
            }
        }

        let satisfaction_score = if total > 0 {
            round2(satisfied as f64 * 100.0 / total as f64)
        } else {
            0.0
        };

        Ok(FeedbackMetrics {
            total: total.max(0) as u64,
            average_rating: round2(average),
            satisfaction_score,
            auto_submitted: auto_submitted.max(0) as u64,
            distribution,
        })
    }

    async fn satisfaction_trend(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SatisfactionTrendPoint>, RepositoryError> {
        // created_at is RFC3339 in UTC, so the first ten characters are the day.
        let rows = sqlx::query(
            "SELECT substr(created_at, 1, 10) AS day, AVG(rating) AS average, COUNT(*) AS n
             FROM feedback
             WHERE created_at >= ?
             GROUP BY day
             ORDER BY day ASC",
        )
        .bind(format_datetime(&since))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut points = Vec::with_capacity(rows.len());
        for row in &rows {
            let day: String = row.try_get("day").map_err(query_error)?;
            let average: f64 = row.try_get("average").map_err(query_error)?;
            let n: i64 = row.try_get("n").map_err(query_error)?;
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| RepositoryError::Query(format!("invalid day '{day}': {e}")))?;
            points.push(SatisfactionTrendPoint {
                date,
                average_rating: round2(average),
                count: n.max(0) as u64,
            });
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_pool;
    use crate::sqlite::user::SqliteUserRepository;
    use chrono::{Duration, TimeZone};
    use parley_core::repository::user::UserRepository;
    use parley_types::user::UserProfile;

    async fn seed_user(pool: &DatabasePool, phone: &str) -> UserProfile {
        let now = Utc::now();
        let user = UserProfile {
            id: UserId::new(),
            phone_number: phone.to_string(),
            name: "Sarah".to_string(),
            job_title: None,
            gender: None,
            date_of_birth: None,
            created_at: now,
            updated_at: now,
        };
        SqliteUserRepository::new(pool.clone())
            .create(&user)
            .await
            .unwrap()
    }

    fn make_feedback(user: &UserProfile, rating: u8, origin: FeedbackOrigin) -> Feedback {
        Feedback {
            id: Uuid::now_v7(),
            flow_id: Uuid::now_v7(),
            user_id: user.id,
            phone_number: user.phone_number.clone(),
            rating: Rating::new(rating).unwrap(),
            comment: (origin == FeedbackOrigin::User).then(|| "helpful".to_string()),
            origin,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_get_and_exists() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "+628123456789").await;
        let repo = SqliteFeedbackRepository::new(pool);

        let feedback = make_feedback(&user, 4, FeedbackOrigin::User);
        repo.create(&feedback).await.unwrap();

        let found = repo.get(&feedback.id).await.unwrap().unwrap();
        assert_eq!(found.rating.value(), 4);
        assert_eq!(found.comment.as_deref(), Some("helpful"));
        assert_eq!(found.origin, FeedbackOrigin::User);
        assert_eq!(found.user_id, user.id);

        assert!(repo.exists_for_flow(&feedback.flow_id).await.unwrap());
        assert!(!repo.exists_for_flow(&Uuid::now_v7()).await.unwrap());
        assert!(repo.get(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_flow_conflicts() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "+628123456789").await;
        let repo = SqliteFeedbackRepository::new(pool);

        let first = make_feedback(&user, 5, FeedbackOrigin::Auto);
        repo.create(&first).await.unwrap();

        let mut second = make_feedback(&user, 2, FeedbackOrigin::User);
        second.flow_id = first.flow_id;
        assert!(matches!(
            repo.create(&second).await.unwrap_err(),
            RepositoryError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_count() {
        let pool = test_pool().await;
        let sarah = seed_user(&pool, "+628111111111").await;
        let budi = seed_user(&pool, "+628222222222").await;
        let repo = SqliteFeedbackRepository::new(pool);

        repo.create(&make_feedback(&sarah, 5, FeedbackOrigin::Auto)).await.unwrap();
        repo.create(&make_feedback(&sarah, 2, FeedbackOrigin::User)).await.unwrap();
        repo.create(&make_feedback(&budi, 4, FeedbackOrigin::User)).await.unwrap();

        let by_phone = FeedbackFilter {
            phone_number: Some("+628111111111".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.list(&by_phone).await.unwrap().len(), 2);
        assert_eq!(repo.count(&by_phone).await.unwrap(), 2);

        let happy_users = FeedbackFilter {
            min_rating: Some(4),
            origin: Some(FeedbackOrigin::User),
            ..Default::default()
        };
        let found = repo.list(&happy_users).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].phone_number, "+628222222222");

        let page = FeedbackFilter {
            max_rating: Some(5),
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(repo.list(&page).await.unwrap().len(), 2);
        assert_eq!(repo.count(&page).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_metrics() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "+628123456789").await;
        let repo = SqliteFeedbackRepository::new(pool);

        let empty = repo.metrics().await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.average_rating, 0.0);
        assert_eq!(empty.distribution.len(), 5);

        for (rating, origin) in [
            (5, FeedbackOrigin::Auto),
            (4, FeedbackOrigin::User),
            (1, FeedbackOrigin::User),
            (5, FeedbackOrigin::User),
        ] {
            repo.create(&make_feedback(&user, rating, origin)).await.unwrap();
        }

        let metrics = repo.metrics().await.unwrap();
        assert_eq!(metrics.total, 4);
        assert_eq!(metrics.average_rating, 3.75);
        assert_eq!(metrics.satisfaction_score, 75.0);
        assert_eq!(metrics.auto_submitted, 1);
        assert_eq!(metrics.distribution[4], RatingCount { rating: 5, count: 2 });
        assert_eq!(metrics.distribution[1], RatingCount { rating: 2, count: 0 });
    }

    #[tokio::test]
    async fn test_satisfaction_trend_groups_by_day() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "+628123456789").await;
        let repo = SqliteFeedbackRepository::new(pool);

        let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let day2 = day1 + Duration::days(1);
        for (rating, at) in [(2, day1), (4, day1), (5, day2), (3, day1 - Duration::days(10))] {
            let mut feedback = make_feedback(&user, rating, FeedbackOrigin::User);
            feedback.created_at = at;
            repo.create(&feedback).await.unwrap();
        }

        let since = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let trend = repo.satisfaction_trend(since).await.unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(trend[0].average_rating, 3.0);
        assert_eq!(trend[0].count, 2);
        assert_eq!(trend[1].average_rating, 5.0);
    }
}
