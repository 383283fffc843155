//! SQLite user repository implementation.
//!
//! Implements `UserRepository` from `parley-core` using sqlx with split read/write pools.

use chrono::{DateTime, NaiveDate, Utc};
use parley_core::repository::user::{UserFilter, UserRepository};
use parley_types::error::RepositoryError;
use parley_types::user::{Gender, UserId, UserProfile};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, query_error};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to a domain `UserProfile`.
struct UserRow {
    id: String,
    phone_number: String,
    name: String,
    job_title: Option<String>,
    gender: Option<String>,
    date_of_birth: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            phone_number: row.try_get("phone_number")?,
            name: row.try_get("name")?,
            job_title: row.try_get("job_title")?,
            gender: row.try_get("gender")?,
            date_of_birth: row.try_get("date_of_birth")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self) -> Result<UserProfile, RepositoryError> {
        let id = self
            .id
            .parse::<UserId>()
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;

        let gender = self
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let date_of_birth = self
            .date_of_birth
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid date of birth: {e}")))?;

        Ok(UserProfile {
            id,
            phone_number: self.phone_number,
            name: self.name,
            job_title: self.job_title,
            gender,
            date_of_birth,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// WHERE clause and its bind values for a user filter.
fn search_clause(filter: &UserFilter) -> (String, Vec<String>) {
    match filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            (
                " WHERE (name LIKE ? OR phone_number LIKE ?)".to_string(),
                vec![pattern.clone(), pattern],
            )
        }
        None => (String::new(), Vec::new()),
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &UserProfile) -> Result<UserProfile, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, phone_number, name, job_title, gender, date_of_birth, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.phone_number)
        .bind(&user.name)
        .bind(&user.job_title)
        .bind(user.gender.map(|g| g.to_string()))
        .bind(user.date_of_birth.as_ref().map(format_date))
        .bind(format_datetime(&user.created_at))
        .bind(format_datetime(&user.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "phone number '{}' already exists",
                user.phone_number
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|row| UserRow::from_row(&row).map_err(query_error)?.into_user())
            .transpose()
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE phone_number = ?")
            .bind(phone_number)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|row| UserRow::from_row(&row).map_err(query_error)?.into_user())
            .transpose()
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserProfile>, RepositoryError> {
        let (clause, binds) = search_clause(filter);
        let order = filter.sort_order.unwrap_or_default().as_sql();
        let mut sql = format!("SELECT * FROM users{clause} ORDER BY created_at {order}");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = filter.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            users.push(UserRow::from_row(row).map_err(query_error)?.into_user()?);
        }
        Ok(users)
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, RepositoryError> {
        let (clause, binds) = search_clause(filter);
        let sql = format!("SELECT COUNT(*) AS total FROM users{clause}");
        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value);
        }
        let row = query
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        let total: i64 = row.try_get("total").map_err(query_error)?;
        Ok(total.max(0) as u64)
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users WHERE created_at >= ?")
            .bind(format_datetime(&since))
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        let total: i64 = row.try_get("total").map_err(query_error)?;
        Ok(total.max(0) as u64)
    }

    async fn phone_numbers(&self) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar("SELECT phone_number FROM users ORDER BY phone_number ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)
    }

    async fn update(&self, user: &UserProfile) -> Result<UserProfile, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET phone_number = ?, name = ?, job_title = ?, gender = ?, date_of_birth = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&user.phone_number)
        .bind(&user.name)
        .bind(&user.job_title)
        .bind(user.gender.map(|g| g.to_string()))
        .bind(user.date_of_birth.as_ref().map(format_date))
        .bind(format_datetime(&user.updated_at))
        .bind(user.id.to_string())
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(RepositoryError::NotFound),
            Ok(_) => Ok(user.clone()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "phone number '{}' already exists",
                user.phone_number
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
