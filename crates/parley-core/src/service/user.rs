//! User management service.
//!
//! Registers, updates and removes the users allowed to talk to the bot.
//! Phone numbers are normalized to E.164 before validation and storage so
//! that they match the keys derived from inbound messages.

use chrono::{DateTime, Duration, Utc};

use parley_types::error::{RepositoryError, UserError};
use parley_types::user::{
    CreateUserRequest, ImportFailure, ImportReport, ImportRow, NEW_USER_WINDOW_DAYS,
    UpdateUserRequest, UserId, UserMetrics, UserProfile, normalize_phone, validate_name,
    validate_phone,
};

use crate::repository::user::{UserFilter, UserRepository};

/// Service orchestrating the user lifecycle.
pub struct UserService<U: UserRepository> {
    repo: U,
}

fn map_repo_error(err: RepositoryError, phone: &str) -> UserError {
    match err {
        RepositoryError::Conflict(_) => UserError::PhoneConflict(phone.to_string()),
        RepositoryError::NotFound => UserError::NotFound,
        other => UserError::StorageError(other.to_string()),
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &U {
        &self.repo
    }

    /// Register a new user.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserProfile, UserError> {
        let phone = normalize_phone(&request.phone_number);
        validate_phone(&phone)?;
        validate_name(&request.name)?;

        let now = Utc::now();
        let user = UserProfile {
            id: UserId::new(),
            phone_number: phone.clone(),
            name: request.name.trim().to_string(),
            job_title: clean_optional(request.job_title),
            gender: request.gender,
            date_of_birth: request.date_of_birth,
            created_at: now,
            updated_at: now,
        };

        let user = self
            .repo
            .create(&user)
            .await
            .map_err(|e| map_repo_error(e, &phone))?;
        tracing::info!(user_id = %user.id, phone = %user.phone_number, "user registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<UserProfile, UserError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?
            .ok_or(UserError::NotFound)
    }

    /// Look up a user by phone number in any accepted spelling.
    pub async fn get_by_phone(&self, phone: &str) -> Result<UserProfile, UserError> {
        let phone = normalize_phone(phone);
        self.repo
            .find_by_phone(&phone)
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?
            .ok_or(UserError::NotFound)
    }

    /// Resolve a user from either a UUID or a phone number.
    pub async fn resolve(&self, id_or_phone: &str) -> Result<UserProfile, UserError> {
        match id_or_phone.parse::<UserId>() {
            Ok(id) => self.get_user(&id).await,
            Err(_) => self.get_by_phone(id_or_phone).await,
        }
    }

    /// List users along with the total matching count.
    pub async fn list_users(&self, filter: &UserFilter) -> Result<(Vec<UserProfile>, u64), UserError> {
        let users = self
            .repo
            .list(filter)
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?;
        let total = self
            .repo
            .count(filter)
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?;
        Ok((users, total))
    }

    /// Register every row of a bulk import. Rows that fail to parse or
    /// validate, or whose phone number is taken, are reported and skipped;
    /// a storage failure aborts the import.
    pub async fn import_users(&self, rows: Vec<ImportRow>) -> Result<ImportReport, UserError> {
        let mut report = ImportReport {
            total_rows: rows.len(),
            ..Default::default()
        };

        for row in rows {
            let request = match row.parsed {
                Ok(request) => request,
                Err(reason) => {
                    report.failures.push(ImportFailure {
                        line: row.line,
                        phone_number: None,
                        reason,
                    });
                    continue;
                }
            };

            let phone = normalize_phone(&request.phone_number);
            match self.create_user(request).await {
                Ok(_) => report.imported += 1,
                Err(UserError::StorageError(e)) => return Err(UserError::StorageError(e)),
                Err(e) => report.failures.push(ImportFailure {
                    line: row.line,
                    phone_number: Some(phone),
                    reason: e.to_string(),
                }),
            }
        }

        tracing::info!(
            imported = report.imported,
            skipped = report.failures.len(),
            "user import finished"
        );
        Ok(report)
    }

    pub async fn metrics(&self) -> Result<UserMetrics, UserError> {
        self.metrics_at(Utc::now()).await
    }

    pub async fn metrics_at(&self, now: DateTime<Utc>) -> Result<UserMetrics, UserError> {
        let total_users = self
            .repo
            .count(&UserFilter::default())
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?;
        let new_users = self
            .repo
            .count_created_since(now - Duration::days(NEW_USER_WINDOW_DAYS))
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))?;
        Ok(UserMetrics {
            total_users,
            new_users,
        })
    }

    /// All registered phone numbers, e.g. for a gateway allow-list.
    pub async fn phone_numbers(&self) -> Result<Vec<String>, UserError> {
        self.repo
            .phone_numbers()
            .await
            .map_err(|e| UserError::StorageError(e.to_string()))
    }

    pub async fn update_user(
        &self,
        id: &UserId,
        request: UpdateUserRequest,
    ) -> Result<UserProfile, UserError> {
        let mut user = self.get_user(id).await?;

        if let Some(phone) = request.phone_number {
            let phone = normalize_phone(&phone);
            validate_phone(&phone)?;
            user.phone_number = phone;
        }
        if let Some(name) = request.name {
            validate_name(&name)?;
            user.name = name.trim().to_string();
        }
        if request.job_title.is_some() {
            user.job_title = clean_optional(request.job_title);
        }
        if request.gender.is_some() {
            user.gender = request.gender;
        }
        if request.date_of_birth.is_some() {
            user.date_of_birth = request.date_of_birth;
        }
        user.updated_at = Utc::now();

        let phone = user.phone_number.clone();
        self.repo
            .update(&user)
            .await
            .map_err(|e| map_repo_error(e, &phone))
    }

    pub async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repo.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound,
            other => UserError::StorageError(other.to_string()),
        })?;
        tracing::info!(user_id = %id, "user removed");
        Ok(())
    }
}
