//! User repository trait definition.

use chrono::{DateTime, Utc};
use parley_types::error::RepositoryError;
use parley_types::user::{UserId, UserProfile};

use super::SortOrder;

/// Filter criteria for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring match on name or phone number.
    pub search: Option<String>,
    /// Sort direction on creation time.
    pub sort_order: Option<SortOrder>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip (offset pagination).
    pub offset: Option<i64>,
}

/// Repository trait for registered users.
///
/// `find_by_phone` doubles as the authorization check for inbound senders.
pub trait UserRepository: Send + Sync {
    /// Create a new user. Fails with `Conflict` when the phone number is taken.
    fn create(
        &self,
        user: &UserProfile,
    ) -> impl std::future::Future<Output = Result<UserProfile, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<UserProfile>, RepositoryError>> + Send;

    /// Look up a user by normalized E.164 phone number.
    fn find_by_phone(
        &self,
        phone_number: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserProfile>, RepositoryError>> + Send;

    fn list(
        &self,
        filter: &UserFilter,
    ) -> impl std::future::Future<Output = Result<Vec<UserProfile>, RepositoryError>> + Send;

    /// Count users matching the filter's search (pagination is ignored).
    fn count(
        &self,
        filter: &UserFilter,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Number of users registered at or after `since`.
    fn count_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Every registered phone number, in ascending order.
    fn phone_numbers(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;

    /// Update an existing user. Returns the updated user.
    fn update(
        &self,
        user: &UserProfile,
    ) -> impl std::future::Future<Output = Result<UserProfile, RepositoryError>> + Send;

    /// Permanently delete a user. Fails with `NotFound` when absent.
    fn delete(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
