use thiserror::Error;
use uuid::Uuid;

/// Errors related to user (authorized sender) operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("phone number '{0}' is already registered")]
    PhoneConflict(String),

    #[error("invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid gender: '{0}' (expected 'male' or 'female')")]
    InvalidGender(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to feedback operations.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("feedback not found")]
    NotFound,

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),

    #[error("comment is {len} characters long (max {max})")]
    CommentTooLong { len: usize, max: usize },

    #[error("feedback already recorded for flow {0}")]
    AlreadyRecorded(Uuid),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to hot-topic reporting.
#[derive(Debug, Error)]
pub enum TopicError {
    #[error("invalid topic batch: {0}")]
    InvalidBatch(String),

    #[error("invalid topic at index {index}: {reason}")]
    InvalidTopic { index: usize, reason: String },

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
