//! Authorized user (remote chat party) types.
//!
//! Only phone numbers registered as users may talk to the bot. Phone numbers
//! are stored and compared in E.164 form (`+<country code><number>`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::UserError;

/// Minimum length of a normalized phone number, including the `+`.
pub const MIN_PHONE_LEN: usize = 10;
/// Maximum length of a normalized phone number, including the `+`.
pub const MAX_PHONE_LEN: usize = 20;
/// Maximum length of a user name.
pub const MAX_NAME_LEN: usize = 255;

/// Unique identifier for a user, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new UserId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Gender, used only to pick a salutation in bot replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Gender {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(UserError::InvalidGender(other.to_string())),
        }
    }
}

/// A registered user allowed to converse with the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    /// E.164 phone number; doubles as the conversation user key.
    pub phone_number: String,
    pub name: String,
    pub job_title: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Salutation used in greetings and prompts.
    pub fn salutation(&self) -> &'static str {
        salutation_for(self.gender)
    }
}

/// Salutation for an optional gender ("Mr.", "Ms.", or both when unknown).
pub fn salutation_for(gender: Option<Gender>) -> &'static str {
    match gender {
        Some(Gender::Male) => "Mr.",
        Some(Gender::Female) => "Ms.",
        None => "Mr./Ms.",
    }
}

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub phone_number: String,
    pub name: String,
    pub job_title: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Partial update of a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub job_title: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Aggregate counts over registered users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetrics {
    pub total_users: u64,
    /// Users registered within the last [`NEW_USER_WINDOW_DAYS`] days.
    pub new_users: u64,
}

/// Window for [`UserMetrics::new_users`].
pub const NEW_USER_WINDOW_DAYS: i64 = 30;

/// One data row of a bulk user import, already split into fields.
#[derive(Debug, Clone)]
pub struct ImportRow {
    /// 1-based line number in the source file, header included.
    pub line: usize,
    /// The registration request, or why the row could not be read.
    pub parsed: Result<CreateUserRequest, String>,
}

/// A row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub line: usize,
    pub phone_number: Option<String>,
    pub reason: String,
}

/// Outcome of a bulk user import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub failures: Vec<ImportFailure>,
}

/// Normalize a raw phone number to E.164 by adding a `+` prefix when missing.
///
/// Transports usually deliver the bare international number
/// (`628123456789`), while users are registered as `+628123456789`.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('+') {
        return trimmed.to_string();
    }
    format!("+{trimmed}")
}

/// Validate a normalized E.164 phone number.
pub fn validate_phone(phone: &str) -> Result<(), UserError> {
    let Some(digits) = phone.strip_prefix('+') else {
        return Err(UserError::InvalidPhone(format!(
            "'{phone}' must start with '+'"
        )));
    };
    if !(MIN_PHONE_LEN..=MAX_PHONE_LEN).contains(&phone.len()) {
        return Err(UserError::InvalidPhone(format!(
            "'{phone}' must be {MIN_PHONE_LEN}-{MAX_PHONE_LEN} characters"
        )));
    }
    if digits.starts_with('0') || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(UserError::InvalidPhone(format!(
            "'{phone}' is not in E.164 format"
        )));
    }
    Ok(())
}

/// Validate a user display name.
pub fn validate_name(name: &str) -> Result<(), UserError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(UserError::InvalidName("name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(UserError::InvalidName(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}
