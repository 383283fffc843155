//! Feedback types: satisfaction ratings and optional comments.
//!
//! One `Feedback` record is created per completed conversation flow, either
//! from the user's own answers or auto-submitted after an unanswered prompt.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::FeedbackError;
use crate::user::UserId;

/// Maximum length of a feedback comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 1000;

/// A satisfaction rating on the 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Build a rating, rejecting values outside 1-5.
    pub fn new(value: u8) -> Result<Self, FeedbackError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FeedbackError::InvalidRating(i64::from(value)))
        }
    }

    /// The highest rating, used for auto-submitted feedback by default.
    pub fn max() -> Self {
        Self(Self::MAX)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = FeedbackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses user input such as `"3"` or `" 4 "`.
impl FromStr for Rating {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| FeedbackError::InvalidRating(0))?;
        u8::try_from(value)
            .map_err(|_| FeedbackError::InvalidRating(value))
            .and_then(Rating::new)
    }
}

/// Who produced a feedback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackOrigin {
    /// The user answered the rating (and optionally comment) prompts.
    User,
    /// The sweeper recorded a default rating after an unanswered prompt.
    Auto,
}

impl fmt::Display for FeedbackOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackOrigin::User => write!(f, "user"),
            FeedbackOrigin::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for FeedbackOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(FeedbackOrigin::User),
            "auto" => Ok(FeedbackOrigin::Auto),
            other => Err(format!("invalid feedback origin: '{other}'")),
        }
    }
}

/// A persisted satisfaction rating tied to one conversation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    /// The conversation flow this feedback concludes (unique per flow).
    pub flow_id: Uuid,
    pub user_id: UserId,
    pub phone_number: String,
    pub rating: Rating,
    pub comment: Option<String>,
    pub origin: FeedbackOrigin,
    pub created_at: DateTime<Utc>,
}

/// Trim a comment and map empty input to `None`.
pub fn normalize_comment(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Reject comments longer than [`MAX_COMMENT_CHARS`].
pub fn validate_comment(comment: Option<&str>) -> Result<(), FeedbackError> {
    if let Some(comment) = comment {
        let len = comment.chars().count();
        if len > MAX_COMMENT_CHARS {
            return Err(FeedbackError::CommentTooLong {
                len,
                max: MAX_COMMENT_CHARS,
            });
        }
    }
    Ok(())
}

/// Number of feedback records with a given rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCount {
    pub rating: u8,
    pub count: u64,
}

/// Aggregate satisfaction figures across all feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMetrics {
    pub total: u64,
    /// Mean rating, 0.0 when there is no feedback.
    pub average_rating: f64,
    /// Percentage of ratings that are 4 or 5.
    pub satisfaction_score: f64,
    pub auto_submitted: u64,
    pub distribution: Vec<RatingCount>,
}

/// Daily average rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionTrendPoint {
    pub date: NaiveDate,
    pub average_rating: f64,
    pub count: u64,
}
