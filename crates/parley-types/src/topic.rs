//! Hot-topic reporting types.
//!
//! An upstream analyzer periodically reports what users asked about as
//! `(title, count)` pairs. Reports are stored as-is and aggregated by title
//! when the hot list is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TopicError;

/// Maximum length of a topic title.
pub const MAX_TITLE_LEN: usize = 255;
/// Maximum number of topics in one bulk report.
pub const MAX_BATCH_SIZE: usize = 100;
/// Number of topics returned by the hot list.
pub const HOT_TOPIC_LIMIT: u32 = 5;
/// Look-back window of the hot list, in days.
pub const HOT_TOPIC_WINDOW_DAYS: i64 = 30;

/// One reported topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTopic {
    pub title: String,
    pub count: u32,
}

/// A batch of topic reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateTopicsRequest {
    pub topics: Vec<NewTopic>,
}

/// A topic on the hot list: all reports for one title within the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotTopic {
    pub title: String,
    pub count: u64,
    pub last_reported_at: DateTime<Utc>,
}

impl BulkCreateTopicsRequest {
    /// Check batch size and every entry, returning the topics with trimmed
    /// titles.
    pub fn validate(&self) -> Result<Vec<NewTopic>, TopicError> {
        if self.topics.is_empty() {
            return Err(TopicError::InvalidBatch(
                "at least one topic is required".to_string(),
            ));
        }
        if self.topics.len() > MAX_BATCH_SIZE {
            return Err(TopicError::InvalidBatch(format!(
                "at most {MAX_BATCH_SIZE} topics per batch, got {}",
                self.topics.len()
            )));
        }

        self.topics
            .iter()
            .enumerate()
            .map(|(index, topic)| {
                let title = topic.title.trim();
                let reason = if title.is_empty() {
                    Some("title is required".to_string())
                } else if title.chars().count() > MAX_TITLE_LEN {
                    Some(format!("title must be at most {MAX_TITLE_LEN} characters"))
                } else if topic.count == 0 {
                    Some("count must be at least 1".to_string())
                } else {
                    None
                };
                match reason {
                    Some(reason) => Err(TopicError::InvalidTopic { index, reason }),
                    None => Ok(NewTopic {
                        title: title.to_string(),
                        count: topic.count,
                    }),
                }
            })
            .collect()
    }
}
