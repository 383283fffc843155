//! In-memory fakes of the ports, shared by the conversation unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use parley_types::conversation::OutboundTarget;
use parley_types::error::RepositoryError;
use parley_types::feedback::{Feedback, FeedbackMetrics, SatisfactionTrendPoint};
use parley_types::topic::{HotTopic, NewTopic};
use parley_types::user::{UserId, UserProfile};

use super::session::{Session, test_profile};
use super::store::{InMemorySessionStore, SessionStore};
use crate::ai::{AiBackend, AiError, AiReply};
use crate::repository::feedback::{FeedbackFilter, FeedbackRepository};
use crate::repository::topic::TopicRepository;
use crate::repository::user::{UserFilter, UserRepository};
use crate::transport::{OutboundSender, TransportError};

pub const KEY: &str = "+628123456789";
pub const RAW_FROM: &str = "628123456789";

pub fn seed_session(store: &InMemorySessionStore) -> Session {
    seed_session_at(store, Utc::now())
}

pub fn seed_session_at(store: &InMemorySessionStore, now: DateTime<Utc>) -> Session {
    let (session, _) = store.get_or_create(KEY, || {
        Session::new(
            KEY,
            test_profile(KEY, "Sarah"),
            OutboundTarget(RAW_FROM.to_string()),
            now,
        )
    });
    session
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

type LookupHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct FakeUserRepo {
    users: Mutex<HashMap<String, UserProfile>>,
    on_lookup: Mutex<Option<LookupHook>>,
}

impl FakeUserRepo {
    pub fn with_default_user() -> Self {
        let repo = Self::default();
        repo.insert(test_profile(KEY, "Sarah"));
        repo
    }

    pub fn insert(&self, user: UserProfile) {
        self.users
            .lock()
            .unwrap()
            .insert(user.phone_number.clone(), user);
    }

    pub fn remove_phone(&self, phone: &str) {
        self.users.lock().unwrap().remove(phone);
    }

    /// Run `hook` inside the next `find_by_phone`, standing in for whatever
    /// else happens while the caller waits on the lookup.
    pub fn on_next_lookup(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_lookup.lock().unwrap() = Some(Box::new(hook));
    }
}

impl UserRepository for FakeUserRepo {
    async fn create(&self, user: &UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.phone_number) {
            return Err(RepositoryError::Conflict(user.phone_number.clone()));
        }
        users.insert(user.phone_number.clone(), user.clone());
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.id == *id)
            .cloned())
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let hook = self.on_lookup.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        Ok(self.users.lock().unwrap().get(phone_number).cloned())
    }

    async fn list(&self, _filter: &UserFilter) -> Result<Vec<UserProfile>, RepositoryError> {
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }

    async fn count(&self, _filter: &UserFilter) -> Result<u64, RepositoryError> {
        Ok(self.users.lock().unwrap().len() as u64)
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.created_at >= since)
            .count() as u64)
    }

    async fn phone_numbers(&self) -> Result<Vec<String>, RepositoryError> {
        let mut phones: Vec<String> = self.users.lock().unwrap().keys().cloned().collect();
        phones.sort();
        Ok(phones)
    }

    async fn update(&self, user: &UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        users.retain(|_, u| u.id != user.id);
        users.insert(user.phone_number.clone(), user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|_, u| u.id != *id);
        if users.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeFeedbackRepo {
    records: Mutex<Vec<Feedback>>,
    fail: bool,
}

impl FakeFeedbackRepo {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn all(&self) -> Vec<Feedback> {
        self.records.lock().unwrap().clone()
    }
}

impl FeedbackRepository for FakeFeedbackRepo {
    async fn create(&self, feedback: &Feedback) -> Result<Feedback, RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|f| f.flow_id == feedback.flow_id) {
            return Err(RepositoryError::Conflict(feedback.flow_id.to_string()));
        }
        records.push(feedback.clone());
        Ok(feedback.clone())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Feedback>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == *id)
            .cloned())
    }

    async fn exists_for_flow(&self, flow_id: &Uuid) -> Result<bool, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|f| f.flow_id == *flow_id))
    }

    async fn list(&self, _filter: &FeedbackFilter) -> Result<Vec<Feedback>, RepositoryError> {
        Ok(self.all())
    }

    async fn count(&self, _filter: &FeedbackFilter) -> Result<u64, RepositoryError> {
        Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn metrics(&self) -> Result<FeedbackMetrics, RepositoryError> {
        let records = self.records.lock().unwrap();
        let total = records.len() as u64;
        let sum: u64 = records.iter().map(|f| u64::from(f.rating.value())).sum();
        Ok(FeedbackMetrics {
            total,
            average_rating: if total == 0 { 0.0 } else { sum as f64 / total as f64 },
            satisfaction_score: 0.0,
            auto_submitted: 0,
            distribution: Vec::new(),
        })
    }

    async fn satisfaction_trend(
        &self,
        _since: DateTime<Utc>,
    ) -> Result<Vec<SatisfactionTrendPoint>, RepositoryError> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeTopicRepo {
    reports: Mutex<Vec<(NewTopic, DateTime<Utc>)>>,
}

impl TopicRepository for FakeTopicRepo {
    async fn bulk_create(
        &self,
        topics: &[NewTopic],
        reported_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut reports = self.reports.lock().unwrap();
        reports.extend(topics.iter().map(|t| (t.clone(), reported_at)));
        Ok(topics.len() as u64)
    }

    async fn hot(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<HotTopic>, RepositoryError> {
        let mut by_title: HashMap<String, HotTopic> = HashMap::new();
        for (topic, at) in self.reports.lock().unwrap().iter() {
            if *at < since {
                continue;
            }
            let entry = by_title.entry(topic.title.clone()).or_insert_with(|| HotTopic {
                title: topic.title.clone(),
                count: 0,
                last_reported_at: *at,
            });
            entry.count += u64::from(topic.count);
            entry.last_reported_at = entry.last_reported_at.max(*at);
        }
        let mut hot: Vec<HotTopic> = by_title.into_values().collect();
        hot.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.title.cmp(&b.title)));
        hot.truncate(limit as usize);
        Ok(hot)
    }
}

// ---------------------------------------------------------------------------
// AI backend
// ---------------------------------------------------------------------------

/// Answers `echo: <query>` and hands out `conv-<n>` references.
#[derive(Default)]
pub struct FakeAi {
    calls: Mutex<Vec<(Option<String>, String)>>,
    fail: bool,
}

impl FakeAi {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// `(conversation_ref, query)` for every call so far.
    pub fn calls(&self) -> Vec<(Option<String>, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl AiBackend for FakeAi {
    async fn chat(
        &self,
        conversation_ref: Option<&str>,
        _user_key: &str,
        query: &str,
    ) -> Result<AiReply, AiError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((conversation_ref.map(str::to_string), query.to_string()));
            calls.len()
        };
        if self.fail {
            return Err(AiError::Timeout);
        }
        Ok(AiReply {
            answer: format!("echo: {query}"),
            conversation_ref: Some(format!("conv-{n}")),
        })
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(OutboundTarget, String)>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<(OutboundTarget, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }
}

impl OutboundSender for RecordingSender {
    async fn send_text(&self, target: &OutboundTarget, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((target.clone(), text.to_string()));
        Ok(())
    }
}
