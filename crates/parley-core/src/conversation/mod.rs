//! Conversation session lifecycle and feedback collection.

pub mod engine;
pub mod finalizer;
pub mod rate_limit;
pub mod replies;
pub mod session;
pub mod store;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{ConversationEngine, FeedbackRequestOutcome, HandleOutcome};
pub use finalizer::{FeedbackFinalizer, FinalizeError};
pub use rate_limit::{RateDecision, RateLimiter};
pub use session::Session;
pub use store::{InMemorySessionStore, SessionStore};
pub use sweeper::{ExpirySweeper, SweepReport};
