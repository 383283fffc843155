//! Service layer for Parley business logic.
//!
//! Services orchestrate repository calls and validation for the admin
//! surfaces (HTTP API and CLI). Conversation handling lives in
//! [`crate::conversation`].

pub mod feedback;
pub mod topic;
pub mod user;
