//! Shared domain types for Parley.
//!
//! This crate contains the domain types used across the Parley bot:
//! users, feedback, hot topics, conversation phases, configuration and their
//! error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod feedback;
pub mod topic;
pub mod user;
