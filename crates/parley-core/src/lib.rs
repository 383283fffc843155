//! Business logic and port (trait) definitions for Parley.
//!
//! This crate owns the conversation lifecycle: the per-user session store,
//! the message state machine, the rate limiter, the inactivity sweeper and
//! the feedback finalizer. Storage, the AI backend and the chat transport
//! are reached only through the traits defined here; implementations live in
//! `parley-infra`.

pub mod ai;
pub mod conversation;
pub mod repository;
pub mod service;
pub mod transport;
