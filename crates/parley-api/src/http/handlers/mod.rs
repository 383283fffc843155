//! REST API request handlers.

pub mod conversation;
pub mod feedback;
pub mod inbound;
pub mod topic;
pub mod user;
