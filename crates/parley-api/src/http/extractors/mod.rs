//! Request extractors: authentication and query parameters.

pub mod auth;
pub mod query;
