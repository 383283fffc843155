//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`:
//! SQLite storage for users, feedback and topics, the Dify-style AI backend
//! client, the webhook chat-transport sender, the `config.toml` loader and
//! the CSV reader for bulk user imports.

pub mod ai;
pub mod config;
pub mod sqlite;
pub mod transport;
pub mod user_csv;
