//! Outbound chat transport adapters.

pub mod webhook;

pub use webhook::WebhookSender;
