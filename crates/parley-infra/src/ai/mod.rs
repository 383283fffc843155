//! AI backend adapters.

pub mod dify;

pub use dify::DifyBackend;
