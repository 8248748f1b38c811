//! Error handling
//!
//! Defines error types and handling for entry operations.

pub mod handlers;
pub mod types;

pub use types::*;
