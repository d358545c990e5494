//! # Core Module
//!
//! Environment configuration, error kinds and Discord text limits.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Add BotError with a distinct build-time error kind
//! - 1.1.0: Add response module with Discord length limits
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use error::BotError;
pub use response::{truncate_for_embed, truncate_for_message, truncate_to, EMBED_LIMIT, MESSAGE_LIMIT};
