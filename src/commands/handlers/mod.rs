//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 3.0.0: Lifecycle builtins plus one handler per configured command
//! - 1.0.0: Initial extraction from monolithic command handler

pub mod admin;
pub mod custom;

use std::sync::Arc;

use super::handler::CommandHandler;

pub use admin::LifecycleHandler;
pub use custom::CustomCommandHandler;

/// Create the builtin command handlers
///
/// Returns a vector of handlers ready to be registered with CommandRegistry.
pub fn create_builtin_handlers() -> Vec<Arc<dyn CommandHandler>> {
    vec![Arc::new(admin::LifecycleHandler)]
}
