//! # Command System
//!
//! Prefixed text commands and slash (/) commands, served by the same
//! handlers.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Commands generated from settings and extension packs
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod invocation;
pub mod registry;
pub mod slash;

// Re-export handler infrastructure
pub use context::{CommandContext, CommandSource};
pub use dispatcher::Dispatcher;
pub use handler::CommandHandler;
pub use invocation::Invocation;
pub use registry::CommandRegistry;

// Re-export commonly used items from submodules
pub use slash::{
    create_slash_commands, get_string_option, register_global_commands, register_guild_commands,
    sync_commands,
};
