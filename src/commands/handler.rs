//! Command handler trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: One trait for prefix and slash invocations, with named checks
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use serenity::prelude::Context;
use std::sync::Arc;

use super::context::CommandContext;
use super::invocation::Invocation;
use crate::checks::CheckName;

/// Trait for command handlers
///
/// A handler serves one or more command names, reachable both as a prefixed
/// text command and as a slash command.
///
/// # Example
///
/// ```ignore
/// pub struct PingHandler;
///
/// #[async_trait]
/// impl CommandHandler for PingHandler {
///     fn command_names(&self) -> Vec<String> {
///         vec!["ping".to_string()]
///     }
///
///     async fn handle(
///         &self,
///         ctx: Arc<CommandContext>,
///         serenity_ctx: &Context,
///         invocation: &Invocation<'_>,
///     ) -> Result<()> {
///         invocation
///             .sink(serenity_ctx)
///             .send_message(MessagePayload::text("pong"))
///             .await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    fn command_names(&self) -> Vec<String>;

    /// Checks to pass before `handle` runs, read from the current store
    fn checks(&self, _ctx: &CommandContext, _name: &str) -> Vec<CheckName> {
        Vec::new()
    }

    /// Handle the invocation
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared command context with settings, database and extensions
    /// * `serenity_ctx` - Serenity context for Discord API calls
    /// * `invocation` - The prefixed message or slash command being handled
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        invocation: &Invocation<'_>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn CommandHandler) {}
}
