//! Lifecycle command handlers
//!
//! Handles: load, unload, reload, reload-setting
//!
//! Every lifecycle command deletes its trigger message (a slash command defers
//! instead), posts a short confirmation once the work is done, and deletes
//! that confirmation after the cleanup delay.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Slash lifecycle commands defer before re-syncing
//! - 2.0.0: Extension packs and settings reload replace guild settings commands
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};
use serenity::prelude::Context;
use std::path::Path;
use std::sync::Arc;

use crate::checks::CheckName;
use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::invocation::{run_confirmed, Invocation};
use crate::commands::slash::{admin::LIFECYCLE_COMMANDS, sync_commands};
use crate::core::BotError;
use crate::extensions::DEFAULT_FOLDER;

/// Which lifecycle operation to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Load { extension: Option<String>, folder: String },
    Unload { extension: Option<String>, folder: String },
    Reload { extension: Option<String>, folder: String },
    ReloadSetting { path: Option<String> },
}

impl Lifecycle {
    /// Build from a command name and its `(extension|path, folder)` arguments
    pub fn parse(name: &str, first: Option<String>, second: Option<String>) -> Option<Self> {
        let folder = || second.clone().unwrap_or_else(|| DEFAULT_FOLDER.to_string());
        match name {
            "load" => Some(Lifecycle::Load {
                extension: first,
                folder: folder(),
            }),
            "unload" => Some(Lifecycle::Unload {
                extension: first,
                folder: folder(),
            }),
            "reload" => Some(Lifecycle::Reload {
                extension: first,
                folder: folder(),
            }),
            "reload-setting" => Some(Lifecycle::ReloadSetting { path: first }),
            _ => None,
        }
    }

    pub fn confirmation(&self) -> &'static str {
        match self {
            Lifecycle::Load { .. } => "loading end!",
            Lifecycle::Unload { .. } => "unloading end!",
            Lifecycle::Reload { .. } => "reloading end!",
            Lifecycle::ReloadSetting { .. } => "reloading setting end!",
        }
    }

    /// Apply the operation to the shared state
    pub fn apply(&self, ctx: &CommandContext) -> Result<(), BotError> {
        match self {
            Lifecycle::Load { extension, folder } => {
                ctx.extensions
                    .load(extension.as_deref(), folder, &ctx.names_taken_by_core())?;
            }
            Lifecycle::Unload { extension, folder } => {
                ctx.extensions.unload(extension.as_deref(), folder)?;
            }
            Lifecycle::Reload { extension, folder } => {
                ctx.extensions
                    .reload(extension.as_deref(), folder, &ctx.names_taken_by_core())?;
            }
            Lifecycle::ReloadSetting { path } => {
                ctx.settings.reload(
                    path.as_deref().map(Path::new),
                    &ctx.names_taken_outside_settings(),
                )?;
            }
        }
        Ok(())
    }
}

/// Handler for the extension and settings lifecycle commands
pub struct LifecycleHandler;

#[async_trait]
impl CommandHandler for LifecycleHandler {
    fn command_names(&self) -> Vec<String> {
        LIFECYCLE_COMMANDS.iter().map(|n| n.to_string()).collect()
    }

    fn checks(&self, _ctx: &CommandContext, _name: &str) -> Vec<CheckName> {
        vec![CheckName::Administrator]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        invocation: &Invocation<'_>,
    ) -> Result<()> {
        let name = invocation.name();
        let first_option = if name == "reload-setting" { "path" } else { "extension" };
        let Some(op) = Lifecycle::parse(
            name,
            invocation.arg(0, first_option),
            invocation.arg(1, "folder"),
        ) else {
            return Ok(());
        };

        let sink = invocation.confirmation_sink(serenity_ctx);
        run_confirmed(sink.as_ref(), ctx.cleanup_delay, async {
            match op.apply(&ctx) {
                Ok(()) => {
                    info!("🔧 {op:?} by {}", invocation.user_id());
                    if let Err(e) = sync_commands(serenity_ctx, &ctx).await {
                        error!("Failed to re-sync slash commands after {name}: {e}");
                    }
                    op.confirmation().to_string()
                }
                Err(e) => {
                    warn!("{name} failed: {e}");
                    format!("❌ {}", e.user_message())
                }
            }
        })
        .await
    }
}
