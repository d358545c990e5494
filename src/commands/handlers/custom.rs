//! Configured (custom) command handler
//!
//! Renders the owning entry's response. The config is looked up again on
//! every invocation so a reload takes effect without re-registering.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Record cooldown timestamps for cooldown-gated commands
//! - 1.0.0: Initial settings-backed commands

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use serenity::prelude::Context;
use std::sync::Arc;

use crate::checks::CheckName;
use crate::commands::context::{CommandContext, CommandSource};
use crate::commands::handler::CommandHandler;
use crate::commands::invocation::Invocation;
use crate::ui::{render, RenderOutcome, ResponseSink};

pub const NOT_CONFIGURED: &str = "⚠️ This command is no longer configured.";

/// Handler bound to one configured command name
pub struct CustomCommandHandler {
    name: String,
    source: CommandSource,
}

impl CustomCommandHandler {
    pub fn new(name: impl Into<String>, source: CommandSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

#[async_trait]
impl CommandHandler for CustomCommandHandler {
    fn command_names(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn checks(&self, ctx: &CommandContext, _name: &str) -> Vec<CheckName> {
        ctx.command_config(&self.name, self.source)
            .map(|config| config.checks)
            .unwrap_or_default()
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        invocation: &Invocation<'_>,
    ) -> Result<()> {
        let sink = invocation.sink(serenity_ctx);
        let outcome = run_custom(
            &ctx,
            sink.as_ref(),
            &self.name,
            self.source,
            invocation.user_id().0,
        )
        .await?;

        // An unanswered interaction shows as failed in the client
        if outcome == RenderOutcome::Nothing && invocation.is_slash() {
            sink.send_notice("✅").await?;
        }
        Ok(())
    }
}

/// Render `name`'s current response through `sink` on behalf of `user_id`
pub async fn run_custom(
    ctx: &CommandContext,
    sink: &dyn ResponseSink,
    name: &str,
    source: CommandSource,
    user_id: u64,
) -> Result<RenderOutcome> {
    let Some(config) = ctx.command_config(name, source) else {
        warn!("Command '{name}' was invoked but is no longer configured");
        sink.send_notice(NOT_CONFIGURED).await?;
        return Ok(RenderOutcome::Message);
    };

    let outcome = render(sink, name, &config.response).await?;
    debug!("Rendered '{name}' as {outcome:?}");

    if config.checks.contains(&CheckName::Cooldown) {
        ctx.database
            .set_user_cooldown(user_id, Utc::now().naive_utc())
            .await?;
    }
    Ok(outcome)
}
