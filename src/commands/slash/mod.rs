//! # Slash Commands (/)
//!
//! Discord native slash command definitions for the lifecycle commands and
//! every slash-enabled custom command.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Definitions generated from settings and extension commands
//! - 2.0.0: Re-sync definitions after extension changes
//! - 1.0.0: Initial global/guild registration

pub mod admin;
pub mod custom;

use anyhow::Result;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::application_command::CommandDataOption;
use serenity::model::id::GuildId;
use serenity::prelude::Context;

use crate::commands::context::CommandContext;

/// Creates every slash command definition: lifecycle commands, then
/// settings commands, then extension commands
pub fn create_slash_commands(ctx: &CommandContext) -> Vec<CreateApplicationCommand> {
    let settings = ctx.settings.current();
    let mut commands = admin::create_commands();
    commands.extend(custom::create_commands(&settings.commands));
    commands.extend(custom::create_commands(&ctx.extensions.commands()));
    commands
}

/// Registers all slash commands globally
pub async fn register_global_commands(serenity_ctx: &Context, ctx: &CommandContext) -> Result<()> {
    let slash_commands = create_slash_commands(ctx);
    let count = slash_commands.len();

    Command::set_global_application_commands(&serenity_ctx.http, |commands| {
        for command in slash_commands {
            commands.add_application_command(command);
        }
        commands
    })
    .await?;

    info!("Global slash commands registered successfully ({count} commands)");
    Ok(())
}

/// Registers all slash commands for a specific guild (faster for testing)
pub async fn register_guild_commands(
    serenity_ctx: &Context,
    ctx: &CommandContext,
    guild_id: GuildId,
) -> Result<()> {
    let slash_commands = create_slash_commands(ctx);
    let count = slash_commands.len();

    guild_id
        .set_application_commands(&serenity_ctx.http, |commands| {
            for command in slash_commands {
                commands.add_application_command(command);
            }
            commands
        })
        .await?;

    info!("Guild slash commands registered for guild {guild_id} ({count} commands)");
    Ok(())
}

/// Registers on the configured guild, or globally when none is set
pub async fn sync_commands(serenity_ctx: &Context, ctx: &CommandContext) -> Result<()> {
    match ctx.guild_id {
        Some(guild_id) => register_guild_commands(serenity_ctx, ctx, guild_id).await,
        None => register_global_commands(serenity_ctx, ctx).await,
    }
}

/// Utility function to get string option from slash command
pub fn get_string_option(options: &[CommandDataOption], name: &str) -> Option<String> {
    options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}
