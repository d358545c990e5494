//! One command invocation, from a prefixed message or a slash command
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Lifecycle confirmations go through a [`ConfirmationSink`]
//! - 1.0.0: Initial prefix and slash invocations

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, UserId};
use serenity::prelude::Context;
use std::future::Future;
use std::time::Duration;

use crate::commands::slash::get_string_option;
use crate::core::truncate_for_message;
use crate::ui::render::{InteractionSink, InteractionTarget, ReplySink};
use crate::ui::{MessagePayload, ResponseSink};

pub enum Invocation<'a> {
    Prefix {
        message: &'a Message,
        name: String,
        args: Vec<String>,
    },
    Slash(&'a ApplicationCommandInteraction),
}

/// Split `!name arg1 arg2` into the command name and its arguments
pub fn parse_prefix(content: &str, prefix: &str) -> Option<(String, Vec<String>)> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let name = words.next()?;
    // `! ping` is not a command
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((name.to_string(), words.map(str::to_string).collect()))
}

impl<'a> Invocation<'a> {
    pub fn name(&self) -> &str {
        match self {
            Invocation::Prefix { name, .. } => name,
            Invocation::Slash(command) => &command.data.name,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Invocation::Prefix { message, .. } => message.author.id,
            Invocation::Slash(command) => command.user.id,
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        match self {
            Invocation::Prefix { message, .. } => message.channel_id,
            Invocation::Slash(command) => command.channel_id,
        }
    }

    pub fn is_slash(&self) -> bool {
        matches!(self, Invocation::Slash(_))
    }

    /// Positional argument for prefix commands, named option for slash commands
    pub fn arg(&self, index: usize, option_name: &str) -> Option<String> {
        match self {
            Invocation::Prefix { args, .. } => args.get(index).cloned(),
            Invocation::Slash(command) => get_string_option(&command.data.options, option_name),
        }
    }

    pub fn sink(&self, ctx: &'a Context) -> Box<dyn ResponseSink + 'a> {
        match self {
            Invocation::Prefix { message, .. } => Box::new(ReplySink::new(ctx, *message)),
            Invocation::Slash(command) => {
                Box::new(InteractionSink::new(ctx, InteractionTarget::Command(*command)))
            }
        }
    }

    /// Whether the caller holds the administrator permission where they invoked
    pub async fn is_platform_admin(&self, ctx: &Context) -> bool {
        match self {
            Invocation::Slash(command) => command
                .member
                .as_ref()
                .and_then(|member| member.permissions)
                .is_some_and(|perms| perms.administrator()),
            Invocation::Prefix { message, .. } => {
                if message.guild_id.is_none() {
                    return false;
                }
                match message.member(ctx).await {
                    Ok(member) => member
                        .permissions(&ctx.cache)
                        .map(|perms| perms.administrator())
                        .unwrap_or(false),
                    Err(e) => {
                        debug!("Could not resolve member for {}: {e}", message.author.id);
                        false
                    }
                }
            }
        }
    }

    /// Where a lifecycle command posts its confirmation
    pub fn confirmation_sink(&self, ctx: &'a Context) -> Box<dyn ConfirmationSink + 'a> {
        match self {
            Invocation::Prefix { message, .. } => Box::new(ReplySink::new(ctx, *message)),
            Invocation::Slash(command) => Box::new(DeferredCommand { ctx, command: *command }),
        }
    }
}

/// A short-lived confirmation for an operation that may take a while
#[async_trait]
pub trait ConfirmationSink: Send + Sync {
    /// Runs before the operation; slash commands defer, prefix triggers are deleted
    async fn acknowledge(&self) -> Result<()>;

    /// Post `text` and remove it again after `cleanup_after`
    async fn confirm(&self, text: &str, cleanup_after: Duration) -> Result<()>;
}

/// Acknowledge, run `work`, then post the text it produced
pub async fn run_confirmed<F>(
    sink: &dyn ConfirmationSink,
    cleanup_after: Duration,
    work: F,
) -> Result<()>
where
    F: Future<Output = String> + Send,
{
    sink.acknowledge().await?;
    let text = work.await;
    sink.confirm(&text, cleanup_after).await
}

#[async_trait]
impl<'a> ConfirmationSink for ReplySink<'a> {
    async fn acknowledge(&self) -> Result<()> {
        let message = self.message;
        if let Err(e) = message.channel_id.delete_message(&self.ctx.http, message.id).await {
            debug!("Could not delete trigger message {}: {e}", message.id);
        }
        Ok(())
    }

    async fn confirm(&self, text: &str, cleanup_after: Duration) -> Result<()> {
        // The trigger is gone, so this cannot be a reply
        let sent = self.send(MessagePayload::text(truncate_for_message(text))).await?;
        let http = self.ctx.http.clone();
        tokio::spawn(async move {
            tokio::time::sleep(cleanup_after).await;
            if let Err(e) = sent.channel_id.delete_message(&http, sent.id).await {
                debug!("Could not delete confirmation {}: {e}", sent.id);
            }
        });
        Ok(())
    }
}

/// Slash command answered with a deferred response that is edited once the work is done
struct DeferredCommand<'a> {
    ctx: &'a Context,
    command: &'a ApplicationCommandInteraction,
}

#[async_trait]
impl<'a> ConfirmationSink for DeferredCommand<'a> {
    async fn acknowledge(&self) -> Result<()> {
        self.command
            .create_interaction_response(&self.ctx.http, |response| {
                response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
            })
            .await?;
        Ok(())
    }

    async fn confirm(&self, text: &str, cleanup_after: Duration) -> Result<()> {
        self.command
            .edit_original_interaction_response(&self.ctx.http, |response| {
                response.content(truncate_for_message(text))
            })
            .await?;
        let http = self.ctx.http.clone();
        let command = self.command.clone();
        tokio::spawn(async move {
            tokio::time::sleep(cleanup_after).await;
            if let Err(e) = command.delete_original_interaction_response(&http).await {
                debug!("Could not delete response to /{}: {e}", command.data.name);
            }
        });
        Ok(())
    }
}
