//! # Dispatcher
//!
//! Routes prefixed messages and slash commands to their handler after the
//! global gate and the command's own checks pass. Each invocation gets a
//! request id, and a failing handler never takes the others down.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Global gate follows the current settings store instead of the one at startup
//! - 1.1.0: Commands added by a reload or an extension resolve without re-registering
//! - 1.0.0: Initial dispatch with checks

use anyhow::Result;
use chrono::Utc;
use log::{debug, error, info};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::context::CommandContext;
use super::handler::CommandHandler;
use super::handlers::CustomCommandHandler;
use super::invocation::{parse_prefix, Invocation};
use super::registry::CommandRegistry;
use crate::settings::Settings;
use crate::checks::{
    all_of, first_failing, global_gate, Caller, ChannelRef, CheckName, PolicyScope, Predicate,
};

const GENERIC_ERROR: &str = "❌ Something went wrong while running this command.";

/// Result of running the gates for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allow,
    /// Turned away by a global precondition; nothing is sent
    Silent,
    /// Turned away by one of the command's checks; the caller is told why
    Deny(CheckName),
}

/// Global preconditions first, then the command's own checks
pub fn evaluate(
    global: &[CheckName],
    checks: &[CheckName],
    caller: &Caller,
    channel: &ChannelRef,
    scope: &PolicyScope<'_>,
) -> Gate {
    if !all_of(global).check(caller, channel, scope) {
        return Gate::Silent;
    }
    match first_failing(checks, caller, channel, scope) {
        Some(failed) => Gate::Deny(failed),
        None => Gate::Allow,
    }
}

pub struct Dispatcher {
    registry: CommandRegistry,
    ctx: Arc<CommandContext>,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, ctx: Arc<CommandContext>) -> Self {
        Self { registry, ctx }
    }

    pub fn context(&self) -> Arc<CommandContext> {
        Arc::clone(&self.ctx)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Settings in force right now, with the preconditions they put on every command
    pub fn current_gate(&self) -> (Arc<Settings>, Vec<CheckName>) {
        let (settings, global) = self.current_gate();
        (settings, global)
    }

    /// Registered handler, or one for a command added since the registry was built
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        if let Some(handler) = self.registry.get(name) {
            return Some(handler);
        }
        self.ctx.find_command(name).map(|(source, _)| {
            Arc::new(CustomCommandHandler::new(name, source)) as Arc<dyn CommandHandler>
        })
    }

    /// Handle a text message; messages that are not commands are ignored
    pub async fn handle_message(&self, serenity_ctx: &Context, msg: &Message) -> Result<()> {
        if msg.author.bot {
            return Ok(());
        }
        let Some((name, args)) = parse_prefix(&msg.content, &self.ctx.prefix) else {
            return Ok(());
        };
        let Some(handler) = self.resolve(&name) else {
            debug!("Ignoring unknown command '{name}'");
            return Ok(());
        };

        let invocation = Invocation::Prefix {
            message: msg,
            name,
            args,
        };
        self.dispatch(serenity_ctx, &invocation, handler).await
    }

    pub async fn handle_slash(
        &self,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(handler) = self.resolve(&command.data.name) else {
            debug!("Unknown slash command /{}", command.data.name);
            let invocation = Invocation::Slash(command);
            invocation
                .sink(serenity_ctx)
                .send_notice("⚠️ This command is not configured.")
                .await?;
            return Ok(());
        };
        self.dispatch(serenity_ctx, &Invocation::Slash(command), handler)
            .await
    }

    async fn dispatch(
        &self,
        serenity_ctx: &Context,
        invocation: &Invocation<'_>,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        let name = invocation.name();
        let user_id = invocation.user_id();
        let channel_id = invocation.channel_id();
        info!(
            "[{request_id}] ⚡ {}{name} from user {user_id} in channel {channel_id}",
            if invocation.is_slash() { "/" } else { self.ctx.prefix.as_str() }
        );

        let (settings, global) = self.current_gate();
        let checks = handler.checks(&self.ctx, name);

        // Only pay for lookups the checks actually need
        let needs_admin = checks.contains(&CheckName::Administrator);
        let primary_users = if needs_admin {
            self.ctx.database.primary_users().await?
        } else {
            HashSet::new()
        };
        let is_platform_admin = needs_admin && invocation.is_platform_admin(serenity_ctx).await;
        let last_used = if checks.contains(&CheckName::Cooldown) {
            self.ctx.database.user_cooldown(user_id.0).await?
        } else {
            None
        };

        let caller = Caller {
            id: user_id.0,
            is_platform_admin,
        };
        let channel = ChannelRef { id: channel_id.0 };
        let scope = PolicyScope {
            settings: &settings,
            primary_users: &primary_users,
            last_used,
            now: Utc::now().naive_utc(),
        };

        match evaluate(&global, &checks, &caller, &channel, &scope) {
            Gate::Allow => {}
            Gate::Silent => {
                debug!("[{request_id}] 🚫 {name} blocked by the global gate");
                return Ok(());
            }
            Gate::Deny(check) => {
                debug!("[{request_id}] 🚫 {name} denied by check '{check}'");
                invocation
                    .sink(serenity_ctx)
                    .send_notice(check.denial_message())
                    .await?;
                return Ok(());
            }
        }

        if let Err(e) = handler
            .handle(Arc::clone(&self.ctx), serenity_ctx, invocation)
            .await
        {
            error!("[{request_id}] ❌ {name} failed: {e:?}");
            // The handler may already have answered; this is best effort
            if let Err(send_err) = invocation.sink(serenity_ctx).send_notice(GENERIC_ERROR).await {
                debug!("[{request_id}] Could not report failure: {send_err}");
            }
            return Ok(());
        }

        debug!("[{request_id}] ✅ {name} completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn scope<'a>(settings: &'a Settings, primary: &'a HashSet<u64>) -> PolicyScope<'a> {
        PolicyScope {
            settings,
            primary_users: primary,
            last_used: None,
            now: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    const MEMBER: Caller = Caller {
        id: 1,
        is_platform_admin: false,
    };

    #[test]
    fn test_global_gate_is_silent_and_runs_first() {
        let mut settings = Settings::default();
        settings.checks.test_channel = vec![9];
        let primary = HashSet::new();
        let s = scope(&settings, &primary);

        let gate = evaluate(
            &[CheckName::TestChannel],
            &[CheckName::Administrator],
            &MEMBER,
            &ChannelRef { id: 1 },
            &s,
        );
        assert_eq!(gate, Gate::Silent);

        let gate = evaluate(
            &[CheckName::TestChannel],
            &[CheckName::Administrator],
            &MEMBER,
            &ChannelRef { id: 9 },
            &s,
        );
        assert_eq!(gate, Gate::Deny(CheckName::Administrator));
    }

    #[test]
    fn test_privileged_user_passes_admin_check() {
        let settings = Settings::default();
        let primary: HashSet<u64> = [1].into_iter().collect();
        let gate = evaluate(
            &[],
            &[CheckName::Administrator],
            &MEMBER,
            &ChannelRef { id: 1 },
            &scope(&settings, &primary),
        );
        assert_eq!(gate, Gate::Allow);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_current_store() {
        use crate::commands::context::tests::{entry, test_context};

        let ctx = Arc::new(test_context(vec![entry("name: ping\ncontent: pong\n")]).await);
        let registry = CommandRegistry::build(&ctx.settings.current()).unwrap();
        let dispatcher = Dispatcher::new(registry, Arc::clone(&ctx));

        assert!(dispatcher.resolve("ping").is_some());
        assert!(dispatcher.resolve("load").is_some());
        assert!(dispatcher.resolve("rules").is_none());

        ctx.settings.replace(Settings {
            commands: vec![entry("name: rules\ncontent: be nice\n")],
            ..Default::default()
        });
        assert!(dispatcher.resolve("rules").is_some());
    }

    #[tokio::test]
    async fn test_global_gate_follows_reloaded_version() {
        use crate::commands::context::tests::test_context;

        let ctx = Arc::new(test_context(Vec::new()).await);
        let mut prerelease = Settings::default();
        prerelease.general.version = [0, 3, 1];
        ctx.settings.replace(prerelease);

        let registry = CommandRegistry::build(&ctx.settings.current()).unwrap();
        let dispatcher = Dispatcher::new(registry, Arc::clone(&ctx));
        assert_eq!(dispatcher.current_gate().1, vec![CheckName::TestChannel]);

        let mut stable = Settings::default();
        stable.general.version = [1, 0, 0];
        ctx.settings.replace(stable);
        let (settings, global) = dispatcher.current_gate();
        assert!(global.is_empty());

        let primary = HashSet::new();
        let gate = evaluate(
            &global,
            &[],
            &MEMBER,
            &ChannelRef { id: 1 },
            &scope(&settings, &primary),
        );
        assert_eq!(gate, Gate::Allow);
    }
}
