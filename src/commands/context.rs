//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Carry the settings store and extensions instead of fixed services
//! - 1.0.0: Initial implementation with core shared state

use serenity::model::id::GuildId;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::database::Database;
use crate::extensions::ExtensionManager;
use crate::settings::{CommandConfig, SettingsHandle};

/// Where a custom command's config lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Settings,
    Extension,
}

/// Shared context for all command handlers
#[derive(Clone)]
pub struct CommandContext {
    pub settings: SettingsHandle,
    pub database: Database,
    pub extensions: Arc<ExtensionManager>,
    /// Prefix for text commands
    pub prefix: String,
    /// How long lifecycle confirmations stay before deleting themselves
    pub cleanup_delay: Duration,
    /// Names owned by builtin handlers
    pub builtin_names: Arc<HashSet<String>>,
    /// Register slash commands on this guild only instead of globally
    pub guild_id: Option<GuildId>,
}

impl CommandContext {
    pub fn new(
        settings: SettingsHandle,
        database: Database,
        extensions: Arc<ExtensionManager>,
        prefix: String,
        cleanup_delay: Duration,
    ) -> Self {
        Self {
            settings,
            database,
            extensions,
            prefix,
            cleanup_delay,
            builtin_names: Arc::new(HashSet::new()),
            guild_id: None,
        }
    }

    pub fn with_builtin_names(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.builtin_names = Arc::new(names.into_iter().collect());
        self
    }

    pub fn with_guild(mut self, guild_id: Option<GuildId>) -> Self {
        self.guild_id = guild_id;
        self
    }

    /// Current config for `name`, looked up in its source
    pub fn command_config(&self, name: &str, source: CommandSource) -> Option<CommandConfig> {
        match source {
            CommandSource::Settings => self.settings.current().command(name).cloned(),
            CommandSource::Extension => self.extensions.command(name),
        }
    }

    /// Current config for `name` from either source, settings first
    pub fn find_command(&self, name: &str) -> Option<(CommandSource, CommandConfig)> {
        self.command_config(name, CommandSource::Settings)
            .map(|c| (CommandSource::Settings, c))
            .or_else(|| {
                self.extensions
                    .command(name)
                    .map(|c| (CommandSource::Extension, c))
            })
    }

    /// Names an extension may not claim: builtins and settings commands
    pub fn names_taken_by_core(&self) -> HashSet<String> {
        let settings = self.settings.current();
        self.builtin_names
            .iter()
            .cloned()
            .chain(settings.command_names().map(str::to_string))
            .collect()
    }

    /// Names a reloaded settings store may not claim: builtins and extension commands
    pub fn names_taken_outside_settings(&self) -> HashSet<String> {
        self.builtin_names
            .iter()
            .cloned()
            .chain(self.extensions.command_names())
            .collect()
    }
}
