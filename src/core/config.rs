//! Process configuration read from the environment
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use std::time::Duration;

use super::error::BotError;

pub const DEFAULT_SETTING_PATH: &str = "setting";
pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_CLEANUP_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Read once at construction; checked at login via [`Config::require_token`]
    pub token: Option<String>,
    pub setting_path: String,
    pub command_prefix: String,
    pub discord_guild_id: Option<String>,
    pub log_level: String,
    pub cleanup_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required at login:
    /// - `TOKEN`: bot token from the Discord Developer Portal
    ///
    /// Optional:
    /// - `SETTING_PATH`: settings directory or file (default `setting`)
    /// - `COMMAND_PREFIX`: prefix for text commands (default `!`)
    /// - `DISCORD_GUILD_ID`: register slash commands on one guild only
    /// - `LOG_LEVEL`: env_logger filter (default `info`)
    /// - `CLEANUP_DELAY_SECS`: delay before admin replies delete themselves
    pub fn from_env() -> Result<Self> {
        let token = non_empty_var("TOKEN");
        let setting_path =
            non_empty_var("SETTING_PATH").unwrap_or_else(|| DEFAULT_SETTING_PATH.to_string());
        let command_prefix =
            non_empty_var("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        let discord_guild_id = non_empty_var("DISCORD_GUILD_ID");
        let log_level = non_empty_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let cleanup_secs = match non_empty_var("CLEANUP_DELAY_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("Invalid CLEANUP_DELAY_SECS: '{raw}'")
            })?,
            None => DEFAULT_CLEANUP_DELAY_SECS,
        };

        Ok(Self {
            token,
            setting_path,
            command_prefix,
            discord_guild_id,
            log_level,
            cleanup_delay: Duration::from_secs(cleanup_secs),
        })
    }

    /// The credential used to log in. Missing tokens fail here, not at construction.
    pub fn require_token(&self) -> Result<&str, BotError> {
        self.token.as_deref().ok_or(BotError::MissingToken)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    dotenvy::var(name).ok().filter(|v| !v.trim().is_empty())
}
