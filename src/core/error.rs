//! Bot error kinds
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Split build-time errors from runtime platform errors

/// Errors raised by the configuration layer.
///
/// `Build` is fatal: the process must not start with an ambiguous command set.
/// Platform errors from serenity stay `anyhow` errors at the handler level.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("this bot has custom commands sharing a name: {}", .0.join(", "))]
    Build(Vec<String>),

    #[error("TOKEN environment variable is required to log in")]
    MissingToken,

    #[error("settings error: {0}")]
    Settings(String),

    #[error("extension error: {0}")]
    Extension(String),

    #[error("database error: {0}")]
    Database(#[from] sqlite::Error),
}

impl BotError {
    pub fn settings(msg: impl Into<String>) -> Self {
        BotError::Settings(msg.into())
    }

    pub fn extension(msg: impl Into<String>) -> Self {
        BotError::Extension(msg.into())
    }

    /// Text shown to a Discord user when a command surfaces this error
    pub fn user_message(&self) -> &str {
        match self {
            BotError::Build(_) => "The command set is misconfigured.",
            BotError::MissingToken => "The bot is missing its credentials.",
            BotError::Settings(msg) | BotError::Extension(msg) => msg,
            BotError::Database(_) => "A database error occurred. Please try again later.",
        }
    }
}
