// Core layer - environment config, errors and text limits
pub mod core;

// Settings store and its typed sections
pub mod settings;

// Declarative embeds, views and modals
pub mod ui;

// Policy predicates gating command execution
pub mod checks;

// Persisted cooldowns and privileged users
pub mod database;

// Declarative command packs loaded at runtime
pub mod extensions;

// Application layer
pub mod commands;
pub mod message_components;

pub use core::{BotError, Config};
pub use settings::{CommandConfig, CommandEntry, Settings, SettingsHandle};
pub use ui::{ResponseConfig, UiResponse};

pub use checks::{CheckName, Predicate};
pub use commands::{CommandRegistry, Dispatcher};
pub use extensions::ExtensionManager;
