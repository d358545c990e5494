//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Built from settings, refusing duplicate command names
//! - 1.0.0: Initial implementation for handler dispatch

use log::info;
use std::collections::HashMap;
use std::sync::Arc;

use super::context::CommandSource;
use super::handler::CommandHandler;
use super::handlers::{create_builtin_handlers, CustomCommandHandler};
use crate::checks::global_gate;
use crate::core::BotError;
use crate::settings::commands::duplicate_names;
use crate::settings::Settings;

/// Registry mapping command names to handlers
///
/// Multiple command names can map to the same handler if they share logic.
///
/// # Example
///
/// ```ignore
/// let registry = CommandRegistry::build(&settings)?;
///
/// if let Some(handler) = registry.get("ping") {
///     handler.handle(ctx, serenity_ctx, &invocation).await?;
/// }
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register the builtins and one handler per `commands` entry.
    ///
    /// Duplicate names, or entries reusing a builtin name, fail the whole
    /// build before anything is registered.
    pub fn build(settings: &Settings) -> Result<Self, BotError> {
        let builtins = create_builtin_handlers();
        let builtin_names: Vec<String> = builtins.iter().flat_map(|h| h.command_names()).collect();

        let duplicates = duplicate_names(
            builtin_names
                .iter()
                .map(String::as_str)
                .chain(settings.command_names()),
        );
        if !duplicates.is_empty() {
            return Err(BotError::Build(duplicates));
        }

        let mut registry = Self::new();
        for handler in builtins {
            registry.register(handler);
        }
        for name in settings.command_names() {
            registry.register(Arc::new(CustomCommandHandler::new(name, CommandSource::Settings)));
        }

        info!(
            "📋 Registered {} commands ({} custom){}",
            registry.len(),
            settings.commands.len(),
            if global_gate(settings).is_empty() {
                ""
            } else {
                ", test-channel gate active"
            }
        );
        Ok(registry)
    }

    /// Register a handler for its declared command names
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        for name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
    }

    /// Get handler for a command name
    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a command is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered command names
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Get all registered command names
    pub fn command_names(&self) -> impl Iterator<Item = &String> {
        self.handlers.keys()
    }

    /// Names owned by builtin handlers
    pub fn builtin_names() -> Vec<String> {
        create_builtin_handlers()
            .iter()
            .flat_map(|h| h.command_names())
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::tests::{entry, test_context};
    use crate::commands::context::CommandContext;
    use crate::commands::invocation::Invocation;
    use crate::commands::slash::create_slash_commands;
    use anyhow::Result;
    use async_trait::async_trait;
    use serenity::prelude::Context;

    // Mock handler for testing
    struct MockHandler {
        names: &'static [&'static str],
    }

    #[async_trait]
    impl CommandHandler for MockHandler {
        fn command_names(&self) -> Vec<String> {
            self.names.iter().map(|n| n.to_string()).collect()
        }

        async fn handle(
            &self,
            _ctx: Arc<CommandContext>,
            _serenity_ctx: &Context,
            _invocation: &Invocation<'_>,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn settings_with(yaml: &[&str], version: [u32; 3]) -> Settings {
        let mut settings = Settings {
            commands: yaml.iter().map(|y| entry(y)).collect(),
            ..Default::default()
        };
        settings.general.version = version;
        settings
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register_multiple_names() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler {
            names: &["load", "unload", "reload"],
        }));

        assert_eq!(registry.len(), 3);
        assert!(registry.contains("load"));
        assert!(registry.get("unload").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_names_fail_build() {
        let settings = settings_with(
            &["name: ping\ncontent: a\n", "name: help\ncontent: b\n", "name: ping\ncontent: c\n"],
            [1, 0, 0],
        );
        match CommandRegistry::build(&settings) {
            Err(BotError::Build(names)) => assert_eq!(names, vec!["ping"]),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("duplicate names must not build"),
        }
    }

    #[test]
    fn test_builtin_names_are_reserved() {
        let settings = settings_with(&["name: reload\ncontent: shadow\n"], [1, 0, 0]);
        assert!(matches!(
            CommandRegistry::build(&settings),
            Err(BotError::Build(names)) if names == vec!["reload"]
        ));
    }

    #[tokio::test]
    async fn test_one_command_per_entry_and_slash_per_enabled() {
        let entries = [
            "name: ping\nembed:\n  title: pong\n",
            "name: rules\ncontent: be nice\n",
            "name: Secret\nslash: false\ncontent: shh\n",
        ];
        let settings = settings_with(&entries, [1, 0, 0]);
        let registry = CommandRegistry::build(&settings).unwrap();

        let builtins = CommandRegistry::builtin_names().len();
        assert_eq!(registry.len(), builtins + 3);
        for name in ["ping", "rules", "Secret", "load", "reload-setting"] {
            assert!(registry.contains(name), "missing {name}");
        }

        let ctx = test_context(settings.commands.clone()).await;
        assert_eq!(create_slash_commands(&ctx).len(), builtins + 2);
    }
}
