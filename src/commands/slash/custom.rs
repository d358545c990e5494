//! Slash definitions for configured commands
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use serenity::builder::CreateApplicationCommand;

use crate::settings::CommandEntry;

/// One definition per slash-enabled entry, in order
pub fn create_commands(entries: &[CommandEntry]) -> Vec<CreateApplicationCommand> {
    entries
        .iter()
        .filter(|entry| entry.config.slash)
        .map(create_custom_command)
        .collect()
}

pub fn create_custom_command(entry: &CommandEntry) -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name(&entry.name)
        .description(entry.config.description_or_default())
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_slash_enabled_entries() {
        let entries: Vec<CommandEntry> = serde_yaml::from_str(
            r#"
- name: ping
  description: Check the bot
- name: secret
  slash: false
- name: help
"#,
        )
        .unwrap();

        let commands = create_commands(&entries);
        assert_eq!(commands.len(), 2);
        let ping = &commands[0];
        assert_eq!(ping.0.get("name").unwrap().as_str(), Some("ping"));
        assert_eq!(ping.0.get("description").unwrap().as_str(), Some("Check the bot"));
        assert_eq!(
            commands[1].0.get("description").unwrap().as_str(),
            Some("Custom command")
        );
    }
}
