//! # Lifecycle Commands
//!
//! `/load`, `/unload`, `/reload` and `/reload-setting`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::Permissions;

use crate::extensions::DEFAULT_FOLDER;

pub const LIFECYCLE_COMMANDS: [&str; 4] = ["load", "unload", "reload", "reload-setting"];

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_extension_command("load", "Load an extension, or every extension in a folder"),
        create_extension_command("unload", "Unload an extension, or every extension in a folder"),
        create_extension_command("reload", "Reload an extension, or every extension in a folder"),
        create_reload_setting_command(),
    ]
}

fn create_extension_command(name: &str, description: &str) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name(name)
        .description(description)
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .create_option(|option| {
            option
                .name("extension")
                .description("Extension name (omit for the whole folder)")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("folder")
                .description(format!("Extension folder (default: {DEFAULT_FOLDER})"))
                .kind(CommandOptionType::String)
                .required(false)
        });
    command
}

fn create_reload_setting_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("reload-setting")
        .description("Reload the settings store")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .create_option(|option| {
            option
                .name("path")
                .description("Load from this path instead of the current one")
                .kind(CommandOptionType::String)
                .required(false)
        });
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_lifecycle_commands() {
        let commands = create_commands();
        assert_eq!(commands.len(), 4);

        let names: Vec<&str> = commands
            .iter()
            .map(|cmd| cmd.0.get("name").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(names, LIFECYCLE_COMMANDS);
    }

    #[test]
    fn test_extension_options_are_optional() {
        let load = &create_commands()[0];
        let options = load.0.get("options").unwrap().as_array().unwrap();
        assert_eq!(options.len(), 2);
        assert!(options
            .iter()
            .all(|o| o.get("required").and_then(|r| r.as_bool()) == Some(false)));
    }
}
