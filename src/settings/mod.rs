//! # Settings
//!
//! Typed sections of the bot's settings store. A settings path is either a
//! directory holding one document per section (`general.yaml`,
//! `commands.json`, ...) or a single document holding every section.
//! Missing sections take their defaults.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Schema validation at load time
//! - 1.1.0: Accept JSON documents next to YAML
//! - 1.0.0: Initial directory loader

pub mod commands;
pub mod store;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::BotError;

pub use commands::{CommandConfig, CommandEntry};
pub use store::SettingsHandle;

/// Extensions tried, in order, when looking for a section document
pub const DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct General {
    pub version: [u32; 3],
    pub avatar_url: String,
    /// Application id, `0` when unset
    pub id: u64,
}

impl General {
    /// Major version zero means the bot only answers in test channels
    pub fn is_prerelease(&self) -> bool {
        self.version[0] == 0
    }

    pub fn version_string(&self) -> String {
        let [major, minor, patch] = self.version;
        format!("{major}.{minor}.{patch}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Managements {
    /// `[hours, minutes, seconds]`
    pub cooldown: [u64; 3],
    pub vips: Vec<u64>,
}

impl Managements {
    /// `None` when the triple does not fit in a duration
    pub fn cooldown_duration(&self) -> Option<Duration> {
        let [hours, minutes, seconds] = self.cooldown;
        hours
            .checked_mul(3600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(seconds))
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Checks {
    pub channel: Vec<u64>,
    pub test_channel: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Cog {
    pub folder: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "bot.db".to_string(),
        }
    }
}

/// Every section as one document, used for single-file settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SettingsDocument {
    general: General,
    managements: Managements,
    checks: Checks,
    commands: Vec<CommandEntry>,
    cog: Cog,
    database: DatabaseSection,
}

/// A loaded settings store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Where the store was loaded from
    pub path: PathBuf,
    pub general: General,
    pub managements: Managements,
    pub checks: Checks,
    pub commands: Vec<CommandEntry>,
    pub cog: Cog,
    pub database: DatabaseSection,
}

impl Settings {
    /// Load and validate the store at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let path = path.as_ref();
        let settings = if path.is_dir() {
            Self::load_dir(path)?
        } else if path.is_file() {
            Self::load_file(path)?
        } else {
            return Err(BotError::settings(format!(
                "settings path '{}' does not exist",
                path.display()
            )));
        };

        settings.validate()?;
        for entry in &settings.commands {
            for key in entry.config.unrouted_interaction_keys() {
                warn!(
                    "⚠️ Command '{}' has an interaction response '{key}' that no component can trigger",
                    entry.name
                );
            }
        }
        info!(
            "⚙️ Loaded settings from {} (v{}, {} commands)",
            path.display(),
            settings.general.version_string(),
            settings.commands.len()
        );
        Ok(settings)
    }

    fn load_dir(dir: &Path) -> Result<Self, BotError> {
        Ok(Self {
            path: dir.to_path_buf(),
            general: read_section(dir, "general")?.unwrap_or_default(),
            managements: read_section(dir, "managements")?.unwrap_or_default(),
            checks: read_section(dir, "checks")?.unwrap_or_default(),
            commands: read_section(dir, "commands")?.unwrap_or_default(),
            cog: read_section(dir, "cog")?.unwrap_or_default(),
            database: read_section(dir, "database")?.unwrap_or_default(),
        })
    }

    fn load_file(file: &Path) -> Result<Self, BotError> {
        let doc: SettingsDocument = read_document(file)?;
        Ok(Self {
            path: file.to_path_buf(),
            general: doc.general,
            managements: doc.managements,
            checks: doc.checks,
            commands: doc.commands,
            cog: doc.cog,
            database: doc.database,
        })
    }

    /// Schema checks that serde cannot express
    pub fn validate(&self) -> Result<(), BotError> {
        for entry in &self.commands {
            entry.validate().map_err(BotError::Settings)?;
        }
        let cooldown = self
            .managements
            .cooldown_duration()
            .and_then(|d| chrono::Duration::from_std(d).ok());
        if cooldown.is_none() {
            return Err(BotError::settings(format!(
                "managements.cooldown {:?} is out of range",
                self.managements.cooldown
            )));
        }
        if self.database.path.trim().is_empty() {
            return Err(BotError::settings("database.path must not be empty"));
        }
        Ok(())
    }

    /// First entry registered under `name`
    pub fn command(&self, name: &str) -> Option<&CommandConfig> {
        self.commands
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.config)
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|entry| entry.name.as_str())
    }

    /// Names used by more than one `commands` entry
    pub fn duplicate_command_names(&self) -> Vec<String> {
        commands::duplicate_names(self.command_names())
    }

    /// Ids configured in `managements.vips`
    pub fn vips(&self) -> HashSet<u64> {
        self.managements.vips.iter().copied().collect()
    }
}

/// Find `<dir>/<name>.{yaml,yml,json}` and parse it, `None` when absent
fn read_section<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Option<T>, BotError> {
    for ext in DOCUMENT_EXTENSIONS {
        let candidate = dir.join(format!("{name}.{ext}"));
        if candidate.is_file() {
            debug!("Reading settings section {}", candidate.display());
            return read_document(&candidate).map(Some);
        }
    }
    Ok(None)
}

/// Parse a YAML or JSON document, chosen by file extension
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, BotError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| BotError::settings(format!("{}: {e}", path.display())))?;
    parse_document(path, &contents)
}

pub(crate) fn parse_document<T: DeserializeOwned>(
    path: &Path,
    contents: &str,
) -> Result<T, BotError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    } else if contents.trim().is_empty() {
        // An empty YAML file is an empty section
        serde_yaml::from_str("{}").map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| BotError::settings(format!("{}: {e}", path.display())))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    /// Fresh directory under the system temp dir
    pub fn temp_dir(prefix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn write_settings_dir(commands_yaml: &str, version: [u32; 3]) -> PathBuf {
        let dir = temp_dir("confbot-settings");
        fs::write(
            dir.join("general.yaml"),
            format!("version: [{}, {}, {}]\n", version[0], version[1], version[2]),
        )
        .unwrap();
        fs::write(dir.join("commands.yaml"), commands_yaml).unwrap();
        dir
    }

    #[test]
    fn test_load_directory() {
        let dir = write_settings_dir("- name: ping\n  embed:\n    title: pong\n", [0, 3, 1]);
        fs::write(dir.join("checks.json"), r#"{"channel": [10, 20], "test_channel": [30]}"#)
            .unwrap();
        fs::write(dir.join("managements.yml"), "cooldown: [0, 1, 30]\nvips: [42]\n").unwrap();

        let settings = Settings::load(&dir).unwrap();
        assert_eq!(settings.path, dir);
        assert_eq!(settings.general.version, [0, 3, 1]);
        assert!(settings.general.is_prerelease());
        assert_eq!(settings.checks.channel, vec![10, 20]);
        assert_eq!(settings.checks.test_channel, vec![30]);
        assert_eq!(settings.managements.cooldown_duration(), Some(Duration::from_secs(90)));
        assert!(settings.vips().contains(&42));
        assert_eq!(settings.database.path, "bot.db");
        assert!(settings.command("ping").is_some());
        assert!(settings.command("pong").is_none());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_single_file() {
        let dir = temp_dir("confbot-settings-file");
        let file = dir.join("bot.yaml");
        fs::write(
            &file,
            r#"
general:
  version: [1, 0, 0]
  id: 1234
database:
  path: data/bot.db
commands:
  - name: rules
    content: Be nice
"#,
        )
        .unwrap();

        let settings = Settings::load(&file).unwrap();
        assert!(!settings.general.is_prerelease());
        assert_eq!(settings.general.id, 1234);
        assert_eq!(settings.database.path, "data/bot.db");
        assert_eq!(settings.command_names().collect::<Vec<_>>(), vec!["rules"]);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let dir = temp_dir("confbot-settings-empty");
        let settings = Settings::load(&dir).unwrap();
        assert_eq!(settings.general.version, [0, 0, 0]);
        assert!(settings.general.avatar_url.is_empty());
        assert!(settings.commands.is_empty());
        assert!(settings.cog.folder.is_empty());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let missing = std::env::temp_dir().join(format!("nope-{}", uuid::Uuid::new_v4()));
        assert!(matches!(Settings::load(missing), Err(BotError::Settings(_))));
    }

    #[test]
    fn test_invalid_view_fails_at_load() {
        let labels: String = (0..6).map(|i| format!("        - label: b{i}\n          row: 0\n")).collect();
        let commands = format!("- name: menu\n  view:\n    items:\n      buttons:\n{labels}");
        let dir = write_settings_dir(&commands, [1, 0, 0]);
        let err = Settings::load(&dir).unwrap_err();
        assert!(err.to_string().contains("menu"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_out_of_range_cooldown_fails_at_load() {
        let dir = write_settings_dir("[]", [1, 0, 0]);
        fs::write(
            dir.join("managements.yaml"),
            "cooldown: [18446744073709551615, 0, 0]\n",
        )
        .unwrap();
        let err = Settings::load(&dir).unwrap_err();
        assert!(matches!(&err, BotError::Settings(msg) if msg.contains("cooldown")));

        // Fits in u64 seconds but not in a timestamp offset
        fs::write(dir.join("managements.yaml"), "cooldown: [0, 0, 18446744073709551615]\n").unwrap();
        assert!(Settings::load(&dir).is_err());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_duplicates_survive_loading() {
        let dir = write_settings_dir(
            "- name: ping\n  content: a\n- name: ping\n  content: b\n",
            [1, 0, 0],
        );
        let settings = Settings::load(&dir).unwrap();
        assert_eq!(settings.duplicate_command_names(), vec!["ping"]);
        assert_eq!(
            settings.command("ping").and_then(|c| c.response.content.as_deref()),
            Some("a")
        );
        fs::remove_dir_all(dir).ok();
    }
}
