//! Custom command entries
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add named checks and per-item interaction responses
//! - 1.0.0: Initial (name, config) entries

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use crate::checks::CheckName;
use crate::ui::modal::MODAL_KEY;
use crate::ui::{ResponseConfig, ViewSpec};

/// Key of the interaction response sent when a command's modal is submitted
pub const SUBMIT_KEY: &str = "submit";

/// One `(name, config)` pair from the `commands` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandEntry {
    pub name: String,
    #[serde(flatten)]
    pub config: CommandConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandConfig {
    pub description: Option<String>,

    /// Also register a native slash command
    #[serde(default = "default_true")]
    pub slash: bool,

    /// Checks that must pass before the command runs
    #[serde(default)]
    pub checks: Vec<CheckName>,

    #[serde(flatten)]
    pub response: ResponseConfig,

    /// Responses keyed by view item key, select option value, or `submit`
    #[serde(default)]
    pub interaction: BTreeMap<String, ResponseConfig>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            description: None,
            slash: true,
            checks: Vec::new(),
            response: ResponseConfig::default(),
            interaction: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn slash_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[-_a-z0-9]{1,32}$").ok())
        .as_ref()
}

/// Whether `name` is accepted by Discord as a slash command name
pub fn is_valid_slash_name(name: &str) -> bool {
    slash_name_pattern().is_some_and(|re| re.is_match(name))
}

impl CommandConfig {
    pub fn description_or_default(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("Custom command")
    }

    /// Views this command can send, its own first
    fn views(&self) -> impl Iterator<Item = &ViewSpec> {
        self.response
            .view
            .iter()
            .chain(self.interaction.values().filter_map(|r| r.view.as_ref()))
    }

    /// Keys of all view items this command can be clicked through, in first-seen order
    pub fn custom_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.views()
            .flat_map(|view| view.custom_ids())
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// `interaction` keys no item key, select value or modal submission resolves to
    pub fn unrouted_interaction_keys(&self) -> Vec<&str> {
        let ids: HashSet<String> = self.custom_ids().into_iter().collect();
        let values: HashSet<&str> = self.views().flat_map(|view| view.option_values()).collect();
        self.interaction
            .keys()
            .map(String::as_str)
            .filter(|key| *key != SUBMIT_KEY && !ids.contains(*key) && !values.contains(key))
            .collect()
    }
}

impl CommandEntry {
    pub fn validate(&self) -> Result<(), String> {
        let name = &self.name;
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(format!("command name '{name}' must be one word"));
        }
        if name.contains(crate::ui::view::ID_SEPARATOR) {
            return Err(format!("command name '{name}' must not contain ':'"));
        }
        if self.config.slash && !is_valid_slash_name(name) {
            return Err(format!(
                "command '{name}' is not a valid slash command name (lowercase, 1-32 chars); set `slash: false` to keep it prefix-only"
            ));
        }
        if self.config.description_or_default().chars().count() > 100 {
            return Err(format!("command '{name}' description is longer than 100 characters"));
        }

        self.config
            .response
            .validate(name)
            .map_err(|e| format!("command '{name}': {e}"))?;

        for (key, response) in &self.config.interaction {
            response
                .validate(name)
                .map_err(|e| format!("command '{name}' interaction '{key}': {e}"))?;
        }
        if let Some(submit) = self.config.interaction.get(SUBMIT_KEY) {
            if submit.modal.is_some() {
                return Err(format!(
                    "command '{name}': the '{SUBMIT_KEY}' response cannot open another modal"
                ));
            }
        }
        if self.config.interaction.contains_key(MODAL_KEY) {
            return Err(format!("command '{name}': '{MODAL_KEY}' is a reserved key"));
        }
        Ok(())
    }
}

/// Names that appear more than once, in first-seen order
pub fn duplicate_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for name in names {
        let count = counts.entry(name).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(name.to_string());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRIES: &str = r#"
- name: ping
  embed:
    title: pong
- name: rules
  description: Server rules
  slash: false
  checks: [available_channel, cooldown]
  content: Read these
  view:
    items:
      buttons:
        - label: Accept
  interaction:
    Accept:
      content: Welcome aboard
"#;

    #[test]
    fn test_parse_entries() {
        let entries: Vec<CommandEntry> = serde_yaml::from_str(ENTRIES).unwrap();
        assert_eq!(entries.len(), 2);

        let ping = &entries[0];
        assert_eq!(ping.name, "ping");
        assert!(ping.config.slash);
        assert_eq!(
            ping.config.response.embed.as_ref().and_then(|e| e.title.as_deref()),
            Some("pong")
        );
        assert!(ping.config.response.view.is_none());

        let rules = &entries[1];
        assert!(!rules.config.slash);
        assert_eq!(
            rules.config.checks,
            vec![CheckName::AvailableChannel, CheckName::Cooldown]
        );
        assert_eq!(rules.config.custom_ids(), vec!["Accept"]);
        assert!(rules.config.interaction.contains_key("Accept"));
        for entry in &entries {
            assert!(entry.validate().is_ok());
        }
    }

    #[test]
    fn test_custom_ids_list_shared_keys_once() {
        let yaml = r#"
- name: menu
  view:
    items:
      buttons:
        - label: Back
        - label: Next
  interaction:
    Next:
      view:
        items:
          buttons:
            - label: Back
            - label: Done
    Done:
      view:
        items:
          buttons:
            - label: Back
"#;
        let entries: Vec<CommandEntry> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entries[0].config.custom_ids(), vec!["Back", "Next", "Done"]);
    }

    #[test]
    fn test_unrouted_interaction_keys() {
        let yaml = r#"
- name: coin
  view:
    items:
      buttons:
        - label: Flip
      selects:
        - custom_id: side
          options:
            - label: Heads
              value: heads
  interaction:
    Flip:
      content: flipping
    heads:
      content: heads it is
    submit:
      content: thanks
    Tails:
      content: never reached
"#;
        let entries: Vec<CommandEntry> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entries[0].config.unrouted_interaction_keys(), vec!["Tails"]);
    }

    #[test]
    fn test_unknown_check_is_a_schema_error() {
        let yaml = "- name: x\n  checks: [moderator]\n";
        let result: Result<Vec<CommandEntry>, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_slash_names_must_be_lowercase() {
        let entry = CommandEntry {
            name: "Ping".to_string(),
            config: CommandConfig::default(),
        };
        assert!(entry.validate().is_err());

        let prefix_only = CommandEntry {
            name: "Ping".to_string(),
            config: CommandConfig {
                slash: false,
                ..Default::default()
            },
        };
        assert!(prefix_only.validate().is_ok());
    }

    #[test]
    fn test_submit_cannot_open_modal() {
        let yaml = r#"
- name: apply
  modal:
    title: Apply
    fields:
      - label: Why
  interaction:
    submit:
      modal:
        title: Again
        fields:
          - label: Why
"#;
        let entries: Vec<CommandEntry> = serde_yaml::from_str(yaml).unwrap();
        assert!(entries[0].validate().is_err());
    }

    #[test]
    fn test_duplicate_names() {
        let names = ["ping", "help", "ping", "rules", "help", "ping"];
        assert_eq!(duplicate_names(names), vec!["ping", "help"]);
        assert!(duplicate_names(["a", "b"]).is_empty());
    }
}
