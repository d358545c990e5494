//! # Views
//!
//! Declarative buttons and select menus, laid out into action rows.
//!
//! Every routable item has a key (its `custom_id`, falling back to its label).
//! On the wire the key is namespaced with the owning command as
//! `"<command>:<key>"` so component clicks can be routed back.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Namespace custom ids with the owning command
//! - 1.1.0: Add select menus with per-option values
//! - 1.0.0: Initial button rows

use serde::{Deserialize, Serialize};
use serenity::builder::{CreateActionRow, CreateComponents};
use serenity::model::application::component::ButtonStyle;
use serenity::model::channel::ReactionType;
use std::collections::{BTreeMap, HashSet};

use crate::core::response::LABEL_LIMIT;
use crate::core::truncate_to;

pub const MAX_ROWS: usize = 5;
pub const MAX_BUTTONS_PER_ROW: usize = 5;
pub const MAX_SELECT_OPTIONS: usize = 25;
/// Discord caps custom ids at 100 characters, including the command namespace
pub const CUSTOM_ID_LIMIT: usize = 100;
pub const ID_SEPARATOR: char = ':';
/// Keys starting with this prefix are reserved for the bot's own components
pub const RESERVED_KEY_PREFIX: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ViewSpec {
    #[serde(default)]
    pub items: ViewItems,
}

/// Items grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ViewItems {
    #[serde(default)]
    pub buttons: Vec<ButtonSpec>,
    #[serde(default)]
    pub selects: Vec<SelectSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ButtonSpec {
    pub label: String,
    pub custom_id: Option<String>,
    #[serde(default)]
    pub style: ButtonStyleSpec,
    pub url: Option<String>,
    pub emoji: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    pub row: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyleSpec {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
    Link,
}

impl From<ButtonStyleSpec> for ButtonStyle {
    fn from(style: ButtonStyleSpec) -> Self {
        match style {
            ButtonStyleSpec::Primary => ButtonStyle::Primary,
            ButtonStyleSpec::Secondary => ButtonStyle::Secondary,
            ButtonStyleSpec::Success => ButtonStyle::Success,
            ButtonStyleSpec::Danger => ButtonStyle::Danger,
            ButtonStyleSpec::Link => ButtonStyle::Link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SelectSpec {
    pub custom_id: Option<String>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub min_values: Option<u64>,
    pub max_values: Option<u64>,
    #[serde(default)]
    pub disabled: bool,
    pub options: Vec<SelectOptionSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SelectOptionSpec {
    pub label: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub emoji: Option<String>,
    #[serde(default)]
    pub default: bool,
}

impl SelectOptionSpec {
    /// The value sent back on selection; defaults to the label
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.label)
    }
}

impl ButtonSpec {
    /// Routing key, `None` for link buttons which never reach the bot
    pub fn key(&self) -> Option<&str> {
        if self.style == ButtonStyleSpec::Link {
            return None;
        }
        Some(self.custom_id.as_deref().unwrap_or(&self.label))
    }
}

impl SelectSpec {
    fn key(&self, index: usize) -> String {
        self.custom_id
            .clone()
            .or_else(|| self.label.clone())
            .unwrap_or_else(|| format!("select-{index}"))
    }
}

enum Row<'a> {
    Buttons(Vec<&'a ButtonSpec>),
    Select(usize, &'a SelectSpec),
}

/// Join a command name and an item key into a wire custom id
pub fn namespaced_id(namespace: &str, key: &str) -> String {
    format!("{namespace}{ID_SEPARATOR}{key}")
}

/// Split a wire custom id back into `(command, key)`
pub fn split_custom_id(custom_id: &str) -> Option<(&str, &str)> {
    custom_id
        .split_once(ID_SEPARATOR)
        .filter(|(namespace, key)| !namespace.is_empty() && !key.is_empty())
}

impl ViewSpec {
    pub fn is_empty(&self) -> bool {
        self.items.buttons.is_empty() && self.items.selects.is_empty()
    }

    /// Keys of every item that can trigger an interaction, across all kinds
    pub fn custom_ids(&self) -> Vec<String> {
        let buttons = self
            .items
            .buttons
            .iter()
            .filter_map(|b| b.key().map(str::to_string));
        let selects = self
            .items
            .selects
            .iter()
            .enumerate()
            .map(|(i, s)| s.key(i));
        buttons.chain(selects).collect()
    }

    /// Values the select menus send back when chosen
    pub fn option_values(&self) -> impl Iterator<Item = &str> {
        self.items
            .selects
            .iter()
            .flat_map(|select| select.options.iter().map(SelectOptionSpec::value))
    }

    fn rows(&self) -> Vec<Row<'_>> {
        let mut placed: BTreeMap<usize, Vec<&ButtonSpec>> = BTreeMap::new();
        let mut loose = Vec::new();
        for button in &self.items.buttons {
            match button.row {
                Some(row) => placed.entry(row).or_default().push(button),
                None => loose.push(button),
            }
        }

        let mut rows: Vec<Row<'_>> = placed.into_values().map(Row::Buttons).collect();
        for chunk in loose.chunks(MAX_BUTTONS_PER_ROW) {
            rows.push(Row::Buttons(chunk.to_vec()));
        }
        for (i, select) in self.items.selects.iter().enumerate() {
            rows.push(Row::Select(i, select));
        }
        rows
    }

    /// Check the layout against Discord's component limits
    pub fn validate(&self, namespace: &str) -> Result<(), String> {
        let rows = self.rows();
        if rows.len() > MAX_ROWS {
            return Err(format!("view needs {} rows (max {MAX_ROWS})", rows.len()));
        }
        for row in &rows {
            if let Row::Buttons(buttons) = row {
                if buttons.len() > MAX_BUTTONS_PER_ROW {
                    return Err(format!(
                        "a view row holds {} buttons (max {MAX_BUTTONS_PER_ROW})",
                        buttons.len()
                    ));
                }
            }
        }

        for button in &self.items.buttons {
            match (button.style, &button.url) {
                (ButtonStyleSpec::Link, None) => {
                    return Err(format!("link button '{}' needs a url", button.label))
                }
                (ButtonStyleSpec::Link, Some(_)) => {}
                (_, Some(_)) => {
                    return Err(format!(
                        "button '{}' has a url but is not a link button",
                        button.label
                    ))
                }
                (_, None) => {}
            }
        }

        for select in &self.items.selects {
            let count = select.options.len();
            if count == 0 || count > MAX_SELECT_OPTIONS {
                return Err(format!(
                    "select menu has {count} options (expected 1-{MAX_SELECT_OPTIONS})"
                ));
            }
            let min = select.min_values.unwrap_or(1);
            let max = select.max_values.unwrap_or(1);
            if min > max || max as usize > count {
                return Err(format!(
                    "select menu min/max values {min}/{max} do not fit {count} options"
                ));
            }
            let mut values = HashSet::new();
            for option in &select.options {
                if !values.insert(option.value()) {
                    return Err(format!("select option value '{}' repeats", option.value()));
                }
            }
        }

        let mut seen = HashSet::new();
        for key in self.custom_ids() {
            if key.starts_with(RESERVED_KEY_PREFIX) {
                return Err(format!("view item key '{key}' uses the reserved '__' prefix"));
            }
            if namespaced_id(namespace, &key).chars().count() > CUSTOM_ID_LIMIT {
                return Err(format!("custom id '{key}' is too long"));
            }
            if !seen.insert(key.clone()) {
                return Err(format!("view item key '{key}' is used twice"));
            }
        }
        Ok(())
    }

    /// Build action rows; custom ids are prefixed with `namespace`
    pub fn build(&self, namespace: &str) -> CreateComponents {
        let mut components = CreateComponents::default();
        for row in self.rows() {
            let mut action_row = CreateActionRow::default();
            match row {
                Row::Buttons(buttons) => {
                    for button in buttons {
                        action_row.create_button(|b| {
                            b.label(truncate_to(&button.label, LABEL_LIMIT))
                                .style(button.style.into())
                                .disabled(button.disabled);
                            match (&button.url, button.key()) {
                                (Some(url), _) => {
                                    b.url(url);
                                }
                                (None, Some(key)) => {
                                    b.custom_id(namespaced_id(namespace, key));
                                }
                                (None, None) => {}
                            }
                            if let Some(emoji) = &button.emoji {
                                b.emoji(ReactionType::Unicode(emoji.clone()));
                            }
                            b
                        });
                    }
                }
                Row::Select(index, select) => {
                    action_row.create_select_menu(|menu| {
                        menu.custom_id(namespaced_id(namespace, &select.key(index)))
                            .disabled(select.disabled)
                            .min_values(select.min_values.unwrap_or(1))
                            .max_values(select.max_values.unwrap_or(1));
                        if let Some(placeholder) = &select.placeholder {
                            menu.placeholder(placeholder);
                        }
                        menu.options(|opts| {
                            for option in &select.options {
                                opts.create_option(|o| {
                                    o.label(truncate_to(&option.label, LABEL_LIMIT))
                                        .value(option.value())
                                        .default_selection(option.default);
                                    if let Some(description) = &option.description {
                                        o.description(truncate_to(description, 100));
                                    }
                                    if let Some(emoji) = &option.emoji {
                                        o.emoji(ReactionType::Unicode(emoji.clone()));
                                    }
                                    o
                                });
                            }
                            opts
                        })
                    });
                }
            }
            components.add_action_row(action_row);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(label: &str) -> ButtonSpec {
        ButtonSpec {
            label: label.to_string(),
            custom_id: None,
            style: ButtonStyleSpec::Primary,
            url: None,
            emoji: None,
            disabled: false,
            row: None,
        }
    }

    fn view_with_buttons(labels: &[&str]) -> ViewSpec {
        ViewSpec {
            items: ViewItems {
                buttons: labels.iter().map(|l| button(l)).collect(),
                selects: vec![],
            },
        }
    }

    #[test]
    fn test_parse_items_grouped_by_kind() {
        let yaml = r#"
items:
  buttons:
    - label: Yes
      style: success
    - label: Docs
      style: link
      url: https://example.com
  selects:
    - custom_id: color
      placeholder: Pick a color
      options:
        - label: Red
          value: red
        - label: Blue
"#;
        let view: ViewSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(view.items.buttons.len(), 2);
        assert_eq!(view.items.selects.len(), 1);
        assert_eq!(view.items.selects[0].options[1].value(), "Blue");
        assert!(view.validate("roles").is_ok());
    }

    #[test]
    fn test_custom_ids_span_all_kinds_and_skip_links() {
        let mut view = view_with_buttons(&["Yes", "No"]);
        view.items.buttons.push(ButtonSpec {
            style: ButtonStyleSpec::Link,
            url: Some("https://example.com".to_string()),
            ..button("Docs")
        });
        view.items.selects.push(SelectSpec {
            custom_id: Some("color".to_string()),
            label: None,
            placeholder: None,
            min_values: None,
            max_values: None,
            disabled: false,
            options: vec![SelectOptionSpec {
                label: "Red".to_string(),
                value: None,
                description: None,
                emoji: None,
                default: false,
            }],
        });

        assert_eq!(view.custom_ids(), vec!["Yes", "No", "color"]);
        assert_eq!(view.option_values().collect::<Vec<_>>(), vec!["Red"]);
    }

    #[test]
    fn test_loose_buttons_pack_five_per_row() {
        let view = view_with_buttons(&["a", "b", "c", "d", "e", "f", "g"]);
        let components = view.build("menu");
        assert_eq!(components.0.len(), 2);
    }

    #[test]
    fn test_explicit_rows_are_respected() {
        let mut view = view_with_buttons(&["a", "b", "c"]);
        view.items.buttons[0].row = Some(0);
        view.items.buttons[1].row = Some(1);
        view.items.buttons[2].row = Some(1);
        assert_eq!(view.build("menu").0.len(), 2);
    }

    #[test]
    fn test_too_many_rows_rejected() {
        let labels: Vec<String> = (0..26).map(|i| format!("b{i}")).collect();
        let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let view = view_with_buttons(&refs);
        assert!(view.validate("menu").is_err());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let view = view_with_buttons(&["Same", "Same"]);
        let err = view.validate("menu").unwrap_err();
        assert!(err.contains("Same"));
    }

    #[test]
    fn test_link_button_without_url_rejected() {
        let mut view = view_with_buttons(&["Docs"]);
        view.items.buttons[0].style = ButtonStyleSpec::Link;
        assert!(view.validate("menu").is_err());
    }

    #[test]
    fn test_button_custom_id_is_namespaced() {
        let view = view_with_buttons(&["Yes"]);
        let components = view.build("vote");
        let row = &components.0[0];
        let custom_id = row["components"][0]["custom_id"].as_str().unwrap();
        assert_eq!(custom_id, "vote:Yes");
    }

    #[test]
    fn test_split_custom_id() {
        assert_eq!(split_custom_id("vote:Yes"), Some(("vote", "Yes")));
        assert_eq!(split_custom_id("vote:a:b"), Some(("vote", "a:b")));
        assert_eq!(split_custom_id("novote"), None);
        assert_eq!(split_custom_id(":x"), None);
    }
}
