//! Modal forms
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use serde::{Deserialize, Serialize};
use serenity::builder::CreateComponents;
use serenity::model::application::component::InputTextStyle;
use std::collections::HashSet;

use crate::core::response::LABEL_LIMIT;

pub const MAX_MODAL_FIELDS: usize = 5;
pub const MODAL_TITLE_LIMIT: usize = 45;
pub const INPUT_LENGTH_LIMIT: u64 = 4000;
/// Reserved key that opens (and later submits) a command's modal
pub const MODAL_KEY: &str = "__modal";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModalSpec {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<ModalFieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModalFieldSpec {
    pub label: String,
    pub custom_id: Option<String>,
    #[serde(default)]
    pub style: InputStyleSpec,
    pub placeholder: Option<String>,
    #[serde(default = "default_true")]
    pub required: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputStyleSpec {
    #[default]
    Short,
    Paragraph,
}

impl From<InputStyleSpec> for InputTextStyle {
    fn from(style: InputStyleSpec) -> Self {
        match style {
            InputStyleSpec::Short => InputTextStyle::Short,
            InputStyleSpec::Paragraph => InputTextStyle::Paragraph,
        }
    }
}

fn default_true() -> bool {
    true
}

impl ModalFieldSpec {
    pub fn key(&self) -> &str {
        self.custom_id.as_deref().unwrap_or(&self.label)
    }
}

impl ModalSpec {
    pub fn validate(&self) -> Result<(), String> {
        let title_len = self.title.chars().count();
        if title_len == 0 || title_len > MODAL_TITLE_LIMIT {
            return Err(format!(
                "modal title must be 1-{MODAL_TITLE_LIMIT} characters, got {title_len}"
            ));
        }
        if self.fields.is_empty() || self.fields.len() > MAX_MODAL_FIELDS {
            return Err(format!(
                "modal '{}' has {} fields (expected 1-{MAX_MODAL_FIELDS})",
                self.title,
                self.fields.len()
            ));
        }

        let mut keys = HashSet::new();
        for field in &self.fields {
            if field.label.chars().count() > 45 {
                return Err(format!("modal field label '{}' is too long", field.label));
            }
            if !keys.insert(field.key()) {
                return Err(format!("modal field key '{}' is used twice", field.key()));
            }
            let min = field.min_length.unwrap_or(0);
            let max = field.max_length.unwrap_or(INPUT_LENGTH_LIMIT);
            if min > max || max > INPUT_LENGTH_LIMIT {
                return Err(format!(
                    "modal field '{}' has invalid length bounds {min}..{max}",
                    field.label
                ));
            }
        }
        Ok(())
    }

    /// One action row per text input
    pub fn components(&self) -> CreateComponents {
        let mut components = CreateComponents::default();
        for field in &self.fields {
            components.create_action_row(|row| {
                row.create_input_text(|input| {
                    input
                        .custom_id(field.key())
                        .label(crate::core::truncate_to(&field.label, LABEL_LIMIT))
                        .style(field.style.into())
                        .required(field.required);
                    if let Some(placeholder) = &field.placeholder {
                        input.placeholder(placeholder);
                    }
                    if let Some(min) = field.min_length {
                        input.min_length(min);
                    }
                    if let Some(max) = field.max_length {
                        input.max_length(max);
                    }
                    if let Some(value) = &field.value {
                        input.value(value);
                    }
                    input
                })
            });
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEEDBACK: &str = r#"
title: Feedback
fields:
  - label: Name
  - label: Message
    custom_id: body
    style: paragraph
    required: false
    max_length: 500
"#;

    #[test]
    fn test_parse_and_defaults() {
        let modal: ModalSpec = serde_yaml::from_str(FEEDBACK).unwrap();
        assert_eq!(modal.fields.len(), 2);
        assert!(modal.fields[0].required);
        assert_eq!(modal.fields[0].key(), "Name");
        assert_eq!(modal.fields[1].key(), "body");
        assert_eq!(modal.fields[1].style, InputStyleSpec::Paragraph);
        assert!(modal.validate().is_ok());
    }

    #[test]
    fn test_one_row_per_field() {
        let modal: ModalSpec = serde_yaml::from_str(FEEDBACK).unwrap();
        assert_eq!(modal.components().0.len(), 2);
    }

    #[test]
    fn test_empty_modal_rejected() {
        let modal = ModalSpec {
            title: "Empty".to_string(),
            fields: vec![],
        };
        assert!(modal.validate().is_err());
    }

    #[test]
    fn test_long_title_rejected() {
        let mut modal: ModalSpec = serde_yaml::from_str(FEEDBACK).unwrap();
        modal.title = "x".repeat(46);
        assert!(modal.validate().is_err());
    }

    #[test]
    fn test_inverted_length_bounds_rejected() {
        let mut modal: ModalSpec = serde_yaml::from_str(FEEDBACK).unwrap();
        modal.fields[0].min_length = Some(10);
        modal.fields[0].max_length = Some(5);
        assert!(modal.validate().is_err());
    }
}
