//! Embed descriptions and their serenity builders
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Accept "#rrggbb" colors alongside integers
//! - 1.0.0: Initial embed spec

use serde::{Deserialize, Deserializer, Serialize};
use serenity::builder::CreateEmbed;

use crate::core::response::{
    EMBED_FIELD_NAME_LIMIT, EMBED_FIELD_VALUE_LIMIT, EMBED_FOOTER_LIMIT, EMBED_TITLE_LIMIT,
};
use crate::core::{truncate_for_embed, truncate_to};

/// Discord allows at most 25 fields per embed
pub const MAX_EMBED_FIELDS: usize = 25;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EmbedSpec {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<EmbedColor>,
    pub author: Option<EmbedAuthor>,
    pub footer: Option<EmbedFooter>,
    pub thumbnail: Option<EmbedMedia>,
    pub image: Option<EmbedMedia>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// RGB color, written either as an integer or as a "#rrggbb" string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmbedColor(pub u32);

impl<'de> Deserialize<'de> for EmbedColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(value) => Ok(EmbedColor(value)),
            Raw::Text(text) => parse_hex_color(&text)
                .map(EmbedColor)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{text}'"))),
        }
    }
}

fn parse_hex_color(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

impl EmbedSpec {
    /// Nothing Discord would display; `url` and `color` alone do not count
    pub fn is_empty(&self) -> bool {
        let blank = |text: &Option<String>| text.as_deref().map_or(true, str::is_empty);
        blank(&self.title)
            && blank(&self.description)
            && self.author.is_none()
            && self.footer.is_none()
            && self.thumbnail.is_none()
            && self.image.is_none()
            && self.fields.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.fields.len() > MAX_EMBED_FIELDS {
            return Err(format!(
                "embed has {} fields (max {MAX_EMBED_FIELDS})",
                self.fields.len()
            ));
        }
        if let Some(color) = self.color {
            if color.0 > 0xFF_FF_FF {
                return Err(format!("embed color {:#x} is out of range", color.0));
            }
        }
        Ok(())
    }

    /// Build the serenity embed. Over-long text is truncated to Discord's limits.
    pub fn build(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::default();

        if let Some(title) = &self.title {
            embed.title(truncate_to(title, EMBED_TITLE_LIMIT));
        }
        if let Some(description) = &self.description {
            embed.description(truncate_for_embed(description));
        }
        if let Some(url) = &self.url {
            embed.url(url);
        }
        if let Some(color) = self.color {
            embed.color(color.0);
        }
        if let Some(author) = &self.author {
            embed.author(|a| {
                a.name(truncate_to(&author.name, EMBED_TITLE_LIMIT));
                if let Some(url) = &author.url {
                    a.url(url);
                }
                if let Some(icon_url) = &author.icon_url {
                    a.icon_url(icon_url);
                }
                a
            });
        }
        if let Some(footer) = &self.footer {
            embed.footer(|f| {
                f.text(truncate_to(&footer.text, EMBED_FOOTER_LIMIT));
                if let Some(icon_url) = &footer.icon_url {
                    f.icon_url(icon_url);
                }
                f
            });
        }
        if let Some(thumbnail) = &self.thumbnail {
            embed.thumbnail(&thumbnail.url);
        }
        if let Some(image) = &self.image {
            embed.image(&image.url);
        }
        for field in &self.fields {
            embed.field(
                truncate_to(&field.name, EMBED_FIELD_NAME_LIMIT),
                truncate_to(&field.value, EMBED_FIELD_VALUE_LIMIT),
                field.inline,
            );
        }

        embed
    }
}
