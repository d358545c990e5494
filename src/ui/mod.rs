//! # Declarative UI
//!
//! Typed descriptions of embeds, views and modals, parsed from settings
//! documents and turned into serenity builders on demand.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Embeds with nothing to display are dropped from the plan; option fan-out
//!   moved into component routing
//! - 1.1.0: Add per-option response fan-out for select menus
//! - 1.0.0: Initial embed/view/modal specs

pub mod embed;
pub mod modal;
pub mod render;
pub mod view;

use serde::{Deserialize, Serialize};

pub use embed::EmbedSpec;
pub use modal::ModalSpec;
pub use render::{render, render_option, MessagePayload, RenderOutcome, ResponseSink};
pub use view::{split_custom_id, ViewSpec};

/// One renderable response: at most a modal, or some of content/embed/view
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResponseConfig {
    pub content: Option<String>,
    pub embed: Option<EmbedSpec>,
    pub view: Option<ViewSpec>,
    pub modal: Option<ModalSpec>,
}

/// What a [`ResponseConfig`] resolves to for a single invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiResponse<'a> {
    Modal(&'a ModalSpec),
    Message {
        content: Option<&'a str>,
        embed: Option<&'a EmbedSpec>,
        view: Option<&'a ViewSpec>,
    },
    Nothing,
}

impl ResponseConfig {
    /// A modal wins over everything else; otherwise any present message parts are sent
    pub fn plan(&self) -> UiResponse<'_> {
        if let Some(modal) = &self.modal {
            return UiResponse::Modal(modal);
        }

        let content = self.content.as_deref().filter(|c| !c.is_empty());
        let embed = self.embed.as_ref().filter(|e| !e.is_empty());
        let view = self.view.as_ref().filter(|v| !v.is_empty());
        if content.is_none() && embed.is_none() && view.is_none() {
            return UiResponse::Nothing;
        }

        UiResponse::Message {
            content,
            embed,
            view,
        }
    }

    pub fn validate(&self, namespace: &str) -> Result<(), String> {
        if let Some(embed) = &self.embed {
            embed.validate()?;
        }
        if let Some(view) = &self.view {
            view.validate(namespace)?;
        }
        if let Some(modal) = &self.modal {
            modal.validate()?;
        }
        Ok(())
    }
}
