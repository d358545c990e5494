//! Response rendering
//!
//! Sends exactly one modal or one message per invocation through a
//! [`ResponseSink`]. Prefix invocations reply without pinging the author;
//! interactions answer with the interaction's own response.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Plain channel sends for messages whose trigger is gone
//! - 1.1.0: Prefix replies offer a button that opens the modal
//! - 1.0.0: Initial renderer

use anyhow::Result;
use async_trait::async_trait;
use serenity::builder::{
    CreateComponents, CreateEmbed, CreateInteractionResponseData, CreateMessage,
};
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, MessageId};
use serenity::prelude::Context;
use std::collections::BTreeMap;

use super::modal::{ModalSpec, MODAL_KEY};
use super::view::namespaced_id;
use super::{EmbedSpec, ResponseConfig, UiResponse};
use crate::core::response::LABEL_LIMIT;
use crate::core::{truncate_for_message, truncate_to};

/// A message ready to send, any part may be absent
#[derive(Debug, Clone, Default)]
pub struct MessagePayload {
    pub content: Option<String>,
    pub embed: Option<CreateEmbed>,
    pub components: Option<CreateComponents>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn apply_message<'a, 'b>(self, m: &'b mut CreateMessage<'a>) -> &'b mut CreateMessage<'a> {
        if let Some(content) = self.content {
            m.content(content);
        }
        if let Some(embed) = self.embed {
            m.set_embed(embed);
        }
        if let Some(components) = self.components {
            m.set_components(components);
        }
        m
    }

    pub fn apply_interaction<'a, 'b>(
        self,
        d: &'b mut CreateInteractionResponseData<'a>,
    ) -> &'b mut CreateInteractionResponseData<'a> {
        if let Some(content) = self.content {
            d.content(content);
        }
        if let Some(embed) = self.embed {
            d.set_embed(embed);
        }
        if let Some(components) = self.components {
            d.set_components(components);
        }
        d
    }
}

/// Where a rendered response goes
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Open `modal`, whose submission will carry the `namespace` command's id
    async fn send_modal(&self, namespace: &str, modal: &ModalSpec) -> Result<()>;

    async fn send_message(&self, payload: MessagePayload) -> Result<()>;

    /// Short text only the caller needs to see (denials, errors, acknowledgements)
    async fn send_notice(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Modal,
    Message,
    Nothing,
}

/// Render one response config: a modal, or a message, never both
pub async fn render(
    sink: &dyn ResponseSink,
    namespace: &str,
    response: &ResponseConfig,
) -> Result<RenderOutcome> {
    match response.plan() {
        UiResponse::Modal(modal) => {
            sink.send_modal(namespace, modal).await?;
            Ok(RenderOutcome::Modal)
        }
        UiResponse::Message {
            content,
            embed,
            view,
        } => {
            let payload = MessagePayload {
                content: content.map(truncate_for_message),
                embed: embed.map(EmbedSpec::build),
                components: view.map(|v| v.build(namespace)),
            };
            sink.send_message(payload).await?;
            Ok(RenderOutcome::Message)
        }
        UiResponse::Nothing => Ok(RenderOutcome::Nothing),
    }
}

/// Render the response configured for one option of a fan-out map
pub async fn render_option(
    sink: &dyn ResponseSink,
    namespace: &str,
    options: &BTreeMap<String, ResponseConfig>,
    key: &str,
) -> Result<RenderOutcome> {
    match options.get(key) {
        Some(response) => render(sink, namespace, response).await,
        None => Ok(RenderOutcome::Nothing),
    }
}

/// Button that opens `namespace`'s modal when clicked
fn modal_launcher(namespace: &str, modal: &ModalSpec) -> CreateComponents {
    let mut components = CreateComponents::default();
    components.create_action_row(|row| {
        row.create_button(|b| {
            b.custom_id(namespaced_id(namespace, MODAL_KEY))
                .label(truncate_to(&modal.title, LABEL_LIMIT))
                .style(ButtonStyle::Primary)
        })
    });
    components
}

/// Fill `m` with `payload`. With a `reference` the message is a reply that
/// does not ping the replied-to author; without one it mentions nobody.
pub fn build_message<'a, 'b>(
    m: &'b mut CreateMessage<'a>,
    reference: Option<(ChannelId, MessageId)>,
    payload: MessagePayload,
) -> &'b mut CreateMessage<'a> {
    match reference {
        Some(reference) => {
            m.reference_message(reference)
                .allowed_mentions(|am| am.replied_user(false));
        }
        None => {
            m.allowed_mentions(|am| am.empty_parse());
        }
    }
    payload.apply_message(m)
}

/// Replies to a prefix command message
pub struct ReplySink<'a> {
    pub ctx: &'a Context,
    pub message: &'a Message,
}

impl<'a> ReplySink<'a> {
    pub fn new(ctx: &'a Context, message: &'a Message) -> Self {
        Self { ctx, message }
    }

    /// Reply without mentioning the author, returning the sent message
    pub async fn reply(&self, payload: MessagePayload) -> Result<Message> {
        let reference = (self.message.channel_id, self.message.id);
        self.post(Some(reference), payload).await
    }

    /// Post to the trigger's channel without referencing the trigger
    pub async fn send(&self, payload: MessagePayload) -> Result<Message> {
        self.post(None, payload).await
    }

    async fn post(
        &self,
        reference: Option<(ChannelId, MessageId)>,
        payload: MessagePayload,
    ) -> Result<Message> {
        let sent = self
            .message
            .channel_id
            .send_message(&self.ctx.http, |m| build_message(m, reference, payload))
            .await?;
        Ok(sent)
    }
}

#[async_trait]
impl<'a> ResponseSink for ReplySink<'a> {
    async fn send_modal(&self, namespace: &str, modal: &ModalSpec) -> Result<()> {
        // Text messages cannot open modals directly
        let payload = MessagePayload {
            components: Some(modal_launcher(namespace, modal)),
            ..Default::default()
        };
        self.reply(payload).await?;
        Ok(())
    }

    async fn send_message(&self, payload: MessagePayload) -> Result<()> {
        self.reply(payload).await?;
        Ok(())
    }

    async fn send_notice(&self, text: &str) -> Result<()> {
        self.reply(MessagePayload::text(truncate_for_message(text)))
            .await?;
        Ok(())
    }
}

/// The interaction a response answers
#[derive(Clone, Copy)]
pub enum InteractionTarget<'a> {
    Command(&'a ApplicationCommandInteraction),
    Component(&'a MessageComponentInteraction),
    ModalSubmit(&'a ModalSubmitInteraction),
}

/// Answers an interaction with its direct response
pub struct InteractionSink<'a> {
    pub ctx: &'a Context,
    pub target: InteractionTarget<'a>,
}

impl<'a> InteractionSink<'a> {
    pub fn new(ctx: &'a Context, target: InteractionTarget<'a>) -> Self {
        Self { ctx, target }
    }

    async fn respond(&self, payload: MessagePayload, ephemeral: bool) -> Result<()> {
        let http = &self.ctx.http;
        let kind = InteractionResponseType::ChannelMessageWithSource;
        match self.target {
            InteractionTarget::Command(i) => {
                i.create_interaction_response(http, |r| {
                    r.kind(kind).interaction_response_data(|d| {
                        d.ephemeral(ephemeral);
                        payload.apply_interaction(d)
                    })
                })
                .await?
            }
            InteractionTarget::Component(i) => {
                i.create_interaction_response(http, |r| {
                    r.kind(kind).interaction_response_data(|d| {
                        d.ephemeral(ephemeral);
                        payload.apply_interaction(d)
                    })
                })
                .await?
            }
            InteractionTarget::ModalSubmit(i) => {
                i.create_interaction_response(http, |r| {
                    r.kind(kind).interaction_response_data(|d| {
                        d.ephemeral(ephemeral);
                        payload.apply_interaction(d)
                    })
                })
                .await?
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<'a> ResponseSink for InteractionSink<'a> {
    async fn send_modal(&self, namespace: &str, modal: &ModalSpec) -> Result<()> {
        let http = &self.ctx.http;
        let custom_id = namespaced_id(namespace, MODAL_KEY);
        let components = modal.components();
        match self.target {
            InteractionTarget::Command(i) => {
                i.create_interaction_response(http, |r| {
                    r.kind(InteractionResponseType::Modal)
                        .interaction_response_data(|d| {
                            d.custom_id(custom_id)
                                .title(&modal.title)
                                .set_components(components)
                        })
                })
                .await?
            }
            InteractionTarget::Component(i) => {
                i.create_interaction_response(http, |r| {
                    r.kind(InteractionResponseType::Modal)
                        .interaction_response_data(|d| {
                            d.custom_id(custom_id)
                                .title(&modal.title)
                                .set_components(components)
                        })
                })
                .await?
            }
            InteractionTarget::ModalSubmit(_) => {
                anyhow::bail!("a modal submission cannot be answered with another modal")
            }
        }
        Ok(())
    }

    async fn send_message(&self, payload: MessagePayload) -> Result<()> {
        self.respond(payload, false).await
    }

    async fn send_notice(&self, text: &str) -> Result<()> {
        self.respond(MessagePayload::text(truncate_for_message(text)), true)
            .await
    }
}
