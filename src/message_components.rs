//! # Message Components
//!
//! Routes button clicks, select choices and modal submissions back to the
//! command that sent them. Custom ids are `"<command>:<key>"`; the key
//! selects a response from the command's `interaction` map.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Responses come from the owning command's `interaction` map
//! - 1.0.0: Initial fixed button handlers

use anyhow::Result;
use log::{debug, info};
use serenity::model::application::component::ActionRowComponent;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::CommandContext;
use crate::settings::commands::SUBMIT_KEY;
use crate::settings::CommandConfig;
use crate::ui::modal::MODAL_KEY;
use crate::ui::render::{InteractionSink, InteractionTarget};
use crate::ui::{render_option, split_custom_id, RenderOutcome, ResponseSink};

pub const STALE_COMPONENT: &str = "This component is no longer active.";
pub const SUBMITTED: &str = "✅ Submitted.";
const ACKNOWLEDGED: &str = "✅";

/// What a component interaction resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    OpenModal,
    /// Render `interaction[key]`
    Respond(String),
    Unknown,
}

/// Pick the response for a click on `key`; `values` holds select choices
pub fn resolve_component(key: &str, values: &[String], config: &CommandConfig) -> ComponentAction {
    if key == MODAL_KEY {
        return if config.response.modal.is_some() {
            ComponentAction::OpenModal
        } else {
            ComponentAction::Unknown
        };
    }

    if let Some(value) = values.iter().find(|v| config.interaction.contains_key(*v)) {
        return ComponentAction::Respond(value.clone());
    }
    if config.interaction.contains_key(key) {
        return ComponentAction::Respond(key.to_string());
    }
    ComponentAction::Unknown
}

/// Answer a component interaction through `sink`
pub async fn route_component(
    ctx: &CommandContext,
    sink: &dyn ResponseSink,
    custom_id: &str,
    values: &[String],
) -> Result<RenderOutcome> {
    let Some((command, key)) = split_custom_id(custom_id) else {
        sink.send_notice(STALE_COMPONENT).await?;
        return Ok(RenderOutcome::Message);
    };
    let Some((_, config)) = ctx.find_command(command) else {
        debug!("Component {custom_id} belongs to an unknown command");
        sink.send_notice(STALE_COMPONENT).await?;
        return Ok(RenderOutcome::Message);
    };

    match resolve_component(key, values, &config) {
        ComponentAction::OpenModal => {
            if let Some(modal) = &config.response.modal {
                sink.send_modal(command, modal).await?;
            }
            Ok(RenderOutcome::Modal)
        }
        ComponentAction::Respond(option) => {
            let outcome = render_option(sink, command, &config.interaction, &option).await?;
            if outcome == RenderOutcome::Nothing {
                sink.send_notice(ACKNOWLEDGED).await?;
            }
            Ok(outcome)
        }
        ComponentAction::Unknown => {
            debug!("No response configured for {custom_id}");
            sink.send_notice(STALE_COMPONENT).await?;
            Ok(RenderOutcome::Message)
        }
    }
}

/// Answer a modal submission through `sink`
pub async fn route_modal_submit(
    ctx: &CommandContext,
    sink: &dyn ResponseSink,
    custom_id: &str,
) -> Result<RenderOutcome> {
    let config = split_custom_id(custom_id)
        .filter(|(_, key)| *key == MODAL_KEY)
        .and_then(|(command, _)| ctx.find_command(command).map(|(_, c)| (command, c)));

    let Some((command, config)) = config else {
        sink.send_notice(SUBMITTED).await?;
        return Ok(RenderOutcome::Message);
    };

    let outcome = render_option(sink, command, &config.interaction, SUBMIT_KEY).await?;
    if outcome == RenderOutcome::Nothing {
        sink.send_notice(SUBMITTED).await?;
    }
    Ok(outcome)
}

/// Handler for all message component interactions
pub struct MessageComponentHandler {
    ctx: Arc<CommandContext>,
}

impl MessageComponentHandler {
    pub fn new(ctx: Arc<CommandContext>) -> Self {
        Self { ctx }
    }

    /// Handle all types of component interactions
    pub async fn handle_component_interaction(
        &self,
        ctx: &Context,
        interaction: &MessageComponentInteraction,
    ) -> Result<()> {
        let custom_id = &interaction.data.custom_id;
        info!(
            "Processing component interaction: {custom_id} from user: {}",
            interaction.user.id
        );

        let sink = InteractionSink::new(ctx, InteractionTarget::Component(interaction));
        route_component(&self.ctx, &sink, custom_id, &interaction.data.values).await?;
        Ok(())
    }

    /// Handle modal submit interactions
    pub async fn handle_modal_submit(
        &self,
        ctx: &Context,
        interaction: &ModalSubmitInteraction,
    ) -> Result<()> {
        let custom_id = &interaction.data.custom_id;
        info!(
            "Processing modal submit: {custom_id} from user: {}",
            interaction.user.id
        );

        for row in &interaction.data.components {
            for component in &row.components {
                if let ActionRowComponent::InputText(input) = component {
                    debug!("  {} = {:?}", input.custom_id, input.value);
                }
            }
        }

        let sink = InteractionSink::new(ctx, InteractionTarget::ModalSubmit(interaction));
        route_modal_submit(&self.ctx, &sink, custom_id).await?;
        Ok(())
    }
}
