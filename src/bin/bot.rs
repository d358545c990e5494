use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;

use confbot::commands::{sync_commands, CommandContext, CommandRegistry, Dispatcher};
use confbot::core::{BotError, Config};
use confbot::database::Database;
use confbot::extensions::ExtensionManager;
use confbot::message_components::MessageComponentHandler;
use confbot::settings::SettingsHandle;

struct Handler {
    dispatcher: Arc<Dispatcher>,
    component_handler: Arc<MessageComponentHandler>,
    ctx: Arc<CommandContext>,
}

impl Handler {
    fn new(dispatcher: Dispatcher) -> Self {
        let ctx = dispatcher.context();
        Handler {
            component_handler: Arc::new(MessageComponentHandler::new(Arc::clone(&ctx))),
            dispatcher: Arc::new(dispatcher),
            ctx,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if let Err(e) = self.dispatcher.handle_message(&ctx, &msg).await {
            error!("Error handling message {}: {e:?}", msg.id);
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        let settings = self.ctx.settings.current();
        info!(
            "📦 Settings version {}{}",
            settings.general.version_string(),
            if settings.general.is_prerelease() {
                " (prerelease, test channels only)"
            } else {
                ""
            }
        );

        match self.ctx.guild_id {
            Some(guild_id) => info!("🔧 Development mode: registering commands for guild {guild_id}"),
            None => info!("🌍 Production mode: registering commands globally"),
        }
        if let Err(e) = sync_commands(&ctx, &self.ctx).await {
            error!("❌ Failed to register slash commands: {e:?}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                if let Err(e) = self.dispatcher.handle_slash(&ctx, &command).await {
                    error!("Error handling slash command '{}': {e:?}", command.data.name);
                }
            }
            Interaction::MessageComponent(component) => {
                if let Err(e) = self
                    .component_handler
                    .handle_component_interaction(&ctx, &component)
                    .await
                {
                    error!(
                        "Error handling component interaction '{}': {e:?}",
                        component.data.custom_id
                    );
                }
            }
            Interaction::ModalSubmit(modal) => {
                if let Err(e) = self.component_handler.handle_modal_submit(&ctx, &modal).await {
                    error!("Error handling modal submit '{}': {e:?}", modal.data.custom_id);
                }
            }
            Interaction::Ping(_) => debug!("Received interaction ping"),
            other => debug!("Ignoring interaction of kind {:?}", other.kind()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting confbot...");

    let settings = SettingsHandle::load(&config.setting_path)?;
    let current = settings.current();
    let database = Database::new(&current.database.path).await?;

    let registry = match CommandRegistry::build(&current) {
        Ok(registry) => registry,
        Err(e @ BotError::Build(_)) => {
            error!("❌ {e}");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    // Parse guild ID if provided for development mode
    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    let extensions = Arc::new(ExtensionManager::new());
    let ctx = CommandContext::new(
        settings,
        database,
        Arc::clone(&extensions),
        config.command_prefix.clone(),
        config.cleanup_delay,
    )
    .with_builtin_names(CommandRegistry::builtin_names())
    .with_guild(guild_id);

    let taken = ctx.names_taken_by_core();
    for folder in &current.cog.folder {
        if let Err(e) = extensions.load(None, folder, &taken) {
            warn!("⚠️ Could not load extensions from '{folder}': {e}");
        }
    }

    let token = config.require_token()?;
    let handler = Handler::new(Dispatcher::new(registry, Arc::new(ctx)));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut builder = Client::builder(token, intents).event_handler(handler);
    if current.general.id != 0 {
        builder = builder.application_id(current.general.id);
    }
    let mut client = builder.await.map_err(|e| {
        error!("Failed to create Discord client: {e}");
        error!("This could indicate:");
        error!("  - Invalid bot token format");
        error!("  - Network issues reaching Discord API");
        anyhow::anyhow!("Client creation failed: {}", e)
    })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        error!("This could be due to:");
        error!("  - Invalid bot token");
        error!("  - Network connectivity issues");
        error!("  - Discord API outage");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
