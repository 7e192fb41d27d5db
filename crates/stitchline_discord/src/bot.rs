use serenity::{
    all::{
        ApplicationId, ChannelId, Command, CommandInteraction, ComponentInteraction,
        CreateCommand, CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, CreateMessage,
    },
    async_trait,
    client::{Context, EventHandler},
    model::{application::Interaction, channel::Message, gateway::Ready},
    prelude::*,
};
use std::sync::Arc;
use std::time::Duration;
use stitchline_core::config::DiscordConfig;
use stitchline_core::{Event, Incoming, Reply, Workshop};
use tracing::{debug, error, info, warn};

use crate::error::{DiscordError, Result};
use crate::incoming::{accepts_channel, chat_id, from_component, from_slash};
use crate::render::{Outgoing, render};

/// Discord event handler feeding the workflow engine
pub struct StitchlineBot {
    workshop: Arc<Workshop>,
    prefix: String,
    allowed_channels: Vec<u64>,
}

impl StitchlineBot {
    pub fn new(workshop: Arc<Workshop>, config: &DiscordConfig) -> Self {
        Self {
            workshop,
            prefix: config.prefix.clone(),
            allowed_channels: config.allowed_channels.clone(),
        }
    }

    fn accepts(&self, is_dm: bool, channel: ChannelId) -> bool {
        accepts_channel(is_dm, channel.get(), &self.allowed_channels)
    }

    async fn send(&self, ctx: &Context, channel: ChannelId, replies: &[Reply]) {
        for outgoing in replies.iter().flat_map(render) {
            let message = CreateMessage::new()
                .content(outgoing.content.clone())
                .components(outgoing.components());
            if let Err(cause) = channel.send_message(&ctx.http, message).await {
                let e = DiscordError::MessageSendFailed {
                    destination: channel.to_string(),
                    message_length: outgoing.content.len(),
                    cause,
                };
                error!("Error sending message: {:?}", e);
            }
        }
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        info!(
            "Received slash command: {} from user {}",
            command.data.name, command.user.name
        );
        let event = Event {
            chat: chat_id(command.user.id),
            incoming: from_slash(&command.data.name),
        };
        let replies = self.workshop.handle(event).await;
        let mut outgoing = replies.iter().flat_map(render);

        // The first message answers the interaction, the rest are follow-ups.
        let first = outgoing.next().unwrap_or_else(|| Outgoing {
            content: "Done.".to_string(),
            rows: Vec::new(),
        });
        let response = CreateInteractionResponseMessage::new()
            .content(first.content.clone())
            .components(first.components());
        if let Err(why) = command
            .create_response(&ctx.http, CreateInteractionResponse::Message(response))
            .await
        {
            error!("Cannot respond to slash command: {:?}", why);
            return;
        }
        for next in outgoing {
            let followup = CreateInteractionResponseFollowup::new()
                .content(next.content.clone())
                .components(next.components());
            if let Err(why) = command.create_followup(&ctx.http, followup).await {
                error!("Cannot send followup: {:?}", why);
            }
        }
    }

    async fn handle_component(&self, ctx: &Context, component: &ComponentInteraction) {
        debug!(
            "Button {} pressed by {}",
            component.data.custom_id, component.user.name
        );
        if let Err(why) = component
            .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
            .await
        {
            error!("Cannot acknowledge button: {:?}", why);
        }
        let event = Event {
            chat: chat_id(component.user.id),
            incoming: from_component(&component.data.custom_id),
        };
        let replies = self.workshop.handle(event).await;
        self.send(ctx, component.channel_id, &replies).await;
    }
}

#[async_trait]
impl EventHandler for StitchlineBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        for command in stitchline_core::Command::ALL {
            let create = CreateCommand::new(command.name()).description(command.description());
            if let Err(cause) = Command::create_global_command(&ctx.http, create).await {
                let e = DiscordError::CommandRegistrationFailed {
                    command_name: command.name().to_string(),
                    cause,
                };
                error!("Cannot create slash command: {:?}", e);
            }
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore bots, including ourselves
        if msg.author.bot {
            return;
        }
        if !self.accepts(msg.guild_id.is_none(), msg.channel_id) {
            return;
        }

        let incoming = Incoming::from_message(&msg.content, &self.prefix);
        if matches!(&incoming, Incoming::Text(text) if text.is_empty()) {
            return;
        }
        let event = Event {
            chat: chat_id(msg.author.id),
            incoming,
        };
        let replies = self.workshop.handle(event).await;
        self.send(&ctx, msg.channel_id, &replies).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if self.accepts(command.guild_id.is_none(), command.channel_id) {
                    self.handle_command(&ctx, &command).await;
                }
            }
            Interaction::Component(component) => {
                if self.accepts(component.guild_id.is_none(), component.channel_id) {
                    self.handle_component(&ctx, &component).await;
                }
            }
            other => warn!("Unhandled interaction kind: {:?}", other.kind()),
        }
    }
}

/// Periodically drop idle conversations when a TTL is configured.
pub fn spawn_session_eviction(workshop: Arc<Workshop>) -> Option<tokio::task::JoinHandle<()>> {
    let ttl = workshop.sessions().ttl()?;
    let period = (ttl / 2).max(Duration::from_secs(30));
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = workshop.sessions().evict_idle();
            if evicted > 0 {
                info!("Evicted {} idle conversations", evicted);
            }
        }
    }))
}

/// Create the Discord client (without starting it)
pub async fn create_client(config: &DiscordConfig, workshop: Arc<Workshop>) -> Result<Client> {
    let token = config
        .token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or(DiscordError::MissingToken)?;
    let handler = StitchlineBot::new(workshop, config);

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client_builder = Client::builder(token, intents).event_handler(handler);

    if let Some(app_id) = config.application_id {
        client_builder = client_builder.application_id(ApplicationId::new(app_id));
    }

    client_builder
        .await
        .map_err(|cause| DiscordError::AuthenticationFailed {
            cause,
            token_preview: DiscordError::token_preview(token),
        })
}

/// Create and run the Discord bot until the gateway connection ends
pub async fn run_bot(config: &DiscordConfig, workshop: Arc<Workshop>) -> Result<()> {
    let eviction = spawn_session_eviction(workshop.clone());
    let mut client = create_client(config, workshop).await?;

    info!("Starting Discord bot...");
    let outcome = client.start().await.map_err(DiscordError::ClientStopped);
    if let Some(task) = eviction {
        task.abort();
    }
    outcome
}
