//! # Discord Session Adapter
//!
//! Binds the platform boundary traits to Discord via the `serenity` SDK.
//! This is the only module that touches serenity types; the core talks
//! exclusively to the traits in `domain::traits`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use async_trait::async_trait;
use serenity::Client;
use serenity::all::{
    Command as GlobalCommand, CommandInteraction, CommandOptionType, Context, CreateCommand,
    CreateCommandOption, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EventHandler,
    GatewayIntents, Http, Message, Ready, ResumedEvent, ShardManager, Timestamp,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::traits::{Interaction, PlatformSession, RegistrationApi, SessionStatus};
use crate::domain::types::{
    CommandDescriptor, Embed, GatewayEvent, LogEvent, MessageEvent, OptionKind, Reply,
    ReplyContent,
};

const EVENT_BUFFER: usize = 128;

/// The single Discord session. Gateway connection plus the REST handle used
/// for interaction responses and command registration.
pub struct DiscordSession {
    intents: GatewayIntents,
    token: Mutex<Option<String>>,
    http: Mutex<Option<Arc<Http>>>,
    shard_manager: Mutex<Option<Arc<ShardManager>>>,
    gateway_task: Mutex<Option<JoinHandle<()>>>,
}

impl DiscordSession {
    pub fn new() -> Self {
        Self {
            intents: GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT,
            token: Mutex::new(None),
            http: Mutex::new(None),
            shard_manager: Mutex::new(None),
            gateway_task: Mutex::new(None),
        }
    }

    /// REST handle; present once `login` has run.
    async fn http(&self) -> Option<Arc<Http>> {
        self.http.lock().await.clone()
    }
}

impl Default for DiscordSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformSession for DiscordSession {
    async fn login(&self, token: &str) -> Result<()> {
        let http = Arc::new(Http::new(token));
        let user = http
            .get_current_user()
            .await
            .context("token validation failed")?;
        info!("logged in as {}", user.name);
        *self.http.lock().await = Some(http);
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn connect(&self) -> Result<mpsc::Receiver<GatewayEvent>> {
        let token = self
            .token
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow!("session is not logged in"))?;

        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        let mut client = Client::builder(&token, self.intents)
            .event_handler(EventBridge { events })
            .await
            .context("failed to build gateway client")?;

        *self.shard_manager.lock().await = Some(client.shard_manager.clone());
        let task = tokio::spawn(async move {
            if let Err(err) = client.start().await {
                error!("gateway connection ended: {err}");
            }
        });
        *self.gateway_task.lock().await = Some(task);
        Ok(receiver)
    }

    async fn disconnect(&self) -> Result<()> {
        if let Some(manager) = self.shard_manager.lock().await.take() {
            manager.shutdown_all().await;
        }
        if let Some(task) = self.gateway_task.lock().await.take() {
            let _ = task.await;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStatus for DiscordSession {
    async fn latency(&self) -> Option<Duration> {
        let manager = self.shard_manager.lock().await.clone()?;
        let runners = manager.runners.lock().await;
        runners.values().next().and_then(|runner| runner.latency)
    }
}

/// Registers command descriptors through the session's REST handle. Lazy so
/// it can be constructed before login; the publisher only runs after ready.
pub struct DiscordRegistrationApi {
    session: Arc<DiscordSession>,
}

impl DiscordRegistrationApi {
    pub fn new(session: Arc<DiscordSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RegistrationApi for DiscordRegistrationApi {
    async fn create_global_command(&self, descriptor: &CommandDescriptor) -> Result<()> {
        let http = self
            .session
            .http()
            .await
            .ok_or_else(|| anyhow!("session is not logged in"))?;
        GlobalCommand::create_global_command(&http, build_command(descriptor))
            .await
            .with_context(|| format!("failed to register /{}", descriptor.name))?;
        Ok(())
    }
}

fn build_command(descriptor: &CommandDescriptor) -> CreateCommand {
    let mut command =
        CreateCommand::new(descriptor.name.clone()).description(descriptor.description.clone());
    for option in &descriptor.options {
        let kind = match option.kind {
            OptionKind::String => CommandOptionType::String,
            OptionKind::Integer => CommandOptionType::Integer,
            OptionKind::Boolean => CommandOptionType::Boolean,
            OptionKind::User => CommandOptionType::User,
        };
        command = command.add_option(
            CreateCommandOption::new(kind, option.name.clone(), option.description.clone())
                .required(option.required),
        );
    }
    command
}

/// Bridges serenity's callback-style events into the lifecycle service's
/// event stream.
struct EventBridge {
    events: mpsc::Sender<GatewayEvent>,
}

impl EventBridge {
    async fn forward(&self, event: GatewayEvent) {
        if self.events.send(event).await.is_err() {
            warn!("gateway event dropped: bridge receiver closed");
        }
    }
}

#[async_trait]
impl EventHandler for EventBridge {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.forward(GatewayEvent::Log(LogEvent::info(
            "gateway",
            format!("connected as {}", ready.user.name),
        )))
        .await;
        self.forward(GatewayEvent::Ready).await;
    }

    async fn resume(&self, _ctx: Context, _event: ResumedEvent) {
        self.forward(GatewayEvent::Log(LogEvent::info("gateway", "session resumed")))
            .await;
    }

    async fn message(&self, _ctx: Context, message: Message) {
        if message.author.bot {
            return;
        }
        self.forward(GatewayEvent::Message(MessageEvent {
            author_id: message.author.id.get(),
            author_name: message.author.name.clone(),
            channel_id: message.channel_id.get(),
            content: message.content.clone(),
        }))
        .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: serenity::all::Interaction) {
        if let serenity::all::Interaction::Command(command) = interaction {
            let wrapped = DiscordInteraction::new(ctx.http.clone(), command);
            self.forward(GatewayEvent::Interaction(Arc::new(wrapped))).await;
        }
    }
}

/// One inbound slash-command invocation, wrapped so the core never sees
/// serenity types. Tracks whether the top-level response has been used.
pub struct DiscordInteraction {
    http: Arc<Http>,
    command: CommandInteraction,
    responded: AtomicBool,
}

impl DiscordInteraction {
    fn new(http: Arc<Http>, command: CommandInteraction) -> Self {
        Self {
            http,
            command,
            responded: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Interaction for DiscordInteraction {
    fn command_name(&self) -> &str {
        &self.command.data.name
    }

    fn user_id(&self) -> u64 {
        self.command.user.id.get()
    }

    fn user_name(&self) -> &str {
        &self.command.user.name
    }

    fn guild_id(&self) -> Option<u64> {
        self.command.guild_id.map(|id| id.get())
    }

    fn has_responded(&self) -> bool {
        self.responded.load(Ordering::Acquire)
    }

    fn string_option(&self, name: &str) -> Option<String> {
        self.command
            .data
            .options
            .iter()
            .find(|option| option.name == name)
            .and_then(|option| option.value.as_str())
            .map(str::to_string)
    }

    async fn respond(&self, reply: Reply) -> Result<()> {
        let mut message = CreateInteractionResponseMessage::new().ephemeral(reply.ephemeral);
        message = match reply.content {
            ReplyContent::Text(text) => message.content(text),
            ReplyContent::Embed(embed) => message.embed(build_embed(embed)),
        };
        self.command
            .create_response(&self.http, CreateInteractionResponse::Message(message))
            .await
            .context("failed to send interaction response")?;
        self.responded.store(true, Ordering::Release);
        Ok(())
    }

    async fn followup(&self, reply: Reply) -> Result<()> {
        let mut message = CreateInteractionResponseFollowup::new().ephemeral(reply.ephemeral);
        message = match reply.content {
            ReplyContent::Text(text) => message.content(text),
            ReplyContent::Embed(embed) => message.embed(build_embed(embed)),
        };
        self.command
            .create_followup(&self.http, message)
            .await
            .context("failed to send interaction followup")?;
        Ok(())
    }
}

fn build_embed(embed: Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = embed.description {
        builder = builder.description(description);
    }
    for field in embed.fields {
        builder = builder.field(field.name, field.value, field.inline);
    }
    if let Some(footer) = embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(color) = embed.color {
        builder = builder.color(color);
    }
    if let Some(timestamp) = embed.timestamp {
        if let Ok(timestamp) = Timestamp::from_unix_timestamp(timestamp.timestamp()) {
            builder = builder.timestamp(timestamp);
        }
    }
    builder
}
