//! # Ping Command
//!
//! Responds with gateway latency so users can check the bot is alive.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::domain::traits::{Interaction, SessionStatus, SlashCommand};
use crate::domain::types::{CommandDescriptor, Embed, Reply};
use crate::strings::messages;

const GREEN: u32 = 0x57F287;
const BLUE: u32 = 0x3498DB;
const ORANGE: u32 = 0xE67E22;
const RED: u32 = 0xED4245;

pub struct PingCommand {
    status: Arc<dyn SessionStatus>,
}

impl PingCommand {
    pub const NAME: &'static str = "ping";
    pub const DESCRIPTION: &'static str = "Check if the bot is online and view latency";

    pub fn new(status: Arc<dyn SessionStatus>) -> Self {
        Self { status }
    }

    fn latency_color(latency_ms: u64) -> u32 {
        match latency_ms {
            0..=99 => GREEN,
            100..=199 => BLUE,
            200..=399 => ORANGE,
            _ => RED,
        }
    }
}

#[async_trait]
impl SlashCommand for PingCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor::new(Self::NAME, Self::DESCRIPTION)
    }

    async fn handle(&self, interaction: &dyn Interaction) -> Result<()> {
        let latency_ms = self
            .status
            .latency()
            .await
            .map(|latency| latency.as_millis() as u64);
        let (label, color) = match latency_ms {
            Some(ms) => (format!("{ms}ms"), Self::latency_color(ms)),
            None => (messages::LATENCY_UNKNOWN.to_string(), RED),
        };

        let embed = Embed::new()
            .title(messages::PONG_TITLE)
            .description(messages::PONG_DESCRIPTION)
            .field("Latency", label, true)
            .color(color)
            .footer(messages::requested_by(interaction.user_name()))
            .timestamp_now();

        interaction.respond(Reply::ephemeral_embed(embed)).await?;

        debug!("ping command completed with latency {latency_ms:?}ms");
        Ok(())
    }
}
