//! # Message Handlers
//!
//! Collaborators for inbound user messages. The bot does not act on plain
//! messages; it either logs them or drops them, selected by configuration.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::domain::traits::MessageHandler;
use crate::domain::types::MessageEvent;

/// Logs every inbound message.
pub struct LogMessageHandler;

#[async_trait]
impl MessageHandler for LogMessageHandler {
    async fn handle_message(&self, message: &MessageEvent) -> Result<()> {
        info!(
            "received message from user {}: {}",
            message.author_name, message.content
        );
        Ok(())
    }
}

/// Drops every inbound message.
pub struct NullMessageHandler;

#[async_trait]
impl MessageHandler for NullMessageHandler {
    async fn handle_message(&self, _message: &MessageEvent) -> Result<()> {
        Ok(())
    }
}
