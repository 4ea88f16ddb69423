//! # Command Dispatcher
//!
//! Routes one inbound interaction to its handler. Every invocation runs in
//! an isolated, correlated scope and ends in exactly one user-visible
//! response, success or error; faults never propagate to the caller and a
//! failed command is never retried.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

use crate::application::registry::HandlerRegistry;
use crate::domain::traits::Interaction;
use crate::domain::types::{DispatchOutcome, Reply};
use crate::strings::messages;

pub struct CommandDispatcher {
    registry: Arc<HandlerRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatches one interaction. Unknown commands get a single ephemeral
    /// fallback; a faulting handler gets a single ephemeral error notice,
    /// top-level if the interaction has not responded yet, followup
    /// otherwise.
    pub async fn dispatch(&self, interaction: Arc<dyn Interaction>) -> DispatchOutcome {
        let command_name = interaction.command_name().to_string();
        info!(
            "received slash command: {} from user {}",
            command_name,
            interaction.user_id()
        );

        let Some(entry) = self.registry.resolve(&command_name).cloned() else {
            warn!("no handler registered for command {}", command_name);
            if let Err(err) = interaction
                .respond(Reply::ephemeral_text(messages::NOT_IMPLEMENTED))
                .await
            {
                warn!("failed to send fallback response for {}: {err:#}", command_name);
            }
            return DispatchOutcome::HandlerNotFound;
        };

        let correlation_id = Uuid::new_v4();
        let span =
            tracing::info_span!("command", command = %entry.name, correlation = %correlation_id);

        async move {
            // Fresh handler instance per invocation.
            let handler = match (entry.factory)(self.registry.context()) {
                Ok(handler) => handler,
                Err(err) => {
                    error!("error constructing handler for {}: {err:#}", entry.name);
                    self.send_error_notice(interaction.as_ref(), &entry.name).await;
                    return DispatchOutcome::Failed;
                }
            };

            match handler.handle(interaction.as_ref()).await {
                Ok(()) => {
                    debug!(
                        "successfully executed {} command for user {}",
                        entry.name,
                        interaction.user_id()
                    );
                    DispatchOutcome::Succeeded
                }
                Err(err) => {
                    error!(
                        "error executing {} command for user {}: {err:#}",
                        entry.name,
                        interaction.user_id()
                    );
                    self.send_error_notice(interaction.as_ref(), &entry.name).await;
                    DispatchOutcome::Failed
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Attempts exactly one user-visible error notice. The interaction may
    /// already have responded, in which case the notice goes out as a
    /// followup. A fault while sending is swallowed; the user is unreachable
    /// and there is nothing further to do.
    async fn send_error_notice(&self, interaction: &dyn Interaction, command: &str) {
        let notice = Reply::ephemeral_text(messages::command_error(command));
        let delivery = if interaction.has_responded() {
            interaction.followup(notice).await
        } else {
            interaction.respond(notice).await
        };
        if let Err(err) = delivery {
            warn!("failed to send error response for {} command: {err:#}", command);
        }
    }
}
