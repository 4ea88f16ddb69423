//! # Consent Command
//!
//! Lets a user grant, revoke, or inspect their stored consent.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::domain::traits::{ConsentStore, Interaction, SlashCommand};
use crate::domain::types::{CommandDescriptor, CommandOption, OptionKind, Reply};
use crate::strings::messages;

pub struct ConsentCommand {
    store: Arc<dyn ConsentStore>,
}

impl ConsentCommand {
    pub const NAME: &'static str = "consent";
    pub const DESCRIPTION: &'static str = "Manage your data-use consent";

    pub fn new(store: Arc<dyn ConsentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SlashCommand for ConsentCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor::new(Self::NAME, Self::DESCRIPTION)
            .with_option(CommandOption::new(
                "action",
                "grant, revoke, or status",
                OptionKind::String,
                true,
            ))
            .with_option(CommandOption::new(
                "type",
                "The consent type, e.g. analytics",
                OptionKind::String,
                true,
            ))
    }

    async fn handle(&self, interaction: &dyn Interaction) -> Result<()> {
        let action = interaction
            .string_option("action")
            .ok_or_else(|| anyhow!("missing required option `action`"))?;
        let consent_type = interaction
            .string_option("type")
            .ok_or_else(|| anyhow!("missing required option `type`"))?;
        let user_id = interaction.user_id();

        let reply = match action.as_str() {
            "grant" => {
                self.store.add_consent(user_id, &consent_type).await?;
                messages::consent_granted(&consent_type)
            }
            "revoke" => {
                self.store.remove_consent(user_id, &consent_type).await?;
                messages::consent_revoked(&consent_type)
            }
            "status" => {
                let consented = self.store.has_consented(user_id, &consent_type).await?;
                messages::consent_status(&consent_type, consented)
            }
            other => messages::consent_unknown_action(other),
        };

        interaction.respond(Reply::ephemeral_text(reply)).await?;
        Ok(())
    }
}
