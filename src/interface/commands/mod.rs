//! # Command Implementations
//!
//! One module per user-invocable command, plus the registration source the
//! registry discovers them from. Adding a command means adding a module and
//! one entry in `builtin`.

pub mod consent;
pub mod ping;

use std::sync::Arc;

use crate::application::registry::{CommandMetadata, HandlerContext, Registration};
use crate::domain::traits::SlashCommand;

/// All built-in commands as one registration source.
pub fn builtin() -> Vec<Registration> {
    vec![
        Registration::with_metadata(
            "PingCommand",
            CommandMetadata {
                name: ping::PingCommand::NAME,
                description: ping::PingCommand::DESCRIPTION,
            },
            Arc::new(|context: &HandlerContext| {
                Ok(Box::new(ping::PingCommand::new(context.status.clone()))
                    as Box<dyn SlashCommand>)
            }),
        ),
        Registration::with_metadata(
            "ConsentCommand",
            CommandMetadata {
                name: consent::ConsentCommand::NAME,
                description: consent::ConsentCommand::DESCRIPTION,
            },
            Arc::new(|context: &HandlerContext| {
                Ok(
                    Box::new(consent::ConsentCommand::new(context.consent.clone()))
                        as Box<dyn SlashCommand>,
                )
            }),
        ),
    ]
}
