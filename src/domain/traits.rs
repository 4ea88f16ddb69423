//! # Domain Traits
//!
//! Abstract interfaces at the platform boundary and the capability contract
//! every command implementation must satisfy. The infrastructure layer binds
//! these to a concrete platform SDK; tests bind them to fakes.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::types::{CommandDescriptor, GatewayEvent, MessageEvent, Reply};

/// Capability contract for a slash command implementation. One per
/// user-invocable command; instances are constructed fresh per invocation and
/// must not carry state across invocations except through injected
/// collaborators.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    /// The command's name, description, and options.
    fn descriptor(&self) -> CommandDescriptor;

    /// Executes the command against one interaction.
    async fn handle(&self, interaction: &dyn Interaction) -> Result<()>;
}

/// One inbound command invocation. Owned by the transport for its duration;
/// the dispatcher borrows it for the lifetime of a single dispatch.
///
/// The platform accepts at most one top-level response per interaction; any
/// further replies must go through `followup`.
#[async_trait]
pub trait Interaction: Send + Sync {
    fn command_name(&self) -> &str;

    fn user_id(&self) -> u64;

    fn user_name(&self) -> &str;

    fn guild_id(&self) -> Option<u64>;

    /// Whether a top-level response has already been sent.
    fn has_responded(&self) -> bool;

    /// Value of a string option supplied by the user, if present.
    fn string_option(&self, name: &str) -> Option<String>;

    /// Sends the top-level response.
    async fn respond(&self, reply: Reply) -> Result<()>;

    /// Sends a followup reply after the top-level response.
    async fn followup(&self, reply: Reply) -> Result<()>;
}

/// The single long-lived session to the remote platform. Only the connection
/// lifecycle service may call `login`/`connect`/`disconnect`.
#[async_trait]
pub trait PlatformSession: Send + Sync {
    /// Authenticates against the platform.
    async fn login(&self, token: &str) -> Result<()>;

    /// Opens the gateway connection and returns the bridged event stream.
    async fn connect(&self) -> Result<mpsc::Receiver<GatewayEvent>>;

    /// Closes the gateway connection.
    async fn disconnect(&self) -> Result<()>;
}

/// The platform's command-registration API.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn create_global_command(&self, descriptor: &CommandDescriptor) -> Result<()>;
}

/// Read-only health probe on the session, safe to share with command
/// handlers.
#[async_trait]
pub trait SessionStatus: Send + Sync {
    /// Current gateway round-trip latency, if a heartbeat has completed.
    async fn latency(&self) -> Option<Duration>;
}

/// Collaborator receiving inbound user messages.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, message: &MessageEvent) -> Result<()>;
}

/// Idempotent key-set of (user, consent type) pairs.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn has_consented(&self, user_id: u64, consent_type: &str) -> Result<bool>;

    async fn add_consent(&self, user_id: u64, consent_type: &str) -> Result<()>;

    async fn remove_consent(&self, user_id: u64, consent_type: &str) -> Result<()>;
}
