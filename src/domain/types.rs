#![allow(dead_code)]
//! # Core Types
//!
//! The data model shared by the registry, dispatcher, publisher, and
//! lifecycle service: command descriptors, replies, gateway events, and the
//! connection state machine.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::traits::Interaction;

/// Immutable metadata describing one command to the remote platform.
///
/// The name is lowercased on construction; the platform only accepts
/// lowercase command identifiers and the registry keys on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

impl CommandDescriptor {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            description: description.to_string(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }
}

/// One parameter a command accepts, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
}

impl CommandOption {
    pub fn new(name: &str, description: &str, kind: OptionKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            required,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
}

/// An outbound reply to an interaction.
#[derive(Debug, Clone)]
pub struct Reply {
    pub content: ReplyContent,
    pub ephemeral: bool,
}

impl Reply {
    /// A reply visible only to the invoking user.
    pub fn ephemeral_text(content: impl Into<String>) -> Self {
        Self {
            content: ReplyContent::Text(content.into()),
            ephemeral: true,
        }
    }

    pub fn ephemeral_embed(embed: Embed) -> Self {
        Self {
            content: ReplyContent::Embed(embed),
            ephemeral: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ReplyContent {
    Text(String),
    Embed(Embed),
}

/// A rich message payload. Only the pieces the bot actually renders.
#[derive(Debug, Clone, Default)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub color: Option<u32>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn timestamp_now(mut self) -> Self {
        self.timestamp = Some(Utc::now());
        self
    }
}

#[derive(Debug, Clone)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Connection state of the single platform session. Owned by the lifecycle
/// service; everyone else gets a read-only watch receiver.
///
/// Transitions only Disconnected -> Connecting -> Connected -> Disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Events bridged from the platform transport into the lifecycle service.
pub enum GatewayEvent {
    /// Diagnostic output from the transport, forwarded to the logger.
    Log(LogEvent),
    /// An inbound user message.
    Message(MessageEvent),
    /// A user invoking a registered command.
    Interaction(Arc<dyn Interaction>),
    /// The remote platform acknowledged the session.
    Ready,
}

/// Severity of a platform diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub source: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, source: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.to_string(),
            message: message.into(),
        }
    }

    pub fn info(source: &str, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, source, message)
    }
}

/// An inbound user message, stripped down to what the handlers need.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub author_id: u64,
    pub author_name: String,
    pub channel_id: u64,
    pub content: String,
}

/// Terminal state of one dispatch invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Succeeded,
    HandlerNotFound,
    Failed,
}
