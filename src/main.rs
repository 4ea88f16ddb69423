//! # Main Entry Point
//!
//! Initializes the bot application:
//! - Domain: Configuration and Types
//! - Infrastructure: Discord session, Consent store
//! - Application: Registry, Dispatcher, Publisher, Lifecycle
//! - Interface: Command and message handlers

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;
#[cfg(test)]
mod test_support;

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::application::lifecycle::ConnectionLifecycleService;
use crate::application::registry::{HandlerContext, HandlerRegistry};
use crate::domain::config::AppConfig;
use crate::domain::traits::MessageHandler;
use crate::infrastructure::consent::FileConsentStore;
use crate::infrastructure::discord::{DiscordRegistrationApi, DiscordSession};
use crate::interface::commands;
use crate::interface::messages::{LogMessageHandler, NullMessageHandler};

#[derive(Parser, Debug)]
#[command(name = "herald", about = "Chat-platform bot")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "data/config.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load Configuration
    let config_content = fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read {}", cli.config))?;
    let config: AppConfig = serde_yaml::from_str(&config_content)
        .with_context(|| format!("Failed to parse {}", cli.config))?;

    // 2. Logging Setup
    if !std::path::Path::new("data").exists() {
        fs::create_dir("data").context("Failed to create data directory")?;
    }

    let file_appender = tracing_appender::rolling::never("data", "herald.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,serenity=warn,hyper=warn"));

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();

    info!("Starting herald...");

    // 3. Infrastructure
    let session = Arc::new(DiscordSession::new());
    let registration = Arc::new(DiscordRegistrationApi::new(session.clone()));
    let consent = Arc::new(
        FileConsentStore::load(&config.consent.path).context("Failed to load consent store")?,
    );

    // 4. Application Components
    let context = HandlerContext {
        status: session.clone(),
        consent,
    };
    let mut registry = HandlerRegistry::new(context);
    registry.discover_all(&[&commands::builtin()]);
    info!("{} commands available", registry.len());

    let message_handler: Arc<dyn MessageHandler> = match config.messages.handler.as_str() {
        "null" => Arc::new(NullMessageHandler),
        _ => Arc::new(LogMessageHandler),
    };

    let service = Arc::new(ConnectionLifecycleService::new(
        session,
        registration,
        Arc::new(registry),
        message_handler,
        config.bot.token.clone(),
    ));

    // 5. Run until shutdown
    service.start().await?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
        _ = service.wait() => {}
    }
    service.stop().await?;

    Ok(())
}
