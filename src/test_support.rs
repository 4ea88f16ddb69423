//! Shared fakes for the boundary traits, used across the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::registry::HandlerContext;
use crate::domain::traits::{
    ConsentStore, Interaction, PlatformSession, RegistrationApi, SessionStatus, SlashCommand,
};
use crate::domain::types::{CommandDescriptor, GatewayEvent, Reply};

/// A minimal command whose descriptor is configurable; handling responds
/// with a fixed ephemeral text.
pub struct TestCommand {
    name: &'static str,
    description: &'static str,
}

impl TestCommand {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }
}

#[async_trait]
impl SlashCommand for TestCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor::new(self.name, self.description)
    }

    async fn handle(&self, interaction: &dyn Interaction) -> Result<()> {
        interaction.respond(Reply::ephemeral_text("ok")).await
    }
}

pub struct FakeStatus {
    latency: Option<Duration>,
}

impl FakeStatus {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
        }
    }

    pub fn unknown() -> Self {
        Self { latency: None }
    }
}

#[async_trait]
impl SessionStatus for FakeStatus {
    async fn latency(&self) -> Option<Duration> {
        self.latency
    }
}

pub struct MemoryConsentStore {
    records: Mutex<HashSet<(u64, String)>>,
}

impl MemoryConsentStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl ConsentStore for MemoryConsentStore {
    async fn has_consented(&self, user_id: u64, consent_type: &str) -> Result<bool> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .contains(&(user_id, consent_type.to_string())))
    }

    async fn add_consent(&self, user_id: u64, consent_type: &str) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert((user_id, consent_type.to_string()));
        Ok(())
    }

    async fn remove_consent(&self, user_id: u64, consent_type: &str) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .remove(&(user_id, consent_type.to_string()));
        Ok(())
    }
}

/// Records replies instead of sending them, and enforces the platform's
/// response contract: one top-level response, followups only after it.
pub struct FakeInteraction {
    name: String,
    user_id: u64,
    user_name: String,
    guild_id: Option<u64>,
    options: HashMap<String, String>,
    broken_channel: bool,
    responded: AtomicBool,
    responses: Mutex<Vec<Reply>>,
    followups: Mutex<Vec<Reply>>,
}

impl FakeInteraction {
    pub fn new(name: &str, user_id: u64) -> Self {
        Self {
            name: name.to_string(),
            user_id,
            user_name: "tester".to_string(),
            guild_id: None,
            options: HashMap::new(),
            broken_channel: false,
            responded: AtomicBool::new(false),
            responses: Mutex::new(Vec::new()),
            followups: Mutex::new(Vec::new()),
        }
    }

    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }

    /// Every send fails, as if the remote channel is gone.
    pub fn with_broken_channel(mut self) -> Self {
        self.broken_channel = true;
        self
    }

    pub fn responses(&self) -> Vec<Reply> {
        self.responses.lock().unwrap().clone()
    }

    pub fn followups(&self) -> Vec<Reply> {
        self.followups.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interaction for FakeInteraction {
    fn command_name(&self) -> &str {
        &self.name
    }

    fn user_id(&self) -> u64 {
        self.user_id
    }

    fn user_name(&self) -> &str {
        &self.user_name
    }

    fn guild_id(&self) -> Option<u64> {
        self.guild_id
    }

    fn has_responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }

    fn string_option(&self, name: &str) -> Option<String> {
        self.options.get(name).cloned()
    }

    async fn respond(&self, reply: Reply) -> Result<()> {
        if self.broken_channel {
            bail!("response channel gone");
        }
        if self.has_responded() {
            bail!("interaction already acknowledged");
        }
        self.responses.lock().unwrap().push(reply);
        self.responded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn followup(&self, reply: Reply) -> Result<()> {
        if self.broken_channel {
            bail!("response channel gone");
        }
        if !self.has_responded() {
            bail!("cannot follow up before the top-level response");
        }
        self.followups.lock().unwrap().push(reply);
        Ok(())
    }
}

pub struct FakeRegistrationApi {
    registered: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl FakeRegistrationApi {
    pub fn new() -> Self {
        Self {
            registered: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Rejects the descriptor with the given name.
    pub fn failing_on(name: &str) -> Self {
        Self {
            registered: Mutex::new(Vec::new()),
            fail_on: Some(name.to_string()),
        }
    }

    pub fn registered(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistrationApi for FakeRegistrationApi {
    async fn create_global_command(&self, descriptor: &CommandDescriptor) -> Result<()> {
        if self.fail_on.as_deref() == Some(descriptor.name.as_str()) {
            bail!("remote API rejected `{}`", descriptor.name);
        }
        self.registered.lock().unwrap().push(descriptor.name.clone());
        Ok(())
    }
}

/// An in-process session: `connect` hands back a channel the test feeds
/// through `emit`.
pub struct FakeSession {
    pub logins: AtomicUsize,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    sender: tokio::sync::Mutex<Option<mpsc::Sender<GatewayEvent>>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            logins: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            sender: tokio::sync::Mutex::new(None),
        }
    }

    pub async fn emit(&self, event: GatewayEvent) {
        let sender = self
            .sender
            .lock()
            .await
            .clone()
            .expect("session is not connected");
        sender.send(event).await.expect("bridge receiver closed");
    }

    /// Drops the sender so the bridged stream ends.
    pub async fn close(&self) {
        self.sender.lock().await.take();
    }
}

#[async_trait]
impl PlatformSession for FakeSession {
    async fn login(&self, _token: &str) -> Result<()> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn connect(&self) -> Result<mpsc::Receiver<GatewayEvent>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::channel(16);
        *self.sender.lock().await = Some(sender);
        Ok(receiver)
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.sender.lock().await.take();
        Ok(())
    }
}

/// A handler context wired to fakes: 42ms latency and an in-memory consent
/// store.
pub fn context() -> HandlerContext {
    HandlerContext {
        status: Arc::new(FakeStatus::with_latency(Duration::from_millis(42))),
        consent: Arc::new(MemoryConsentStore::new()),
    }
}
