//! # Connection Lifecycle Service
//!
//! Owns the single long-lived platform session: connect and disconnect,
//! bridging the gateway event stream into the dispatcher and the message
//! handler, and publishing the command surface once per connection when the
//! platform acknowledges the session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::application::dispatcher::CommandDispatcher;
use crate::application::publisher::RegistrationPublisher;
use crate::application::registry::HandlerRegistry;
use crate::domain::traits::{MessageHandler, PlatformSession, RegistrationApi};
use crate::domain::types::{ConnectionState, GatewayEvent, LogEvent, LogLevel};

/// How long `stop` waits for in-flight event tasks before aborting them.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ConnectionLifecycleService {
    session: Arc<dyn PlatformSession>,
    registration: Arc<dyn RegistrationApi>,
    registry: Arc<HandlerRegistry>,
    dispatcher: Arc<CommandDispatcher>,
    publisher: Arc<RegistrationPublisher>,
    messages: Arc<dyn MessageHandler>,
    token: String,
    state_tx: watch::Sender<ConnectionState>,
    shutdown: CancellationToken,
    run_handle: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl ConnectionLifecycleService {
    pub fn new(
        session: Arc<dyn PlatformSession>,
        registration: Arc<dyn RegistrationApi>,
        registry: Arc<HandlerRegistry>,
        messages: Arc<dyn MessageHandler>,
        token: String,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            dispatcher: Arc::new(CommandDispatcher::new(registry.clone())),
            publisher: Arc::new(RegistrationPublisher::new()),
            session,
            registration,
            registry,
            messages,
            token,
            state_tx,
            shutdown: CancellationToken::new(),
            run_handle: Mutex::new(None),
        }
    }

    /// Read-only view of the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Completes when the service begins shutting down, whether from an
    /// external `stop` or because the event bridge ended on its own.
    pub async fn wait(&self) {
        self.shutdown.cancelled().await;
    }

    /// Authenticates, opens the session, and spawns the event bridge.
    /// Calling start while already connecting or connected is a warned
    /// no-op; a second session is never opened.
    pub async fn start(&self) -> Result<()> {
        let mut handle = self.run_handle.lock().await;
        if handle.is_some() {
            warn!("bot is already started, ignoring start request");
            return Ok(());
        }

        self.state_tx.send_replace(ConnectionState::Connecting);
        info!("starting bot session");

        if let Err(err) = self.session.login(&self.token).await {
            self.state_tx.send_replace(ConnectionState::Disconnected);
            return Err(err);
        }

        let events = match self.session.connect().await {
            Ok(events) => events,
            Err(err) => {
                self.state_tx.send_replace(ConnectionState::Disconnected);
                return Err(err);
            }
        };

        info!("session opened, bridging gateway events");
        *handle = Some(tokio::spawn(Self::run(
            events,
            self.dispatcher.clone(),
            self.publisher.clone(),
            self.registry.clone(),
            self.registration.clone(),
            self.messages.clone(),
            self.state_tx.clone(),
            self.shutdown.clone(),
        )));
        Ok(())
    }

    /// Gracefully closes the session: cancels the event bridge, drains
    /// in-flight event tasks with a bounded wait, and disconnects. Called
    /// while not connected it logs a warning and takes no action. A fatal
    /// error from the bridge (a failed command publish) is returned here.
    pub async fn stop(&self) -> Result<()> {
        let handle = self.run_handle.lock().await.take();
        let Some(handle) = handle else {
            warn!("bot is not connected, no action taken");
            return Ok(());
        };

        info!("stopping bot session");
        self.shutdown.cancel();
        let run_result = match handle.await {
            Ok(result) => result,
            Err(err) => {
                warn!("event bridge task failed: {err}");
                Ok(())
            }
        };

        if let Err(err) = self.session.disconnect().await {
            warn!("session disconnect failed: {err:#}");
        }
        self.state_tx.send_replace(ConnectionState::Disconnected);
        info!("bot stopped successfully");
        run_result
    }

    /// The event bridge. Each message and interaction event is handled in
    /// its own spawned task so a fault in one cannot block or corrupt the
    /// next; log events are forwarded inline. The publisher runs exactly
    /// once per connection, on the first ready acknowledgement, and a
    /// rejected publish shuts the whole service down.
    #[allow(clippy::too_many_arguments)]
    async fn run(
        mut events: mpsc::Receiver<GatewayEvent>,
        dispatcher: Arc<CommandDispatcher>,
        publisher: Arc<RegistrationPublisher>,
        registry: Arc<HandlerRegistry>,
        registration: Arc<dyn RegistrationApi>,
        messages: Arc<dyn MessageHandler>,
        state_tx: watch::Sender<ConnectionState>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let mut inflight: JoinSet<()> = JoinSet::new();
        let mut published = false;

        let result = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                event = events.recv() => match event {
                    Some(GatewayEvent::Log(log)) => Self::forward_log(&log),
                    Some(GatewayEvent::Message(message)) => {
                        let handler = messages.clone();
                        inflight.spawn(async move {
                            if let Err(err) = handler.handle_message(&message).await {
                                error!("message handler failed: {err:#}");
                            }
                        });
                    }
                    Some(GatewayEvent::Interaction(interaction)) => {
                        let dispatcher = dispatcher.clone();
                        inflight.spawn(async move {
                            dispatcher.dispatch(interaction).await;
                        });
                    }
                    Some(GatewayEvent::Ready) => {
                        state_tx.send_replace(ConnectionState::Connected);
                        info!("gateway ready");
                        if !published {
                            published = true;
                            match publisher.publish(&registry, registration.as_ref()).await {
                                Ok(count) => info!("published {count} command descriptors"),
                                Err(err) => {
                                    error!("command registration failed, shutting down: {err}");
                                    break Err(err.into());
                                }
                            }
                        }
                    }
                    None => {
                        warn!("gateway event stream closed");
                        break Ok(());
                    }
                },
                // Reap completed event tasks as we go so the set stays small.
                Some(completed) = inflight.join_next(), if !inflight.is_empty() => {
                    if let Err(err) = completed {
                        warn!("event task panicked: {err}");
                    }
                }
            }
        };

        Self::drain(inflight).await;
        // Signal the host even when the bridge ended on its own, so the
        // process does not keep running without a session.
        shutdown.cancel();
        result
    }

    /// Bounded-wait drain of in-flight event tasks; stragglers are aborted
    /// after `DRAIN_TIMEOUT`.
    async fn drain(mut inflight: JoinSet<()>) {
        if inflight.is_empty() {
            return;
        }
        debug!("waiting for {} in-flight event tasks", inflight.len());
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while inflight.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                "in-flight event tasks did not finish within {DRAIN_TIMEOUT:?}, aborting"
            );
            inflight.abort_all();
        }
    }

    /// Maps platform diagnostic events onto the structured logger.
    fn forward_log(event: &LogEvent) {
        match event.level {
            LogLevel::Critical | LogLevel::Error => {
                error!("[{}] {}", event.source, event.message);
            }
            LogLevel::Warning => warn!("[{}] {}", event.source, event.message),
            LogLevel::Info => info!("[{}] {}", event.source, event.message),
            LogLevel::Debug => debug!("[{}] {}", event.source, event.message),
            LogLevel::Trace => trace!("[{}] {}", event.source, event.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::application::registry::{HandlerContext, Registration};
    use crate::domain::traits::SlashCommand;
    use crate::domain::types::{CommandDescriptor, Reply};
    use crate::interface::messages::NullMessageHandler;
    use crate::test_support::{
        FakeInteraction, FakeRegistrationApi, FakeSession, TestCommand, context,
    };

    fn test_registry() -> Arc<HandlerRegistry> {
        let mut registry = HandlerRegistry::new(context());
        let source = vec![Registration::new(
            "TestCommand",
            Arc::new(|_context: &HandlerContext| {
                Ok(Box::new(TestCommand::new("ping", "test")) as Box<dyn SlashCommand>)
            }),
        )];
        registry.discover_all(&[&source]);
        Arc::new(registry)
    }

    fn service_with(
        session: Arc<FakeSession>,
        api: Arc<FakeRegistrationApi>,
        registry: Arc<HandlerRegistry>,
    ) -> ConnectionLifecycleService {
        ConnectionLifecycleService::new(
            session,
            api,
            registry,
            Arc::new(NullMessageHandler),
            "test-token".to_string(),
        )
    }

    #[tokio::test]
    async fn ready_connects_and_publishes_once() {
        let session = Arc::new(FakeSession::new());
        let api = Arc::new(FakeRegistrationApi::new());
        let service = service_with(session.clone(), api.clone(), test_registry());

        assert_eq!(*service.state().borrow(), ConnectionState::Disconnected);
        service.start().await.unwrap();
        session.emit(GatewayEvent::Ready).await;
        // A resumed session acknowledges again; the publish must not repeat.
        session.emit(GatewayEvent::Ready).await;

        let mut state = service.state();
        state
            .wait_for(|state| *state == ConnectionState::Connected)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(api.registered(), vec!["ping"]);
        service.stop().await.unwrap();
        assert_eq!(*service.state().borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn double_start_opens_one_session() {
        let session = Arc::new(FakeSession::new());
        let api = Arc::new(FakeRegistrationApi::new());
        let service = service_with(session.clone(), api, test_registry());

        service.start().await.unwrap();
        service.start().await.unwrap();

        assert_eq!(session.logins.load(Ordering::SeqCst), 1);
        assert_eq!(session.connects.load(Ordering::SeqCst), 1);
        service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_while_disconnected_is_a_warned_noop() {
        let session = Arc::new(FakeSession::new());
        let api = Arc::new(FakeRegistrationApi::new());
        let service = service_with(session.clone(), api, test_registry());

        service.stop().await.unwrap();

        assert_eq!(session.disconnects.load(Ordering::SeqCst), 0);
        assert_eq!(*service.state().borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn interaction_events_reach_the_dispatcher() {
        let session = Arc::new(FakeSession::new());
        let api = Arc::new(FakeRegistrationApi::new());
        let service = service_with(session.clone(), api, test_registry());

        service.start().await.unwrap();
        let interaction = Arc::new(FakeInteraction::new("ping", 42));
        session
            .emit(GatewayEvent::Interaction(interaction.clone()))
            .await;

        for _ in 0..50 {
            if !interaction.responses().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(interaction.responses().len(), 1);
        service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_drains_inflight_dispatches() {
        struct SlowCommand;

        #[async_trait::async_trait]
        impl SlashCommand for SlowCommand {
            fn descriptor(&self) -> CommandDescriptor {
                CommandDescriptor::new("slow", "sleeps before responding")
            }

            async fn handle(
                &self,
                interaction: &dyn crate::domain::traits::Interaction,
            ) -> anyhow::Result<()> {
                tokio::time::sleep(Duration::from_millis(100)).await;
                interaction.respond(Reply::ephemeral_text("done")).await
            }
        }

        let mut registry = HandlerRegistry::new(context());
        let source = vec![Registration::new(
            "SlowCommand",
            Arc::new(|_context: &HandlerContext| Ok(Box::new(SlowCommand) as Box<dyn SlashCommand>)),
        )];
        registry.discover_all(&[&source]);

        let session = Arc::new(FakeSession::new());
        let api = Arc::new(FakeRegistrationApi::new());
        let service = service_with(session.clone(), api, Arc::new(registry));

        service.start().await.unwrap();
        let interaction = Arc::new(FakeInteraction::new("slow", 42));
        session
            .emit(GatewayEvent::Interaction(interaction.clone()))
            .await;
        // Give the bridge a moment to spawn the dispatch, then stop.
        tokio::time::sleep(Duration::from_millis(10)).await;
        service.stop().await.unwrap();

        assert_eq!(interaction.responses().len(), 1);
    }

    #[tokio::test]
    async fn publish_failure_shuts_the_service_down() {
        let session = Arc::new(FakeSession::new());
        let api = Arc::new(FakeRegistrationApi::failing_on("ping"));
        let service = service_with(session.clone(), api, test_registry());

        service.start().await.unwrap();
        session.emit(GatewayEvent::Ready).await;

        // The bridge cancels itself on a fatal publish.
        tokio::time::timeout(Duration::from_secs(1), service.wait())
            .await
            .unwrap();
        let err = service.stop().await.unwrap_err();
        assert!(err.to_string().contains("ping"));
        assert_eq!(*service.state().borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn closed_event_stream_ends_the_bridge() {
        let session = Arc::new(FakeSession::new());
        let api = Arc::new(FakeRegistrationApi::new());
        let service = service_with(session.clone(), api, test_registry());

        service.start().await.unwrap();
        session.close().await;

        tokio::time::timeout(Duration::from_secs(1), service.wait())
            .await
            .unwrap();
        service.stop().await.unwrap();
    }
}
