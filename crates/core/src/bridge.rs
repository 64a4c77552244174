//! Session Bridge
//!
//! Owns the voice-agent client, folds its events into a [`SessionState`]
//! snapshot, and proxies user actions to it. The client and its event
//! subscriptions live and die together as a single [`ClientHandle`].

use crate::{
    client::{ClientFactory, ListenerId, Listener, VoiceClient},
    config::SessionConfig,
    event::{AgentMessage, ClientEvent, EventKind, OutgoingMessage},
    state::SessionState,
};
use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub const MISSING_API_KEY: &str = "Vapi API key is required";
pub const CLIENT_UNAVAILABLE: &str = "Vapi client or assistant ID not available";

/// A client together with the listeners registered on it.
///
/// Dropping the handle deregisters every listener and disarms them, so a
/// client that keeps firing afterwards cannot reach the bridge's state.
/// The flag is only read and cleared under the snapshot's write lock.
struct ClientHandle {
    client: Arc<dyn VoiceClient>,
    listeners: Vec<(EventKind, ListenerId)>,
    live: Arc<AtomicBool>,
    state_tx: Arc<watch::Sender<SessionState>>,
}

impl ClientHandle {
    fn acquire(client: Arc<dyn VoiceClient>, state_tx: &Arc<watch::Sender<SessionState>>) -> Self {
        let live = Arc::new(AtomicBool::new(true));
        let listeners = EventKind::ALL
            .into_iter()
            .map(|kind| {
                let id = client.on(kind, state_listener(Arc::downgrade(state_tx), live.clone()));
                (kind, id)
            })
            .collect();
        debug!("Subscribed to all client events");
        Self {
            client,
            listeners,
            live,
            state_tx: state_tx.clone(),
        }
    }

    fn client(&self) -> Arc<dyn VoiceClient> {
        self.client.clone()
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        // Waits for any listener mid-update; later ones see the cleared flag.
        self.state_tx.send_if_modified(|_| {
            self.live.store(false, Ordering::Release);
            false
        });
        for (kind, id) in self.listeners.drain(..) {
            self.client.off(kind, id);
        }
        debug!("Released client event subscriptions");
    }
}

/// Builds the callback that folds one client event into the snapshot.
fn state_listener(state_tx: Weak<watch::Sender<SessionState>>, live: Arc<AtomicBool>) -> Listener {
    Arc::new(move |event: ClientEvent| {
        if !live.load(Ordering::Acquire) {
            debug!(event = %event.kind(), "Ignoring event from released client");
            return;
        }
        let Some(state_tx) = state_tx.upgrade() else {
            return;
        };

        if let ClientEvent::Message(AgentMessage::FunctionCall { function_call }) = &event {
            info!(%function_call, "Function call");
        }
        debug!(event = %event.kind(), "Client event");

        state_tx.send_if_modified(|state| {
            if !live.load(Ordering::Acquire) {
                return false;
            }
            let next = state.apply(&event);
            if next == *state {
                false
            } else {
                *state = next;
                true
            }
        });
    })
}

/// Bridges an event-driven voice client to a renderable session snapshot.
pub struct SessionBridge {
    config: SessionConfig,
    factory: Arc<dyn ClientFactory>,
    handle: Option<ClientHandle>,
    state_tx: Arc<watch::Sender<SessionState>>,
}

impl SessionBridge {
    /// Creates the bridge and immediately tries to construct a client.
    ///
    /// Initialization failures never escape: they are recorded in the
    /// snapshot's `error` and leave the bridge uninitialized.
    pub fn new(config: SessionConfig, factory: Arc<dyn ClientFactory>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::default());
        let mut bridge = Self {
            config,
            factory,
            handle: None,
            state_tx: Arc::new(state_tx),
        };
        bridge.initialize();
        bridge
    }

    fn initialize(&mut self) {
        // Release the previous client before a new one can register listeners.
        self.handle = None;

        if !self.config.has_api_key() {
            warn!("No API key configured; voice client not created");
            self.set_error(MISSING_API_KEY);
            return;
        }

        match self.factory.create(self.config.api_key()) {
            Ok(client) => {
                self.handle = Some(ClientHandle::acquire(client, &self.state_tx));
                info!(server_url = ?self.config.server_url, "Voice client initialized");
            }
            Err(e) => {
                error!(error = %e, "Voice client construction failed");
                self.set_error(format!("Failed to initialize Vapi: {}", e));
            }
        }
    }

    /// Applies a new configuration.
    ///
    /// A client is built once per distinct API key: the current client is kept
    /// when only the assistant id or server URL change.
    pub fn reconfigure(&mut self, config: SessionConfig) {
        let key_changed = config.api_key() != self.config.api_key();
        self.config = config;
        if key_changed {
            info!("API key changed; re-initializing voice client");
            self.initialize();
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True while a client handle exists.
    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    /// The current snapshot.
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// A receiver that observes every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state_tx
            .send_modify(|state| *state = state.with_error(message));
    }

    /// Starts a call with the configured assistant.
    ///
    /// `connected` is not touched here; it follows the client's call events.
    pub async fn connect(&self) {
        let client = match &self.handle {
            Some(handle) if self.config.has_assistant_id() => handle.client(),
            _ => {
                warn!("Connect requested without a client or assistant id");
                self.set_error(CLIENT_UNAVAILABLE);
                return;
            }
        };

        info!(assistant_id = %self.config.assistant_id, "Starting call");
        if let Err(e) = client.start(&self.config.assistant_id).await {
            error!(error = %e, "Failed to start call");
            self.set_error(format!("Failed to connect: {}", e));
        }
    }

    /// Ends the active call. Failures are logged only.
    pub async fn disconnect(&self) {
        let Some(client) = self.handle.as_ref().map(ClientHandle::client) else {
            return;
        };

        info!("Stopping call");
        if let Err(e) = client.stop().await {
            error!(error = %e, "Error disconnecting");
        }
    }

    /// Mutes when speech is currently detected, unmutes otherwise.
    pub async fn toggle_mute(&self) {
        let Some(client) = self.handle.as_ref().map(ClientHandle::client) else {
            return;
        };

        let muted = !self.state_tx.borrow().recording;
        debug!(muted, "Toggling mute");
        if let Err(e) = client.set_muted(muted).await {
            error!(error = %e, "Error toggling mute");
        }
    }

    /// Injects a user message into the conversation. Failures are logged only.
    pub async fn send_message(&self, text: impl Into<String>) {
        let Some(client) = self.handle.as_ref().map(ClientHandle::client) else {
            return;
        };

        if let Err(e) = client.send(OutgoingMessage::user(text)).await {
            error!(error = %e, "Error sending message");
        }
    }

    /// Releases the client and its subscriptions.
    ///
    /// Receivers obtained from [`SessionBridge::subscribe`] keep the last
    /// snapshot; nothing the old client emits afterwards reaches them.
    pub fn teardown(mut self) {
        self.handle = None;
        info!("Session bridge torn down");
    }
}
