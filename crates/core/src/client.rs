//! The voice-agent client capability the bridge depends on.
//!
//! This abstraction allows the bridge to drive any SDK (a hosted service, the
//! in-memory loopback, a test double) through the same event registration and
//! action surface.

use crate::event::{ClientEvent, EventKind, OutgoingMessage};
use async_trait::async_trait;
use std::sync::Arc;

/// A failure reported by the external client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ClientError(pub String);

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Callback invoked for every event of the kind it was registered for.
pub type Listener = Arc<dyn Fn(ClientEvent) + Send + Sync>;

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// An event-driven voice-agent client.
#[async_trait]
pub trait VoiceClient: Send + Sync {
    /// Registers `listener` for events of `kind`.
    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Removes a listener previously returned by [`VoiceClient::on`].
    fn off(&self, kind: EventKind, id: ListenerId);

    /// Starts a call with the given assistant.
    ///
    /// Returning `Ok` only means the request was accepted; the call is live
    /// once the client emits `call-start`.
    ///
    /// # Arguments
    ///
    /// * `assistant_id` - The hosted assistant to talk to.
    async fn start(&self, assistant_id: &str) -> Result<(), ClientError>;

    /// Ends the active call. The client follows up with `call-end`.
    async fn stop(&self) -> Result<(), ClientError>;

    /// Mutes or unmutes the microphone for the active call.
    ///
    /// # Arguments
    ///
    /// * `muted` - `true` stops sending microphone audio, `false` resumes it.
    ///
    /// # Returns
    ///
    /// An error when the client has no call to apply the change to.
    async fn set_muted(&self, muted: bool) -> Result<(), ClientError>;

    /// Sends a structured message into the running conversation.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to deliver, e.g. [`OutgoingMessage::user`].
    ///
    /// # Returns
    ///
    /// An error when the message could not be delivered.
    async fn send(&self, message: OutgoingMessage) -> Result<(), ClientError>;
}

/// Constructs clients from a credential token.
pub trait ClientFactory: Send + Sync {
    /// Builds a new, unsubscribed client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The public credential token; never empty when called
    ///   by the bridge.
    ///
    /// # Returns
    ///
    /// The client, or the SDK's construction error.
    fn create(&self, api_key: &str) -> Result<Arc<dyn VoiceClient>, ClientError>;
}
