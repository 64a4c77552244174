//! An in-memory voice client for development and demos.
//!
//! The loopback behaves like a well-mannered hosted agent without touching
//! the network: starting a call emits `call-start`, unmuting emits
//! `speech-start`, and every user message is echoed back as a transcript.

use crate::{
    client::{ClientError, ClientFactory, Listener, ListenerId, VoiceClient},
    event::{AgentMessage, ClientEvent, EventKind, OutgoingMessage},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tracing::debug;

/// Volume reported while the loopback "speaks" an echoed message.
const ECHO_VOLUME: f32 = 0.6;

#[derive(Default)]
pub struct LoopbackClient {
    listeners: Mutex<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
    in_call: AtomicBool,
    muted: AtomicBool,
}

impl LoopbackClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every listener registered for its kind.
    pub fn emit(&self, event: ClientEvent) {
        let targets: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind())
            .map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();
        debug!(event = %event.kind(), listeners = targets.len(), "Loopback emitting");
        for listener in targets {
            listener(event.clone());
        }
    }

    /// Number of listeners currently registered across all kinds.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn in_call(&self) -> bool {
        self.in_call.load(Ordering::Acquire)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    fn require_call(&self) -> Result<(), ClientError> {
        if self.in_call() {
            Ok(())
        } else {
            Err(ClientError::new("no active call"))
        }
    }
}

#[async_trait]
impl VoiceClient for LoopbackClient {
    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((id, listener));
        id
    }

    fn off(&self, kind: EventKind, id: ListenerId) {
        if let Some(entries) = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&kind)
        {
            entries.retain(|(existing, _)| *existing != id);
        }
    }

    async fn start(&self, assistant_id: &str) -> Result<(), ClientError> {
        if self.in_call.swap(true, Ordering::AcqRel) {
            return Err(ClientError::new("call already in progress"));
        }
        debug!(assistant_id, "Loopback call started");
        self.emit(ClientEvent::CallStart);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ClientError> {
        if !self.in_call.swap(false, Ordering::AcqRel) {
            return Err(ClientError::new("no active call"));
        }
        self.muted.store(false, Ordering::Release);
        self.emit(ClientEvent::CallEnd);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<(), ClientError> {
        self.require_call()?;
        self.muted.store(muted, Ordering::Release);
        if muted {
            self.emit(ClientEvent::SpeechEnd);
        }
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), ClientError> {
        self.require_call()?;
        let OutgoingMessage::AddMessage { message } = message;
        self.emit(ClientEvent::VolumeLevel(ECHO_VOLUME));
        self.emit(ClientEvent::Message(AgentMessage::transcript(message.content)));
        self.emit(ClientEvent::VolumeLevel(0.0));
        Ok(())
    }
}

/// Hands out [`LoopbackClient`]s and remembers the most recent one.
#[derive(Default)]
pub struct LoopbackFactory {
    last: Mutex<Option<Arc<LoopbackClient>>>,
}

impl LoopbackFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_client(&self) -> Option<Arc<LoopbackClient>> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ClientFactory for LoopbackFactory {
    fn create(&self, api_key: &str) -> Result<Arc<dyn VoiceClient>, ClientError> {
        if api_key.trim().is_empty() {
            return Err(ClientError::new("invalid API key"));
        }
        let client = Arc::new(LoopbackClient::new());
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(client.clone());
        Ok(client as Arc<dyn VoiceClient>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = counter.clone();
        Arc::new(move |_: ClientEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let client = LoopbackClient::new();
        assert!(client.start("asst").await.is_ok());
        assert_eq!(
            client.start("asst").await,
            Err(ClientError::new("call already in progress"))
        );
    }

    #[tokio::test]
    async fn test_actions_require_active_call() {
        let client = LoopbackClient::new();
        assert!(client.stop().await.is_err());
        assert!(client.set_muted(true).await.is_err());
        assert!(client.send(OutgoingMessage::user("hi")).await.is_err());
    }

    #[tokio::test]
    async fn test_off_stops_delivery() {
        let client = LoopbackClient::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = client.on(EventKind::CallStart, counting_listener(&hits));
        client.on(EventKind::CallEnd, counting_listener(&hits));

        client.start("asst").await.unwrap();
        client.off(EventKind::CallStart, id);
        client.emit(ClientEvent::CallStart);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(client.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_send_echoes_transcript() {
        let client = LoopbackClient::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        client.on(
            EventKind::Message,
            Arc::new(move |event: ClientEvent| sink.lock().unwrap().push(event)),
        );

        client.start("asst").await.unwrap();
        client.send(OutgoingMessage::user("ping")).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![ClientEvent::Message(AgentMessage::transcript("ping"))]
        );
    }

    #[tokio::test]
    async fn test_mute_ends_detected_speech() {
        let client = LoopbackClient::new();
        let hits = Arc::new(AtomicUsize::new(0));
        client.on(EventKind::SpeechEnd, counting_listener(&hits));
        client.start("asst").await.unwrap();

        client.set_muted(false).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!client.is_muted());

        client.set_muted(true).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(client.is_muted());

        client.stop().await.unwrap();
        assert!(!client.is_muted());
    }

    #[test]
    fn test_factory_rejects_blank_key() {
        let factory = LoopbackFactory::new();
        assert!(factory.create("   ").is_err());
        assert!(factory.last_client().is_none());
        assert!(factory.create("pk").is_ok());
        assert!(factory.last_client().is_some());
    }
}
