//! Voice Bridge Core
//!
//! Keeps a renderable snapshot of a voice-agent session in sync with an
//! event-driven client, and exposes the actions a front-end needs:
//!
//! - `config`: session credentials and environment loading.
//! - `event`: the client's event kinds, payloads and outgoing messages.
//! - `state`: the session snapshot and its transition function.
//! - `client`: the capability traits a voice SDK must provide.
//! - `bridge`: the `SessionBridge` tying a client to the snapshot.
//! - `loopback`: an in-memory client for local development.

pub mod bridge;
pub mod client;
pub mod config;
pub mod event;
pub mod loopback;
pub mod state;

pub use bridge::SessionBridge;
pub use client::{ClientError, ClientFactory, VoiceClient};
pub use config::{ConfigError, EnvConfig, SessionConfig};
pub use event::{AgentMessage, ClientErrorPayload, ClientEvent, EventKind, OutgoingMessage};
pub use state::SessionState;
