//! The session snapshot and the transitions applied to it.

use crate::event::ClientEvent;
use serde::Serialize;

/// Shown when an `error` event carries no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Complete, immutable view of a voice session at a point in time.
///
/// Every event produces a new snapshot derived from the previous one; fields
/// not touched by the event are carried over unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub connected: bool,
    pub recording: bool,
    pub speaking: bool,
    /// Last reported input level in `[0, 1]`.
    pub volume: f32,
    pub error: Option<String>,
    /// Latest transcript line. Replaced, never appended.
    pub transcript: String,
}

impl SessionState {
    /// Returns the snapshot that follows `event`.
    pub fn apply(&self, event: &ClientEvent) -> SessionState {
        match event {
            ClientEvent::CallStart => SessionState {
                connected: true,
                error: None,
                ..self.clone()
            },
            ClientEvent::CallEnd => SessionState {
                connected: false,
                recording: false,
                speaking: false,
                volume: 0.0,
                ..self.clone()
            },
            ClientEvent::SpeechStart => SessionState {
                recording: true,
                ..self.clone()
            },
            ClientEvent::SpeechEnd => SessionState {
                recording: false,
                ..self.clone()
            },
            ClientEvent::VolumeLevel(level) => SessionState {
                volume: clamp_volume(*level),
                ..self.clone()
            },
            ClientEvent::Message(message) => match message.transcript_text() {
                Some(text) => SessionState {
                    transcript: text.to_string(),
                    ..self.clone()
                },
                None => self.clone(),
            },
            ClientEvent::Error(payload) => SessionState {
                error: Some(
                    payload
                        .message
                        .clone()
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
                ),
                connected: false,
                recording: false,
                speaking: false,
                ..self.clone()
            },
        }
    }

    /// Returns a copy with `error` set, used for action outcomes.
    pub fn with_error(&self, message: impl Into<String>) -> SessionState {
        SessionState {
            error: Some(message.into()),
            ..self.clone()
        }
    }
}

fn clamp_volume(level: f32) -> f32 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
