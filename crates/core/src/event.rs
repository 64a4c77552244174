//! Events emitted by the voice-agent client, and the messages sent back to it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The event kinds a client can be subscribed to, keyed by their SDK names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CallStart,
    CallEnd,
    SpeechStart,
    SpeechEnd,
    VolumeLevel,
    Message,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::CallStart,
        EventKind::CallEnd,
        EventKind::SpeechStart,
        EventKind::SpeechEnd,
        EventKind::VolumeLevel,
        EventKind::Message,
        EventKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CallStart => "call-start",
            EventKind::CallEnd => "call-end",
            EventKind::SpeechStart => "speech-start",
            EventKind::SpeechEnd => "speech-end",
            EventKind::VolumeLevel => "volume-level",
            EventKind::Message => "message",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an `error` event. The SDK does not guarantee a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientErrorPayload {
    pub message: Option<String>,
}

impl ClientErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// A tagged message delivered through the `message` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AgentMessage {
    #[serde(rename_all = "camelCase")]
    Transcript {
        #[serde(default)]
        transcript: Option<String>,
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        transcript_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    FunctionCall {
        #[serde(default)]
        function_call: serde_json::Value,
    },
    /// Any message type the bridge does not act on.
    #[serde(other)]
    Other,
}

impl AgentMessage {
    /// Parses a raw SDK message payload.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn transcript(text: impl Into<String>) -> Self {
        AgentMessage::Transcript {
            transcript: Some(text.into()),
            role: None,
            transcript_type: None,
        }
    }

    /// The transcript text, if this is a transcript message carrying a non-empty one.
    pub fn transcript_text(&self) -> Option<&str> {
        match self {
            AgentMessage::Transcript {
                transcript: Some(text),
                ..
            } if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// An event as delivered by the client, together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    CallStart,
    CallEnd,
    SpeechStart,
    SpeechEnd,
    VolumeLevel(f32),
    Message(AgentMessage),
    Error(ClientErrorPayload),
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::CallStart => EventKind::CallStart,
            ClientEvent::CallEnd => EventKind::CallEnd,
            ClientEvent::SpeechStart => EventKind::SpeechStart,
            ClientEvent::SpeechEnd => EventKind::SpeechEnd,
            ClientEvent::VolumeLevel(_) => EventKind::VolumeLevel,
            ClientEvent::Message(_) => EventKind::Message,
            ClientEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Role of a message injected into the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Structured messages sent to the client through `send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutgoingMessage {
    AddMessage { message: ConversationMessage },
}

impl OutgoingMessage {
    /// A user-role `add-message` carrying `content`.
    pub fn user(content: impl Into<String>) -> Self {
        OutgoingMessage::AddMessage {
            message: ConversationMessage {
                role: MessageRole::User,
                content: content.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kind_names_are_distinct() {
        let mut names: Vec<&str> = EventKind::ALL.iter().map(EventKind::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EventKind::ALL.len());
        assert_eq!(ClientEvent::VolumeLevel(0.1).kind().to_string(), "volume-level");
    }

    #[test]
    fn test_transcript_message_from_sdk_payload() {
        let msg = AgentMessage::from_json(
            r#"{"type":"transcript","role":"user","transcriptType":"final","transcript":"hello"}"#,
        )
        .unwrap();
        assert_eq!(msg.transcript_text(), Some("hello"));
        match msg {
            AgentMessage::Transcript {
                role,
                transcript_type,
                ..
            } => {
                assert_eq!(role.as_deref(), Some("user"));
                assert_eq!(transcript_type.as_deref(), Some("final"));
            }
            other => panic!("Expected transcript, got {:?}", other),
        }
    }

    #[test]
    fn test_transcript_without_text_has_no_transcript() {
        let msg = AgentMessage::from_json(r#"{"type":"transcript"}"#).unwrap();
        assert_eq!(msg.transcript_text(), None);

        let empty = AgentMessage::transcript("");
        assert_eq!(empty.transcript_text(), None);
    }

    #[test]
    fn test_function_call_and_unknown_types() {
        let call = AgentMessage::from_json(
            r#"{"type":"function-call","functionCall":{"name":"lookup","parameters":{}}}"#,
        )
        .unwrap();
        match call {
            AgentMessage::FunctionCall { function_call } => {
                assert_eq!(function_call["name"], "lookup");
            }
            other => panic!("Expected function-call, got {:?}", other),
        }

        let other = AgentMessage::from_json(r#"{"type":"status-update","status":"ended"}"#).unwrap();
        assert_eq!(other, AgentMessage::Other);
    }

    #[test]
    fn test_message_without_type_is_rejected() {
        assert!(AgentMessage::from_json(r#"{"transcript":"hi"}"#).is_err());
    }

    #[test]
    fn test_outgoing_user_message_shape() {
        let value = serde_json::to_value(OutgoingMessage::user("what's the weather?")).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "add-message",
                "message": { "role": "user", "content": "what's the weather?" }
            })
        );
    }
}
