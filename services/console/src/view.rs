//! Derives what the console shows from a session snapshot.

use voice_bridge_core::SessionState;

const METER_WIDTH: usize = 10;

/// Presentation-only state the bridge knows nothing about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub show_transcript: bool,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub headline: &'static str,
    pub connection_label: &'static str,
    pub ready_marker: Option<&'static str>,
    pub error_banner: Option<String>,
    pub mic_hint: &'static str,
    pub mic_enabled: bool,
    pub recording_marker: bool,
    pub connect_label: &'static str,
    pub connect_enabled: bool,
    /// Volume in `[0, 1]`, present only while connected and audible.
    pub volume_meter: Option<f32>,
    pub speaking_indicator: bool,
    pub can_toggle_transcript: bool,
    pub transcript_panel: Option<String>,
}

impl ViewModel {
    pub fn from_snapshot(state: &SessionState, is_initialized: bool, ui: &UiState) -> Self {
        let has_transcript = !state.transcript.is_empty();
        Self {
            headline: if state.connected {
                "Connected and ready"
            } else {
                "Click connect to start"
            },
            connection_label: if state.connected {
                "Connected"
            } else {
                "Disconnected"
            },
            ready_marker: is_initialized.then_some("(Vapi Ready)"),
            error_banner: state.error.clone(),
            mic_hint: if state.recording {
                "Listening... Tap to mute"
            } else {
                "Tap to start talking"
            },
            mic_enabled: state.connected,
            recording_marker: state.recording,
            connect_label: if state.connected {
                "Disconnect"
            } else {
                "Connect"
            },
            connect_enabled: is_initialized,
            volume_meter: (state.connected && state.volume > 0.0).then_some(state.volume),
            speaking_indicator: state.speaking,
            can_toggle_transcript: has_transcript,
            transcript_panel: (ui.show_transcript && has_transcript)
                .then(|| state.transcript.clone()),
        }
    }

    /// Renders the frame as plain text lines.
    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![format!("Voice Assistant: {}", self.headline)];

        if let Some(error) = &self.error_banner {
            lines.push(format!("! {}", error));
        }

        let mut status = format!("[{}]", self.connection_label);
        if let Some(marker) = self.ready_marker {
            status.push(' ');
            status.push_str(marker);
        }
        lines.push(status);

        lines.push(format!("mic: {}", self.mic_hint));
        if self.recording_marker {
            lines.push("((( recording )))".to_string());
        }
        if let Some(volume) = self.volume_meter {
            lines.push(format!("vol: {}", meter(volume)));
        }
        if self.speaking_indicator {
            lines.push("Assistant is speaking...".to_string());
        }

        let mut controls = Vec::new();
        if self.connect_enabled {
            controls.push(format!("connect ({})", self.connect_label));
        }
        if self.mic_enabled {
            controls.push("mic".to_string());
        }
        if self.can_toggle_transcript {
            let verb = if self.transcript_panel.is_some() {
                "Hide"
            } else {
                "Show"
            };
            controls.push(format!("transcript ({} Transcript)", verb));
        }
        if !controls.is_empty() {
            lines.push(format!("> {}", controls.join(" | ")));
        }

        if let Some(transcript) = &self.transcript_panel {
            lines.push(format!("Transcript: {}", transcript));
        }
        lines
    }
}

fn meter(volume: f32) -> String {
    let filled = ((volume.clamp(0.0, 1.0) * METER_WIDTH as f32).round() as usize).min(METER_WIDTH);
    format!("{}{}", "#".repeat(filled), ".".repeat(METER_WIDTH - filled))
}
