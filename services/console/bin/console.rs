//! Main Entrypoint for the Voice Bridge Console
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and command line.
//! 2. Initializing logging on stderr, leaving stdout to the view.
//! 3. Building the session bridge over the loopback client.
//! 4. Running the input/render loop until `quit` or Ctrl+C.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use voice_bridge_core::{
    EnvConfig, SessionBridge, SessionConfig, SessionState, config::validate_server_url,
    loopback::LoopbackFactory,
};
use voice_bridge_console::{
    command::{Outcome, dispatch, parse_line},
    view::{UiState, ViewModel},
};

#[derive(Parser, Debug)]
#[command(version, about = "Terminal front-end for a voice-agent session")]
struct Args {
    /// Overrides VAPI_API_KEY.
    #[arg(long)]
    api_key: Option<String>,
    /// Overrides VAPI_ASSISTANT_ID.
    #[arg(long)]
    assistant_id: Option<String>,
    /// Overrides VAPI_SERVER_URL.
    #[arg(long)]
    server_url: Option<String>,
    /// Print each snapshot as a JSON line instead of the text view.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn session_config(&self, from_env: SessionConfig) -> anyhow::Result<SessionConfig> {
        let api_key = self
            .api_key
            .clone()
            .unwrap_or_else(|| from_env.api_key().to_string());
        let assistant_id = self
            .assistant_id
            .clone()
            .unwrap_or_else(|| from_env.assistant_id.clone());
        let mut config = SessionConfig::new(api_key, assistant_id);
        config.server_url = match &self.server_url {
            Some(url) => Some(validate_server_url(url).context("Invalid --server-url")?),
            None => from_env.server_url,
        };
        Ok(config)
    }
}

fn draw(bridge: &SessionBridge, state: &SessionState, ui: &UiState, json: bool) {
    if json {
        match serde_json::to_string(state) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "Failed to serialize snapshot"),
        }
        return;
    }
    let view = ViewModel::from_snapshot(state, bridge.is_initialized(), ui);
    println!();
    for line in view.render() {
        println!("{}", line);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let args = Args::parse();
    let env = EnvConfig::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(env.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let session = args.session_config(env.session)?;
    info!(config = ?session, "Configuration loaded");

    // --- 3. Build the Bridge ---
    let bridge = SessionBridge::new(session, Arc::new(LoopbackFactory::new()));
    let mut snapshots = bridge.subscribe();
    let mut ui = UiState::default();
    draw(&bridge, &snapshots.borrow_and_update(), &ui, args.json);

    // --- 4. Input / Render Loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("Input closed.");
                    break;
                };
                let command = match parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match dispatch(&bridge, &mut ui, command).await {
                    Outcome::Done => {}
                    Outcome::Redraw => draw(&bridge, &bridge.state(), &ui, args.json),
                    Outcome::Disabled(reason) => println!("({})", reason),
                    Outcome::Print(text) => println!("{}", text),
                    Outcome::Quit => break,
                }
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = snapshots.borrow_and_update().clone();
                draw(&bridge, &state, &ui, args.json);
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal. Shutting down gracefully...");
                break;
            }
        }
    }

    if bridge.state().connected {
        bridge.disconnect().await;
    }
    bridge.teardown();
    info!("Console has shut down.");
    Ok(())
}
