//! Voice Bridge Console
//!
//! A terminal front-end over `voice-bridge-core`. It renders session
//! snapshots and turns typed commands into bridge actions; the binary in
//! `bin/console.rs` is a thin loop around this library.

pub mod command;
pub mod view;
