//! tama - an asynchronous IRC bot.
//!
//! Connections are driven by [`client::Client`], which turns inbound frames
//! into [`event::Event`]s on a per-connection [`event::EventBus`]. The
//! [`bot::Bot`] subscribes to those events and dispatches commands and
//! patterns to plugin [`bot::Action`]s.

pub mod bot;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod plugins;
pub mod telemetry;

pub use bot::{Bot, BotHandle, ExitStatus};
pub use config::Config;
