//! The bot: plugin actions dispatched over supervised connections.
//!
//! [`Bot::run`] keeps one task per configured server in a [`JoinSet`].
//! Connections that die are reconnected after a fixed delay with their
//! original configuration; connections that quit deliberately are dropped.
//! The loop returns once every task has finished.

mod actions;
mod dispatch;
mod handle;
mod proxy;
mod trie;

pub use actions::{
    Action, ActionContext, ActionResult, ActionTable, Handler, Resolution, Trigger,
};
pub use dispatch::did_you_mean;
pub use handle::{BotHandle, ExitStatus, Permissions};
pub use proxy::ClientProxy;
pub use trie::{CommandTrie, EmptyQuery};

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::client::{Client, ClientExit, ClientOptions, ExitReason};
use crate::config::{Config, ServerConfig};
use crate::error::ActionTableError;
use crate::plugins::Plugin;

/// Delay before reconnecting a dead connection.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// What a supervised task reports when it finishes.
enum Supervised {
    Exited(ClientExit),
    ConnectFailed {
        config: Arc<ServerConfig>,
        error: String,
    },
    ReconnectDue(Arc<ServerConfig>),
    Panicked {
        config: Arc<ServerConfig>,
        message: String,
    },
}

/// A configured bot, ready to run.
pub struct Bot {
    handle: BotHandle,
    servers: Vec<Arc<ServerConfig>>,
    options: ClientOptions,
    reconnect_delay: Duration,
}

impl Bot {
    /// Collect plugin actions into the action table and prepare one
    /// connection per configured server.
    pub fn new(config: &Config, plugins: &[Box<dyn Plugin>]) -> Result<Self, ActionTableError> {
        let mut all = Vec::new();
        for plugin in plugins {
            let actions = plugin.actions();
            debug!(plugin = plugin.name(), actions = actions.len(), "loaded plugin");
            all.extend(actions);
        }

        let table = ActionTable::build(all)?;
        let permissions = Permissions::compile(&config.tama.permissions)?;
        info!(
            commands = table.command_names().count(),
            plugins = plugins.len(),
            "action table built"
        );

        Ok(Self {
            handle: BotHandle::new(config.tama.prefix.clone(), table, permissions),
            servers: config.servers(),
            options: ClientOptions::default(),
            reconnect_delay: RECONNECT_DELAY,
        })
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Handle for signalling the bot from outside, e.g. on Ctrl-C.
    pub fn handle(&self) -> &BotHandle {
        &self.handle
    }

    /// Run every connection until the bot is asked to exit and all
    /// connection and reconnection tasks have finished.
    ///
    /// Returns [`ExitStatus::Quit`] when every connection went away without
    /// an explicit request.
    pub async fn run(self) -> ExitStatus {
        let mut tasks = JoinSet::new();
        for config in &self.servers {
            let run = connect_and_run(
                self.handle.clone(),
                Arc::clone(config),
                self.options.clone(),
            );
            tasks.spawn(supervised(Arc::clone(config), run));
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "connection task failed");
                    continue;
                }
            };

            let (config, why) = match outcome {
                Supervised::Exited(ClientExit {
                    config,
                    reason: ExitReason::Quit,
                }) => {
                    info!(server = %config.name, "connection dropped after quit");
                    continue;
                }
                Supervised::Exited(ClientExit {
                    config,
                    reason: ExitReason::Died(why),
                }) => (config, why.to_string()),
                Supervised::ConnectFailed { config, error } => (config, error),
                Supervised::Panicked { config, message } => {
                    error!(server = %config.name, panic = %message, "connection task panicked");
                    (config, format!("task panicked: {message}"))
                }
                Supervised::ReconnectDue(config) => {
                    if self.handle.exit_status().is_some() {
                        debug!(server = %config.name, "exiting, reconnection abandoned");
                        continue;
                    }
                    let run = connect_and_run(
                        self.handle.clone(),
                        Arc::clone(&config),
                        self.options.clone(),
                    );
                    tasks.spawn(supervised(config, run));
                    continue;
                }
            };

            if self.handle.exit_status().is_some() {
                info!(server = %config.name, reason = %why, "connection ended while exiting");
                continue;
            }

            warn!(
                server = %config.name,
                reason = %why,
                delay_secs = self.reconnect_delay.as_secs_f64(),
                "connection lost, scheduling reconnect"
            );
            let delay = self.reconnect_delay;
            tasks.spawn(async move {
                tokio::time::sleep(delay).await;
                Supervised::ReconnectDue(config)
            });
        }

        self.handle.exit_status().unwrap_or_else(|| {
            warn!("every connection was dropped without an exit request");
            ExitStatus::Quit
        })
    }
}

/// Run one connection task, turning a panic into an ordinary outcome so the
/// server's configuration is not lost.
async fn supervised<F>(config: Arc<ServerConfig>, task: F) -> Supervised
where
    F: Future<Output = Supervised>,
{
    match AssertUnwindSafe(task).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Supervised::Panicked {
            config,
            message: dispatch::panic_message(panic.as_ref()).to_owned(),
        },
    }
}

async fn connect_and_run(
    bot: BotHandle,
    config: Arc<ServerConfig>,
    options: ClientOptions,
) -> Supervised {
    let mut client = match Client::connect(Arc::clone(&config), options).await {
        Ok(client) => client,
        Err(e) => {
            return Supervised::ConnectFailed {
                config,
                error: e.to_string(),
            };
        }
    };

    if let Err(e) = dispatch::attach(&bot, client.bus_mut()) {
        error!(server = %config.name, error = %e, "failed to subscribe bot to connection");
    }

    let handle = client.handle().clone();
    bot.register_client(handle.clone());
    if bot.exit_status().is_some() {
        handle.quit(None);
    }

    let exit = client.run().await;
    bot.unregister_client(&handle);
    Supervised::Exited(exit)
}
