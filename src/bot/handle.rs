//! Shared bot state reachable from every action.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use regex::Regex;
use tama_proto::{Message, User};
use tracing::info;

use super::actions::ActionTable;
use crate::client::ClientHandle;
use crate::error::ActionTableError;

/// Why [`super::Bot::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Stop the process.
    Quit,
    /// Re-read the configuration and start again.
    Reload,
}

/// User masks allowed per permission tag.
#[derive(Debug, Default)]
pub struct Permissions {
    tags: HashMap<String, Vec<Regex>>,
}

impl Permissions {
    /// Compile `nick!user@host` masks with `*` and `?` wildcards.
    pub fn compile(config: &HashMap<String, Vec<String>>) -> Result<Self, ActionTableError> {
        let mut tags = HashMap::with_capacity(config.len());
        for (tag, masks) in config {
            let compiled = masks
                .iter()
                .map(|mask| mask_regex(mask))
                .collect::<Result<Vec<_>, _>>()?;
            tags.insert(tag.clone(), compiled);
        }
        Ok(Self { tags })
    }

    /// True if `user` holds every tag in `required`. Tags with no
    /// configured masks are held by nobody.
    pub fn allows(&self, user: &User, required: &[String]) -> bool {
        if required.is_empty() {
            return true;
        }
        if user.is_unknown() {
            return false;
        }
        let address = user.address();
        required.iter().all(|tag| {
            self.tags
                .get(tag)
                .is_some_and(|masks| masks.iter().any(|m| m.is_match(&address)))
        })
    }
}

fn mask_regex(mask: &str) -> Result<Regex, ActionTableError> {
    let mut pattern = String::with_capacity(mask.len() + 8);
    pattern.push_str("(?i)^");
    for c in mask.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|source| ActionTableError::InvalidPattern {
        pattern: mask.to_owned(),
        source,
    })
}

/// Cheap, cloneable handle to the running bot.
#[derive(Clone)]
pub struct BotHandle {
    shared: Arc<Shared>,
}

struct Shared {
    prefix: String,
    actions: ActionTable,
    permissions: Permissions,
    exit: Mutex<Option<ExitStatus>>,
    clients: DashMap<String, ClientHandle>,
}

impl BotHandle {
    pub(crate) fn new(prefix: String, actions: ActionTable, permissions: Permissions) -> Self {
        Self {
            shared: Arc::new(Shared {
                prefix,
                actions,
                permissions,
                exit: Mutex::new(None),
                clients: DashMap::new(),
            }),
        }
    }

    pub fn command_prefix(&self) -> &str {
        &self.shared.prefix
    }

    pub fn actions(&self) -> &ActionTable {
        &self.shared.actions
    }

    pub fn permissions(&self) -> &Permissions {
        &self.shared.permissions
    }

    /// Set once the bot has been asked to stop or reload.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        *self.shared.exit.lock()
    }

    /// Quit every connection and stop.
    pub fn shutdown(&self, reason: &str) {
        info!(reason = %reason, "shutdown requested");
        *self.shared.exit.lock() = Some(ExitStatus::Quit);
        for client in self.shared.clients.iter() {
            client.quit(Some(reason));
        }
    }

    /// Quit every connection and restart with fresh configuration.
    pub fn reload(&self, reason: &str) {
        info!(reason = %reason, "reload requested");
        *self.shared.exit.lock() = Some(ExitStatus::Reload);
        for client in self.shared.clients.iter() {
            client.quit(Some(reason));
        }
    }

    /// Drop every connection so each reconnects.
    pub fn reconnect(&self, reason: &str) {
        info!(reason = %reason, "reconnect requested");
        let reason = Some(reason).filter(|r| !r.is_empty());
        for client in self.shared.clients.iter() {
            client.send(Message::quit(reason));
        }
    }

    /// Live connections by name.
    pub fn clients(&self) -> Vec<ClientHandle> {
        self.shared
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub(crate) fn register_client(&self, client: ClientHandle) {
        self.shared.clients.insert(client.name().to_owned(), client);
    }

    pub(crate) fn unregister_client(&self, client: &ClientHandle) {
        self.shared
            .clients
            .remove_if(client.name(), |_, current| current.same_connection(client));
    }
}

impl fmt::Debug for BotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotHandle")
            .field("prefix", &self.shared.prefix)
            .field("exit", &self.exit_status())
            .field("clients", &self.shared.clients.len())
            .finish()
    }
}
