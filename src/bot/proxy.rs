//! Messaging surface handed to plugin actions.

use tracing::info;

use crate::client::ClientHandle;
use crate::telemetry::CHAT_TARGET;

/// Sends on behalf of the bot over one connection, logging what it says.
#[derive(Debug, Clone)]
pub struct ClientProxy {
    client: ClientHandle,
}

impl ClientProxy {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    /// The underlying connection handle.
    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    /// PRIVMSG `target`.
    pub fn message(&self, target: &str, text: &str) {
        info!(
            target: CHAT_TARGET,
            server = %self.client.name(),
            channel = %target,
            "<{}> {}",
            self.client.nickname(),
            text
        );
        self.client.privmsg(target, text);
    }

    /// NOTICE `target`.
    pub fn notice(&self, target: &str, text: &str) {
        info!(
            target: CHAT_TARGET,
            server = %self.client.name(),
            channel = %target,
            "-{}- {}",
            self.client.nickname(),
            text
        );
        self.client.notice(target, text);
    }

    pub fn nick(&self, nickname: &str) {
        self.client.nick(nickname);
    }

    pub fn join(&self, channel: &str) {
        self.client.join(channel);
    }

    pub fn part(&self, channel: &str, reason: Option<&str>) {
        self.client.part(channel, reason);
    }
}
