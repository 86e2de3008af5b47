//! Connection state machine, independent of any I/O.
//!
//! A [`Session`] consumes inbound frames, updates connection state, queues
//! replies through its [`ClientHandle`] and publishes domain events on its
//! bus. [`super::Client`] drives it from a socket.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{Local, Utc};
use lazy_static::lazy_static;
use tama_proto::{Ctcp, CtcpKind, Message, User};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use super::handle::{ClientHandle, ClientStatus, ConnectionState, HandleParts};
use crate::config::ServerConfig;
use crate::error::FrameError;
use crate::event::{Event, EventBus};
use crate::telemetry::RAW_TARGET;

type VerbHandler = fn(&mut Session, &Message) -> Result<(), FrameError>;

lazy_static! {
    /// Canonical verb to handler. Verbs missing here are logged and dropped.
    static ref VERBS: HashMap<&'static str, VerbHandler> = {
        let mut m: HashMap<&'static str, VerbHandler> = HashMap::new();
        m.insert("PING", Session::on_ping);
        m.insert("PONG", Session::on_pong);
        m.insert("NICK", Session::on_nick);
        m.insert("PRIVMSG", Session::on_privmsg);
        m.insert("NOTICE", Session::on_notice);
        m.insert("INVITE", Session::on_invite);
        m.insert("JOIN", Session::on_join);
        m.insert("PART", Session::on_part);
        m.insert("KICK", Session::on_kick);
        m.insert("ERROR", Session::on_error);
        m.insert("RPL_WELCOME", Session::on_welcome);
        m.insert("ERR_NICKNAMEINUSE", Session::on_nickname_in_use);
        m
    };
}

/// Outcome of an idle interval elapsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    /// A probe was sent carrying this token.
    Probed(String),
    /// The previous probe went unanswered.
    Dead,
}

/// Per-connection protocol state.
pub struct Session {
    config: Arc<ServerConfig>,
    handle: ClientHandle,
    status: watch::Sender<ClientStatus>,
    bus: EventBus,
    nickname: String,
    state: ConnectionState,
    channels: HashSet<String>,
    pending: VecDeque<Message>,
    liveness: Option<String>,
    probes_sent: u64,
    close_reason: Option<String>,
}

impl Session {
    /// Create a session in [`ConnectionState::Connecting`].
    ///
    /// Returns the receiving end of the outbound queue.
    pub fn new(config: Arc<ServerConfig>) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (handle, HandleParts { outbound, status }) =
            ClientHandle::new(&config.name, &config.nick);

        let mut pending = VecDeque::new();
        if let Some(ref auth) = config.service_auth {
            pending.push_back(Message::privmsg(auth.service(), &auth.command_text()));
        }
        for channel in &config.channels {
            pending.push_back(Message::join(channel));
        }

        let session = Self {
            nickname: config.nick.clone(),
            config,
            handle,
            status,
            bus: EventBus::with_all_kinds(),
            state: ConnectionState::Connecting,
            channels: HashSet::new(),
            pending,
            liveness: None,
            probes_sent: 0,
            close_reason: None,
        };
        (session, outbound)
    }

    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    pub fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Channels the bot is currently in, lowercased.
    pub fn channels(&self) -> &HashSet<String> {
        &self.channels
    }

    /// Token of the unanswered liveness probe, if any.
    pub fn pending_probe(&self) -> Option<&str> {
        self.liveness.as_deref()
    }

    /// The transport is up: queue NICK and USER.
    pub fn begin_registration(&mut self) {
        self.set_state(ConnectionState::Registering);
        self.handle.nick(&self.nickname);
        self.handle.user(&self.config.user, self.config.realname());
    }

    /// Parse and act on one inbound frame. Malformed frames are dropped.
    pub fn handle_frame(&mut self, raw: &[u8]) {
        debug!(target: RAW_TARGET, server = %self.config.name, ">> {}", String::from_utf8_lossy(raw));

        match Message::parse(raw) {
            Ok(msg) => self.handle_message(&msg),
            Err(e) => warn!(server = %self.config.name, error = %e, "dropping malformed frame"),
        }
    }

    /// Dispatch a parsed message to its verb handler.
    pub fn handle_message(&mut self, msg: &Message) {
        let handler = VERBS
            .get(msg.command.as_str())
            .or_else(|| VERBS.get(msg.command.to_ascii_uppercase().as_str()));

        let Some(handler) = handler else {
            trace!(server = %self.config.name, command = %msg.command, "no handler");
            return;
        };

        if let Err(e) = handler(self, msg) {
            warn!(
                server = %self.config.name,
                command = %msg.command,
                code = e.error_code(),
                error = %e,
                "failed to handle frame"
            );
        }
    }

    /// Called when the idle interval elapses.
    pub fn on_idle(&mut self) -> Liveness {
        if let Some(ref token) = self.liveness {
            warn!(server = %self.config.name, token = %token, "liveness probe unanswered");
            self.set_state(ConnectionState::ShuttingDown);
            return Liveness::Dead;
        }

        self.probes_sent += 1;
        let token = format!("{}.{}", Utc::now().timestamp(), self.probes_sent);
        self.handle.ping(&token);
        self.liveness = Some(token.clone());
        Liveness::Probed(token)
    }

    /// Why the server says it is closing us, if it told us.
    pub fn close_reason(&self) -> Option<&str> {
        self.close_reason.as_deref()
    }

    /// Publish `Closed`, detach subscribers and finish in
    /// [`ConnectionState::Closed`].
    pub fn shut_down(&mut self, reason: &str) {
        self.set_state(ConnectionState::ShuttingDown);

        let event = Event::Closed {
            client: self.handle.clone(),
            reason: reason.to_owned(),
        };
        if let Err(e) = self.bus.publish(&event) {
            warn!(server = %self.config.name, error = %e, "Closed subscriber failed");
        }
        self.bus.clear();
        self.set_state(ConnectionState::Closed);
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(server = %self.config.name, from = %self.state, to = %state, "state change");
        }
        self.state = state;
        self.status.send_modify(|s| s.state = state);
    }

    fn set_nickname(&mut self, nickname: &str) {
        self.nickname = nickname.to_owned();
        self.status.send_modify(|s| s.nickname = nickname.to_owned());
    }

    fn is_me(&self, nick: &str) -> bool {
        nick.eq_ignore_ascii_case(&self.nickname)
    }

    /// Where a reply to `target` should go: the sender for private messages.
    fn location(&self, target: &str, sender: &User) -> String {
        if self.is_me(target) {
            sender.nick.clone()
        } else {
            target.to_owned()
        }
    }

    fn publish(&self, event: Event) -> Result<(), FrameError> {
        Ok(self.bus.publish(&event)?)
    }

    // === Verb handlers ===

    fn on_ping(&mut self, msg: &Message) -> Result<(), FrameError> {
        let token = msg.last_arg().ok_or_else(|| missing(msg, 0))?;
        self.handle.pong(token);
        Ok(())
    }

    fn on_pong(&mut self, msg: &Message) -> Result<(), FrameError> {
        match (msg.last_arg(), self.liveness.as_deref()) {
            (Some(got), Some(expected)) if got == expected => {
                trace!(server = %self.config.name, token = %got, "liveness probe answered");
                self.liveness = None;
            }
            (got, _) => {
                debug!(server = %self.config.name, token = ?got, "unsolicited PONG");
            }
        }
        Ok(())
    }

    fn on_welcome(&mut self, msg: &Message) -> Result<(), FrameError> {
        if let Some(nick) = msg.arg(0) {
            self.set_nickname(nick);
        }
        self.set_state(ConnectionState::Registered);
        info!(server = %self.config.name, nick = %self.nickname, "registered");

        while let Some(queued) = self.pending.pop_front() {
            self.handle.send(queued);
        }
        Ok(())
    }

    fn on_nickname_in_use(&mut self, msg: &Message) -> Result<(), FrameError> {
        if self.state != ConnectionState::Registering {
            warn!(server = %self.config.name, nick = ?msg.arg(1), "nickname change refused");
            return Ok(());
        }

        let candidate = format!("{}_", self.nickname);
        info!(server = %self.config.name, nick = %candidate, "nickname in use, retrying");
        self.set_nickname(&candidate);
        self.handle.nick(&candidate);
        Ok(())
    }

    fn on_nick(&mut self, msg: &Message) -> Result<(), FrameError> {
        let new_nick = msg.arg(0).ok_or_else(|| missing(msg, 0))?;
        if msg.source_nickname().is_some_and(|n| self.is_me(n)) {
            info!(server = %self.config.name, nick = %new_nick, "nickname changed");
            self.set_nickname(new_nick);
        }
        Ok(())
    }

    fn on_privmsg(&mut self, msg: &Message) -> Result<(), FrameError> {
        let target = msg.arg(0).ok_or_else(|| missing(msg, 0))?;
        let text = msg.arg(1).ok_or_else(|| missing(msg, 1))?;
        let sender = msg.source_user();

        if self.is_me(target)
            && let Some(ctcp) = Ctcp::parse(text)
            && self.answer_ctcp(&ctcp, &sender)
        {
            return Ok(());
        }

        self.publish(Event::Messaged {
            client: self.handle.clone(),
            location: self.location(target, &sender),
            sender,
            text: text.to_owned(),
        })
    }

    fn on_notice(&mut self, msg: &Message) -> Result<(), FrameError> {
        let target = msg.arg(0).ok_or_else(|| missing(msg, 0))?;
        let text = msg.arg(1).ok_or_else(|| missing(msg, 1))?;
        let sender = msg.source_user();

        self.publish(Event::Noticed {
            client: self.handle.clone(),
            location: self.location(target, &sender),
            sender,
            text: text.to_owned(),
        })
    }

    /// Answer VERSION, PING and TIME queries. Returns false for anything
    /// that should be surfaced as an ordinary message.
    fn answer_ctcp(&self, ctcp: &Ctcp<'_>, sender: &User) -> bool {
        if sender.is_unknown() {
            return false;
        }

        let version = format!("tama {}", env!("CARGO_PKG_VERSION"));
        let time = Local::now().to_rfc2822();
        let params = match ctcp.kind {
            CtcpKind::Version => Some(version.as_str()),
            CtcpKind::Ping => ctcp.params,
            CtcpKind::Time => Some(time.as_str()),
            CtcpKind::Clientinfo => Some("ACTION CLIENTINFO PING TIME VERSION"),
            _ => return false,
        };

        debug!(server = %self.config.name, kind = %ctcp.kind, from = %sender.nick, "answering CTCP");
        let reply = Ctcp::new(ctcp.kind.clone(), params);
        self.handle.send(reply.reply_message(&sender.nick));
        true
    }

    fn on_invite(&mut self, msg: &Message) -> Result<(), FrameError> {
        let channel = msg.arg(1).ok_or_else(|| missing(msg, 1))?;
        self.publish(Event::Invited {
            client: self.handle.clone(),
            sender: msg.source_user(),
            channel: channel.to_owned(),
        })
    }

    fn on_join(&mut self, msg: &Message) -> Result<(), FrameError> {
        let channel = msg.arg(0).ok_or_else(|| missing(msg, 0))?;
        let user = msg.source_user();

        if !self.is_me(&user.nick) {
            return self.publish(Event::ChannelJoined {
                client: self.handle.clone(),
                user,
                channel: channel.to_owned(),
            });
        }

        if !self.channels.insert(channel.to_ascii_lowercase()) {
            warn!(server = %self.config.name, channel = %channel, "joined a channel already recorded as joined");
        }
        info!(server = %self.config.name, channel = %channel, "joined");
        self.publish(Event::BotJoined {
            client: self.handle.clone(),
            channel: channel.to_owned(),
        })
    }

    fn on_part(&mut self, msg: &Message) -> Result<(), FrameError> {
        let channel = msg.arg(0).ok_or_else(|| missing(msg, 0))?;
        let reason = msg.arg(1).map(str::to_owned);
        let user = msg.source_user();

        if !self.is_me(&user.nick) {
            return self.publish(Event::ChannelParted {
                client: self.handle.clone(),
                user,
                channel: channel.to_owned(),
                reason,
            });
        }

        self.forget_channel(channel);
        info!(server = %self.config.name, channel = %channel, "parted");
        self.publish(Event::BotParted {
            client: self.handle.clone(),
            channel: channel.to_owned(),
            reason,
        })
    }

    fn on_kick(&mut self, msg: &Message) -> Result<(), FrameError> {
        let channel = msg.arg(0).ok_or_else(|| missing(msg, 0))?;
        let target = msg.arg(1).ok_or_else(|| missing(msg, 1))?;
        let reason = msg.arg(2).map(str::to_owned);
        let sender = msg.source_user();

        if !self.is_me(target) {
            return self.publish(Event::ChannelKicked {
                client: self.handle.clone(),
                sender,
                target: target.to_owned(),
                channel: channel.to_owned(),
                reason,
            });
        }

        self.forget_channel(channel);
        warn!(server = %self.config.name, channel = %channel, by = %sender.nick, "kicked");
        self.publish(Event::BotKicked {
            client: self.handle.clone(),
            sender,
            channel: channel.to_owned(),
            reason,
        })
    }

    fn on_error(&mut self, msg: &Message) -> Result<(), FrameError> {
        let reason = msg.last_arg().unwrap_or("ERROR").to_owned();
        warn!(server = %self.config.name, reason = %reason, "server error");
        self.close_reason = Some(reason);
        Ok(())
    }

    fn forget_channel(&mut self, channel: &str) {
        if !self.channels.remove(&channel.to_ascii_lowercase()) {
            warn!(server = %self.config.name, channel = %channel, "left a channel never recorded as joined");
        }
    }
}

fn missing(msg: &Message, index: usize) -> FrameError {
    FrameError::MissingParam {
        verb: msg.command.clone(),
        index,
    }
}
