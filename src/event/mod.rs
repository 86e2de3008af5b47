//! Domain events synthesized from inbound frames.
//!
//! Every event carries the [`ClientHandle`] of the connection it came from,
//! so subscribers can answer without looking anything up.

mod bus;

pub use bus::{EventBus, Subscriber, SubscriptionId};

use tama_proto::User;

use crate::client::ClientHandle;

/// Discriminant used to key bus subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Invited,
    BotJoined,
    ChannelJoined,
    BotParted,
    ChannelParted,
    BotKicked,
    ChannelKicked,
    Messaged,
    Noticed,
    Closed,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: &'static [EventKind] = &[
        Self::Invited,
        Self::BotJoined,
        Self::ChannelJoined,
        Self::BotParted,
        Self::ChannelParted,
        Self::BotKicked,
        Self::ChannelKicked,
        Self::Messaged,
        Self::Noticed,
        Self::Closed,
    ];
}

/// A connection-scoped notification.
#[derive(Debug, Clone)]
pub enum Event {
    /// Someone invited the bot to a channel.
    Invited {
        client: ClientHandle,
        sender: User,
        channel: String,
    },
    /// The bot joined a channel.
    BotJoined { client: ClientHandle, channel: String },
    /// Someone else joined a channel the bot is in.
    ChannelJoined {
        client: ClientHandle,
        user: User,
        channel: String,
    },
    /// The bot left a channel.
    BotParted {
        client: ClientHandle,
        channel: String,
        reason: Option<String>,
    },
    /// Someone else left a channel.
    ChannelParted {
        client: ClientHandle,
        user: User,
        channel: String,
        reason: Option<String>,
    },
    /// The bot was kicked.
    BotKicked {
        client: ClientHandle,
        sender: User,
        channel: String,
        reason: Option<String>,
    },
    /// Someone else was kicked.
    ChannelKicked {
        client: ClientHandle,
        sender: User,
        target: String,
        channel: String,
        reason: Option<String>,
    },
    /// A PRIVMSG. `location` is the channel, or the sender's nick for
    /// private messages.
    Messaged {
        client: ClientHandle,
        sender: User,
        location: String,
        text: String,
    },
    /// A NOTICE, located like [`Event::Messaged`].
    Noticed {
        client: ClientHandle,
        sender: User,
        location: String,
        text: String,
    },
    /// The connection is going away.
    Closed { client: ClientHandle, reason: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Invited { .. } => EventKind::Invited,
            Self::BotJoined { .. } => EventKind::BotJoined,
            Self::ChannelJoined { .. } => EventKind::ChannelJoined,
            Self::BotParted { .. } => EventKind::BotParted,
            Self::ChannelParted { .. } => EventKind::ChannelParted,
            Self::BotKicked { .. } => EventKind::BotKicked,
            Self::ChannelKicked { .. } => EventKind::ChannelKicked,
            Self::Messaged { .. } => EventKind::Messaged,
            Self::Noticed { .. } => EventKind::Noticed,
            Self::Closed { .. } => EventKind::Closed,
        }
    }

    /// The connection this event came from.
    pub fn client(&self) -> &ClientHandle {
        match self {
            Self::Invited { client, .. }
            | Self::BotJoined { client, .. }
            | Self::ChannelJoined { client, .. }
            | Self::BotParted { client, .. }
            | Self::ChannelParted { client, .. }
            | Self::BotKicked { client, .. }
            | Self::ChannelKicked { client, .. }
            | Self::Messaged { client, .. }
            | Self::Noticed { client, .. }
            | Self::Closed { client, .. } => client,
        }
    }
}
