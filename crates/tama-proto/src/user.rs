//! User identities carried in message prefixes.
//!
//! A prefix naming a user has the form `nick!user@host`. Server prefixes
//! (`irc.example.net`) do not parse as users.

use std::fmt;
use std::str::FromStr;

use crate::error::InvalidAddress;

const UNKNOWN: &str = "<unknown>";

/// A user on the network, identified by `nick!user@host`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct User {
    /// Nickname.
    pub nick: String,
    /// Username (ident).
    pub user: String,
    /// Hostname or cloak.
    pub host: String,
}

impl User {
    /// Create a user from its three components.
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            user: user.into(),
            host: host.into(),
        }
    }

    /// The sentinel used when a prefix cannot be read as a user.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, UNKNOWN)
    }

    /// True if this is the [`User::unknown`] sentinel.
    pub fn is_unknown(&self) -> bool {
        self.nick == UNKNOWN && self.user == UNKNOWN && self.host == UNKNOWN
    }

    /// The full `nick!user@host` address.
    pub fn address(&self) -> String {
        self.to_string()
    }

    /// Parse `nick!user@host`.
    pub fn from_address(address: &str) -> Result<Self, InvalidAddress> {
        let invalid = || InvalidAddress(address.to_owned());
        let (nick, rest) = address.split_once('!').ok_or_else(invalid)?;
        let (user, host) = rest.split_once('@').ok_or_else(invalid)?;
        if nick.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(nick, user, host))
    }
}

impl FromStr for User {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}
