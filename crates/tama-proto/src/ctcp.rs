//! Client-to-client queries carried inside message bodies.
//!
//! A query is a PRIVMSG whose text is wrapped in `\x01` bytes. The answer
//! goes back in a NOTICE framed the same way.
//!
//! ```
//! use tama_proto::ctcp::{Ctcp, CtcpKind};
//!
//! let ctcp = Ctcp::parse("\x01PING 1700000000\x01").unwrap();
//! assert_eq!(ctcp.kind, CtcpKind::Ping);
//! assert_eq!(ctcp.params, Some("1700000000"));
//! assert_eq!(ctcp.reply_message("alice").to_string(),
//!            "NOTICE alice :\x01PING 1700000000\x01\r\n");
//! ```

use std::fmt;

use crate::Message;

/// Framing byte around every CTCP payload.
const MARKER: char = '\x01';

/// A CTCP query or reply name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CtcpKind {
    /// `/me` emote.
    Action,
    Version,
    /// Echoed back verbatim.
    Ping,
    Time,
    Clientinfo,
    /// Any name not listed above, kept as received.
    Other(String),
}

/// Names the bot understands, matched case-insensitively.
const NAMED: [CtcpKind; 5] = [
    CtcpKind::Action,
    CtcpKind::Version,
    CtcpKind::Ping,
    CtcpKind::Time,
    CtcpKind::Clientinfo,
];

impl CtcpKind {
    pub fn parse(name: &str) -> Self {
        NAMED
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_else(|| Self::Other(name.to_owned()))
    }

    /// Wire spelling; upper case for the named kinds.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Time => "TIME",
            Self::Clientinfo => "CLIENTINFO",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One CTCP payload, borrowing its parameters from the message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    pub kind: CtcpKind,
    /// Everything after the name; `None` when absent or empty.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Read a PRIVMSG or NOTICE body.
    ///
    /// Returns `None` for ordinary text. Clients that forget the closing
    /// marker are accepted.
    pub fn parse(body: &'a str) -> Option<Self> {
        let inner = body.strip_prefix(MARKER)?;
        let inner = inner.strip_suffix(MARKER).unwrap_or(inner);

        let (name, params) = inner
            .split_once(' ')
            .map_or((inner, None), |(name, rest)| (name, Some(rest)));
        if name.is_empty() {
            return None;
        }

        Some(Self::new(
            CtcpKind::parse(name),
            params.filter(|rest| !rest.is_empty()),
        ))
    }

    pub fn is_ctcp(body: &str) -> bool {
        body.starts_with(MARKER)
    }

    pub fn new(kind: CtcpKind, params: Option<&'a str>) -> Self {
        Self { kind, params }
    }

    /// This payload as a NOTICE, the form replies take.
    pub fn reply_message(&self, target: &str) -> Message {
        Message::notice(target, &self.to_string())
    }

    /// This payload as a PRIVMSG, the form queries take.
    pub fn request_message(&self, target: &str) -> Message {
        Message::privmsg(target, &self.to_string())
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params {
            Some(params) => write!(f, "{MARKER}{} {params}{MARKER}", self.kind),
            None => write!(f, "{MARKER}{}{MARKER}", self.kind),
        }
    }
}
