use encoding::{Encoding, UTF_8};

use crate::error::{ProtocolError, Result};
use crate::response::Response;
use crate::user::User;
use crate::verb;

/// An owned IRC message.
///
/// `command` always holds the canonical upper-case verb or, for numeric
/// replies, the reply name (`RPL_WELCOME`). The original three-digit code is
/// kept in `numeric` and is what gets serialized back onto the wire.
///
/// # Example
///
/// ```
/// use tama_proto::Message;
///
/// // Parse a message
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// assert_eq!(msg.command, "PRIVMSG");
///
/// // Construct a message
/// let msg = Message::privmsg("#channel", "Hello!");
/// assert_eq!(msg.to_string(), "PRIVMSG #channel :Hello!\r\n");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Message prefix/source (e.g. `nick!user@host`).
    pub prefix: Option<String>,
    /// Canonical verb or reply name.
    pub command: String,
    /// Original numeric code for replies.
    pub numeric: Option<String>,
    /// Space-separated parameters.
    pub middle: Vec<String>,
    /// Final `:`-introduced parameter. `Some("")` differs from `None`.
    pub trailing: Option<String>,
    /// Character encoding used on the wire.
    pub encoding: &'static Encoding,
}

impl Message {
    /// Build a message for a known verb, validating it.
    ///
    /// Numeric tokens are accepted and resolved through the reply table.
    pub fn new(
        command: &str,
        middle: Vec<String>,
        trailing: Option<String>,
    ) -> Result<Self> {
        let mut msg = Self::resolve_command(command)?;
        msg.middle = middle;
        msg.trailing = trailing;
        Ok(msg)
    }

    /// Build a numeric reply. Serializes as the three-digit code.
    pub fn reply(response: Response, middle: Vec<String>, trailing: Option<String>) -> Self {
        Self {
            prefix: None,
            command: response.name().to_owned(),
            numeric: Some(response.numeric()),
            middle,
            trailing,
            encoding: UTF_8,
        }
    }

    /// Resolve a wire verb token into an empty message carrying it.
    pub(crate) fn resolve_command(token: &str) -> Result<Self> {
        let malformed = || ProtocolError::MalformedCommand(token.to_owned());

        if token.is_empty() {
            return Err(malformed());
        }

        if verb::is_numeric(token) {
            let response = Response::from_numeric(token).ok_or_else(malformed)?;
            return Ok(Self::reply(response, Vec::new(), None));
        }

        let command = verb::canonical(token).ok_or_else(malformed)?;
        Ok(Self::verb(command, Vec::new(), None))
    }

    /// Build a message from a verb already known to be canonical.
    pub(crate) fn verb(command: &'static str, middle: Vec<String>, trailing: Option<String>) -> Self {
        Self {
            prefix: None,
            command: command.to_owned(),
            numeric: None,
            middle,
            trailing,
            encoding: UTF_8,
        }
    }

    /// Set the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the wire encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Argument `n`, counting the middle parameters followed by trailing.
    pub fn arg(&self, n: usize) -> Option<&str> {
        match n.cmp(&self.middle.len()) {
            std::cmp::Ordering::Less => Some(&self.middle[n]),
            std::cmp::Ordering::Equal => self.trailing.as_deref(),
            std::cmp::Ordering::Greater => None,
        }
    }

    /// The last argument, trailing if present.
    pub fn last_arg(&self) -> Option<&str> {
        self.trailing
            .as_deref()
            .or_else(|| self.middle.last().map(String::as_str))
    }

    /// Total number of arguments.
    pub fn arg_count(&self) -> usize {
        self.middle.len() + usize::from(self.trailing.is_some())
    }

    /// The reply code, when this is a numeric reply.
    pub fn response(&self) -> Option<Response> {
        self.numeric.as_deref().and_then(Response::from_numeric)
    }

    /// The prefix read as a user, or [`User::unknown`] when it is absent or
    /// names a server.
    pub fn source_user(&self) -> User {
        self.prefix
            .as_deref()
            .and_then(|p| User::from_address(p).ok())
            .unwrap_or_else(User::unknown)
    }

    /// The nick part of a user prefix.
    pub fn source_nickname(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        prefix.split_once('!').map(|(nick, _)| nick)
    }
}
