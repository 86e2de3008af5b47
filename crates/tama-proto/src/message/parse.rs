use std::str::FromStr;

use encoding::{Encoding, UTF_8};

use super::nom_parser::parse_line;
use super::types::Message;
use crate::error::{ProtocolError, Result};

impl Message {
    /// Parse one frame, decoding it as UTF-8.
    ///
    /// A trailing `\r\n` is tolerated and ignored.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_with_encoding(raw, UTF_8)
    }

    /// Parse one frame with an explicit wire encoding.
    pub fn parse_with_encoding(raw: &[u8], encoding: &'static Encoding) -> Result<Self> {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

        let text = encoding
            .decode_without_bom_handling_and_without_replacement(raw)
            .ok_or(ProtocolError::InvalidEncoding {
                encoding: encoding.name(),
            })?;

        let mut msg = Self::parse_str(&text)?;
        msg.encoding = encoding;
        Ok(msg)
    }

    fn parse_str(line: &str) -> Result<Self> {
        let (_rest, parsed) = parse_line(line)
            .map_err(|_| ProtocolError::MalformedCommand(String::new()))?;

        let mut msg = Self::resolve_command(parsed.verb)?;
        msg.prefix = parsed.prefix.map(str::to_owned);
        msg.middle = parsed.middle.iter().map(|s| (*s).to_owned()).collect();
        msg.trailing = parsed.trailing.map(str::to_owned);
        Ok(msg)
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim_end_matches(['\r', '\n']);
        Self::parse_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    #[test]
    fn parse_numeric_resolves_name() {
        let msg = Message::parse(b":irc.example.net 001 tama :Welcome to IRC\r\n").unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("irc.example.net"));
        assert_eq!(msg.command, "RPL_WELCOME");
        assert_eq!(msg.numeric.as_deref(), Some("001"));
        assert_eq!(msg.response(), Some(Response::RPL_WELCOME));
        assert_eq!(msg.middle, vec!["tama"]);
        assert_eq!(msg.trailing.as_deref(), Some("Welcome to IRC"));
    }

    #[test]
    fn verbs_are_canonicalized() {
        let msg: Message = "privmsg #rust :hi".parse().unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.numeric, None);
    }

    #[test]
    fn unknown_verb_is_malformed() {
        let err = Message::parse(b"CAP LS 302").unwrap_err();
        assert_eq!(err.offending_token(), Some("CAP"));
    }

    #[test]
    fn unknown_numeric_is_malformed() {
        let err = Message::parse(b":server 999 tama :what").unwrap_err();
        assert_eq!(err.offending_token(), Some("999"));
    }

    #[test]
    fn missing_verb_is_malformed() {
        let err = Message::parse(b":server.only").unwrap_err();
        assert_eq!(err.offending_token(), Some(""));
        let err = Message::parse(b"").unwrap_err();
        assert_eq!(err.offending_token(), Some(""));
    }

    #[test]
    fn absent_and_empty_trailing_differ() {
        let absent = Message::parse(b"AWAY").unwrap();
        let empty = Message::parse(b"AWAY :").unwrap();
        assert_eq!(absent.trailing, None);
        assert_eq!(empty.trailing.as_deref(), Some(""));
        assert_ne!(absent, empty);
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = Message::parse(b"PRIVMSG #c :\xff\xfe").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidEncoding { .. }));
    }

    #[test]
    fn legacy_encoding_decodes() {
        let latin1 = Encoding::for_label(b"iso-8859-1").unwrap();
        let msg = Message::parse_with_encoding(b"PRIVMSG #c :caf\xe9", latin1).unwrap();
        assert_eq!(msg.trailing.as_deref(), Some("café"));
        assert_eq!(msg.encoding, latin1);
    }

    #[test]
    fn source_user_falls_back_to_sentinel() {
        let msg = Message::parse(b":alice!a@host PRIVMSG tama :hi").unwrap();
        assert_eq!(msg.source_user().nick, "alice");
        assert_eq!(msg.source_nickname(), Some("alice"));

        let msg = Message::parse(b":irc.example.net NOTICE * :hi").unwrap();
        assert!(msg.source_user().is_unknown());
        assert_eq!(msg.source_nickname(), None);
    }

    #[test]
    fn args_span_middle_and_trailing() {
        let msg = Message::parse(b"KICK #chan bob :go away").unwrap();
        assert_eq!(msg.arg(0), Some("#chan"));
        assert_eq!(msg.arg(1), Some("bob"));
        assert_eq!(msg.arg(2), Some("go away"));
        assert_eq!(msg.arg(3), None);
        assert_eq!(msg.arg_count(), 3);
        assert_eq!(msg.last_arg(), Some("go away"));
    }
}
