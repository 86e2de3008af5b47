//! The fixed set of command verbs accepted on the wire.
//!
//! # Reference
//! - RFC 2812 Section 3: Message details
//! - RFC 2813 Section 4: Server to server messages

/// Every non-numeric verb the codec accepts, in upper case.
pub const KNOWN_VERBS: &[&str] = &[
    "ADMIN", "AWAY", "CONNECT", "DIE", "ERROR", "INFO", "INVITE", "ISON", "JOIN", "KICK", "KILL",
    "LINKS", "LIST", "LUSERS", "MODE", "MOTD", "NAMES", "NICK", "NJOIN", "NOTICE", "OPER",
    "PART", "PASS", "PING", "PONG", "PRIVMSG", "QUIT", "REHASH", "RESTART", "SERVER", "SERVICE",
    "SERVLIST", "SQUERY", "SQUIRT", "SQUIT", "STATS", "SUMMON", "TIME", "TOPIC", "TRACE", "USER",
    "USERHOST", "USERS", "VERSION", "WALLOPS", "WHO", "WHOIS", "WHOWAS",
];

/// Resolve `token` case-insensitively to its canonical verb.
///
/// ```
/// use tama_proto::verb;
///
/// assert_eq!(verb::canonical("privmsg"), Some("PRIVMSG"));
/// assert_eq!(verb::canonical("CAP"), None);
/// ```
pub fn canonical(token: &str) -> Option<&'static str> {
    KNOWN_VERBS
        .iter()
        .copied()
        .find(|verb| verb.eq_ignore_ascii_case(token))
}

/// True when `token` is three ASCII digits, i.e. a numeric reply.
pub fn is_numeric(token: &str) -> bool {
    token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_verbs_are_uppercase() {
        for verb in KNOWN_VERBS {
            assert_eq!(*verb, verb.to_ascii_uppercase());
        }
    }

    #[test]
    fn canonical_is_case_insensitive() {
        assert_eq!(canonical("Join"), Some("JOIN"));
        assert_eq!(canonical("sQuIrT"), Some("SQUIRT"));
        assert_eq!(canonical("JOINX"), None);
        assert_eq!(canonical(""), None);
    }

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("001"));
        assert!(is_numeric("433"));
        assert!(!is_numeric("01"));
        assert!(!is_numeric("0A1"));
        assert!(!is_numeric("1001"));
    }
}
