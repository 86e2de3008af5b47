//! Constructors for the commands a client sends.

use super::types::Message;

impl Message {
    /// `NICK <nickname>`
    pub fn nick(nickname: &str) -> Self {
        Self::verb("NICK", vec![nickname.to_owned()], None)
    }

    /// `USER <user> 0 * :<realname>`
    pub fn user(username: &str, realname: &str) -> Self {
        Self::verb(
            "USER",
            vec![username.to_owned(), "0".to_owned(), "*".to_owned()],
            Some(realname.to_owned()),
        )
    }

    /// `JOIN <channel>`
    pub fn join(channel: &str) -> Self {
        Self::verb("JOIN", vec![channel.to_owned()], None)
    }

    /// `PART <channel> [:<reason>]`
    pub fn part(channel: &str, reason: Option<&str>) -> Self {
        Self::verb("PART", vec![channel.to_owned()], reason.map(str::to_owned))
    }

    /// `PRIVMSG <target> :<text>`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::verb("PRIVMSG", vec![target.to_owned()], Some(text.to_owned()))
    }

    /// `NOTICE <target> :<text>`
    pub fn notice(target: &str, text: &str) -> Self {
        Self::verb("NOTICE", vec![target.to_owned()], Some(text.to_owned()))
    }

    /// `PING :<token>`
    pub fn ping(token: &str) -> Self {
        Self::verb("PING", Vec::new(), Some(token.to_owned()))
    }

    /// `PONG :<token>`
    pub fn pong(token: &str) -> Self {
        Self::verb("PONG", Vec::new(), Some(token.to_owned()))
    }

    /// `QUIT [:<reason>]`
    pub fn quit(reason: Option<&str>) -> Self {
        Self::verb("QUIT", Vec::new(), reason.map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_commands() {
        assert_eq!(Message::nick("tama").to_string(), "NICK tama\r\n");
        assert_eq!(
            Message::user("tama", "Tama bot").to_string(),
            "USER tama 0 * :Tama bot\r\n"
        );
    }

    #[test]
    fn optional_reasons() {
        assert_eq!(Message::quit(None).to_string(), "QUIT\r\n");
        assert_eq!(Message::quit(Some("bye")).to_string(), "QUIT :bye\r\n");
        assert_eq!(Message::part("#c", None).to_string(), "PART #c\r\n");
    }

    #[test]
    fn constructed_messages_reparse() {
        for msg in [
            Message::join("#rust"),
            Message::privmsg("alice", "hi there"),
            Message::notice("#c", ""),
            Message::pong("12345.1"),
        ] {
            assert_eq!(msg.to_string().parse::<Message>().unwrap(), msg);
        }
    }
}
