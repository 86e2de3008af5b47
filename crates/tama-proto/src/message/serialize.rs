use std::fmt::{self, Display, Formatter};

use super::types::Message;

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            write!(f, ":{} ", prefix)?;
        }

        match self.numeric {
            Some(ref numeric) => f.write_str(numeric)?,
            None => f.write_str(&self.command)?,
        }

        for param in &self.middle {
            write!(f, " {}", param)?;
        }

        if let Some(ref trailing) = self.trailing {
            write!(f, " :{}", trailing)?;
        }

        f.write_str("\r\n")
    }
}

impl Message {
    /// Serialize to wire bytes in the message's encoding, CRLF included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let line = self.to_string();
        let (bytes, _encoding, _had_errors) = self.encoding.encode(&line);
        bytes.into_owned()
    }
}
