//! CRLF line codec for tokio.
//!
//! Decoding yields raw frames with the terminator stripped; parsing is left
//! to the caller so that one bad frame never poisons the stream. Encoding
//! serializes [`Message`]s in their own wire encoding.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{self, ProtocolError};
use crate::message::Message;

/// Longest line accepted before the buffered bytes are discarded.
pub const DEFAULT_MAX_LINE: usize = 8191;

const CRLF: &[u8] = b"\r\n";

/// Line codec splitting on `\r\n`.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for a terminator
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Dropping an over-long line until its terminator shows up
    discarding: bool,
}

impl LineCodec {
    /// Create a codec with the default line limit.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE)
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    /// Keep only the first line of an outgoing frame.
    ///
    /// Serialized messages end in CRLF; anything after an embedded line
    /// break would be read by the server as a second command.
    fn sanitize(mut data: Vec<u8>) -> Vec<u8> {
        if let Some(pos) = data.iter().position(|b| *b == b'\r' || *b == b'\n') {
            data.truncate(pos);
        }
        data.extend_from_slice(CRLF);
        data
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Bytes;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Bytes>> {
        loop {
            let found = src[self.next_index..]
                .windows(CRLF.len())
                .position(|w| w == CRLF)
                .map(|offset| self.next_index + offset);

            match found {
                Some(end) => {
                    let mut line = src.split_to(end + CRLF.len());
                    self.next_index = 0;

                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }

                    line.truncate(end);
                    return Ok(Some(line.freeze()));
                }
                None if self.discarding => {
                    // Keep a lone '\r' in case the '\n' arrives next read.
                    let keep = usize::from(src.last() == Some(&b'\r'));
                    let drop = src.len() - keep;
                    let _ = src.split_to(drop);
                    self.next_index = 0;
                    return Ok(None);
                }
                None if src.len() > self.max_len => {
                    let actual = src.len();
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Err(ProtocolError::MessageTooLong {
                        actual,
                        limit: self.max_len,
                    });
                }
                None => {
                    // The terminator may straddle reads.
                    self.next_index = src.len().saturating_sub(1);
                    return Ok(None);
                }
            }
        }
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        let line = Self::sanitize(msg.to_bytes());
        if line.len() > self.max_len + CRLF.len() {
            warn!(len = line.len(), "sending line longer than the server may accept");
        }
        dst.extend_from_slice(&line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<Bytes> {
        let mut out = Vec::new();
        while let Some(frame) = codec.decode(buf).unwrap() {
            out.push(frame);
        }
        out
    }

    #[test]
    fn decode_complete_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :a\r\nPING :b\r\n");
        assert_eq!(drain(&mut codec, &mut buf), vec!["PING :a", "PING :b"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn terminator_split_across_reads() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("A\r\nB\r");
        assert_eq!(drain(&mut codec, &mut buf), vec!["A"]);
        assert_eq!(&buf[..], b"B\r");

        buf.extend_from_slice(b"\nC\r\n");
        assert_eq!(drain(&mut codec, &mut buf), vec!["B", "C"]);
    }

    #[test]
    fn bare_newline_is_not_a_terminator() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("A\nB");
        assert!(drain(&mut codec, &mut buf).is_empty());
        assert_eq!(&buf[..], b"A\nB");
    }

    #[test]
    fn overlong_line_is_discarded() {
        let mut codec = LineCodec::with_max_len(8);
        let mut buf = BytesMut::from("0123456789");
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::MessageTooLong { actual: 10, limit: 8 })
        ));

        buf.extend_from_slice(b"tail\r\nOK\r\n");
        assert_eq!(drain(&mut codec, &mut buf), vec!["OK"]);
    }

    #[test]
    fn encode_truncates_embedded_newlines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Message::privmsg("#c", "hi\r\nQUIT"), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"PRIVMSG #c :hi\r\n");
    }
}
