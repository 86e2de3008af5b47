//! # tama-proto
//!
//! IRC wire protocol support for the tama bot: message parsing and
//! serialization, the numeric reply table, CTCP payloads, and (with the
//! default `tokio` feature) CRLF framing over plain or TLS client streams.
//!
//! ## Parsing
//!
//! ```rust
//! use tama_proto::{Message, Response};
//!
//! let msg = Message::parse(b":irc.example.net 433 * tama :Nickname is already in use\r\n").unwrap();
//! assert_eq!(msg.command, "ERR_NICKNAMEINUSE");
//! assert_eq!(msg.response(), Some(Response::ERR_NICKNAMEINUSE));
//! ```
//!
//! Verbs outside the known set and numerics outside the reply table are
//! rejected:
//!
//! ```rust
//! use tama_proto::Message;
//!
//! let err = Message::parse(b"FROBNICATE #chan").unwrap_err();
//! assert_eq!(err.offending_token(), Some("FROBNICATE"));
//! ```

#![deny(clippy::all)]

pub mod ctcp;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod response;
#[cfg(feature = "tokio")]
pub mod transport;
pub mod user;
pub mod verb;

pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::error::{InvalidAddress, ProtocolError};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::Message;
pub use self::response::Response;
#[cfg(feature = "tokio")]
pub use self::transport::{
    FrameReader, FrameWriter, ReadOutcome, TransportError, TransportStream,
};
pub use self::user::User;

pub use encoding::Encoding;
