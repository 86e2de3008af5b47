//! Client transport: connecting, framing inbound bytes, writing messages.
//!
//! # Usage
//!
//! ```ignore
//! use tama_proto::transport::{FrameReader, FrameWriter, ReadOutcome, TransportStream};
//!
//! let stream = TransportStream::connect("irc.libera.chat", 6697, true).await?;
//! let (read, write) = tokio::io::split(stream);
//! let mut reader = FrameReader::new(read);
//! let mut writer = FrameWriter::new(write);
//!
//! writer.send(Message::nick("tama")).await?;
//! while let ReadOutcome::Frames(frames) = reader.read_frames().await? {
//!     for frame in frames {
//!         // parse with Message::parse(&frame)
//!     }
//! }
//! ```

mod error;
mod framed;
mod stream;

pub use error::TransportError;
pub use framed::{FrameReader, FrameWriter, ReadOutcome, DEFAULT_READ_SIZE};
pub use stream::TransportStream;
