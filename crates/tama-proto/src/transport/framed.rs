//! Frame-level read and write halves.
//!
//! [`FrameReader::read_frames`] performs exactly one bounded read per call so
//! a caller multiplexing it in `tokio::select!` can interleave inbound
//! traffic with its own timers and outbound queue. The read is cancel-safe:
//! dropping the future before it completes loses no bytes.

use bytes::{Bytes, BytesMut};
use futures_util::SinkExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_util::codec::{Decoder, FramedWrite};
use tracing::warn;

use crate::line::LineCodec;
use crate::Message;

use super::error::TransportError;

/// Default size of a single read.
pub const DEFAULT_READ_SIZE: usize = 1024;

/// Result of one [`FrameReader::read_frames`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Zero or more complete frames, terminators stripped.
    Frames(Vec<Bytes>),
    /// The peer closed the stream.
    Closed,
}

/// Buffers partial input and yields complete CRLF frames.
pub struct FrameReader<R> {
    inner: R,
    codec: LineCodec,
    buffer: BytesMut,
    scratch: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a read half with the default read size.
    pub fn new(inner: R) -> Self {
        Self::with_read_size(inner, DEFAULT_READ_SIZE)
    }

    /// Wrap a read half, reading at most `read_size` bytes per call.
    pub fn with_read_size(inner: R, read_size: usize) -> Self {
        Self {
            inner,
            codec: LineCodec::new(),
            buffer: BytesMut::with_capacity(read_size * 2),
            scratch: vec![0; read_size.max(1)],
        }
    }

    /// Perform one read and return the frames it completed.
    ///
    /// End of stream is reported as [`ReadOutcome::Closed`], not an error.
    /// Over-long lines are discarded with a warning.
    pub async fn read_frames(&mut self) -> Result<ReadOutcome, TransportError> {
        let n = self.inner.read(&mut self.scratch).await?;
        if n == 0 {
            return Ok(ReadOutcome::Closed);
        }
        self.buffer.extend_from_slice(&self.scratch[..n]);

        let mut frames = Vec::new();
        loop {
            match self.codec.decode(&mut self.buffer) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => break,
                Err(e) => warn!(error = %e, "discarding inbound data"),
            }
        }
        Ok(ReadOutcome::Frames(frames))
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }
}

/// Serializes messages onto a write half.
pub struct FrameWriter<W> {
    framed: FramedWrite<W, LineCodec>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap a write half.
    pub fn new(inner: W) -> Self {
        Self {
            framed: FramedWrite::new(inner, LineCodec::new()),
        }
    }

    /// Serialize, write and flush one message.
    pub async fn send(&mut self, msg: Message) -> Result<(), TransportError> {
        self.framed.send(msg).await.map_err(TransportError::from)
    }

    /// Shut down the write side.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::<Message>::close(&mut self.framed)
            .await
            .map_err(TransportError::from)
    }
}
