//! One IRC server connection.
//!
//! [`Client`] owns the socket and multiplexes three things in a single
//! task: inbound frames, the outbound queue fed by [`ClientHandle`]s, and
//! an idle timer that drives liveness probes. Protocol decisions live in
//! [`Session`].

mod handle;
mod session;

pub use handle::{ClientHandle, ClientStatus, ConnectionState};
pub use session::{Liveness, Session};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tama_proto::{
    FrameReader, FrameWriter, Message, ReadOutcome, TransportError, TransportStream,
};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, warn};

use crate::config::ServerConfig;
use crate::event::EventBus;
use crate::telemetry::{RAW_TARGET, spans};

/// Tunables for a connection.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Idle time after which a liveness probe is sent.
    pub ping_interval: Duration,
    /// Maximum bytes per socket read.
    pub read_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            read_size: tama_proto::transport::DEFAULT_READ_SIZE,
        }
    }
}

/// Why a connection died.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server closed the stream.
    Eof,
    /// A read or write failed.
    Transport(String),
    /// A liveness probe went unanswered for a full interval.
    PingTimeout,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => f.write_str("connection closed by server"),
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::PingTimeout => f.write_str("ping timeout"),
        }
    }
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The bot quit deliberately; do not reconnect.
    Quit,
    /// The connection was lost.
    Died(DisconnectReason),
}

/// Returned by [`Client::run`].
#[derive(Debug, Clone)]
pub struct ClientExit {
    pub config: Arc<ServerConfig>,
    pub reason: ExitReason,
}

/// A registered or registering connection over stream `S`.
pub struct Client<S> {
    session: Session,
    reader: FrameReader<ReadHalf<S>>,
    writer: FrameWriter<WriteHalf<S>>,
    outbound: mpsc::UnboundedReceiver<Message>,
    options: ClientOptions,
}

impl Client<TransportStream> {
    /// Open a connection to the configured server and start registration.
    pub async fn connect(
        config: Arc<ServerConfig>,
        options: ClientOptions,
    ) -> Result<Self, TransportError> {
        let (session, outbound) = Session::new(Arc::clone(&config));
        let stream =
            TransportStream::connect(&config.host, config.port.number, config.port.tls).await?;
        info!(server = %config.name, tls = stream.is_tls(), "connected");
        Ok(Self::with_session(session, outbound, stream, options))
    }
}

impl<S: AsyncRead + AsyncWrite> Client<S> {
    /// Wrap an already-connected stream and start registration.
    pub fn from_stream(config: Arc<ServerConfig>, stream: S, options: ClientOptions) -> Self {
        let (session, outbound) = Session::new(config);
        Self::with_session(session, outbound, stream, options)
    }

    fn with_session(
        mut session: Session,
        outbound: mpsc::UnboundedReceiver<Message>,
        stream: S,
        options: ClientOptions,
    ) -> Self {
        let (read, write) = tokio::io::split(stream);
        session.begin_registration();
        Self {
            session,
            reader: FrameReader::with_read_size(read, options.read_size),
            writer: FrameWriter::new(write),
            outbound,
            options,
        }
    }

    pub fn handle(&self) -> &ClientHandle {
        self.session.handle()
    }

    /// Subscribe to events before calling [`Client::run`].
    pub fn bus_mut(&mut self) -> &mut EventBus {
        self.session.bus_mut()
    }

    /// Drive the connection until it closes.
    pub async fn run(self) -> ClientExit {
        let span = spans::connection(&self.session.config().name, &self.session.config().host);
        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> ClientExit {
        let interval = self.options.ping_interval;
        let idle = tokio::time::sleep(interval);
        tokio::pin!(idle);

        let disconnect = loop {
            tokio::select! {
                read = self.reader.read_frames() => match read {
                    Ok(ReadOutcome::Frames(frames)) => {
                        idle.as_mut().reset(Instant::now() + interval);
                        for frame in frames {
                            self.session.handle_frame(&frame);
                        }
                    }
                    Ok(ReadOutcome::Closed) => break DisconnectReason::Eof,
                    Err(e) => break DisconnectReason::Transport(e.to_string()),
                },
                Some(msg) = self.outbound.recv() => {
                    debug!(target: RAW_TARGET, "<< {}", msg.to_string().trim_end());
                    if let Err(e) = self.writer.send(msg).await {
                        break DisconnectReason::Transport(e.to_string());
                    }
                }
                () = &mut idle => {
                    if self.session.on_idle() == Liveness::Dead {
                        break DisconnectReason::PingTimeout;
                    }
                    idle.as_mut().reset(Instant::now() + interval);
                }
            }
        };

        let reason = match self.session.close_reason() {
            Some(text) => format!("{} ({})", disconnect, text),
            None => disconnect.to_string(),
        };
        self.session.shut_down(&reason);
        if let Err(e) = self.writer.close().await {
            debug!(error = %e, "error closing write half");
        }

        let quitting = self.session.handle().is_quitting();
        if quitting {
            info!(reason = %reason, "connection closed");
        } else {
            warn!(reason = %reason, "connection lost");
        }

        ClientExit {
            config: Arc::clone(self.session.config()),
            reason: if quitting {
                ExitReason::Quit
            } else {
                ExitReason::Died(disconnect)
            },
        }
    }
}
