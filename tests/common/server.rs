//! Scripted IRC server.
//!
//! Accepts bot connections on an ephemeral port and lets a test read the
//! lines the bot sends and write lines back, one at a time.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// A listening test server.
pub struct TestServer {
    listener: TcpListener,
}

impl TestServer {
    /// Bind to an ephemeral localhost port.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    /// Bind to a specific localhost port.
    #[allow(dead_code)]
    pub async fn bind_port(port: u16) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        Ok(Self { listener })
    }

    pub fn port(&self) -> u16 {
        self.listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or_default()
    }

    /// Wait for the bot to connect.
    pub async fn accept(&self) -> anyhow::Result<TestConnection> {
        let (stream, _) = timeout(STEP_TIMEOUT, self.listener.accept()).await??;
        let (read, write) = stream.into_split();
        Ok(TestConnection {
            reader: BufReader::new(read),
            writer: write,
        })
    }

    /// Fail if the bot connects within `window`.
    #[allow(dead_code)]
    pub async fn expect_no_connection(&self, window: Duration) -> anyhow::Result<()> {
        match timeout(window, self.listener.accept()).await {
            Err(_) => Ok(()),
            Ok(Ok((_, addr))) => anyhow::bail!("unexpected connection from {addr}"),
            Ok(Err(e)) => Err(e.into()),
        }
    }
}

/// One accepted bot connection.
pub struct TestConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

#[allow(dead_code)]
impl TestConnection {
    /// Send one line, CRLF appended.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next line from the bot, without its terminator. `None` on close.
    pub async fn recv(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let n = timeout(STEP_TIMEOUT, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    /// Read the next line and assert it equals `expected`.
    pub async fn expect(&mut self, expected: &str) -> anyhow::Result<()> {
        match self.recv().await? {
            Some(line) if line == expected => Ok(()),
            Some(line) => anyhow::bail!("expected {expected:?}, got {line:?}"),
            None => anyhow::bail!("expected {expected:?}, got end of stream"),
        }
    }

    /// Skip lines until one satisfies `predicate`, returning it.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            match self.recv().await? {
                Some(line) if predicate(&line) => return Ok(line),
                Some(_) => continue,
                None => anyhow::bail!("stream closed before a matching line"),
            }
        }
    }

    /// Consume NICK and USER, then welcome the bot as `nick`.
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<()> {
        self.expect(&format!("NICK {nick}")).await?;
        self.expect("USER tama 0 * :Tama bot").await?;
        self.send(&format!(":irc.test 001 {nick} :Welcome to the test network"))
            .await
    }

    /// Wait for the bot to close its side.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        loop {
            if self.recv().await?.is_none() {
                return Ok(());
            }
        }
    }
}
