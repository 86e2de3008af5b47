//! Plain and TLS client streams.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

use super::error::TransportError;

/// A connected client stream, optionally TLS-wrapped.
pub enum TransportStream {
    /// Plain TCP stream.
    Tcp(TcpStream),
    /// Client-side TLS stream (boxed for size).
    ClientTls(Box<TlsStream<TcpStream>>),
}

impl TransportStream {
    /// Open a connection to `host:port`, wrapping it in TLS when asked.
    ///
    /// TLS verifies the server against the platform trust store.
    pub async fn connect(host: &str, port: u16, tls: bool) -> Result<Self, TransportError> {
        let scheme = if tls { "ircs" } else { "irc" };
        info!("Connecting to {}://{}:{}", scheme, host, port);

        let tcp = TcpStream::connect((host, port)).await?;
        if let Err(e) = tcp.set_nodelay(true) {
            debug!("failed to set TCP_NODELAY: {}", e);
        }

        if !tls {
            return Ok(Self::Tcp(tcp));
        }

        let server_name = ServerName::try_from(host.to_owned())
            .map_err(|_| TransportError::InvalidServerName(host.to_owned()))?;
        let connector = TlsConnector::from(Arc::new(client_config()));
        let stream = connector.connect(server_name, tcp).await?;
        Ok(Self::ClientTls(Box::new(stream)))
    }

    /// True for TLS streams.
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::ClientTls(_))
    }
}

fn client_config() -> ClientConfig {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for e in &certs.errors {
        warn!("Error loading native certs: {}", e);
    }
    let (added, ignored) = roots.add_parsable_certificates(certs.certs);
    debug!(added, ignored, "loaded platform trust store");

    ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}

impl AsyncRead for TransportStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_read(cx, buf),
            Self::ClientTls(inner) => Pin::new(inner.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TransportStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_write(cx, buf),
            Self::ClientTls(inner) => Pin::new(inner.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_flush(cx),
            Self::ClientTls(inner) => Pin::new(inner.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_shutdown(cx),
            Self::ClientTls(inner) => Pin::new(inner.as_mut()).poll_shutdown(cx),
        }
    }
}
