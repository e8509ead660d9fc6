//! Plain or TLS byte streams, one per pooled connection.

use std::net::SocketAddr;
use std::ops::DerefMut;
use std::pin::Pin;
#[cfg(feature = "transport-tls")]
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

#[cfg(feature = "transport-tls")]
use tokio_rustls::{client::TlsStream, TlsConnector};

#[cfg(feature = "transport-tls")]
pub type TlsConfig = Option<Arc<rustls::ClientConfig>>;

#[cfg(not(feature = "transport-tls"))]
#[allow(missing_copy_implementations)]
#[derive(Debug, Clone, Default)]
pub struct TlsConfig();

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Connecting to the endpoint timed out")]
    ConnectTimeout,

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(std::io::Error),

    #[cfg(feature = "transport-tls")]
    #[error("Invalid hostname: {0}")]
    BadHostname(#[from] rustls::pki_types::InvalidDnsNameError),

    #[error("Endpoint is https but no TLS configuration was provided")]
    TlsConfigMissing,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A plain or TLS-wrapped byte stream to the service.
#[cfg(feature = "transport-tls")]
#[derive(Debug)]
pub enum Transport {
    Plain {
        inner: TcpStream,
    },

    Tls {
        inner: Pin<Box<TlsStream<TcpStream>>>,
    },
}

#[cfg(not(feature = "transport-tls"))]
#[derive(Debug)]
pub enum Transport {
    Plain { inner: TcpStream },
}

impl AsyncRead for Transport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.deref_mut() {
            Self::Plain { inner } => Pin::new(inner).poll_read(cx, buf),

            #[cfg(feature = "transport-tls")]
            Self::Tls { inner } => inner.as_mut().poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.deref_mut() {
            Self::Plain { inner } => Pin::new(inner).poll_write(cx, buf),

            #[cfg(feature = "transport-tls")]
            Self::Tls { inner } => inner.as_mut().poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.deref_mut() {
            Self::Plain { inner } => Pin::new(inner).poll_flush(cx),

            #[cfg(feature = "transport-tls")]
            Self::Tls { inner } => inner.as_mut().poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.deref_mut() {
            Self::Plain { inner } => Pin::new(inner).poll_shutdown(cx),

            #[cfg(feature = "transport-tls")]
            Self::Tls { inner } => inner.as_mut().poll_shutdown(cx),
        }
    }
}

impl Transport {
    /// Opens a TCP connection to `addr` and, for https endpoints, runs the
    /// TLS handshake with `host` as SNI; the certificate is verified
    /// against that name (RFC 2818) by rustls.
    pub async fn connect(
        addr: SocketAddr,
        host: &str,
        use_tls: bool,
        tls_config: TlsConfig,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let tcp_stream = Self::connect_timeout(addr, timeout).await?;
        if !use_tls {
            return Ok(Self::Plain { inner: tcp_stream });
        }
        Self::wrap_tls(tcp_stream, host, tls_config).await
    }

    async fn connect_timeout(addr: SocketAddr, timeout: Option<Duration>) -> Result<TcpStream> {
        match timeout {
            Some(timeout) => Ok(tokio::time::timeout(timeout, TcpStream::connect(addr))
                .await
                .map_err(|_| Error::ConnectTimeout)??),
            None => Ok(TcpStream::connect(addr).await?),
        }
    }

    #[cfg(feature = "transport-tls")]
    async fn wrap_tls(tcp_stream: TcpStream, host: &str, tls_config: TlsConfig) -> Result<Self> {
        let config = tls_config.ok_or(Error::TlsConfigMissing)?;
        let server_name = rustls::pki_types::ServerName::try_from(host.to_owned())?;

        let connector = TlsConnector::from(config);
        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(Error::TlsHandshake)?;
        Ok(Self::Tls {
            inner: Box::pin(tls_stream),
        })
    }

    #[cfg(not(feature = "transport-tls"))]
    async fn wrap_tls(
        _tcp_stream: TcpStream,
        _host: &str,
        _tls_config: TlsConfig,
    ) -> Result<Self> {
        Err(Error::TlsConfigMissing)
    }
}
