//! TCP/unix stream and listener wrappers.
//!
//! X displays resolve to either address family; the closed set is
//! modelled as enums with delegating impls. Relay loops use the readiness
//! API (`ready` + `try_read_buf`/`try_write`) so that every socket
//! operation is non-blocking; the bootstrap clients use the stream as a
//! plain `AsyncRead`/`AsyncWrite`.

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, Interest, ReadBuf, Ready};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};
use tracing::info;

use crate::core::display::{DisplayInfo, Family};
use crate::{Error, Result};

pub enum Stream {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl Stream {
    /// Connects to the endpoint a display name resolved to. TCP families
    /// prefer their own address family and fall back to whatever the
    /// resolver offers (v4-mapped operation on dual-stack hosts).
    pub async fn connect(display: &DisplayInfo) -> io::Result<Self> {
        match display.family {
            Family::Unix => {
                let path = display.socket_path.as_ref().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "unix display without socket path")
                })?;
                Ok(Self::Unix(UnixStream::connect(path).await?))
            }
            Family::Inet | Family::Inet6 => {
                let host = display.connect_host();
                let addrs: Vec<_> =
                    tokio::net::lookup_host((host, display.port())).await?.collect();
                let preferred = addrs
                    .iter()
                    .find(|a| match display.family {
                        Family::Inet => a.is_ipv4(),
                        _ => a.is_ipv6(),
                    })
                    .or_else(|| addrs.first())
                    .copied()
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("no address for {host}"),
                        )
                    })?;
                Ok(Self::Tcp(TcpStream::connect(preferred).await?))
            }
        }
    }

    pub async fn ready(&self, interest: Interest) -> io::Result<Ready> {
        match self {
            Self::Tcp(s) => s.ready(interest).await,
            Self::Unix(s) => s.ready(interest).await,
        }
    }

    pub fn try_read_buf(&self, buf: &mut BytesMut) -> io::Result<usize> {
        match self {
            Self::Tcp(s) => s.try_read_buf(buf),
            Self::Unix(s) => s.try_read_buf(buf),
        }
    }

    pub fn try_write(&self, data: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(s) => s.try_write(data),
            Self::Unix(s) => s.try_write(data),
        }
    }

    /// Human description of the peer for log prefixes.
    pub fn peer_desc(&self) -> String {
        match self {
            Self::Tcp(s) => s
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown(tcp)".to_string()),
            Self::Unix(_) => "unknown(local)".to_string(),
        }
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Unix(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_flush(cx),
            Stream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

pub enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener, PathBuf),
}

impl Listener {
    /// Binds the proxy's listening socket per the in display's family. A
    /// stale unix socket file is removed first; the bound file is removed
    /// again on drop.
    pub async fn bind(target: &DisplayInfo) -> Result<Self> {
        match target.family {
            Family::Unix => {
                let path = target
                    .socket_path
                    .clone()
                    .ok_or_else(|| Error::DisplayName(format!("no socket path in '{}'", target.name)))?;
                let _ = std::fs::remove_file(&path);
                let listener = UnixListener::bind(&path).map_err(|e| {
                    Error::Setup(format!("cannot bind unix socket {}: {e}", path.display()))
                })?;
                info!("listening on unix socket {}", path.display());
                Ok(Self::Unix(listener, path))
            }
            Family::Inet => {
                let listener = TcpListener::bind(("0.0.0.0", target.port()))
                    .await
                    .map_err(|e| {
                        Error::Setup(format!("cannot bind port {}: {e}", target.port()))
                    })?;
                info!("listening on 0.0.0.0:{}", target.port());
                Ok(Self::Tcp(listener))
            }
            Family::Inet6 => {
                let listener = TcpListener::bind(("::", target.port()))
                    .await
                    .map_err(|e| {
                        Error::Setup(format!("cannot bind port {}: {e}", target.port()))
                    })?;
                info!("listening on [::]:{}", target.port());
                Ok(Self::Tcp(listener))
            }
        }
    }

    pub async fn accept(&self) -> io::Result<Stream> {
        match self {
            Self::Tcp(l) => {
                let (stream, _) = l.accept().await?;
                Ok(Stream::Tcp(stream))
            }
            Self::Unix(l, _) => {
                let (stream, _) = l.accept().await?;
                Ok(Stream::Unix(stream))
            }
        }
    }

    pub fn unlink(&self) {
        if let Self::Unix(_, path) = self {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.unlink();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unix_listener_binds_and_unlinks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X9");
        let display = DisplayInfo::parse(path.to_str().unwrap()).unwrap();
        let listener = Listener::bind(&display).await.unwrap();
        assert!(path.exists());
        drop(listener);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_accept_and_connect_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X5");
        let display = DisplayInfo::parse(path.to_str().unwrap()).unwrap();
        let listener = Listener::bind(&display).await.unwrap();

        let client = tokio::spawn({
            let display = display.clone();
            async move { Stream::connect(&display).await.unwrap() }
        });
        let accepted = listener.accept().await.unwrap();
        let client = client.await.unwrap();
        assert_eq!(accepted.peer_desc(), "unknown(local)");

        client.ready(Interest::WRITABLE).await.unwrap();
        assert_eq!(client.try_write(b"ping").unwrap(), 4);
        let mut buf = BytesMut::new();
        accepted.ready(Interest::READABLE).await.unwrap();
        let n = accepted.try_read_buf(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }
}
