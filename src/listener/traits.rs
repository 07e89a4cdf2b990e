// src/listener/traits.rs
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

/// Anything that hands out connected streams.
///
/// Plain TCP implements this directly; TLS is layered on top by wrapping
/// another `Listener` (see [`TlsListener`](super::TlsListener)), so both stay
/// interchangeable for the accept loops above them.
#[async_trait]
pub trait Listener: Send + Sync {
    type Conn: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn accept(&self) -> io::Result<(Self::Conn, SocketAddr)>;

    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Network family reported for the bound address.
    fn network(&self) -> &'static str {
        "tcp"
    }
}

#[async_trait]
impl Listener for TcpListener {
    type Conn = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}
