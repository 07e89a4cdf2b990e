// src/listener/handle.rs
use arc_swap::ArcSwapOption;
use futures::stream::{self, Stream};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use super::error::ListenerError;
use super::tls::{TlsConnection, TlsListener};
use super::traits::Listener;

/// The socket a handle owns.
pub(crate) enum Bound {
    Plain(TcpListener),
    Tls(TlsListener<TcpListener>),
}

impl Bound {
    async fn accept(&self) -> io::Result<(Connection, SocketAddr)> {
        match self {
            Bound::Plain(listener) => {
                let (stream, peer) = Listener::accept(listener).await?;
                Ok((Connection::Plain(stream), peer))
            }
            Bound::Tls(listener) => {
                let (stream, peer) = listener.accept().await?;
                Ok((Connection::Tls(Box::new(stream)), peer))
            }
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Bound::Plain(listener) => Listener::local_addr(listener),
            Bound::Tls(listener) => listener.local_addr(),
        }
    }

    fn network(&self) -> &'static str {
        match self {
            Bound::Plain(listener) => listener.network(),
            Bound::Tls(listener) => listener.network(),
        }
    }
}

/// A bound SMTP listening socket.
///
/// Share it behind an `Arc` to run several accept loops at once. The socket is
/// released by [`close`](Self::close) or when the handle is dropped; a second
/// `close` fails with [`ListenerError::AlreadyClosed`].
pub struct ListenerHandle {
    local_addr: SocketAddr,
    network: &'static str,
    secured: bool,
    bound: ArcSwapOption<Bound>,
    closed_tx: watch::Sender<bool>,
}

impl ListenerHandle {
    pub(crate) fn new(bound: Bound) -> io::Result<Self> {
        let (closed_tx, _) = watch::channel(false);

        Ok(Self {
            local_addr: bound.local_addr()?,
            network: bound.network(),
            secured: matches!(bound, Bound::Tls(_)),
            bound: ArcSwapOption::from_pointee(bound),
            closed_tx,
        })
    }

    /// Network family of the bound address, `"tcp"` for plain and TLS alike.
    pub fn network(&self) -> &'static str {
        self.network
    }

    /// Address the socket is bound to, including the OS-assigned port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_secured(&self) -> bool {
        self.secured
    }

    pub fn is_closed(&self) -> bool {
        self.bound.load().is_none()
    }

    /// Wait for the next connection.
    ///
    /// Returns as soon as the TCP connection is accepted. On TLS handles the
    /// handshake runs later, inside the returned [`Connection`], so one stalled
    /// client never blocks the accept loop. Pending calls return
    /// [`ListenerError::AlreadyClosed`] once the handle is closed.
    pub async fn accept(&self) -> Result<(Connection, SocketAddr), ListenerError> {
        let mut closed_rx = self.closed_tx.subscribe();
        let bound = self.bound.load_full().ok_or(ListenerError::AlreadyClosed)?;

        tokio::select! {
            accepted = bound.accept() => accepted.map_err(ListenerError::Accept),
            _ = wait_closed(&mut closed_rx) => Err(ListenerError::AlreadyClosed),
        }
    }

    /// Repeated [`accept`](Self::accept) calls as a stream, ending on close.
    pub fn incoming(&self) -> impl Stream<Item = Result<(Connection, SocketAddr), ListenerError>> + '_ {
        stream::unfold(self, |handle| async move {
            match handle.accept().await {
                Err(ListenerError::AlreadyClosed) => None,
                accepted => Some((accepted, handle)),
            }
        })
    }

    /// Release the listening socket. Already accepted connections stay open.
    pub fn close(&self) -> Result<(), ListenerError> {
        let bound = self.bound.swap(None).ok_or(ListenerError::AlreadyClosed)?;
        self.closed_tx.send_replace(true);
        drop(bound);

        tracing::debug!(addr = %self.local_addr, "SMTP listener closed");
        Ok(())
    }
}

async fn wait_closed(closed_rx: &mut watch::Receiver<bool>) {
    let _ = closed_rx.wait_for(|closed| *closed).await;
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local_addr)
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("network", &self.network)
            .field("local_addr", &self.local_addr)
            .field("secured", &self.secured)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// An accepted client stream.
///
/// On secured handles the TLS handshake is completed by the first read or
/// write, or up front with [`handshake`](Self::handshake).
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsConnection<TcpStream>>),
}

impl Connection {
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Connection::Plain(stream) => stream.peer_addr(),
            Connection::Tls(stream) => Ok(stream.peer_addr()),
        }
    }

    /// Finish the TLS handshake. A no-op for plain connections.
    pub async fn handshake(&mut self) -> io::Result<()> {
        match self {
            Connection::Plain(_) => Ok(()),
            Connection::Tls(stream) => stream.handshake().await,
        }
    }

    pub fn is_secured(&self) -> bool {
        matches!(self, Connection::Tls(_))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.peer_addr().ok())
            .field("secured", &self.is_secured())
            .finish()
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Connection::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Connection::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Connection::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Connection::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}
