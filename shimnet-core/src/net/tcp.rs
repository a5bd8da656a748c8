// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TCP Channel
//!
//! Non-blocking TCP sockets driven by an explicit single-socket poll.
//! Every channel owns its own `mio` poller; readiness is re-armed before each
//! wait so a poll always reflects the socket's current state.

use std::io::{self, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr};
use std::time::Duration;

use mio::net::{TcpListener as MioListener, TcpStream as MioStream};
use mio::{Events, Interest, Poll, Token};
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use tracing::{debug, warn};

use crate::error::{NetError, NetResult};

const CHANNEL: Token = Token(0);
const LISTEN_BACKLOG: i32 = 128;
/// Wait slice used while a write is blocked on back-pressure.
const WRITE_WAIT: Duration = Duration::from_millis(500);

/// Outcome of a readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// The socket is ready for the requested operation.
    Ready,
    /// The timeout elapsed with no readiness. Not a failure.
    Continue,
}

/// Socket options applied to every connected or accepted channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpConfig {
    /// SO_RCVBUF in bytes.
    pub recv_buffer_size: usize,
    /// SO_SNDBUF in bytes.
    pub send_buffer_size: usize,
    pub keepalive: bool,
    pub nodelay: bool,
    pub reuse_address: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            recv_buffer_size: 64 * 1024,
            send_buffer_size: 64 * 1024,
            keepalive: true,
            nodelay: true,
            reuse_address: true,
        }
    }
}

impl TcpConfig {
    fn apply(&self, socket: SockRef<'_>) -> io::Result<()> {
        socket.set_recv_buffer_size(self.recv_buffer_size)?;
        socket.set_send_buffer_size(self.send_buffer_size)?;
        socket.set_keepalive(self.keepalive)?;
        socket.set_reuse_address(self.reuse_address)?;
        socket.set_nodelay(self.nodelay)?;
        Ok(())
    }
}

/// A connected, always non-blocking TCP socket.
///
/// Dropping the channel shuts down both directions and closes the socket.
pub struct TcpChannel {
    stream: MioStream,
    poll: Poll,
    events: Events,
}

impl std::fmt::Debug for TcpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpChannel")
            .field("peer", &self.stream.peer_addr().ok())
            .finish()
    }
}

impl TcpChannel {
    /// Connects to `ip:port`, waiting at most `timeout` for the handshake.
    ///
    /// Fails without retrying on any step.
    pub fn connect(ip: &str, port: u16, timeout: Duration, config: &TcpConfig) -> NetResult<Self> {
        let ip: IpAddr = super::dns::parse_literal(ip)
            .ok_or_else(|| NetError::ConnectionFailed(format!("not an IP address: {}", ip)))?;
        Self::connect_addr(SocketAddr::new(ip, port), timeout, config)
    }

    /// Connects to an already resolved socket address.
    pub fn connect_addr(addr: SocketAddr, timeout: Duration, config: &TcpConfig) -> NetResult<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        config.apply(SockRef::from(&socket))?;

        match socket.connect(&addr.into()) {
            Ok(()) => {}
            Err(e) if connect_in_progress(&e) => {}
            Err(e) => return Err(NetError::ConnectionFailed(format!("{}: {}", addr, e))),
        }

        let mut channel = Self::from_stream(MioStream::from_std(socket.into()))?;

        if channel.poll(true, timeout)? == PollStatus::Continue {
            return Err(NetError::ConnectionFailed(format!(
                "{}: timed out after {} ms",
                addr,
                timeout.as_millis()
            )));
        }
        if let Some(err) = channel.stream.take_error()? {
            return Err(NetError::ConnectionFailed(format!("{}: {}", addr, err)));
        }
        // A socket that polled writable without a pending error may still be unconnected.
        channel
            .stream
            .peer_addr()
            .map_err(|e| NetError::ConnectionFailed(format!("{}: {}", addr, e)))?;

        debug!("connected to {}", addr);
        Ok(channel)
    }

    fn from_stream(mut stream: MioStream) -> NetResult<Self> {
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut stream, CHANNEL, Interest::READABLE | Interest::WRITABLE)?;
        Ok(TcpChannel {
            stream,
            poll,
            events: Events::with_capacity(4),
        })
    }

    /// Waits until the socket is readable (or writable when `want_write`).
    ///
    /// Error and hang-up conditions report `Ready` so the following I/O call
    /// surfaces the actual failure.
    pub fn poll(&mut self, want_write: bool, timeout: Duration) -> NetResult<PollStatus> {
        let interest = if want_write {
            Interest::WRITABLE
        } else {
            Interest::READABLE
        };
        self.poll
            .registry()
            .reregister(&mut self.stream, CHANNEL, interest)?;

        loop {
            match self.poll.poll(&mut self.events, Some(timeout)) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let ready = self.events.iter().any(|event| {
            event.token() == CHANNEL
                && (event.is_error()
                    || if want_write {
                        event.is_writable() || event.is_write_closed()
                    } else {
                        event.is_readable() || event.is_read_closed()
                    })
        });

        Ok(if ready {
            PollStatus::Ready
        } else {
            PollStatus::Continue
        })
    }

    /// Fills `buf` completely.
    ///
    /// `timeout` bounds the wait before each received chunk, not the whole
    /// call: a peer that keeps sending within the timeout keeps the read alive.
    pub fn read(&mut self, buf: &mut [u8], timeout: Duration) -> NetResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.poll(false, timeout)? == PollStatus::Continue {
                return Err(NetError::Timeout);
            }
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => return Err(NetError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(e) if is_retryable(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Sends all of `buf`, retrying partial sends. Blocks on back-pressure
    /// without a deadline.
    pub fn write(&mut self, buf: &[u8]) -> NetResult<()> {
        let mut sent = 0;
        while sent < buf.len() {
            match self.stream.write(&buf[sent..]) {
                Ok(0) => return Err(NetError::ConnectionClosed),
                Ok(n) => sent += n,
                Err(e) if is_retryable(&e) => {
                    self.poll(true, WRITE_WAIT)?;
                }
                Err(e) => {
                    warn!("tcp write failed after {} of {} bytes: {}", sent, buf.len(), e);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    pub fn peer_addr(&self) -> NetResult<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }

    pub fn local_addr(&self) -> NetResult<SocketAddr> {
        Ok(self.stream.local_addr()?)
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// A listening socket producing [`TcpChannel`]s.
pub struct TcpAcceptor {
    listener: MioListener,
    poll: Poll,
    events: Events,
    config: TcpConfig,
}

impl TcpAcceptor {
    /// Binds and listens on `ip:port`. Port 0 picks an ephemeral port.
    pub fn listen(ip: &str, port: u16, config: &TcpConfig) -> NetResult<Self> {
        let ip: IpAddr = super::dns::parse_literal(ip)
            .ok_or_else(|| NetError::ConnectionFailed(format!("not an IP address: {}", ip)))?;
        let addr = SocketAddr::new(ip, port);

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(config.reuse_address)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(LISTEN_BACKLOG)?;

        let mut listener = MioListener::from_std(socket.into());
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, CHANNEL, Interest::READABLE)?;

        debug!("listening on {}", addr);
        Ok(TcpAcceptor {
            listener,
            poll,
            events: Events::with_capacity(4),
            config: config.clone(),
        })
    }

    /// Waits up to `timeout` for a connection. `Ok(None)` means none arrived.
    ///
    /// Accepted channels get the listener's socket options.
    pub fn accept(&mut self, timeout: Duration) -> NetResult<Option<TcpChannel>> {
        self.poll
            .registry()
            .reregister(&mut self.listener, CHANNEL, Interest::READABLE)?;
        loop {
            match self.poll.poll(&mut self.events, Some(timeout)) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if self.events.is_empty() {
            return Ok(None);
        }

        match self.listener.accept() {
            Ok((stream, peer)) => {
                self.config.apply(SockRef::from(&stream))?;
                debug!("accepted {}", peer);
                TcpChannel::from_stream(stream).map(Some)
            }
            Err(e) if is_retryable(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn local_addr(&self) -> NetResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

fn is_retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn connect_in_progress(err: &io::Error) -> bool {
    #[cfg(unix)]
    if err.raw_os_error() == Some(libc::EINPROGRESS) {
        return true;
    }
    err.kind() == io::ErrorKind::WouldBlock
}
