// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Channel
//!
//! Client WebSocket over a plain or secure [`Net`] connection (or any other
//! transport). Outgoing frames are always masked. Liveness is kept with an
//! implicit ping on every read once the ping interval has passed; a missing
//! pong for three intervals fails the read.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::frame::{encode_frame, read_frame, Opcode};
use super::handshake::client_handshake;
use crate::buffer::ByteBuffer;
use crate::crypto::random_array;
use crate::error::{NetError, NetResult};
use crate::http::parse_url;
use crate::net::{default_port, Net, NetConfig, PollStatus, Transport};

/// Close code sent by [`WebSocketChannel::close`].
pub const CLOSE_NORMAL: u16 = 1000;

const PING_PAYLOAD: &[u8] = b"ping";
const PONG_TIMEOUT_FACTOR: u32 = 3;

/// Configuration for WebSocket channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Interval between implicit pings in milliseconds.
    pub ping_interval_ms: u64,
    /// Per-read timeout while pulling a frame that has started arriving.
    pub frame_timeout_ms: u64,
    /// Largest accepted frame payload.
    pub max_message_size: usize,
    pub net: NetConfig,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        WebSocketConfig {
            ping_interval_ms: 60_000,
            frame_timeout_ms: 1_000,
            max_message_size: 1024 * 1024,
            net: NetConfig::default(),
        }
    }
}

impl WebSocketConfig {
    fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    fn pong_timeout(&self) -> Duration {
        self.ping_interval() * PONG_TIMEOUT_FACTOR
    }
}

/// Result of one [`WebSocketChannel::read`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsRead {
    /// Nothing for the caller yet (timeout, control frame, heartbeat).
    Continue,
    /// A complete text message.
    Message(String),
    /// The peer closed the connection with this code (0 when none was sent).
    Closed(u16),
}

/// Client WebSocket connection.
pub struct WebSocketChannel<T: Transport = Net> {
    transport: T,
    connected: bool,
    mask: bool,
    last_ping: Instant,
    last_pong: Instant,
    close_code: u16,
    scratch: ByteBuffer,
    config: WebSocketConfig,
}

impl<T: Transport> std::fmt::Debug for WebSocketChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketChannel")
            .field("connected", &self.connected)
            .field("close_code", &self.close_code)
            .finish()
    }
}

impl WebSocketChannel<Net> {
    /// Connects to `host:port` and upgrades `path`. Port 0 picks the
    /// scheme default.
    ///
    /// On an upgrade failure, [`NetError::upgrade_status`] gives the HTTP
    /// status the server answered with.
    pub fn connect(
        host: &str,
        port: u16,
        secure: bool,
        path: &str,
        headers: &str,
        timeout: Duration,
        config: &WebSocketConfig,
    ) -> NetResult<Self> {
        let port = if port == 0 { default_port(secure) } else { port };
        let transport = Net::connect(host, port, secure, timeout, &config.net)?;

        let host_header = if port == default_port(secure) {
            host.to_string()
        } else {
            format!("{}:{}", host, port)
        };
        let channel = Self::handshake(transport, &host_header, path, headers, timeout, config)?;
        info!("WebSocket connected to {}{}", host_header, path);
        Ok(channel)
    }

    /// Connects to a `ws://` or `wss://` URL.
    pub fn connect_url(
        url: &str,
        headers: &str,
        timeout: Duration,
        config: &WebSocketConfig,
    ) -> NetResult<Self> {
        let parsed = parse_url(url)?;
        Self::connect(
            &parsed.host,
            parsed.port,
            parsed.secure,
            &parsed.path,
            headers,
            timeout,
            config,
        )
    }
}

impl<T: Transport> WebSocketChannel<T> {
    /// Performs the upgrade over an already connected transport.
    pub fn handshake(
        mut transport: T,
        host: &str,
        path: &str,
        headers: &str,
        timeout: Duration,
        config: &WebSocketConfig,
    ) -> NetResult<Self> {
        client_handshake(&mut transport, host, path, headers, timeout)?;

        let now = Instant::now();
        Ok(WebSocketChannel {
            transport,
            connected: true,
            mask: true,
            last_ping: now,
            last_pong: now,
            close_code: 0,
            scratch: ByteBuffer::new(),
            config: config.clone(),
        })
    }

    fn write_frame(&mut self, opcode: Opcode, payload: &[u8]) -> NetResult<()> {
        let mask = if self.mask {
            Some(random_array::<4>()?)
        } else {
            None
        };
        self.scratch.clear();
        encode_frame(&mut self.scratch, opcode, payload, mask);
        self.transport.write(self.scratch.as_slice())
    }

    /// Sends `text` as one TEXT frame.
    pub fn write_text(&mut self, text: &str) -> NetResult<()> {
        if !self.connected {
            return Err(NetError::NotConnected);
        }
        self.write_frame(Opcode::Text, text.as_bytes())
    }

    /// Waits up to `timeout` for a frame and handles it.
    ///
    /// PING is answered, PONG refreshes liveness, empty TEXT is a heartbeat
    /// and other opcodes are ignored; all of these report `Continue`.
    pub fn read(&mut self, timeout: Duration) -> NetResult<WsRead> {
        if !self.connected {
            return Ok(WsRead::Closed(self.close_code));
        }

        let now = Instant::now();
        if now.duration_since(self.last_ping) > self.config.ping_interval() {
            self.write_frame(Opcode::Ping, PING_PAYLOAD)?;
            self.last_ping = now;
        }

        let mut result = WsRead::Continue;
        if self.transport.poll_readable(timeout)? == PollStatus::Ready {
            let frame = read_frame(
                &mut self.transport,
                Duration::from_millis(self.config.frame_timeout_ms),
                self.config.max_message_size,
            )?;

            match frame.opcode {
                Opcode::Ping => self.write_frame(Opcode::Pong, &frame.payload)?,
                Opcode::Pong => self.last_pong = Instant::now(),
                Opcode::Text if !frame.payload.is_empty() => {
                    let text = String::from_utf8(frame.payload)
                        .map_err(|_| NetError::Protocol("text frame is not valid UTF-8".into()))?;
                    result = WsRead::Message(text);
                }
                Opcode::Close => {
                    self.close_code = match frame.payload.as_slice() {
                        [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
                        _ => 0,
                    };
                    self.acknowledge_close();
                    result = WsRead::Closed(self.close_code);
                }
                _ => {}
            }
        }

        if self.last_pong.elapsed() > self.config.pong_timeout() {
            warn!("no pong for {} ms", self.config.pong_timeout().as_millis());
            return Err(NetError::PongTimeout(self.config.pong_timeout().as_millis() as u64));
        }

        Ok(result)
    }

    /// Echoes the peer's CLOSE once and stops sending.
    fn acknowledge_close(&mut self) {
        let payload = if self.close_code == 0 {
            Vec::new()
        } else {
            self.close_code.to_be_bytes().to_vec()
        };
        if let Err(e) = self.write_frame(Opcode::Close, &payload) {
            debug!("close echo failed: {}", e);
        }
        self.connected = false;
        debug!("peer closed WebSocket with code {}", self.close_code);
    }

    /// Sends CLOSE with code 1000 if still connected. Further calls do nothing.
    pub fn close(&mut self) -> NetResult<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.write_frame(Opcode::Close, &CLOSE_NORMAL.to_be_bytes())
    }

    /// Close code received from the peer, or 0.
    pub fn close_code(&self) -> u16 {
        self.close_code
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> Drop for WebSocketChannel<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("close on drop failed: {}", e);
        }
    }
}
