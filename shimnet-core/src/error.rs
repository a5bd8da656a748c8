// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types
//!
//! One error type shared by every layer of the stack. Transient conditions
//! (poll timeouts, handshake "not yet") are never errors; they are reported
//! through the per-layer status enums instead.

use std::io;

use thiserror::Error;

/// Result type for network operations.
pub type NetResult<T> = Result<T, NetError>;

/// Network, protocol and trust error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("DNS resolution failed: {0}")]
    Resolve(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("DTLS error: {0}")]
    Dtls(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Peer fingerprint mismatch: expected {expected}, found {found}")]
    FingerprintMismatch { expected: String, found: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid HTTP header: {0}")]
    InvalidHeader(String),

    #[error("HTTP header exceeds {0} bytes")]
    HeaderTooLarge(usize),

    #[error("Proxy rejected CONNECT with status {0}")]
    ProxyRejected(u16),

    #[error("WebSocket upgrade rejected with status {0}")]
    UpgradeRejected(u16),

    #[error("Sec-WebSocket-Accept does not match the request key")]
    AcceptKeyMismatch,

    #[error("Frame of {size} bytes exceeds limit of {limit}")]
    FrameTooLarge { size: u64, limit: usize },

    #[error("No pong received within {0} ms")]
    PongTimeout(u64),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Output buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Response body exceeds {0} bytes")]
    ResponseTooLarge(usize),

    #[error("Decompression failed: {0}")]
    Decompress(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport not connected")]
    NotConnected,
}

impl NetError {
    /// HTTP status observed while upgrading to a WebSocket, if this error
    /// came from the upgrade exchange.
    ///
    /// A wrong accept key still saw `101`, so it reports that status.
    pub fn upgrade_status(&self) -> Option<u16> {
        match self {
            NetError::UpgradeRejected(status) => Some(*status),
            NetError::AcceptKeyMismatch => Some(101),
            _ => None,
        }
    }

    /// Returns true for failures caused by the socket rather than the peer's protocol.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            NetError::Io(_)
                | NetError::ConnectionFailed(_)
                | NetError::ConnectionClosed
                | NetError::Timeout
                | NetError::Resolve(_)
        )
    }
}

impl From<io::Error> for NetError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => NetError::Timeout,
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => NetError::ConnectionClosed,
            io::ErrorKind::ConnectionRefused => NetError::ConnectionFailed(err.to_string()),
            _ => NetError::Io(err.to_string()),
        }
    }
}

#[cfg(feature = "dtls")]
impl From<openssl::error::ErrorStack> for NetError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        NetError::Dtls(err.to_string())
    }
}
