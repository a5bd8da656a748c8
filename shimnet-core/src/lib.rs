// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shimnet Core Library
//!
//! Client-side secure network transport: DNS, non-blocking TCP, TLS over
//! any transport, DTLS with fingerprint pinning, HTTP headers with proxy
//! CONNECT, and a WebSocket client.
//! Digests and randomness use the audited `ring` crate.

pub mod buffer;
pub mod crypto;
pub mod dtls;
pub mod error;
pub mod http;
pub mod net;
pub mod tls;
pub mod ws;

pub use buffer::ByteBuffer;
#[cfg(feature = "dtls")]
pub use dtls::{Certificate, DtlsConfig, OpensslDtlsEngine};
pub use dtls::{DtlsChannel, DtlsEngine, DtlsState, Fingerprint};
pub use error::{NetError, NetResult};
pub use http::{fetch, parse_url, HttpHeader, HttpRequest, HttpResponse, ProxyConfig};
pub use net::{MockTransport, Net, NetConfig, PollStatus, TcpAcceptor, TcpChannel, TcpConfig, Transport};
pub use tls::{SecureChannel, TlsConfig};
pub use ws::{WebSocketChannel, WebSocketConfig, WsRead};
