// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Module
//!
//! DNS resolution, non-blocking TCP channels and the byte-stream
//! [`Transport`] abstraction the upper layers are written against.
//!
//! # Architecture
//!
//! ```text
//! WebSocket / HTTP
//!        │
//!   ┌────┴────┐
//!   │   Net   │  Plain(TcpChannel) | Secure(SecureChannel<TcpChannel>)
//!   └────┬────┘
//!        │  optional CONNECT tunnel through ProxyConfig
//!   TcpChannel ── mio poll + socket2 options
//!        │
//!   Resolver (system DNS)
//! ```

pub mod dns;
mod mock;
pub mod tcp;
mod transport;

pub use dns::{query, Resolver, SystemResolver};
pub use mock::MockTransport;
pub use tcp::{PollStatus, TcpAcceptor, TcpChannel, TcpConfig};
pub use transport::{default_port, Net, NetConfig, Transport};
