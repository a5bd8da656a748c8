// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TLS Module
//!
//! Record framing, the engine contract and the secure channel.

pub mod record;
mod secure;
mod session;

pub use record::{
    is_dtls_application_data, is_dtls_handshake, is_tls_application_data, is_tls_handshake,
    read_record, RecordHeader, RECORD_HEADER_SIZE,
};
pub use secure::{SecureChannel, SECURE_PADDING};
pub use session::{HandshakeStatus, RustlsSession, TlsConfig, TlsSession};
