// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TLS Session Engine
//!
//! Record-level engine contract used by the secure channel, and its rustls
//! implementation. The engine never touches a socket: whole records go in,
//! ciphertext flights and plaintext come out.

use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore};
use serde::{Deserialize, Serialize};

use crate::buffer::ByteBuffer;
use crate::error::{NetError, NetResult};

/// Outcome of one handshake step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStatus {
    /// More peer input is needed.
    Continue,
    /// Handshake finished; application data may flow.
    Complete,
}

/// Record-oriented TLS client engine.
pub trait TlsSession: Send {
    /// Advances the handshake.
    ///
    /// The first call gets `None` and must produce the opening flight and
    /// report `Continue`. Later calls get exactly one peer record. Outbound
    /// bytes are appended to `out`.
    fn handshake(&mut self, input: Option<&[u8]>, out: &mut ByteBuffer) -> NetResult<HandshakeStatus>;

    /// Encrypts `plain` and appends the resulting records to `out`.
    fn encrypt(&mut self, plain: &[u8], out: &mut ByteBuffer) -> NetResult<()>;

    /// Decrypts one record, appending plaintext to `plain`. Returns the number
    /// of plaintext bytes produced (0 for records carrying none).
    fn decrypt(&mut self, record: &[u8], plain: &mut ByteBuffer) -> NetResult<usize>;
}

/// Trust configuration for the secure channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Trust the bundled Mozilla root set.
    pub use_webpki_roots: bool,
    /// Extra DER-encoded trust anchors.
    pub additional_roots: Vec<Vec<u8>>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig {
            use_webpki_roots: true,
            additional_roots: Vec::new(),
        }
    }
}

impl TlsConfig {
    /// Trusts only the given DER certificate.
    pub fn trusting(cert_der: Vec<u8>) -> Self {
        TlsConfig {
            use_webpki_roots: false,
            additional_roots: vec![cert_der],
        }
    }

    fn client_config(&self) -> NetResult<ClientConfig> {
        let mut roots = RootCertStore::empty();

        #[cfg(feature = "webpki")]
        if self.use_webpki_roots {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        for der in &self.additional_roots {
            roots
                .add(CertificateDer::from(der.clone()))
                .map_err(|e| NetError::Tls(format!("invalid trust anchor: {}", e)))?;
        }

        if roots.is_empty() {
            return Err(NetError::Tls("no trust anchors configured".into()));
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| NetError::Tls(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(config)
    }
}

/// [`TlsSession`] backed by a rustls client connection.
pub struct RustlsSession {
    conn: ClientConnection,
}

impl RustlsSession {
    /// Creates a client session for `host` (SNI and certificate name).
    pub fn new(host: &str, config: &TlsConfig) -> NetResult<Self> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| NetError::Tls(format!("Invalid server name: {}", host)))?;
        let conn = ClientConnection::new(Arc::new(config.client_config()?), server_name)
            .map_err(|e| NetError::Tls(format!("TLS setup failed: {}", e)))?;
        Ok(RustlsSession { conn })
    }

    fn feed(&mut self, record: &[u8]) -> NetResult<()> {
        let mut cursor = Cursor::new(record);
        while (cursor.position() as usize) < record.len() {
            let n = self
                .conn
                .read_tls(&mut cursor)
                .map_err(|e| NetError::Tls(e.to_string()))?;
            if n == 0 {
                break;
            }
            self.conn
                .process_new_packets()
                .map_err(|e| NetError::Tls(e.to_string()))?;
        }
        Ok(())
    }

    fn drain(&mut self, out: &mut ByteBuffer) -> NetResult<()> {
        while self.conn.wants_write() {
            self.conn.write_tls(out)?;
        }
        Ok(())
    }
}

impl TlsSession for RustlsSession {
    fn handshake(&mut self, input: Option<&[u8]>, out: &mut ByteBuffer) -> NetResult<HandshakeStatus> {
        if let Some(record) = input {
            self.feed(record)?;
        }
        self.drain(out)?;

        if self.conn.is_handshaking() {
            Ok(HandshakeStatus::Continue)
        } else {
            Ok(HandshakeStatus::Complete)
        }
    }

    fn encrypt(&mut self, plain: &[u8], out: &mut ByteBuffer) -> NetResult<()> {
        self.conn.writer().write_all(plain)?;
        self.drain(out)
    }

    fn decrypt(&mut self, record: &[u8], plain: &mut ByteBuffer) -> NetResult<usize> {
        self.feed(record)?;

        let mut produced = 0;
        let mut chunk = [0u8; 4096];
        loop {
            match self.conn.reader().read(&mut chunk) {
                // Clean close_notify from the peer.
                Ok(0) if produced == 0 => return Err(NetError::ConnectionClosed),
                Ok(0) => break,
                Ok(n) => {
                    plain.extend_from_slice(&chunk[..n]);
                    produced += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(produced)
    }
}
