// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Secure Channel
//!
//! TLS over a byte-stream transport. The engine only accepts whole records,
//! so every read pulls exactly one record off the stream before decrypting.

use std::time::Duration;

use tracing::debug;

use super::record::read_record;
use super::session::{HandshakeStatus, RustlsSession, TlsConfig, TlsSession};
use crate::buffer::ByteBuffer;
use crate::error::{NetError, NetResult};
use crate::net::{PollStatus, Transport};

/// Headroom reserved above the plaintext size when encrypting.
pub const SECURE_PADDING: usize = 32 * 1024;

/// A TLS session bound to the transport it owns.
pub struct SecureChannel<T: Transport, S: TlsSession = RustlsSession> {
    transport: T,
    session: S,
    /// Last record read off the wire; grows to the largest record seen.
    record: ByteBuffer,
    /// Decrypted bytes not yet handed to the caller.
    plain: ByteBuffer,
    scratch: ByteBuffer,
}

impl<T: Transport> SecureChannel<T, RustlsSession> {
    /// Performs a TLS client handshake for `host` over `transport`.
    pub fn connect(transport: T, host: &str, timeout: Duration, config: &TlsConfig) -> NetResult<Self> {
        let session = RustlsSession::new(host, config)?;
        let channel = Self::with_session(transport, session, timeout)?;
        debug!("TLS session established with {}", host);
        Ok(channel)
    }
}

impl<T: Transport, S: TlsSession> SecureChannel<T, S> {
    /// Runs the handshake with a caller-supplied engine.
    ///
    /// On failure the transport and session are dropped.
    pub fn with_session(mut transport: T, mut session: S, timeout: Duration) -> NetResult<Self> {
        let mut record = ByteBuffer::new();
        let mut out = ByteBuffer::new();

        if session.handshake(None, &mut out)? != HandshakeStatus::Continue {
            return Err(NetError::Tls(
                "engine finished the handshake before any peer input".into(),
            ));
        }
        flush(&mut transport, &mut out)?;

        loop {
            read_record(&mut transport, &mut record, timeout)?;
            let status = session.handshake(Some(record.as_slice()), &mut out)?;
            flush(&mut transport, &mut out)?;
            if status == HandshakeStatus::Complete {
                break;
            }
        }

        Ok(SecureChannel {
            transport,
            session,
            record,
            plain: ByteBuffer::new(),
            scratch: ByteBuffer::new(),
        })
    }

    /// Fills `buf` with plaintext, reading and decrypting records as needed.
    ///
    /// Bytes left over from a record stay buffered for the next call.
    pub fn read(&mut self, buf: &mut [u8], timeout: Duration) -> NetResult<()> {
        while self.plain.len() < buf.len() {
            read_record(&mut self.transport, &mut self.record, timeout)?;
            self.plain.ensure_capacity(self.record.len());
            self.session.decrypt(self.record.as_slice(), &mut self.plain)?;
        }
        self.plain.take_into(buf);
        Ok(())
    }

    /// Encrypts `buf` and sends the records in one transport write.
    pub fn write(&mut self, buf: &[u8]) -> NetResult<()> {
        self.scratch.clear();
        self.scratch.ensure_capacity(buf.len() + SECURE_PADDING);
        self.session.encrypt(buf, &mut self.scratch)?;
        self.transport.write(self.scratch.as_slice())
    }

    /// Ready when decrypted bytes are already buffered, otherwise asks the transport.
    pub fn poll_readable(&mut self, timeout: Duration) -> NetResult<PollStatus> {
        if !self.plain.is_empty() {
            return Ok(PollStatus::Ready);
        }
        self.transport.poll_readable(timeout)
    }

    /// Number of decrypted bytes waiting to be read.
    pub fn pending(&self) -> usize {
        self.plain.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport, S: TlsSession> Transport for SecureChannel<T, S> {
    fn poll_readable(&mut self, timeout: Duration) -> NetResult<PollStatus> {
        SecureChannel::poll_readable(self, timeout)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> NetResult<()> {
        SecureChannel::read(self, buf, timeout)
    }

    fn write(&mut self, buf: &[u8]) -> NetResult<()> {
        SecureChannel::write(self, buf)
    }
}

fn flush<T: Transport>(transport: &mut T, out: &mut ByteBuffer) -> NetResult<()> {
    if !out.is_empty() {
        transport.write(out.as_slice())?;
        out.clear();
    }
    Ok(())
}
