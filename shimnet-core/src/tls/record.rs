// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TLS Record Framing
//!
//! Pulls whole records off a byte stream. The 5-byte header's length field
//! is the only boundary the stream carries, so it is read first and trusted
//! (after a sanity bound) to size the body read.

use std::time::Duration;

use crate::buffer::ByteBuffer;
use crate::error::{NetError, NetResult};
use crate::net::Transport;

/// Size of the type(1) + version(2) + length(2) record header.
pub const RECORD_HEADER_SIZE: usize = 5;

/// Largest record body accepted: 2^14 plaintext plus the ciphertext expansion
/// allowance TLS 1.2 grants.
pub const MAX_RECORD_BODY: usize = (1 << 14) + 2048;

pub const CONTENT_CHANGE_CIPHER_SPEC: u8 = 0x14;
pub const CONTENT_ALERT: u8 = 0x15;
pub const CONTENT_HANDSHAKE: u8 = 0x16;
pub const CONTENT_APPLICATION_DATA: u8 = 0x17;

pub const VERSION_TLS12: u16 = 0x0303;
pub const VERSION_DTLS12: u16 = 0xFEFD;

/// Parsed record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub content_type: u8,
    pub version: u16,
    pub length: u16,
}

impl RecordHeader {
    pub fn parse(bytes: [u8; RECORD_HEADER_SIZE]) -> NetResult<Self> {
        let header = RecordHeader {
            content_type: bytes[0],
            version: u16::from_be_bytes([bytes[1], bytes[2]]),
            length: u16::from_be_bytes([bytes[3], bytes[4]]),
        };

        if !(CONTENT_CHANGE_CIPHER_SPEC..=CONTENT_APPLICATION_DATA).contains(&header.content_type) {
            return Err(NetError::MalformedRecord(format!(
                "unknown content type 0x{:02x}",
                header.content_type
            )));
        }
        if header.length as usize > MAX_RECORD_BODY {
            return Err(NetError::MalformedRecord(format!(
                "record length {} exceeds {}",
                header.length, MAX_RECORD_BODY
            )));
        }
        Ok(header)
    }

    /// Header plus body size.
    pub fn record_len(&self) -> usize {
        RECORD_HEADER_SIZE + self.length as usize
    }
}

/// Reads one whole record (header included) into `out`, replacing its contents.
///
/// Consumes exactly `5 + length` bytes from the transport however it chunks them.
pub fn read_record<T: Transport + ?Sized>(
    transport: &mut T,
    out: &mut ByteBuffer,
    timeout: Duration,
) -> NetResult<RecordHeader> {
    let mut header_bytes = [0u8; RECORD_HEADER_SIZE];
    transport.read(&mut header_bytes, timeout)?;
    let header = RecordHeader::parse(header_bytes)?;

    out.clear();
    out.ensure_capacity(header.record_len());
    out.extend_from_slice(&header_bytes);
    if header.length > 0 {
        let body = out.fill_mut(header.length as usize);
        transport.read(body, timeout)?;
    }
    Ok(header)
}

fn version_of(data: &[u8]) -> Option<u16> {
    (data.len() > 2).then(|| u16::from_be_bytes([data[1], data[2]]))
}

/// True for TLS 1.2 or DTLS 1.2 handshake-phase records (handshake or change cipher spec).
pub fn is_tls_handshake(data: &[u8]) -> bool {
    matches!(version_of(data), Some(VERSION_TLS12 | VERSION_DTLS12))
        && matches!(data[0], CONTENT_CHANGE_CIPHER_SPEC | CONTENT_HANDSHAKE)
}

/// True for TLS 1.2 or DTLS 1.2 application data records.
pub fn is_tls_application_data(data: &[u8]) -> bool {
    matches!(version_of(data), Some(VERSION_TLS12 | VERSION_DTLS12))
        && data[0] == CONTENT_APPLICATION_DATA
}

/// True for DTLS 1.2 handshake-phase datagrams.
pub fn is_dtls_handshake(data: &[u8]) -> bool {
    version_of(data) == Some(VERSION_DTLS12)
        && matches!(data[0], CONTENT_CHANGE_CIPHER_SPEC | CONTENT_HANDSHAKE)
}

/// True for DTLS 1.2 application data datagrams.
pub fn is_dtls_application_data(data: &[u8]) -> bool {
    version_of(data) == Some(VERSION_DTLS12) && data[0] == CONTENT_APPLICATION_DATA
}
