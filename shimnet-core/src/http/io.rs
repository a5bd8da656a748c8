// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Header I/O over a transport.

use std::time::Duration;

use super::header::{HeaderFields, HttpHeader};
use crate::error::{NetError, NetResult};
use crate::net::Transport;

/// Hard limit on a header block, terminator included.
pub const HEADER_MAX: usize = 16 * 1024;

const TERMINATOR: &[u8] = b"\r\n\r\n";

/// Reads a header block byte by byte until `\r\n\r\n`, then parses it.
///
/// Nothing past the terminator is consumed, so a body or tunnelled stream
/// stays on the transport.
pub fn read_header<T: Transport + ?Sized>(transport: &mut T, timeout: Duration) -> NetResult<HttpHeader> {
    let mut raw = Vec::with_capacity(512);
    let mut byte = [0u8; 1];

    while raw.len() < HEADER_MAX {
        transport.read(&mut byte, timeout)?;
        raw.push(byte[0]);
        if raw.ends_with(TERMINATOR) {
            // Field values may carry obs-text bytes; those decode lossily.
            return Ok(HttpHeader::parse(&String::from_utf8_lossy(&raw)));
        }
    }

    Err(NetError::HeaderTooLarge(HEADER_MAX))
}

/// Formats a request header. `Host` always follows the request line.
pub fn format_request(method: &str, host: &str, path: &str, fields: &HeaderFields) -> String {
    format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\n{}\r\n",
        method,
        path,
        host,
        fields.as_str()
    )
}

/// Formats a response header.
pub fn format_response(code: &str, reason: &str, fields: &HeaderFields) -> String {
    format!("HTTP/1.1 {} {}\r\n{}\r\n", code, reason, fields.as_str())
}

/// Formats a CONNECT request for `host:port`.
pub fn format_connect(host: &str, port: u16, fields: &HeaderFields) -> String {
    format!("CONNECT {}:{} HTTP/1.1\r\n{}\r\n", host, port, fields.as_str())
}

/// Sends a request header addressed to `host`.
pub fn write_request<T: Transport + ?Sized>(
    transport: &mut T,
    method: &str,
    host: &str,
    path: &str,
    fields: &HeaderFields,
) -> NetResult<()> {
    transport.write(format_request(method, host, path, fields).as_bytes())
}

/// Sends a response header.
pub fn write_response<T: Transport + ?Sized>(
    transport: &mut T,
    code: &str,
    reason: &str,
    fields: &HeaderFields,
) -> NetResult<()> {
    transport.write(format_response(code, reason, fields).as_bytes())
}
