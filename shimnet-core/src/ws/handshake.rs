// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Upgrade Handshake (client side)

use std::time::Duration;

use tracing::{debug, warn};

use crate::crypto::{base64_encode, random_array, sha1};
use crate::error::{NetError, NetResult};
use crate::http::{parse_header_lines, read_header, write_request, HeaderFields};
use crate::net::Transport;

/// GUID appended to the client key before hashing (RFC 6455 §1.3).
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

pub const WEBSOCKET_VERSION: &str = "13";

/// Base64 of 16 random bytes: always 24 characters.
pub fn generate_key() -> NetResult<String> {
    Ok(base64_encode(&random_array::<16>()?))
}

/// `Sec-WebSocket-Accept` value the server must return for `key`.
pub fn accept_key(key: &str) -> String {
    let mut input = String::with_capacity(key.len() + WEBSOCKET_GUID.len());
    input.push_str(key);
    input.push_str(WEBSOCKET_GUID);
    base64_encode(&sha1(input.as_bytes()))
}

/// Sends the upgrade request for `path` and validates the response.
///
/// `extra_headers` is a `Key: Value\n` blob appended after the mandatory
/// upgrade fields. Requires status 101 and an exact accept-key match.
pub fn client_handshake<T: Transport + ?Sized>(
    transport: &mut T,
    host: &str,
    path: &str,
    extra_headers: &str,
    timeout: Duration,
) -> NetResult<()> {
    let key = generate_key()?;

    let mut fields = HeaderFields::new();
    fields
        .push_str("Upgrade", "websocket")
        .push_str("Connection", "Upgrade")
        .push_str("Sec-WebSocket-Key", &key)
        .push_str("Sec-WebSocket-Version", WEBSOCKET_VERSION);
    for (name, value) in parse_header_lines(extra_headers) {
        fields.push_str(&name, &value);
    }

    write_request(transport, "GET", host, path, &fields)?;

    let header = read_header(transport, timeout)?;
    let status = header
        .status_code()
        .ok_or_else(|| NetError::InvalidHeader(format!("bad status line: {}", header.first_line())))?;
    if status != 101 {
        warn!("WebSocket upgrade of {}{} rejected with {}", host, path, status);
        return Err(NetError::UpgradeRejected(status));
    }

    let accept = header
        .get_str("Sec-WebSocket-Accept")
        .ok_or(NetError::AcceptKeyMismatch)?;
    if accept != accept_key(&key) {
        return Err(NetError::AcceptKeyMismatch);
    }

    debug!("WebSocket upgraded: {}{}", host, path);
    Ok(())
}
