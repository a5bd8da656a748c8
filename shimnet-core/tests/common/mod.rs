// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared fixtures for the integration tests: a scripted WebSocket server
//! on top of `MockTransport` and server-side frame encoding.

#![allow(dead_code)]

pub mod strategies;

use std::time::Duration;

use shimnet_core::buffer::ByteBuffer;
use shimnet_core::http::HttpHeader;
use shimnet_core::ws::{accept_key, encode_frame, Opcode};
use shimnet_core::MockTransport;

pub const TIMEOUT: Duration = Duration::from_millis(200);

/// Answers the first write (the upgrade request) with a 101 carrying the
/// correct accept key. Later writes get no reply.
pub fn install_ws_server(transport: &MockTransport) {
    let mut upgraded = false;
    transport.set_responder(move |request| {
        if upgraded {
            return None;
        }
        upgraded = true;
        let header = HttpHeader::parse(&String::from_utf8_lossy(request));
        let key = header.get_str("Sec-WebSocket-Key").unwrap_or_default();
        Some(
            format!(
                "HTTP/1.1 101 Switching Protocols\r\n\
                 Upgrade: websocket\r\n\
                 Connection: Upgrade\r\n\
                 Sec-WebSocket-Accept: {}\r\n\r\n",
                accept_key(key)
            )
            .into_bytes(),
        )
    });
}

/// Answers the upgrade request with a fixed response.
pub fn install_raw_reply(transport: &MockTransport, reply: &'static str) {
    transport.set_responder(move |_| Some(reply.as_bytes().to_vec()));
}

/// Unmasked frame as a server would send it.
pub fn server_frame(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let mut out = ByteBuffer::new();
    encode_frame(&mut out, opcode, payload, None);
    out.as_slice().to_vec()
}

/// Decodes a masked client frame with a 7-bit length: (first byte, payload).
pub fn decode_client_frame(frame: &[u8]) -> (u8, Vec<u8>) {
    assert!(frame[1] & 0x80 != 0, "client frames must be masked");
    let len = (frame[1] & 0x7F) as usize;
    assert!(len < 126);
    let key = [frame[2], frame[3], frame[4], frame[5]];
    let payload = frame[6..6 + len]
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ key[i % 4])
        .collect();
    (frame[0], payload)
}
