// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Module
//!
//! Client-side RFC 6455: upgrade handshake, framing and a channel with
//! implicit ping/pong liveness.

mod channel;
pub mod frame;
mod handshake;

pub use channel::{WebSocketChannel, WebSocketConfig, WsRead, CLOSE_NORMAL};
pub use frame::{apply_mask, encode_frame, read_frame, Frame, Opcode, MAX_HEADER_SIZE};
pub use handshake::{accept_key, client_handshake, generate_key, WEBSOCKET_GUID};
