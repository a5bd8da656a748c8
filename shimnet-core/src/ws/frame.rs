// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Framing
//!
//! Frame layout:
//!
//! ```text
//! byte 0      FIN | opcode (FIN always set, no fragmentation produced)
//! byte 1      MASK | length class (< 126 inline, 126 → u16, 127 → u64)
//! 0, 2 or 8   extended big-endian length
//! 0 or 4      masking key
//! ...         payload (XORed with the key, cycling every 4 bytes)
//! ```

use std::time::Duration;

use crate::buffer::ByteBuffer;
use crate::error::{NetError, NetResult};
use crate::net::Transport;

/// Largest possible frame header: 2 + 8 length bytes + 4 mask bytes.
pub const MAX_HEADER_SIZE: usize = 14;

const FIN: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const LEN_U16: u8 = 126;
const LEN_U64: u8 = 127;

/// Frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    /// Any opcode not defined by RFC 6455.
    Reserved(u8),
}

impl Opcode {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x0F {
            0x0 => Opcode::Continuation,
            0x1 => Opcode::Text,
            0x2 => Opcode::Binary,
            0x8 => Opcode::Close,
            0x9 => Opcode::Ping,
            0xA => Opcode::Pong,
            other => Opcode::Reserved(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
            Opcode::Reserved(value) => value & 0x0F,
        }
    }
}

/// A received frame with its payload already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

/// XORs `data` in place with `mask`, cycling every 4 bytes. Self-inverse.
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Appends one complete FIN frame to `out`, masked when `mask` is given.
pub fn encode_frame(out: &mut ByteBuffer, opcode: Opcode, payload: &[u8], mask: Option<[u8; 4]>) {
    out.ensure_capacity(payload.len() + MAX_HEADER_SIZE);

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    let len = payload.len();

    out.extend_from_slice(&[FIN | opcode.as_u8()]);
    if len < LEN_U16 as usize {
        out.extend_from_slice(&[mask_bit | len as u8]);
    } else if len <= u16::MAX as usize {
        out.extend_from_slice(&[mask_bit | LEN_U16]);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.extend_from_slice(&[mask_bit | LEN_U64]);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }

    match mask {
        Some(key) => {
            out.extend_from_slice(&key);
            let start = out.len();
            out.extend_from_slice(payload);
            apply_mask(&mut out.as_mut_slice()[start..], key);
        }
        None => out.extend_from_slice(payload),
    }
}

/// Reads one frame. Payloads longer than `max_payload` fail with
/// [`NetError::FrameTooLarge`] before any payload byte is read.
pub fn read_frame<T: Transport + ?Sized>(
    transport: &mut T,
    timeout: Duration,
    max_payload: usize,
) -> NetResult<Frame> {
    let mut head = [0u8; 2];
    transport.read(&mut head, timeout)?;

    let opcode = Opcode::from_u8(head[0]);
    let masked = head[1] & MASK_BIT != 0;
    let len_class = head[1] & 0x7F;

    let len = match len_class {
        LEN_U16 => {
            let mut ext = [0u8; 2];
            transport.read(&mut ext, timeout)?;
            u16::from_be_bytes(ext) as u64
        }
        LEN_U64 => {
            let mut ext = [0u8; 8];
            transport.read(&mut ext, timeout)?;
            u64::from_be_bytes(ext)
        }
        inline => inline as u64,
    };

    let mask = if masked {
        let mut key = [0u8; 4];
        transport.read(&mut key, timeout)?;
        Some(key)
    } else {
        None
    };

    if len > max_payload as u64 {
        return Err(NetError::FrameTooLarge {
            size: len,
            limit: max_payload,
        });
    }

    let mut payload = vec![0u8; len as usize];
    if !payload.is_empty() {
        transport.read(&mut payload, timeout)?;
    }
    if let Some(key) = mask {
        apply_mask(&mut payload, key);
    }

    Ok(Frame { opcode, payload })
}
