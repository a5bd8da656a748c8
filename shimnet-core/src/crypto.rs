// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Crypto Primitives
//!
//! Random bytes, digests and base64 used by the handshake layers.

use base64::{engine::general_purpose::STANDARD, Engine};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{NetError, NetResult};

/// Fills `buf` with cryptographically strong random bytes.
pub fn fill_random(buf: &mut [u8]) -> NetResult<()> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| NetError::Crypto("system random source unavailable".into()))
}

/// Returns `N` random bytes.
pub fn random_array<const N: usize>() -> NetResult<[u8; N]> {
    let mut out = [0u8; N];
    fill_random(&mut out)?;
    Ok(out)
}

/// SHA-1 digest. Only used where a protocol mandates it (WebSocket accept key).
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, data);
    let mut out = [0u8; 20];
    out.copy_from_slice(hash.as_ref());
    out
}

/// SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = digest::digest(&digest::SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_ref());
    out
}

/// Standard-alphabet base64 with padding.
pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn base64_decode(text: &str) -> NetResult<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| NetError::Crypto(format!("invalid base64: {}", e)))
}
