// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Certificate Fingerprints
//!
//! SHA-256 digests of DER-encoded certificates in the
//! `sha-256 XX:XX:...:XX` text form exchanged out of band (for example in
//! SDP) and pinned by the DTLS channel.

use std::fmt;
use std::str::FromStr;

use crate::crypto::sha256;
use crate::error::NetError;

/// Hash-name prefix of the text form.
pub const FINGERPRINT_ALGORITHM: &str = "sha-256";

/// SHA-256 fingerprint of a DER-encoded certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn new(digest: [u8; 32]) -> Self {
        Fingerprint(digest)
    }

    /// Hashes DER-encoded certificate bytes.
    pub fn from_der(cert_der: &[u8]) -> Self {
        Fingerprint(sha256(cert_der))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", FINGERPRINT_ALGORITHM)?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for Fingerprint {
    type Err = NetError;

    /// Parses the text form; the algorithm name and hex digits are case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NetError::Protocol(format!("invalid fingerprint: {}", s));

        let (algorithm, digest) = s.trim().split_once(' ').ok_or_else(invalid)?;
        if !algorithm.eq_ignore_ascii_case(FINGERPRINT_ALGORITHM) {
            return Err(invalid());
        }

        let hex_digits: String = digest.split(':').collect();
        let bytes = hex::decode(hex_digits).map_err(|_| invalid())?;
        let digest: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
        Ok(Fingerprint(digest))
    }
}

/// Checks a DER certificate against an expected fingerprint string.
///
/// The comparison is on the exact text form, as produced by [`Fingerprint`]'s `Display`.
pub fn verify_fingerprint(cert_der: &[u8], expected: &str) -> bool {
    Fingerprint::from_der(cert_der).to_string() == expected
}
