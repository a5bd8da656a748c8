// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! DTLS Module
//!
//! Fingerprint-pinned DTLS client sessions over caller-owned datagram I/O.
//!
//! ```text
//!   caller datagram socket
//!        │ incoming            ▲ write_fn
//!        ▼                     │
//!   DtlsChannel ── step / pop_outbound ──► DtlsEngine (OpenSSL)
//!        │
//!   Established ──► peer fingerprint == expected ?
//! ```

#[cfg(feature = "dtls")]
mod cert;
mod channel;
mod engine;
mod fingerprint;

#[cfg(feature = "dtls")]
pub use cert::Certificate;
#[cfg(feature = "dtls")]
pub use channel::DtlsConfig;
pub use channel::{DtlsChannel, DtlsState, DEFAULT_MTU};
#[cfg(feature = "dtls")]
pub use engine::OpensslDtlsEngine;
pub use engine::DtlsEngine;
pub use fingerprint::{verify_fingerprint, Fingerprint, FINGERPRINT_ALGORITHM};

pub use crate::tls::{is_dtls_application_data, is_dtls_handshake};
