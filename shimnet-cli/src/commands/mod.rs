// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Commands

#[cfg(feature = "dtls")]
pub mod fingerprint;
pub mod http;
pub mod resolve;
pub mod ws;
