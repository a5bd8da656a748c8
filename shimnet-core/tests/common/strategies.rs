// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies

use proptest::prelude::*;

/// Frame payloads spanning the 7-bit and 16-bit length classes.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

pub fn mask_strategy() -> impl Strategy<Value = [u8; 4]> {
    any::<[u8; 4]>()
}

/// Header names as servers send them.
pub fn header_name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9-]{0,23}"
}

/// Header values without line breaks or leading whitespace.
pub fn header_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][ -~]{0,40}".prop_map(|s| s.trim_end().to_string())
}
