// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP Module
//!
//! HTTP/1.1 header handling, CONNECT proxy tunneling, URL helpers and a
//! one-shot request client.

pub mod header;
pub mod io;
pub mod proxy;
mod request;
pub mod url;

pub use header::{parse_header_lines, HeaderFields, HttpHeader};
pub use io::{read_header, write_request, write_response, HEADER_MAX};
pub use proxy::{proxy_connect, ProxyConfig};
pub use request::{fetch, HttpRequest, HttpResponse, MAX_RESPONSE_SIZE, USER_AGENT};
pub use url::{encode_url, parse_url, ParsedUrl};
