// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! URL Utilities
//!
//! Just enough URL handling for the HTTP and WebSocket clients:
//! `scheme://host[:port]/path` with http, https, ws and wss schemes.

use crate::error::{NetError, NetResult};
use crate::net::default_port;

/// Components of a parsed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub secure: bool,
    /// Host without brackets for IPv6 literals.
    pub host: String,
    pub port: u16,
    /// Always starts with `/`.
    pub path: String,
}

impl ParsedUrl {
    /// `host[:port]` as sent in a `Host` header; the port is omitted when it
    /// is the scheme default.
    pub fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == default_port(self.secure) {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

/// Parses `url`. Without a scheme the URL is taken as plain `host[:port]/path`.
pub fn parse_url(url: &str) -> NetResult<ParsedUrl> {
    let invalid = |why: &str| NetError::InvalidUrl(format!("{}: {}", why, url));

    let (secure, rest) = match url.split_once("://") {
        Some((scheme, rest)) => {
            let secure = match scheme.to_ascii_lowercase().as_str() {
                "https" | "wss" => true,
                "http" | "ws" => false,
                _ => return Err(invalid("unsupported scheme")),
            };
            (secure, rest)
        }
        None => (false, url),
    };

    let rest = rest.trim_start_matches('/');
    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, ""),
    };

    let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
        let (host, after) = bracketed
            .split_once(']')
            .ok_or_else(|| invalid("unterminated IPv6 literal"))?;
        let port = match after.strip_prefix(':') {
            Some(port) => Some(port),
            None if after.is_empty() => None,
            None => return Err(invalid("garbage after IPv6 literal")),
        };
        (host, port)
    } else {
        match authority.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    if host.is_empty() {
        return Err(invalid("missing host"));
    }

    let port = match port {
        Some(text) => text.parse::<u16>().map_err(|_| invalid("invalid port"))?,
        None => default_port(secure),
    };

    Ok(ParsedUrl {
        secure,
        host: host.to_string(),
        port,
        path: format!("/{}", path),
    })
}

/// Form-encodes `src`: ASCII alphanumerics and `*-._` pass through, space
/// becomes `+`, every other byte becomes `%XX`.
pub fn encode_url(src: &str) -> String {
    let mut out = String::with_capacity(src.len() * 3);
    for byte in src.bytes() {
        match byte {
            b if b.is_ascii_alphanumeric() || matches!(b, b'*' | b'-' | b'.' | b'_') => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wss_defaults() {
        let url = parse_url("wss://relay.example.com").unwrap();
        assert!(url.secure);
        assert_eq!(url.host, "relay.example.com");
        assert_eq!(url.port, 443);
        assert_eq!(url.path, "/");
    }

    #[test]
    fn test_parse_ws_with_port_and_path() {
        let url = parse_url("ws://localhost:8080/chat?room=1").unwrap();
        assert!(!url.secure);
        assert_eq!(url.host, "localhost");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/chat?room=1");
    }

    #[test]
    fn test_parse_schemeless() {
        let url = parse_url("proxy.internal:3128").unwrap();
        assert!(!url.secure);
        assert_eq!(url.host, "proxy.internal");
        assert_eq!(url.port, 3128);
    }

    #[test]
    fn test_parse_ipv6_literal() {
        let url = parse_url("http://[::1]:9000/x").unwrap();
        assert_eq!(url.host, "::1");
        assert_eq!(url.port, 9000);
        assert_eq!(url.host_header(), "[::1]:9000");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_url("ftp://example.com").is_err());
        assert!(parse_url("http://").is_err());
        assert!(parse_url("http://host:notaport/").is_err());
        assert!(parse_url("http://[::1").is_err());
    }

    #[test]
    fn test_scheme_case_insensitive() {
        assert!(parse_url("HTTPS://Example.com").unwrap().secure);
    }

    #[test]
    fn test_host_header_omits_default_port() {
        assert_eq!(parse_url("https://a.test").unwrap().host_header(), "a.test");
        assert_eq!(parse_url("http://a.test:8080").unwrap().host_header(), "a.test:8080");
    }

    #[test]
    fn test_encode_url() {
        assert_eq!(encode_url("a b*c-d.e_f"), "a+b*c-d.e_f");
        assert_eq!(encode_url("k=v&x/y"), "k%3Dv%26x%2Fy");
        assert_eq!(encode_url("é"), "%C3%A9");
    }
}
