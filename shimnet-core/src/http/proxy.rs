// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP Proxy Tunneling
//!
//! Forward-proxy configuration and the CONNECT exchange that turns a
//! connection to the proxy into a tunnel to the real destination.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::header::HeaderFields;
use super::io::{format_connect, read_header};
use super::url::parse_url;
use crate::error::{NetError, NetResult};
use crate::net::Transport;

/// Proxy configuration for outbound connections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProxyConfig {
    /// No proxy (direct connection).
    #[default]
    None,
    /// HTTP CONNECT proxy.
    HttpConnect {
        /// Proxy host address.
        host: String,
        /// Proxy port.
        port: u16,
    },
}

impl ProxyConfig {
    /// Creates an HTTP CONNECT proxy config.
    pub fn http_connect(host: &str, port: u16) -> Self {
        ProxyConfig::HttpConnect {
            host: host.to_string(),
            port,
        }
    }

    /// Parses a proxy URL of the form `scheme://host[:port]`.
    ///
    /// The scheme only selects the default port; the proxy itself is always
    /// spoken to in plain HTTP. An empty string means no proxy.
    pub fn from_url(url: &str) -> NetResult<Self> {
        if url.trim().is_empty() {
            return Ok(ProxyConfig::None);
        }
        let parsed = parse_url(url.trim())?;
        Ok(ProxyConfig::HttpConnect {
            host: parsed.host,
            port: parsed.port,
        })
    }

    /// Returns the proxy endpoint when connections should be tunnelled.
    pub fn should_proxy(&self) -> Option<(&str, u16)> {
        match self {
            ProxyConfig::None => None,
            ProxyConfig::HttpConnect { host, port } => Some((host.as_str(), *port)),
        }
    }
}

/// Asks the proxy at the other end of `transport` to open a tunnel to
/// `host:port`.
///
/// Succeeds only on status 200. Afterwards the same transport carries the
/// tunnelled stream; nothing beyond the response header has been read.
pub fn proxy_connect<T: Transport + ?Sized>(
    transport: &mut T,
    host: &str,
    port: u16,
    timeout: Duration,
) -> NetResult<()> {
    let mut fields = HeaderFields::new();
    fields.push_str("Host", &format!("{}:{}", host, port));
    transport.write(format_connect(host, port, &fields).as_bytes())?;

    let header = read_header(transport, timeout)?;
    let status = header
        .status_code()
        .ok_or_else(|| NetError::InvalidHeader(format!("bad status line: {}", header.first_line())))?;

    if status != 200 {
        warn!("proxy refused tunnel to {}:{} with status {}", host, port, status);
        return Err(NetError::ProxyRejected(status));
    }

    debug!("proxy tunnel open to {}:{}", host, port);
    Ok(())
}
