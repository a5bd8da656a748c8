// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! DNS Resolution
//!
//! Hostname to IP lookup through the system resolver.

use std::net::{IpAddr, ToSocketAddrs};

use tracing::debug;

use crate::error::{NetError, NetResult};

/// Hostname resolver used by [`Net::connect`](super::Net::connect).
pub trait Resolver: Send + Sync {
    /// Resolves `host` to one address of the requested family.
    fn resolve(&self, host: &str, ipv6: bool) -> NetResult<IpAddr>;
}

/// Resolver backed by the operating system (`getaddrinfo`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str, ipv6: bool) -> NetResult<IpAddr> {
        if let Some(ip) = parse_literal(host) {
            return Ok(ip);
        }

        let addrs = (host, 0)
            .to_socket_addrs()
            .map_err(|e| NetError::Resolve(format!("{}: {}", host, e)))?;

        let ip = addrs
            .map(|addr| addr.ip())
            .find(|ip| ip.is_ipv6() == ipv6)
            .ok_or_else(|| {
                let family = if ipv6 { "IPv6" } else { "IPv4" };
                NetError::Resolve(format!("{}: no {} address", host, family))
            })?;

        debug!("resolved {} to {}", host, ip);
        Ok(ip)
    }
}

/// Resolves `host` with the system resolver and returns the address as text.
pub fn query(host: &str, ipv6: bool) -> NetResult<String> {
    SystemResolver.resolve(host, ipv6).map(|ip| ip.to_string())
}

/// Parses an IP literal, accepting bracketed IPv6 (`[::1]`).
pub(crate) fn parse_literal(host: &str) -> Option<IpAddr> {
    let trimmed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    trimmed.parse().ok()
}
