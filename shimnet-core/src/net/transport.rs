// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Trait
//!
//! Byte-stream abstraction shared by the plain TCP channel, the secure
//! channel and the mock, plus the [`Net`] handle that picks between them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dns::{Resolver, SystemResolver};
use super::tcp::{PollStatus, TcpChannel, TcpConfig};
use crate::error::NetResult;
use crate::http::proxy::{proxy_connect, ProxyConfig};
use crate::tls::{SecureChannel, TlsConfig};

/// Synchronous byte-stream transport.
///
/// Reads fill the whole buffer or fail; writes send everything or fail.
/// "Nothing yet" is reported by [`Transport::poll_readable`], never by an error.
pub trait Transport: Send {
    /// Waits up to `timeout` for readable data.
    fn poll_readable(&mut self, timeout: Duration) -> NetResult<PollStatus>;

    /// Reads exactly `buf.len()` bytes; `timeout` bounds each wait for data.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> NetResult<()>;

    /// Writes all of `buf`.
    fn write(&mut self, buf: &[u8]) -> NetResult<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn poll_readable(&mut self, timeout: Duration) -> NetResult<PollStatus> {
        (**self).poll_readable(timeout)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> NetResult<()> {
        (**self).read(buf, timeout)
    }

    fn write(&mut self, buf: &[u8]) -> NetResult<()> {
        (**self).write(buf)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn poll_readable(&mut self, timeout: Duration) -> NetResult<PollStatus> {
        (**self).poll_readable(timeout)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> NetResult<()> {
        (**self).read(buf, timeout)
    }

    fn write(&mut self, buf: &[u8]) -> NetResult<()> {
        (**self).write(buf)
    }
}

impl Transport for TcpChannel {
    fn poll_readable(&mut self, timeout: Duration) -> NetResult<PollStatus> {
        self.poll(false, timeout)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> NetResult<()> {
        TcpChannel::read(self, buf, timeout)
    }

    fn write(&mut self, buf: &[u8]) -> NetResult<()> {
        TcpChannel::write(self, buf)
    }
}

/// Configuration for outbound connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Forward proxy used for every connection.
    pub proxy: ProxyConfig,
    pub tcp: TcpConfig,
    pub tls: TlsConfig,
    /// Resolve hostnames to IPv6 addresses instead of IPv4.
    pub ipv6: bool,
}

impl NetConfig {
    /// Creates a config routing through `proxy`.
    pub fn with_proxy(proxy: ProxyConfig) -> Self {
        NetConfig {
            proxy,
            ..Default::default()
        }
    }
}

/// Default port for the given security flag.
pub fn default_port(secure: bool) -> u16 {
    if secure {
        443
    } else {
        80
    }
}

enum NetStream {
    Plain(TcpChannel),
    Secure(Box<SecureChannel<TcpChannel>>),
}

/// A plain or TLS-secured connection to one endpoint.
///
/// The endpoint is resolved once during [`Net::connect`] and not kept.
pub struct Net {
    host: String,
    port: u16,
    stream: NetStream,
}

impl std::fmt::Debug for Net {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Net")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.is_secure())
            .finish()
    }
}

impl Net {
    /// Connects to `host:port` with the system resolver.
    ///
    /// Port 0 selects 80 or 443 from `secure`. When a proxy is configured the
    /// TCP connection goes to the proxy and a CONNECT tunnel carries the rest,
    /// including the TLS handshake.
    pub fn connect(
        host: &str,
        port: u16,
        secure: bool,
        timeout: Duration,
        config: &NetConfig,
    ) -> NetResult<Self> {
        Self::connect_with(&SystemResolver, host, port, secure, timeout, config)
    }

    /// Connects using a caller-supplied resolver.
    pub fn connect_with(
        resolver: &dyn Resolver,
        host: &str,
        port: u16,
        secure: bool,
        timeout: Duration,
        config: &NetConfig,
    ) -> NetResult<Self> {
        let port = if port == 0 { default_port(secure) } else { port };

        let tcp = match config.proxy.should_proxy() {
            Some((proxy_host, proxy_port)) => {
                let ip = resolver.resolve(proxy_host, config.ipv6)?;
                let mut tcp = TcpChannel::connect(&ip.to_string(), proxy_port, timeout, &config.tcp)?;
                proxy_connect(&mut tcp, host, port, timeout)?;
                info!("tunnel to {}:{} via proxy {}:{}", host, port, proxy_host, proxy_port);
                tcp
            }
            None => {
                let ip = resolver.resolve(host, config.ipv6)?;
                TcpChannel::connect(&ip.to_string(), port, timeout, &config.tcp)?
            }
        };

        let stream = if secure {
            let channel = SecureChannel::connect(tcp, host, timeout, &config.tls)?;
            NetStream::Secure(Box::new(channel))
        } else {
            NetStream::Plain(tcp)
        };

        debug!("connected to {}:{} (secure: {})", host, port, secure);
        Ok(Net {
            host: host.to_string(),
            port,
            stream,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        matches!(self.stream, NetStream::Secure(_))
    }
}

impl Transport for Net {
    fn poll_readable(&mut self, timeout: Duration) -> NetResult<PollStatus> {
        match &mut self.stream {
            NetStream::Plain(tcp) => tcp.poll(false, timeout),
            NetStream::Secure(secure) => secure.poll_readable(timeout),
        }
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> NetResult<()> {
        match &mut self.stream {
            NetStream::Plain(tcp) => tcp.read(buf, timeout),
            NetStream::Secure(secure) => secure.read(buf, timeout),
        }
    }

    fn write(&mut self, buf: &[u8]) -> NetResult<()> {
        match &mut self.stream {
            NetStream::Plain(tcp) => tcp.write(buf),
            NetStream::Secure(secure) => secure.write(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;
    use crate::net::tcp::TcpAcceptor;
    use std::net::IpAddr;

    struct FixedResolver(IpAddr);

    impl Resolver for FixedResolver {
        fn resolve(&self, _host: &str, _ipv6: bool) -> NetResult<IpAddr> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_default_port() {
        assert_eq!(default_port(false), 80);
        assert_eq!(default_port(true), 443);
    }

    #[test]
    fn test_plain_connect_through_resolver() {
        let mut acceptor =
            TcpAcceptor::listen("127.0.0.1", 0, &TcpConfig::default()).unwrap();
        let port = acceptor.local_addr().unwrap().port();

        let resolver = FixedResolver("127.0.0.1".parse().unwrap());
        let mut net = Net::connect_with(
            &resolver,
            "service.test",
            port,
            false,
            Duration::from_secs(2),
            &NetConfig::default(),
        )
        .unwrap();
        let mut server = acceptor.accept(Duration::from_secs(2)).unwrap().unwrap();

        assert_eq!(net.host(), "service.test");
        assert!(!net.is_secure());

        net.write(b"ping").unwrap();
        let mut buf = [0u8; 4];
        server.read(&mut buf, Duration::from_secs(2)).unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[test]
    fn test_resolver_failure_propagates() {
        struct Failing;
        impl Resolver for Failing {
            fn resolve(&self, host: &str, _ipv6: bool) -> NetResult<IpAddr> {
                Err(NetError::Resolve(host.to_string()))
            }
        }

        let result = Net::connect_with(
            &Failing,
            "nowhere.test",
            0,
            false,
            Duration::from_millis(100),
            &NetConfig::default(),
        );
        assert!(matches!(result, Err(NetError::Resolve(_))));
    }
}
