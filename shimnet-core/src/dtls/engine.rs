// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! DTLS Engine
//!
//! Handshake/record engine contract for the DTLS channel and its OpenSSL
//! implementation over in-memory datagram queues.

use crate::error::NetResult;
use crate::tls::HandshakeStatus;

/// Datagram-oriented DTLS client engine.
///
/// The engine never owns a socket. Inbound datagrams are handed to it
/// explicitly and outbound datagrams are collected with
/// [`DtlsEngine::pop_outbound`].
pub trait DtlsEngine: Send {
    /// Feeds an optional peer datagram and advances the handshake one step.
    fn step(&mut self, input: Option<&[u8]>) -> NetResult<HandshakeStatus>;

    /// Takes the next datagram the engine wants sent.
    fn pop_outbound(&mut self) -> Option<Vec<u8>>;

    /// Encrypts application data; the records become outbound datagrams.
    fn encrypt(&mut self, plain: &[u8]) -> NetResult<()>;

    /// Decrypts one datagram into `out`. Returns 0 when the engine needs more
    /// data before it can produce plaintext.
    fn decrypt(&mut self, datagram: &[u8], out: &mut [u8]) -> NetResult<usize>;

    /// DER encoding of the peer's certificate once the handshake has seen it.
    fn peer_certificate_der(&self) -> Option<Vec<u8>>;
}

#[cfg(feature = "dtls")]
pub use self::openssl_engine::OpensslDtlsEngine;

#[cfg(feature = "dtls")]
mod openssl_engine {
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};

    use openssl::ssl::{
        ErrorCode, Ssl, SslContext, SslMethod, SslOptions, SslStream, SslVerifyMode,
    };
    use tracing::{debug, warn};

    use super::DtlsEngine;
    use crate::dtls::cert::Certificate;
    use crate::error::{NetError, NetResult};
    use crate::tls::HandshakeStatus;

    /// Datagram queues standing in for the engine's socket BIO.
    ///
    /// Each read returns exactly one queued datagram and each write queues
    /// one, so record boundaries survive.
    #[derive(Debug, Default)]
    pub(crate) struct DatagramPipe {
        pub(crate) inbound: VecDeque<Vec<u8>>,
        pub(crate) outbound: VecDeque<Vec<u8>>,
    }

    impl Read for DatagramPipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.inbound.pop_front() {
                Some(datagram) => {
                    let n = datagram.len().min(buf.len());
                    buf[..n].copy_from_slice(&datagram[..n]);
                    Ok(n)
                }
                None => Err(io::ErrorKind::WouldBlock.into()),
            }
        }
    }

    impl Write for DatagramPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.outbound.push_back(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// OpenSSL DTLS client session.
    pub struct OpensslDtlsEngine {
        stream: SslStream<DatagramPipe>,
    }

    impl OpensslDtlsEngine {
        /// Builds a client session.
        ///
        /// Session resumption and tickets are off, the path MTU is fixed to
        /// `mtu`, and certificate verification always passes inside the
        /// engine: trust is decided afterwards by fingerprint.
        pub fn new(mtu: u32, certificate: Option<&Certificate>) -> NetResult<Self> {
            let mut ctx = SslContext::builder(SslMethod::dtls())?;
            ctx.set_options(
                SslOptions::NO_TICKET
                    | SslOptions::NO_SESSION_RESUMPTION_ON_RENEGOTIATION
                    | SslOptions::NO_QUERY_MTU,
            );
            ctx.set_verify_callback(
                SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT,
                |_, _| true,
            );
            if let Some(cert) = certificate {
                ctx.set_certificate(cert.x509())?;
                ctx.set_private_key(cert.private_key())?;
                ctx.check_private_key()?;
            }
            let ctx = ctx.build();

            let mut ssl = Ssl::new(&ctx)?;
            ssl.set_mtu(mtu)?;
            ssl.set_connect_state();

            let stream = SslStream::new(ssl, DatagramPipe::default())?;
            debug!("DTLS client session created (mtu {})", mtu);
            Ok(OpensslDtlsEngine { stream })
        }

        fn feed(&mut self, datagram: &[u8]) {
            if !datagram.is_empty() {
                self.stream.get_mut().inbound.push_back(datagram.to_vec());
            }
        }
    }

    impl DtlsEngine for OpensslDtlsEngine {
        fn step(&mut self, input: Option<&[u8]>) -> NetResult<HandshakeStatus> {
            if let Some(datagram) = input {
                self.feed(datagram);
            }
            match self.stream.do_handshake() {
                Ok(()) => Ok(HandshakeStatus::Complete),
                Err(e) if e.code() == ErrorCode::WANT_READ || e.code() == ErrorCode::WANT_WRITE => {
                    Ok(HandshakeStatus::Continue)
                }
                Err(e) => {
                    warn!("DTLS handshake step failed: {}", e);
                    Err(NetError::Dtls(e.to_string()))
                }
            }
        }

        fn pop_outbound(&mut self) -> Option<Vec<u8>> {
            self.stream.get_mut().outbound.pop_front()
        }

        fn encrypt(&mut self, plain: &[u8]) -> NetResult<()> {
            self.stream
                .ssl_write(plain)
                .map_err(|e| NetError::Dtls(e.to_string()))?;
            Ok(())
        }

        fn decrypt(&mut self, datagram: &[u8], out: &mut [u8]) -> NetResult<usize> {
            self.feed(datagram);
            match self.stream.ssl_read(out) {
                Ok(n) => Ok(n),
                Err(e) if e.code() == ErrorCode::WANT_READ => Ok(0),
                Err(e) if e.code() == ErrorCode::ZERO_RETURN => Err(NetError::ConnectionClosed),
                Err(e) => Err(NetError::Dtls(e.to_string())),
            }
        }

        fn peer_certificate_der(&self) -> Option<Vec<u8>> {
            self.stream
                .ssl()
                .peer_certificate()
                .and_then(|cert| cert.to_der().ok())
        }
    }

}
