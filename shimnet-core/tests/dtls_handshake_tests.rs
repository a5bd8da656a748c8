// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! DTLS channel against an in-memory OpenSSL server.

#![cfg(feature = "dtls")]

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use openssl::ssl::{ErrorCode, Ssl, SslContext, SslMethod, SslOptions, SslStream};
use shimnet_core::dtls::{
    is_dtls_application_data, is_dtls_handshake, Certificate, DtlsChannel, DtlsConfig, DtlsState,
    OpensslDtlsEngine,
};
use shimnet_core::tls::HandshakeStatus;
use shimnet_core::NetError;

#[derive(Default)]
struct ServerPipe {
    inbound: VecDeque<Vec<u8>>,
    outbound: VecDeque<Vec<u8>>,
}

impl Read for ServerPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inbound.pop_front() {
            Some(dgram) => {
                let n = dgram.len().min(buf.len());
                buf[..n].copy_from_slice(&dgram[..n]);
                Ok(n)
            }
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl Write for ServerPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outbound.push_back(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Server {
    stream: SslStream<ServerPipe>,
}

impl Server {
    fn new(cert: &Certificate) -> Self {
        let mut ctx = SslContext::builder(SslMethod::dtls()).unwrap();
        ctx.set_options(SslOptions::NO_TICKET | SslOptions::NO_QUERY_MTU);
        ctx.set_certificate(cert.x509()).unwrap();
        ctx.set_private_key(cert.private_key()).unwrap();
        let ctx = ctx.build();

        let mut ssl = Ssl::new(&ctx).unwrap();
        ssl.set_mtu(1200).unwrap();
        ssl.set_accept_state();
        Server {
            stream: SslStream::new(ssl, ServerPipe::default()).unwrap(),
        }
    }

    fn receive(&mut self, datagrams: &mut VecDeque<Vec<u8>>) {
        self.stream.get_mut().inbound.extend(datagrams.drain(..));
        if let Err(e) = self.stream.do_handshake() {
            assert!(
                e.code() == ErrorCode::WANT_READ || e.code() == ErrorCode::WANT_WRITE,
                "server handshake failed: {}",
                e
            );
        }
    }

    fn take_outbound(&mut self) -> VecDeque<Vec<u8>> {
        std::mem::take(&mut self.stream.get_mut().outbound)
    }
}

fn client_config(pin: Option<String>) -> DtlsConfig {
    DtlsConfig {
        peer_fingerprint: pin,
        ..DtlsConfig::default()
    }
}

/// Shuttles datagrams until the client settles. Returns the last client result.
fn run_handshake(
    client: &mut DtlsChannel<OpensslDtlsEngine>,
    server: &mut Server,
) -> Result<HandshakeStatus, NetError> {
    let mut to_server = VecDeque::new();
    let status = client.handshake(None, |d| {
        to_server.push_back(d.to_vec());
        Ok(())
    })?;
    assert_eq!(status, HandshakeStatus::Continue);
    // The opening ClientHello may carry the DTLS 1.0 record version.
    assert!(!to_server.is_empty());
    assert!(to_server.iter().all(|d| d[0] == 0x16));

    for _ in 0..32 {
        server.receive(&mut to_server);
        for dgram in server.take_outbound() {
            let status = client.handshake(Some(&dgram), |d| {
                to_server.push_back(d.to_vec());
                Ok(())
            })?;
            if status == HandshakeStatus::Complete {
                assert!(to_server.iter().all(|d| is_dtls_handshake(d)));
                // Deliver the client's final flight.
                server.receive(&mut to_server);
                return Ok(status);
            }
        }
    }
    Ok(HandshakeStatus::Continue)
}

#[test]
fn test_handshake_with_pinned_fingerprint() {
    let server_cert = Certificate::generate().unwrap();
    let pin = server_cert.fingerprint().unwrap().to_string();
    let mut server = Server::new(&server_cert);
    let mut client = DtlsChannel::create(&client_config(Some(pin))).unwrap();

    assert_eq!(client.state(), DtlsState::Idle);
    assert_eq!(run_handshake(&mut client, &mut server).unwrap(), HandshakeStatus::Complete);
    assert_eq!(client.state(), DtlsState::Established);
    assert_eq!(
        client.peer_fingerprint(),
        Some(server_cert.fingerprint().unwrap())
    );

    // Further handshake calls are no-ops.
    let mut extra = 0;
    let status = client
        .handshake(None, |_| {
            extra += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(status, HandshakeStatus::Complete);
    assert_eq!(extra, 0);
}

#[test]
fn test_application_data_both_ways() {
    let server_cert = Certificate::generate().unwrap();
    let mut server = Server::new(&server_cert);
    let mut client = DtlsChannel::create(&client_config(None)).unwrap();
    run_handshake(&mut client, &mut server).unwrap();
    assert!(client.is_established());

    let mut wire = [0u8; 1500];
    let n = client.encrypt(b"ping", &mut wire).unwrap();
    assert!(is_dtls_application_data(&wire[..n]));

    server.stream.get_mut().inbound.push_back(wire[..n].to_vec());
    let mut plain = [0u8; 16];
    let got = server.stream.ssl_read(&mut plain).unwrap();
    assert_eq!(&plain[..got], b"ping");

    server.stream.ssl_write(b"pong").unwrap();
    let reply = server.take_outbound().pop_front().unwrap();
    let mut out = [0u8; 16];
    let got = client.decrypt(&reply, &mut out).unwrap();
    assert_eq!(&out[..got], b"pong");
}

#[test]
fn test_fingerprint_mismatch_fails_channel() {
    let server_cert = Certificate::generate().unwrap();
    let other = Certificate::generate().unwrap();
    let mut server = Server::new(&server_cert);
    let pin = other.fingerprint().unwrap().to_string();
    let mut client = DtlsChannel::create(&client_config(Some(pin))).unwrap();

    let err = run_handshake(&mut client, &mut server).unwrap_err();
    assert!(matches!(err, NetError::FingerprintMismatch { .. }));
    assert_eq!(client.state(), DtlsState::Failed);
    assert!(client.handshake(None, |_| Ok(())).is_err());

    let mut wire = [0u8; 64];
    assert_eq!(client.encrypt(b"x", &mut wire), Err(NetError::NotConnected));
}

#[test]
fn test_client_certificate_is_accepted() {
    let server_cert = Certificate::generate().unwrap();
    let config = DtlsConfig {
        certificate: Some(Certificate::generate().unwrap()),
        ..client_config(Some(server_cert.fingerprint().unwrap().to_string()))
    };
    let mut server = Server::new(&server_cert);
    let mut client = DtlsChannel::create(&config).unwrap();

    assert_eq!(run_handshake(&mut client, &mut server).unwrap(), HandshakeStatus::Complete);
}
