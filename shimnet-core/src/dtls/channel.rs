// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! DTLS Channel
//!
//! Drives a DTLS client handshake over datagrams the caller moves itself,
//! then pins the peer by certificate fingerprint.

use tracing::{debug, warn};

use super::engine::DtlsEngine;
use super::fingerprint::Fingerprint;
use crate::error::{NetError, NetResult};
use crate::tls::HandshakeStatus;

#[cfg(feature = "dtls")]
use super::cert::Certificate;
#[cfg(feature = "dtls")]
use super::engine::OpensslDtlsEngine;

/// Default path MTU for DTLS records.
pub const DEFAULT_MTU: u32 = 1200;

/// Lifecycle of a DTLS channel. `Established` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtlsState {
    Idle,
    Handshaking,
    Established,
    Failed,
}

/// Options for [`DtlsChannel::create`].
#[cfg(feature = "dtls")]
#[derive(Debug, Clone)]
pub struct DtlsConfig {
    pub mtu: u32,
    /// Local certificate offered to the peer.
    pub certificate: Option<Certificate>,
    /// Expected peer fingerprint, `sha-256 XX:..`.
    pub peer_fingerprint: Option<String>,
}

#[cfg(feature = "dtls")]
impl Default for DtlsConfig {
    fn default() -> Self {
        DtlsConfig {
            mtu: DEFAULT_MTU,
            certificate: None,
            peer_fingerprint: None,
        }
    }
}

/// DTLS client session over caller-owned datagram I/O.
pub struct DtlsChannel<E: DtlsEngine> {
    engine: E,
    state: DtlsState,
    peer_fingerprint: Option<String>,
}

#[cfg(feature = "dtls")]
impl DtlsChannel<OpensslDtlsEngine> {
    /// Creates a client channel backed by OpenSSL.
    pub fn create(config: &DtlsConfig) -> NetResult<Self> {
        let engine = OpensslDtlsEngine::new(config.mtu, config.certificate.as_ref())?;
        Ok(Self::with_engine(engine, config.peer_fingerprint.clone()))
    }
}

impl<E: DtlsEngine> DtlsChannel<E> {
    pub fn with_engine(engine: E, peer_fingerprint: Option<String>) -> Self {
        DtlsChannel {
            engine,
            state: DtlsState::Idle,
            peer_fingerprint,
        }
    }

    pub fn state(&self) -> DtlsState {
        self.state
    }

    pub fn is_established(&self) -> bool {
        self.state == DtlsState::Established
    }

    /// Advances the handshake.
    ///
    /// `incoming` is the datagram just received from the peer, if any. Every
    /// datagram the engine produces is passed to `write_fn`, one call each.
    /// Once established, further calls are no-ops reporting `Complete`; once
    /// failed, they keep failing.
    pub fn handshake<F>(&mut self, incoming: Option<&[u8]>, mut write_fn: F) -> NetResult<HandshakeStatus>
    where
        F: FnMut(&[u8]) -> NetResult<()>,
    {
        match self.state {
            DtlsState::Established => return Ok(HandshakeStatus::Complete),
            DtlsState::Failed => {
                return Err(NetError::Dtls("handshake already failed".into()));
            }
            DtlsState::Idle => self.state = DtlsState::Handshaking,
            DtlsState::Handshaking => {}
        }

        match self.drive(incoming, &mut write_fn) {
            Ok(HandshakeStatus::Continue) => Ok(HandshakeStatus::Continue),
            Ok(HandshakeStatus::Complete) => match self.check_peer() {
                Ok(()) => {
                    self.state = DtlsState::Established;
                    debug!("DTLS handshake complete");
                    Ok(HandshakeStatus::Complete)
                }
                Err(e) => {
                    warn!("DTLS peer rejected: {}", e);
                    self.state = DtlsState::Failed;
                    Err(e)
                }
            },
            Err(e) => {
                self.state = DtlsState::Failed;
                Err(e)
            }
        }
    }

    /// Steps the engine until a step produces no outbound datagrams.
    fn drive<F>(&mut self, incoming: Option<&[u8]>, write_fn: &mut F) -> NetResult<HandshakeStatus>
    where
        F: FnMut(&[u8]) -> NetResult<()>,
    {
        let mut input = incoming;
        let mut complete = false;
        loop {
            if self.engine.step(input.take())? == HandshakeStatus::Complete {
                complete = true;
            }

            let mut wrote = false;
            while let Some(datagram) = self.engine.pop_outbound() {
                write_fn(&datagram)?;
                wrote = true;
            }
            if !wrote {
                break;
            }
        }

        Ok(if complete {
            HandshakeStatus::Complete
        } else {
            HandshakeStatus::Continue
        })
    }

    fn check_peer(&self) -> NetResult<()> {
        let Some(expected) = &self.peer_fingerprint else {
            return Ok(());
        };
        let der = self
            .engine
            .peer_certificate_der()
            .ok_or_else(|| NetError::Dtls("peer presented no certificate".into()))?;

        let found = Fingerprint::from_der(&der).to_string();
        if &found != expected {
            return Err(NetError::FingerprintMismatch {
                expected: expected.clone(),
                found,
            });
        }
        Ok(())
    }

    /// Fingerprint of the peer certificate seen during the handshake.
    pub fn peer_fingerprint(&self) -> Option<Fingerprint> {
        self.engine
            .peer_certificate_der()
            .map(|der| Fingerprint::from_der(&der))
    }

    /// Encrypts `plain` into `out`, returning the ciphertext length.
    pub fn encrypt(&mut self, plain: &[u8], out: &mut [u8]) -> NetResult<usize> {
        self.require_established()?;
        self.engine.encrypt(plain)?;

        let mut records = Vec::new();
        while let Some(datagram) = self.engine.pop_outbound() {
            records.extend_from_slice(&datagram);
        }
        if records.is_empty() {
            return Err(NetError::Dtls("engine produced no ciphertext".into()));
        }
        if records.len() > out.len() {
            return Err(NetError::BufferTooSmall {
                needed: records.len(),
                available: out.len(),
            });
        }
        out[..records.len()].copy_from_slice(&records);
        Ok(records.len())
    }

    /// Decrypts one datagram into `out`. Zero means more datagrams are needed.
    pub fn decrypt(&mut self, ciphertext: &[u8], out: &mut [u8]) -> NetResult<usize> {
        self.require_established()?;
        self.engine.decrypt(ciphertext, out)
    }

    fn require_established(&self) -> NetResult<()> {
        if self.state == DtlsState::Established {
            Ok(())
        } else {
            Err(NetError::NotConnected)
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Engine replaying a fixed script of step outcomes.
    struct ScriptedEngine {
        steps: VecDeque<NetResult<(HandshakeStatus, Vec<Vec<u8>>)>>,
        outbound: VecDeque<Vec<u8>>,
        inputs: Vec<Option<Vec<u8>>>,
        peer_der: Option<Vec<u8>>,
    }

    impl ScriptedEngine {
        fn new(steps: Vec<NetResult<(HandshakeStatus, Vec<Vec<u8>>)>>) -> Self {
            ScriptedEngine {
                steps: steps.into(),
                outbound: VecDeque::new(),
                inputs: Vec::new(),
                peer_der: Some(b"peer certificate".to_vec()),
            }
        }
    }

    impl DtlsEngine for ScriptedEngine {
        fn step(&mut self, input: Option<&[u8]>) -> NetResult<HandshakeStatus> {
            self.inputs.push(input.map(<[u8]>::to_vec));
            let (status, out) = self
                .steps
                .pop_front()
                .unwrap_or(Ok((HandshakeStatus::Continue, Vec::new())))?;
            self.outbound.extend(out);
            Ok(status)
        }

        fn pop_outbound(&mut self) -> Option<Vec<u8>> {
            self.outbound.pop_front()
        }

        fn encrypt(&mut self, plain: &[u8]) -> NetResult<()> {
            let mut record = vec![0x17, 0xFE, 0xFD];
            record.extend_from_slice(plain);
            self.outbound.push_back(record);
            Ok(())
        }

        fn decrypt(&mut self, datagram: &[u8], out: &mut [u8]) -> NetResult<usize> {
            let body = datagram.get(3..).unwrap_or_default();
            out[..body.len()].copy_from_slice(body);
            Ok(body.len())
        }

        fn peer_certificate_der(&self) -> Option<Vec<u8>> {
            self.peer_der.clone()
        }
    }

    fn established(peer_fingerprint: Option<String>) -> DtlsChannel<ScriptedEngine> {
        let engine = ScriptedEngine::new(vec![Ok((HandshakeStatus::Complete, Vec::new()))]);
        let mut channel = DtlsChannel::with_engine(engine, peer_fingerprint);
        channel.handshake(None, |_| Ok(())).unwrap();
        channel
    }

    #[test]
    fn test_handshake_drains_until_quiet() {
        let engine = ScriptedEngine::new(vec![
            Ok((HandshakeStatus::Continue, vec![b"hello".to_vec()])),
            Ok((HandshakeStatus::Continue, vec![b"retransmit".to_vec()])),
            Ok((HandshakeStatus::Continue, Vec::new())),
        ]);
        let mut channel = DtlsChannel::with_engine(engine, None);
        assert_eq!(channel.state(), DtlsState::Idle);

        let mut sent = Vec::new();
        let status = channel
            .handshake(None, |d| {
                sent.push(d.to_vec());
                Ok(())
            })
            .unwrap();

        assert_eq!(status, HandshakeStatus::Continue);
        assert_eq!(channel.state(), DtlsState::Handshaking);
        assert_eq!(sent, vec![b"hello".to_vec(), b"retransmit".to_vec()]);
        // Input is fed on the first step only.
        assert_eq!(channel.engine().inputs, vec![None, None, None]);
    }

    #[test]
    fn test_incoming_fed_once() {
        let engine = ScriptedEngine::new(vec![
            Ok((HandshakeStatus::Continue, vec![b"flight".to_vec()])),
            Ok((HandshakeStatus::Complete, Vec::new())),
        ]);
        let mut channel = DtlsChannel::with_engine(engine, None);

        let status = channel.handshake(Some(b"server"), |_| Ok(())).unwrap();
        assert_eq!(status, HandshakeStatus::Complete);
        assert_eq!(
            channel.engine().inputs,
            vec![Some(b"server".to_vec()), None]
        );
    }

    #[test]
    fn test_complete_is_sticky() {
        let mut channel = established(None);
        assert_eq!(channel.state(), DtlsState::Established);

        let steps_before = channel.engine().inputs.len();
        let status = channel.handshake(Some(b"late"), |_| Ok(())).unwrap();
        assert_eq!(status, HandshakeStatus::Complete);
        assert_eq!(channel.state(), DtlsState::Established);
        assert_eq!(channel.engine().inputs.len(), steps_before);
    }

    #[test]
    fn test_engine_error_fails_channel() {
        let engine = ScriptedEngine::new(vec![Err(NetError::Dtls("alert".into()))]);
        let mut channel = DtlsChannel::with_engine(engine, None);

        assert!(channel.handshake(None, |_| Ok(())).is_err());
        assert_eq!(channel.state(), DtlsState::Failed);
        assert!(channel.handshake(None, |_| Ok(())).is_err());
        assert_eq!(channel.state(), DtlsState::Failed);
    }

    #[test]
    fn test_write_error_fails_channel() {
        let engine = ScriptedEngine::new(vec![Ok((HandshakeStatus::Continue, vec![b"x".to_vec()]))]);
        let mut channel = DtlsChannel::with_engine(engine, None);

        let result = channel.handshake(None, |_| Err(NetError::ConnectionClosed));
        assert_eq!(result, Err(NetError::ConnectionClosed));
        assert_eq!(channel.state(), DtlsState::Failed);
    }

    #[test]
    fn test_fingerprint_match_and_mismatch() {
        let good = Fingerprint::from_der(b"peer certificate").to_string();
        assert!(established(Some(good)).is_established());

        let engine = ScriptedEngine::new(vec![Ok((HandshakeStatus::Complete, Vec::new()))]);
        let mut channel =
            DtlsChannel::with_engine(engine, Some(Fingerprint::new([0u8; 32]).to_string()));
        let result = channel.handshake(None, |_| Ok(()));
        assert!(matches!(result, Err(NetError::FingerprintMismatch { .. })));
        assert_eq!(channel.state(), DtlsState::Failed);
    }

    #[test]
    fn test_missing_peer_certificate_fails_pinning() {
        let mut engine = ScriptedEngine::new(vec![Ok((HandshakeStatus::Complete, Vec::new()))]);
        engine.peer_der = None;
        let mut channel = DtlsChannel::with_engine(engine, Some("sha-256 00".into()));
        assert!(channel.handshake(None, |_| Ok(())).is_err());
        assert_eq!(channel.state(), DtlsState::Failed);
    }

    #[test]
    fn test_encrypt_requires_established() {
        let engine = ScriptedEngine::new(Vec::new());
        let mut channel = DtlsChannel::with_engine(engine, None);
        let mut out = [0u8; 64];
        assert_eq!(
            channel.encrypt(b"data", &mut out),
            Err(NetError::NotConnected)
        );
    }

    #[test]
    fn test_encrypt_checks_capacity() {
        let mut channel = established(None);

        let mut out = [0u8; 64];
        let n = channel.encrypt(b"data", &mut out).unwrap();
        assert_eq!(&out[..n], &[0x17, 0xFE, 0xFD, b'd', b'a', b't', b'a']);

        let mut small = [0u8; 4];
        assert!(matches!(
            channel.encrypt(b"data", &mut small),
            Err(NetError::BufferTooSmall { needed: 7, available: 4 })
        ));
    }

    #[test]
    fn test_decrypt_passthrough() {
        let mut channel = established(None);
        let mut out = [0u8; 16];
        let n = channel.decrypt(&[0x17, 0xFE, 0xFD, 1, 2], &mut out).unwrap();
        assert_eq!(&out[..n], &[1, 2]);
    }
}
