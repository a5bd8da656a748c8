// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Self-Signed Certificates
//!
//! Short-lived RSA certificates for DTLS sessions that are trusted by
//! fingerprint rather than by a certificate authority.

use std::fmt;

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{ExtendedKeyUsage, SubjectAlternativeName};
use openssl::x509::{X509NameBuilder, X509};

use super::fingerprint::Fingerprint;
use crate::crypto::random_array;
use crate::error::{NetError, NetResult};

const RSA_BITS: u32 = 2048;
const VALIDITY_DAYS: u32 = 30;
const SERIAL_MIN: u32 = 1_000_000_000;

/// An X.509 certificate with its private key.
#[derive(Clone)]
pub struct Certificate {
    cert: X509,
    key: PKey<Private>,
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("fingerprint", &self.fingerprint().ok())
            .finish()
    }
}

impl Certificate {
    /// Generates a self-signed certificate with a random hex common name.
    pub fn generate() -> NetResult<Self> {
        Self::build(None)
    }

    /// Like [`Certificate::generate`] with `host` as DNS or IP subject
    /// alternative name, usable as a TLS server certificate.
    pub fn generate_for_host(host: &str) -> NetResult<Self> {
        Self::build(Some(host))
    }

    fn build(host: Option<&str>) -> NetResult<Self> {
        let key = PKey::from_rsa(Rsa::generate(RSA_BITS)?)?;

        let common_name = hex::encode(random_array::<16>()?);
        let mut name = X509NameBuilder::new()?;
        name.append_entry_by_nid(Nid::COMMONNAME, &common_name)?;
        let name = name.build();

        let serial_offset = u32::from_be_bytes(random_array::<4>()?) % SERIAL_MIN;
        let serial = BigNum::from_u32(SERIAL_MIN + serial_offset)?.to_asn1_integer()?;

        let mut builder = X509::builder()?;
        builder.set_version(2)?;
        builder.set_serial_number(&serial)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;
        builder.set_pubkey(&key)?;
        let not_before: Asn1Time = Asn1Time::days_from_now(0)?;
        let not_after: Asn1Time = Asn1Time::days_from_now(VALIDITY_DAYS)?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;

        if let Some(host) = host {
            let mut san = SubjectAlternativeName::new();
            if crate::net::dns::parse_literal(host).is_some() {
                san.ip(host);
            } else {
                san.dns(host);
            }
            let san = san.build(&builder.x509v3_context(None, None))?;
            builder.append_extension(san)?;
            builder.append_extension(ExtendedKeyUsage::new().server_auth().client_auth().build()?)?;
        }

        builder.sign(&key, MessageDigest::sha256())?;
        Ok(Certificate {
            cert: builder.build(),
            key,
        })
    }

    /// Loads a certificate and its PEM private key (PKCS#8 or traditional RSA).
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> NetResult<Self> {
        let cert = X509::from_pem(cert_pem)?;
        let key = PKey::private_key_from_pem(key_pem)?;

        let cert_key = cert.public_key()?;
        if !key.public_eq(&cert_key) {
            return Err(NetError::Crypto(
                "private key does not match certificate".into(),
            ));
        }
        Ok(Certificate { cert, key })
    }

    /// `sha-256 XX:..` fingerprint of the DER encoding.
    pub fn fingerprint(&self) -> NetResult<Fingerprint> {
        Ok(Fingerprint::from_der(&self.to_der()?))
    }

    pub fn to_der(&self) -> NetResult<Vec<u8>> {
        Ok(self.cert.to_der()?)
    }

    pub fn to_pem(&self) -> NetResult<Vec<u8>> {
        Ok(self.cert.to_pem()?)
    }

    /// PKCS#8 DER encoding of the private key.
    pub fn private_key_der(&self) -> NetResult<Vec<u8>> {
        Ok(self.key.private_key_to_pkcs8()?)
    }

    pub fn private_key_pem(&self) -> NetResult<Vec<u8>> {
        Ok(self.key.private_key_to_pem_pkcs8()?)
    }

    pub fn x509(&self) -> &X509 {
        &self.cert
    }

    pub fn private_key(&self) -> &PKey<Private> {
        &self.key
    }
}
