// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fingerprint Command
//!
//! Generates a DTLS certificate (or loads one) and prints the fingerprint
//! peers pin against.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use shimnet_core::crypto::base64_decode;
use shimnet_core::dtls::{Certificate, Fingerprint};

pub fn run(host: Option<&str>, cert: Option<&Path>, pem: bool) -> Result<()> {
    if let Some(path) = cert {
        let text = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let der = pem_to_der(&text)?;
        println!("{}", Fingerprint::from_der(&der));
        return Ok(());
    }

    let cert = match host {
        Some(host) => Certificate::generate_for_host(host)?,
        None => Certificate::generate()?,
    };
    println!("{}", cert.fingerprint()?);

    if pem {
        print!("{}", String::from_utf8_lossy(&cert.to_pem()?));
        print!("{}", String::from_utf8_lossy(&cert.private_key_pem()?));
    }
    Ok(())
}

/// Decodes the first `CERTIFICATE` block of a PEM file.
fn pem_to_der(pem: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(pem).context("certificate is not PEM text")?;
    let body: String = text
        .lines()
        .map(str::trim)
        .skip_while(|line| *line != "-----BEGIN CERTIFICATE-----")
        .skip(1)
        .take_while(|line| *line != "-----END CERTIFICATE-----")
        .collect();
    if body.is_empty() {
        bail!("no CERTIFICATE block found");
    }
    Ok(base64_decode(&body)?)
}
