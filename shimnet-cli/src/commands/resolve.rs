// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resolve Command

use anyhow::{Context, Result};
use shimnet_core::net::query;

use crate::config::CliConfig;

pub fn run(config: &CliConfig, host: &str) -> Result<()> {
    let ip = query(host, config.ipv6).with_context(|| format!("resolving {}", host))?;
    println!("{}", ip);
    Ok(())
}
