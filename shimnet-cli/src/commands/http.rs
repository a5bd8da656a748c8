// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP Command

use std::io::{self, Write};

use anyhow::{Context, Result};
use shimnet_core::{fetch, HttpRequest};

use crate::config::{header_blob, CliConfig};
use crate::display;

/// Sends one request and writes the body to stdout.
pub fn get(
    config: &CliConfig,
    url: &str,
    data: Option<&str>,
    headers: &[String],
    include: bool,
) -> Result<()> {
    let request = match data {
        Some(body) => HttpRequest::post(body),
        None => HttpRequest::get(),
    }
    .with_header_blob(&header_blob(headers));

    let response = fetch(url, &request, config.timeout(), &config.net_config()?)
        .with_context(|| format!("requesting {}", url))?;

    if include {
        display::header(&response.header);
    }
    io::stdout().write_all(&response.body)?;
    io::stdout().flush()?;

    if response.status >= 400 {
        display::warning(&format!("HTTP {}", response.status));
    }
    Ok(())
}
