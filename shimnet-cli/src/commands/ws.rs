// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Command
//!
//! Connects, sends the given messages and prints incoming text until the
//! peer closes or enough messages arrived.

use anyhow::{Context, Result};
use shimnet_core::{WebSocketChannel, WsRead};

use crate::config::{header_blob, CliConfig};
use crate::display;

pub fn run(
    config: &CliConfig,
    url: &str,
    messages: &[String],
    headers: &[String],
    count: Option<usize>,
) -> Result<()> {
    let ws_config = config.ws_config()?;
    let mut ws = WebSocketChannel::connect_url(url, &header_blob(headers), config.timeout(), &ws_config)
        .map_err(|e| match e.upgrade_status() {
            Some(status) => anyhow::anyhow!("upgrade failed with HTTP {}: {}", status, e),
            None => anyhow::Error::new(e),
        })
        .with_context(|| format!("connecting to {}", url))?;
    display::success(&format!("Connected to {}", url));

    for text in messages {
        ws.write_text(text)?;
    }

    let mut received = 0;
    loop {
        if count.is_some_and(|n| received >= n) {
            ws.close()?;
            break;
        }
        match ws.read(config.timeout())? {
            WsRead::Continue => {}
            WsRead::Message(text) => {
                display::message(&text);
                received += 1;
            }
            WsRead::Closed(code) => {
                display::info(&format!("Closed by peer (code {})", code));
                break;
            }
        }
    }

    Ok(())
}
