// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Configuration

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use shimnet_core::{NetConfig, ProxyConfig, WebSocketConfig};
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Proxy URL from `--proxy` or `SHIMNET_PROXY`; overrides the profile.
    pub proxy: Option<String>,
    pub timeout_ms: u64,
    /// Optional JSON `NetConfig` profile.
    pub profile: Option<PathBuf>,
    pub ipv6: bool,
}

impl CliConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builds the network config: profile first, then command-line overrides.
    pub fn net_config(&self) -> Result<NetConfig> {
        let mut config = match &self.profile {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading profile {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing profile {}", path.display()))?
            }
            None => NetConfig::default(),
        };

        if let Some(url) = &self.proxy {
            config.proxy = ProxyConfig::from_url(url)?;
        }
        if self.ipv6 {
            config.ipv6 = true;
        }
        debug!("network config: {:?}", config);
        Ok(config)
    }

    pub fn ws_config(&self) -> Result<WebSocketConfig> {
        Ok(WebSocketConfig {
            net: self.net_config()?,
            ..WebSocketConfig::default()
        })
    }
}

/// Joins repeated `--header` values into a `Key: Value\n` blob.
pub fn header_blob(headers: &[String]) -> String {
    headers.iter().map(|h| format!("{}\n", h.trim())).collect()
}
