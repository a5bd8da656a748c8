// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shimnet CLI
//!
//! Command-line front end for the shimnet transport stack.

mod commands;
mod config;
mod display;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use config::CliConfig;

#[derive(Parser)]
#[command(name = "shimnet")]
#[command(version, about = "Client-side network transport toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Forward proxy URL (http://host:port)
    #[arg(long, global = true, env = "SHIMNET_PROXY")]
    proxy: Option<String>,

    /// Network timeout in milliseconds
    #[arg(long, global = true, env = "SHIMNET_TIMEOUT_MS", default_value_t = 10_000)]
    timeout_ms: u64,

    /// JSON network profile (NetConfig)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resolve hostnames to IPv6 addresses
    #[arg(long, global = true)]
    ipv6: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a WebSocket, send messages and print what comes back
    Ws {
        /// ws:// or wss:// URL
        url: String,

        /// Text message to send after connecting (repeatable)
        #[arg(long = "send", value_name = "TEXT")]
        messages: Vec<String>,

        /// Extra request header, `Key: Value` (repeatable)
        #[arg(long = "header", short = 'H', value_name = "HEADER")]
        headers: Vec<String>,

        /// Stop after this many received messages
        #[arg(long)]
        count: Option<usize>,
    },

    /// Perform a one-shot HTTP request
    Get {
        /// http:// or https:// URL
        url: String,

        /// Request body; switches the method to POST
        #[arg(long)]
        data: Option<String>,

        /// Extra request header, `Key: Value` (repeatable)
        #[arg(long = "header", short = 'H', value_name = "HEADER")]
        headers: Vec<String>,

        /// Print the response header as well
        #[arg(long, short = 'i')]
        include: bool,
    },

    /// Resolve a hostname
    Resolve {
        host: String,
    },

    /// Generate a self-signed certificate and print its fingerprint
    #[cfg(feature = "dtls")]
    Fingerprint {
        /// Add a subject alternative name for this host
        #[arg(long)]
        host: Option<String>,

        /// Print an existing PEM certificate's fingerprint instead
        #[arg(long, value_name = "FILE")]
        cert: Option<PathBuf>,

        /// Print the certificate and private key as PEM
        #[arg(long)]
        pem: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shimnet=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = CliConfig {
        proxy: cli.proxy,
        timeout_ms: cli.timeout_ms,
        profile: cli.config,
        ipv6: cli.ipv6,
    };

    let result = match cli.command {
        Commands::Ws {
            url,
            messages,
            headers,
            count,
        } => commands::ws::run(&config, &url, &messages, &headers, count),
        Commands::Get {
            url,
            data,
            headers,
            include,
        } => commands::http::get(&config, &url, data.as_deref(), &headers, include),
        Commands::Resolve { host } => commands::resolve::run(&config, &host),
        #[cfg(feature = "dtls")]
        Commands::Fingerprint { host, cert, pem } => {
            commands::fingerprint::run(host.as_deref(), cert.as_deref(), pem)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "shimnet", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result {
        display::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
