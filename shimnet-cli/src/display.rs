// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Display Helpers
//!
//! Terminal output formatting and styling.

use console::style;
use shimnet_core::HttpHeader;

/// Prints a success message.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Prints a received WebSocket message.
pub fn message(text: &str) {
    println!("{} {}", style("<").cyan().bold(), text);
}

/// Prints a response header block, keys dimmed.
pub fn header(header: &HttpHeader) {
    println!("{}", style(header.first_line()).bold());
    for (key, value) in header.fields() {
        println!("{}: {}", style(key).dim(), value);
    }
    println!();
}
