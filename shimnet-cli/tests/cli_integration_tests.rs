// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Integration Tests
//!
//! Drives the built `shimnet` binary against loopback servers.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::thread;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shimnet"))
        .env_remove("SHIMNET_PROXY")
        .env("SHIMNET_TIMEOUT_MS", "5000")
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn run_success(args: &[&str]) -> String {
    let output = run(args);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    assert!(
        output.status.success(),
        "Command {:?} failed.\nStdout: {}\nStderr: {}",
        args,
        stdout,
        stderr
    );
    stdout
}

fn run_failure(args: &[&str]) -> String {
    let output = run(args);
    assert!(!output.status.success(), "Command {:?} should have failed", args);
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn read_head(stream: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut byte = [0u8; 1];
    while !raw.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).unwrap();
        raw.push(byte[0]);
    }
    String::from_utf8(raw).unwrap()
}

/// Serves one HTTP response and returns the request head it saw.
fn one_shot_server(response: &'static [u8]) -> (u16, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let head = read_head(&mut stream);
        stream.write_all(response).unwrap();
        head
    });
    (port, handle)
}

#[test]
fn test_help_lists_commands() {
    let stdout = run_success(&["--help"]);
    for command in ["ws", "get", "resolve", "completions"] {
        assert!(stdout.contains(command), "missing {} in help", command);
    }
}

#[test]
fn test_resolve_literal() {
    assert_eq!(run_success(&["resolve", "127.0.0.1"]).trim(), "127.0.0.1");
}

#[test]
fn test_get_prints_body() {
    let (port, server) =
        one_shot_server(b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\n\r\nhello shimnet");
    let url = format!("http://127.0.0.1:{}/greeting", port);

    let stdout = run_success(&["get", &url, "-H", "X-Test: yes"]);
    assert_eq!(stdout, "hello shimnet");

    let head = server.join().unwrap();
    assert!(head.starts_with("GET /greeting HTTP/1.1\r\n"));
    assert!(head.contains("X-Test: yes\r\n"));
}

#[test]
fn test_get_through_proxy_refusal_fails() {
    let (port, server) = one_shot_server(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n");
    let proxy = format!("http://127.0.0.1:{}", port);

    let stderr = run_failure(&["--proxy", &proxy, "get", "http://backend.test/"]);
    assert!(stderr.contains("407"));

    let head = server.join().unwrap();
    assert!(head.starts_with("CONNECT backend.test:80 HTTP/1.1\r\n"));
}

#[test]
fn test_ws_upgrade_rejection_reports_status() {
    let (port, server) = one_shot_server(b"HTTP/1.1 404 Not Found\r\n\r\n");
    let url = format!("ws://127.0.0.1:{}/socket", port);

    let stderr = run_failure(&["ws", &url]);
    assert!(stderr.contains("404"));
    server.join().unwrap();
}

#[test]
fn test_invalid_url_fails() {
    run_failure(&["get", "ftp://example.com/file"]);
}

#[cfg(feature = "dtls")]
#[test]
fn test_fingerprint_format() {
    let stdout = run_success(&["fingerprint"]);
    let line = stdout.trim();
    assert!(line.starts_with("sha-256 "));
    // 32 bytes as colon-separated hex pairs.
    assert_eq!(line.len(), "sha-256 ".len() + 32 * 3 - 1);
}

#[cfg(feature = "dtls")]
#[test]
fn test_fingerprint_of_pem_file_matches() {
    let stdout = run_success(&["fingerprint", "--host", "localhost", "--pem"]);
    let mut lines = stdout.lines();
    let fingerprint = lines.next().unwrap().to_string();
    let pem: String = lines.map(|l| format!("{}\n", l)).collect();

    let path = std::env::temp_dir().join(format!("shimnet-cli-test-{}.pem", std::process::id()));
    std::fs::write(&path, pem).unwrap();
    let again = run_success(&["fingerprint", "--cert", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(again.trim(), fingerprint);
}
