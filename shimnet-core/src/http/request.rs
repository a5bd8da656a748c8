// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! One-Shot HTTP Requests
//!
//! Sends a single request on a fresh connection and reads the full
//! response body (fixed length or chunked, optionally gzip-encoded).

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use tracing::debug;

use super::header::{parse_header_lines, HeaderFields, HttpHeader};
use super::io::{read_header, write_request};
use super::url::parse_url;
use crate::error::{NetError, NetResult};
use crate::net::{Net, NetConfig, Transport};

/// Largest response body accepted, before or after decompression.
pub const MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024;

/// User agent sent when the caller supplies none.
pub const USER_AGENT: &str = concat!("shimnet/", env!("CARGO_PKG_VERSION"));

const CHUNK_LINE_MAX: usize = 64;

/// A request without its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Default for HttpRequest {
    fn default() -> Self {
        HttpRequest::new("GET")
    }
}

impl HttpRequest {
    pub fn new(method: &str) -> Self {
        HttpRequest {
            method: method.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new("GET")
    }

    pub fn post(body: impl Into<Vec<u8>>) -> Self {
        Self::new("POST").with_body(body)
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds headers from a `Key: Value\n` blob.
    pub fn with_header_blob(mut self, blob: &str) -> Self {
        self.headers.extend(parse_header_lines(blob));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Header fields sent on the wire: `Connection: close`, the caller's
    /// headers, a default `User-Agent` if none was given, and
    /// `Content-Length` for a non-empty body.
    pub fn fields(&self) -> HeaderFields {
        let mut fields = HeaderFields::new();
        fields.push_str("Connection", "close");
        fields.extend(self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if !self
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("User-Agent"))
        {
            fields.push_str("User-Agent", USER_AGENT);
        }
        if !self.body.is_empty() {
            fields.push_int("Content-Length", self.body.len() as i64);
        }
        fields
    }

    /// Sends the request over an established transport and reads the response.
    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        host: &str,
        path: &str,
        timeout: Duration,
    ) -> NetResult<HttpResponse> {
        write_request(transport, &self.method, host, path, &self.fields())?;
        if !self.body.is_empty() {
            transport.write(&self.body)?;
        }

        let header = read_header(transport, timeout)?;
        let status = header
            .status_code()
            .ok_or_else(|| NetError::InvalidHeader(format!("bad status line: {}", header.first_line())))?;

        let mut body = read_body(transport, &header, timeout)?;
        if !body.is_empty()
            && header
                .get_str("Content-Encoding")
                .is_some_and(|v| v.eq_ignore_ascii_case("gzip"))
        {
            body = gunzip(&body)?;
        }

        debug!("{} {} -> {} ({} bytes)", self.method, path, status, body.len());
        Ok(HttpResponse {
            status,
            header,
            body,
        })
    }
}

/// A complete response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub header: HttpHeader,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Connects to `url`, sends `request`, and returns the response.
pub fn fetch(url: &str, request: &HttpRequest, timeout: Duration, config: &NetConfig) -> NetResult<HttpResponse> {
    let parsed = parse_url(url)?;
    let mut net = Net::connect(&parsed.host, parsed.port, parsed.secure, timeout, config)?;
    request.send(&mut net, &parsed.host_header(), &parsed.path, timeout)
}

fn read_body<T: Transport + ?Sized>(
    transport: &mut T,
    header: &HttpHeader,
    timeout: Duration,
) -> NetResult<Vec<u8>> {
    if let Some(length) = header.get_int("Content-Length").filter(|&n| n > 0) {
        let length = length as usize;
        if length > MAX_RESPONSE_SIZE {
            return Err(NetError::ResponseTooLarge(MAX_RESPONSE_SIZE));
        }
        let mut body = vec![0u8; length];
        transport.read(&mut body, timeout)?;
        return Ok(body);
    }

    if header
        .get_str("Transfer-Encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        return read_chunked(transport, timeout);
    }

    Ok(Vec::new())
}

fn read_chunked<T: Transport + ?Sized>(transport: &mut T, timeout: Duration) -> NetResult<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let len = read_chunk_len(transport, timeout)?;
        if len > MAX_RESPONSE_SIZE || body.len() + len > MAX_RESPONSE_SIZE {
            return Err(NetError::ResponseTooLarge(MAX_RESPONSE_SIZE));
        }

        // Chunk data plus its trailing CRLF.
        let start = body.len();
        body.resize(start + len + 2, 0);
        transport.read(&mut body[start..], timeout)?;
        body.truncate(start + len);

        if len == 0 {
            return Ok(body);
        }
    }
}

/// Reads a chunk-size line and parses its leading hex digits.
fn read_chunk_len<T: Transport + ?Sized>(transport: &mut T, timeout: Duration) -> NetResult<usize> {
    let mut line = Vec::with_capacity(CHUNK_LINE_MAX);
    let mut byte = [0u8; 1];

    while line.len() < CHUNK_LINE_MAX - 1 {
        transport.read(&mut byte, timeout)?;
        line.push(byte[0]);
        if line.ends_with(b"\r\n") {
            let digits: String = line
                .iter()
                .take_while(|b| b.is_ascii_hexdigit())
                .map(|&b| b as char)
                .collect();
            if digits.is_empty() {
                return Ok(0);
            }
            return usize::from_str_radix(&digits, 16)
                .map_err(|_| NetError::Protocol(format!("invalid chunk size: {}", digits)));
        }
    }

    Err(NetError::Protocol("chunk size line too long".into()))
}

fn gunzip(data: &[u8]) -> NetResult<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .take(MAX_RESPONSE_SIZE as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| NetError::Decompress(e.to_string()))?;
    if out.len() > MAX_RESPONSE_SIZE {
        return Err(NetError::ResponseTooLarge(MAX_RESPONSE_SIZE));
    }
    Ok(out)
}
