// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP Header Parsing and Construction

use std::fmt::Write as _;

/// A parsed request or response header: the first line plus ordered fields.
///
/// Lookups are case-insensitive and return the first match; duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeader {
    first_line: String,
    fields: Vec<(String, String)>,
}

impl HttpHeader {
    /// Parses a raw header block.
    ///
    /// Lines are separated by any run of `\r`/`\n`, so blank lines vanish.
    /// Field lines split at the first `:` or space; the value starts after
    /// any following colons and spaces. Lines with neither are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut lines = raw.split(['\r', '\n']).filter(|line| !line.is_empty());

        let first_line = lines.next().unwrap_or_default().to_string();
        let fields = lines
            .filter_map(|line| {
                let delim = line.find([':', ' '])?;
                let key = &line[..delim];
                let value = line[delim..].trim_start_matches([':', ' ']);
                Some((key.to_string(), value.to_string()))
            })
            .collect();

        HttpHeader { first_line, fields }
    }

    /// The request or status line, verbatim.
    pub fn first_line(&self) -> &str {
        &self.first_line
    }

    /// All fields in arrival order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Status code: the second space-separated token of the first line.
    ///
    /// Leading digits are parsed; a token without any, or one outside the
    /// `u16` range, yields 0. `None` when the first line has fewer than two
    /// tokens.
    pub fn status_code(&self) -> Option<u16> {
        let token = self.first_line.split(' ').filter(|t| !t.is_empty()).nth(1)?;
        Some(
            leading_int(token)
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(0),
        )
    }

    /// First value stored under `key`, compared case-insensitively.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// First value under `key` parsed as a decimal integer (leading digits
    /// with optional sign; trailing text is ignored).
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get_str(key).and_then(leading_int)
    }
}

/// Parses an optionally signed run of leading decimal digits after whitespace.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Accumulates `Key: Value\r\n` lines for a request or response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    text: String,
}

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, name: &str, value: &str) -> &mut Self {
        let _ = write!(self.text, "{}: {}\r\n", name, value);
        self
    }

    pub fn push_int(&mut self, name: &str, value: i64) -> &mut Self {
        let _ = write!(self.text, "{}: {}\r\n", name, value);
        self
    }

    /// Appends every `(key, value)` pair.
    pub fn extend<'a, I>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in pairs {
            self.push_str(key, value);
        }
        self
    }

    /// True if a field named `name` was already pushed (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.text.split("\r\n").any(|line| {
            line.split_once(':')
                .is_some_and(|(key, _)| key.eq_ignore_ascii_case(name))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Parses a caller-supplied `Key: Value\n` blob into pairs.
///
/// Each line's key ends at the first space or colon (runs of either are
/// skipped); the value is the remainder with leading spaces and tabs removed
/// and a trailing `\r` dropped. Parsing stops at the first line without a value.
pub fn parse_header_lines(blob: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for line in blob.split('\n').filter(|l| !l.is_empty()) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let rest = line.trim_start_matches([' ', ':']);
        let Some(key_end) = rest.find([' ', ':']) else {
            break;
        };
        let key = &rest[..key_end];
        let value = rest[key_end + 1..].trim_start_matches([' ', '\t']);
        if key.is_empty() || rest.len() == key_end + 1 {
            break;
        }
        pairs.push((key.to_string(), value.to_string()));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_line_and_fields() {
        let raw = "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n";
        let header = HttpHeader::parse(raw);

        assert_eq!(header.first_line(), "HTTP/1.1 101 Switching Protocols");
        assert_eq!(header.status_code(), Some(101));
        assert_eq!(header.get_str("upgrade"), Some("websocket"));
        assert_eq!(header.get_str("CONNECTION"), Some("Upgrade"));
        assert_eq!(header.fields().len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let header = HttpHeader::parse("HTTP/1.1 200 OK\r\nX-Id: 1\r\nx-id: 2\r\n\r\n");
        assert_eq!(header.get_str("X-ID"), Some("1"));
        assert_eq!(header.fields().len(), 2);
    }

    #[test]
    fn test_split_on_space_or_colon() {
        let header = HttpHeader::parse("GET / HTTP/1.1\r\nHost:example.com\r\nWeird value here\r\nNoDelimiter\r\n");
        assert_eq!(header.get_str("host"), Some("example.com"));
        assert_eq!(header.get_str("weird"), Some("value here"));
        assert_eq!(header.fields().len(), 2);
    }

    #[test]
    fn test_get_int_like_strtol() {
        let header = HttpHeader::parse(
            "HTTP/1.1 200 OK\r\nContent-Length: 42\r\nX-Neg: -7 units\r\nX-Bad: abc\r\n",
        );
        assert_eq!(header.get_int("content-length"), Some(42));
        assert_eq!(header.get_int("x-neg"), Some(-7));
        assert_eq!(header.get_int("x-bad"), None);
        assert_eq!(header.get_int("missing"), None);
    }

    #[test]
    fn test_status_code_missing_token() {
        assert_eq!(HttpHeader::parse("HTTP/1.1\r\n").status_code(), None);
        assert_eq!(HttpHeader::parse("HTTP/1.1 abc\r\n").status_code(), Some(0));
        assert_eq!(HttpHeader::parse("").status_code(), None);
    }

    #[test]
    fn test_status_code_out_of_range() {
        assert_eq!(HttpHeader::parse("HTTP/1.1 65736 Nope\r\n").status_code(), Some(0));
        assert_eq!(HttpHeader::parse("HTTP/1.1 -65435 Nope\r\n").status_code(), Some(0));
        assert_eq!(HttpHeader::parse("HTTP/1.1 65535 Max\r\n").status_code(), Some(65535));
    }

    #[test]
    fn test_header_fields_builder() {
        let mut fields = HeaderFields::new();
        fields.push_str("User-Agent", "shimnet").push_int("Content-Length", 12);
        assert_eq!(fields.as_str(), "User-Agent: shimnet\r\nContent-Length: 12\r\n");
        assert!(fields.contains("user-agent"));
        assert!(!fields.contains("Host"));
    }

    #[test]
    fn test_parse_header_lines_blob() {
        let pairs = parse_header_lines("Authorization: Bearer abc\nX-Trace:\t 7\r\n\nOrigin: https://app.test\n");
        assert_eq!(
            pairs,
            vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("X-Trace".to_string(), "7".to_string()),
                ("Origin".to_string(), "https://app.test".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_header_lines_stops_at_bare_key() {
        let pairs = parse_header_lines("A: 1\nBare\nB: 2\n");
        assert_eq!(pairs, vec![("A".to_string(), "1".to_string())]);
    }
}
