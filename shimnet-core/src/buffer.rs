// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Byte Buffer
//!
//! Growable byte buffer with prefix consumption. Used for the secure
//! channel's record and plaintext buffers and for frame serialization.

use std::io;

/// Owned byte buffer whose valid bytes always start at offset 0.
///
/// Capacity only grows: consuming or clearing keeps the allocation so the
/// buffer settles at the size of the largest unit it has carried.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        ByteBuffer { data: Vec::new() }
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Number of valid (pending) bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Makes sure `additional` more bytes fit without reallocating.
    pub fn ensure_capacity(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    /// Appends bytes after the pending ones.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Appends `n` zeroed bytes and returns them for the caller to fill.
    ///
    /// Pair with [`ByteBuffer::truncate`] when fewer bytes were produced.
    pub fn fill_mut(&mut self, n: usize) -> &mut [u8] {
        let start = self.data.len();
        self.data.resize(start + n, 0);
        &mut self.data[start..]
    }

    /// Drops bytes past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Removes the first `n` bytes, moving the remainder to offset 0.
    ///
    /// Consuming more than is pending empties the buffer.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.data.len());
        self.data.drain(..n);
    }

    /// Copies the first `out.len()` bytes into `out` and consumes them.
    ///
    /// Returns false without touching anything if not enough bytes are pending.
    pub fn take_into(&mut self, out: &mut [u8]) -> bool {
        if out.len() > self.data.len() {
            return false;
        }
        out.copy_from_slice(&self.data[..out.len()]);
        self.consume(out.len());
        true
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl io::Write for ByteBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_compacts_to_front() {
        let mut buf = ByteBuffer::new();
        buf.extend_from_slice(b"hello world");
        buf.consume(6);
        assert_eq!(buf.as_slice(), b"world");
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_consume_past_end_empties() {
        let mut buf = ByteBuffer::new();
        buf.extend_from_slice(b"abc");
        buf.consume(10);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_capacity_never_shrinks() {
        let mut buf = ByteBuffer::new();
        buf.ensure_capacity(4096);
        let cap = buf.capacity();
        buf.extend_from_slice(&[1u8; 100]);
        buf.consume(100);
        buf.clear();
        assert!(buf.capacity() >= cap);
    }

    #[test]
    fn test_take_into_requires_enough_bytes() {
        let mut buf = ByteBuffer::new();
        buf.extend_from_slice(b"abcdef");

        let mut out = [0u8; 8];
        assert!(!buf.take_into(&mut out));
        assert_eq!(buf.len(), 6);

        let mut out = [0u8; 4];
        assert!(buf.take_into(&mut out));
        assert_eq!(&out, b"abcd");
        assert_eq!(buf.as_slice(), b"ef");
    }

    #[test]
    fn test_fill_mut_then_truncate() {
        let mut buf = ByteBuffer::new();
        buf.extend_from_slice(b"ab");
        let slot = buf.fill_mut(10);
        slot[..3].copy_from_slice(b"cde");
        buf.truncate(5);
        assert_eq!(buf.as_slice(), b"abcde");
    }
}
