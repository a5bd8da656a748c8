// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! In-memory implementation of the Transport trait for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::tcp::PollStatus;
use super::transport::Transport;
use crate::error::{NetError, NetResult};

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

#[derive(Default)]
struct MockState {
    /// Inbound chunks; `reads` counts one per chunk touched.
    inbound: VecDeque<Vec<u8>>,
    written: Vec<Vec<u8>>,
    inject_error: Option<NetError>,
    responder: Option<Responder>,
    closed: bool,
    reads: usize,
}

/// Mock transport for testing.
///
/// Clones share state, so a test can keep a handle after moving the
/// transport into a channel and inspect what the channel wrote.
///
/// # Example
///
/// ```ignore
/// use shimnet_core::net::MockTransport;
///
/// let transport = MockTransport::new();
/// let probe = transport.clone();
/// transport.queue_receive(b"HTTP/1.1 200 OK\r\n\r\n");
/// // ... hand `transport` to the code under test ...
/// assert_eq!(probe.written().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockTransport")
            .field("inbound_chunks", &state.inbound.len())
            .field("writes", &state.written.len())
            .finish()
    }
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues bytes to be returned by subsequent reads.
    pub fn queue_receive(&self, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.lock().inbound.push_back(bytes.to_vec());
        }
    }

    /// Queues bytes split into chunks of at most `chunk` bytes.
    pub fn queue_chunked(&self, bytes: &[u8], chunk: usize) {
        for piece in bytes.chunks(chunk.max(1)) {
            self.queue_receive(piece);
        }
    }

    /// Installs a callback run on every write; bytes it returns are queued
    /// for reading.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        self.lock().responder = Some(Box::new(responder));
    }

    /// Returns every write, one entry per call.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// Returns all written bytes concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.lock().written.concat()
    }

    /// Clears the write log.
    pub fn clear_written(&self) {
        self.lock().written.clear();
    }

    /// Number of unread inbound bytes.
    pub fn pending_bytes(&self) -> usize {
        self.lock().inbound.iter().map(Vec::len).sum()
    }

    /// Number of underlying read calls served.
    pub fn read_calls(&self) -> usize {
        self.lock().reads
    }

    /// Injects an error to be returned on the next operation.
    pub fn inject_error(&self, error: NetError) {
        self.lock().inject_error = Some(error);
    }

    /// Makes reads past the queued data fail with `ConnectionClosed`
    /// instead of `Timeout`.
    pub fn close_inbound(&self) {
        self.lock().closed = true;
    }

    fn check_error(state: &mut MockState) -> NetResult<()> {
        if let Some(err) = state.inject_error.take() {
            return Err(err);
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn poll_readable(&mut self, _timeout: Duration) -> NetResult<PollStatus> {
        let mut state = self.lock();
        Self::check_error(&mut state)?;
        if state.inbound.is_empty() && !state.closed {
            Ok(PollStatus::Continue)
        } else {
            Ok(PollStatus::Ready)
        }
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> NetResult<()> {
        let mut state = self.lock();
        Self::check_error(&mut state)?;

        let mut filled = 0;
        while filled < buf.len() {
            let Some(front) = state.inbound.front_mut() else {
                return Err(if state.closed {
                    NetError::ConnectionClosed
                } else {
                    NetError::Timeout
                });
            };
            let n = front.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&front[..n]);
            front.drain(..n);
            if front.is_empty() {
                state.inbound.pop_front();
            }
            filled += n;
            state.reads += 1;
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> NetResult<()> {
        let mut state = self.lock();
        Self::check_error(&mut state)?;
        state.written.push(buf.to_vec());

        let reply = state.responder.as_mut().and_then(|respond| respond(buf));
        if let Some(reply) = reply {
            if !reply.is_empty() {
                state.inbound.push_back(reply);
            }
        }
        Ok(())
    }
}
