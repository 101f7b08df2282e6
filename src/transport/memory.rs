//! In-process loopback backend
//!
//! Records every byte written and serves bytes queued with
//! [`MemoryTransport::push_input`]. Faults can be switched on to exercise error
//! paths without hardware.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::{Channels, RawInput, RawOutput, ReadMode, Transport};
use crate::protocol::{Message, MESSAGE_LEN};

/// Failures to inject into channels opened from a [`MemoryTransport`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Faults {
    /// `open` fails with `NotFound`
    pub open: bool,
    /// Each write accepts at most this many bytes
    pub write_limit: Option<usize>,
    /// `drain` fails
    pub drain: bool,
    /// `read` fails with an I/O error other than `WouldBlock`
    pub read: bool,
    /// `close` fails on both halves
    pub close: bool,
}

#[derive(Debug, Default)]
struct State {
    written: Vec<u8>,
    inbound: VecDeque<u8>,
    faults: Faults,
    open_handles: usize,
    opened: usize,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    input_ready: Condvar,
}

/// Loopback transport. Clones share the same buffers.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    shared: Arc<Shared>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the input channel and wake a blocked reader
    pub fn push_input(&self, data: &[u8]) {
        self.shared.state.lock().inbound.extend(data.iter().copied());
        self.shared.input_ready.notify_all();
    }

    /// Everything written so far
    pub fn written(&self) -> Vec<u8> {
        self.shared.state.lock().written.clone()
    }

    /// Everything written so far, clearing the record
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.shared.state.lock().written)
    }

    /// Written bytes split into 3-byte messages. A trailing partial message is
    /// dropped.
    pub fn messages(&self) -> Vec<Message> {
        self.shared
            .state
            .lock()
            .written
            .chunks_exact(MESSAGE_LEN)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
            .collect()
    }

    pub fn set_faults(&self, faults: Faults) {
        self.shared.state.lock().faults = faults;
    }

    pub fn faults(&self) -> Faults {
        self.shared.state.lock().faults.clone()
    }

    /// Channel halves opened and not yet closed
    pub fn open_handles(&self) -> usize {
        self.shared.state.lock().open_handles
    }

    /// Number of successful `open` calls
    pub fn opened(&self) -> usize {
        self.shared.state.lock().opened
    }
}

impl Transport for MemoryTransport {
    fn open(&self, address: &str, mode: ReadMode) -> io::Result<Channels> {
        let mut state = self.shared.state.lock();
        if state.faults.open {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no device at '{}'", address),
            ));
        }
        state.open_handles += 2;
        state.opened += 1;

        Ok(Channels {
            input: Box::new(MemoryInput {
                shared: Arc::clone(&self.shared),
                mode,
            }),
            output: Box::new(MemoryOutput {
                shared: Arc::clone(&self.shared),
            }),
        })
    }
}

struct MemoryOutput {
    shared: Arc<Shared>,
}

impl RawOutput for MemoryOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.shared.state.lock();
        let count = match state.faults.write_limit {
            Some(limit) => data.len().min(limit),
            None => data.len(),
        };
        state.written.extend_from_slice(&data[..count]);
        Ok(count)
    }

    fn drain(&mut self) -> io::Result<()> {
        if self.shared.state.lock().faults.drain {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "drain failed"));
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        close_handle(&self.shared)
    }
}

struct MemoryInput {
    shared: Arc<Shared>,
    mode: ReadMode,
}

impl RawInput for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.shared.state.lock();
        loop {
            if state.faults.read {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "read failed"));
            }
            if !state.inbound.is_empty() || buf.is_empty() {
                break;
            }
            match self.mode {
                ReadMode::NonBlocking => return Err(io::Error::from(io::ErrorKind::WouldBlock)),
                ReadMode::Blocking => self.shared.input_ready.wait(&mut state),
            }
        }

        let count = buf.len().min(state.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        close_handle(&self.shared)
    }
}

fn close_handle(shared: &Shared) -> io::Result<()> {
    let mut state = shared.state.lock();
    state.open_handles = state.open_handles.saturating_sub(1);
    if state.faults.close {
        return Err(io::Error::other("close failed"));
    }
    Ok(())
}
