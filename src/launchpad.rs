//! Launchpad S session
//!
//! Owns the duplex MIDI channel to one device and tracks which LED buffer is
//! on display. Every write is sent and drained before the call returns, so
//! messages reach the device in program order.
//!
//! ```no_run
//! use launchpad_s::{Color, GridKey, Launchpad, Note};
//!
//! # fn main() -> launchpad_s::Result<()> {
//! let mut lp = Launchpad::open("Launchpad S", true)?;
//! lp.set_note(Note::on(GridKey::encode(0, 0), Color::RED_FULL))?;
//! lp.set_note(Note::on(GridKey::encode(0, 3), Color::GREEN_FULL))?;
//! lp.reset()?;
//! lp.close()?;
//! # Ok(())
//! # }
//! ```

use std::io;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    self, decode_event, format_hex, Buffer, BufferingFlags, Event, Grid, Note, COLS,
    MESSAGE_LEN, ROWS,
};
use crate::transport::{Channels, MidiTransport, RawInput, RawOutput, ReadMode, Transport};

/// An open connection to a Launchpad S
pub struct Launchpad {
    input: Option<Box<dyn RawInput>>,
    output: Option<Box<dyn RawOutput>>,
    mode: ReadMode,
    /// Buffer shown by the last swap that reached the device
    current_buffer: Buffer,
}

impl Launchpad {
    /// Open the device at `address` through the system MIDI API.
    ///
    /// With `nonblocking`, [`poll_event`](Self::poll_event) returns
    /// immediately when no input is pending. Writes always block.
    pub fn open(address: &str, nonblocking: bool) -> Result<Self> {
        Self::open_with(&MidiTransport::default(), address, nonblocking)
    }

    /// Open the device at `address` through `transport`
    pub fn open_with<T: Transport + ?Sized>(
        transport: &T,
        address: &str,
        nonblocking: bool,
    ) -> Result<Self> {
        let mode = ReadMode::from_nonblocking(nonblocking);
        let Channels { input, output } =
            transport
                .open(address, mode)
                .map_err(|source| Error::OpeningFailed {
                    address: address.to_string(),
                    source,
                })?;

        debug!("Launchpad opened at '{}' ({:?})", address, mode);

        Ok(Self {
            input: Some(input),
            output: Some(output),
            mode,
            current_buffer: Buffer::Zero,
        })
    }

    /// Borrow a session that may be absent
    pub fn require(session: Option<&mut Launchpad>) -> Result<&mut Launchpad> {
        session.ok_or(Error::NullSession)
    }

    pub fn is_open(&self) -> bool {
        self.input.is_some() || self.output.is_some()
    }

    pub fn is_nonblocking(&self) -> bool {
        self.mode == ReadMode::NonBlocking
    }

    /// Buffer currently on display
    pub fn current_buffer(&self) -> Buffer {
        self.current_buffer
    }

    /// Write one complete message and wait for it to reach the device
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let output = self.output.as_mut().ok_or(Error::Uninitialized)?;

        let written = output.write(data).map_err(|source| Error::WriteFailed {
            expected: data.len(),
            written: 0,
            source: Some(source),
        })?;
        if written != data.len() {
            return Err(Error::WriteFailed {
                expected: data.len(),
                written,
                source: None,
            });
        }

        output.drain().map_err(Error::DrainFailed)?;
        trace!("Sent: {}", format_hex(data));
        Ok(())
    }

    /// Turn every LED off
    pub fn reset(&mut self) -> Result<()> {
        self.send(&protocol::encode_reset())
    }

    /// Update a single pad
    pub fn set_note(&mut self, note: Note) -> Result<()> {
        self.send(&note.encode())
    }

    /// Update all 64 pads in one message
    pub fn set_grid(&mut self, grid: &Grid) -> Result<()> {
        self.send(&grid.encode())
    }

    /// Update all 64 pads from a row-major slice.
    ///
    /// An empty slice counts as a missing argument; any length other than 64
    /// is rejected before anything is sent.
    pub fn set_notes(&mut self, notes: &[Note]) -> Result<()> {
        if self.output.is_none() {
            return Err(Error::Uninitialized);
        }
        if notes.is_empty() {
            return Err(Error::ArgumentNull);
        }
        if notes.len() != ROWS * COLS {
            return Err(Error::GridLength {
                expected: ROWS * COLS,
                actual: notes.len(),
            });
        }
        self.send(&protocol::encode_notes(notes))
    }

    /// Low-level double-buffering control. Does not change
    /// [`current_buffer`](Self::current_buffer).
    pub fn set_buffering_flags(&mut self, flags: BufferingFlags) -> Result<()> {
        self.send(&protocol::encode_buffering_command(flags))
    }

    /// Show the buffer that was being updated and start updating the other
    /// one, copying the new display into it.
    ///
    /// The tracked buffer only changes once the command has been sent.
    pub fn swap_buffers(&mut self) -> Result<()> {
        let next = self.current_buffer.other();
        let flags = BufferingFlags::new(next, self.current_buffer).with_copy();
        self.set_buffering_flags(flags)?;
        self.current_buffer = next;
        Ok(())
    }

    /// Let the device flip buffers on its own so flagged LEDs blink
    pub fn enable_flashing(&mut self) -> Result<()> {
        self.send(&protocol::encode_flash_on())
    }

    pub fn disable_flashing(&mut self) -> Result<()> {
        self.send(&protocol::encode_flash_off())
    }

    /// Read the next button event.
    ///
    /// Returns `Ok(None)` when a non-blocking session has nothing pending, on
    /// a short read, and for messages that are not button events. A blocking
    /// session waits for input.
    pub fn poll_event(&mut self) -> Result<Option<Event>> {
        let input = self.input.as_mut().ok_or(Error::Uninitialized)?;

        let mut buf = [0u8; MESSAGE_LEN];
        let count = match input.read(&mut buf) {
            Ok(count) => count,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(Error::ReadFailed(e)),
        };

        let event = decode_event(&buf[..count]);
        if event.is_none() {
            trace!("Unclassified input: {}", format_hex(&buf[..count]));
        }
        Ok(event)
    }

    /// Close both channels. Closing a closed session does nothing.
    ///
    /// Both halves are released even if the first close fails; the first
    /// failure is returned.
    pub fn close(&mut self) -> Result<()> {
        let input = self.input.take().map(|input| input.close());
        let output = self.output.take().map(|output| output.close());

        if input.is_some() || output.is_some() {
            debug!("Launchpad closed");
        }

        for result in [input, output].into_iter().flatten() {
            result.map_err(Error::CloseFailed)?;
        }
        Ok(())
    }
}

impl Drop for Launchpad {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close Launchpad: {}", e);
        }
    }
}

impl std::fmt::Debug for Launchpad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launchpad")
            .field("open", &self.is_open())
            .field("mode", &self.mode)
            .field("current_buffer", &self.current_buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests;
