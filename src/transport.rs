//! Raw MIDI byte channels
//!
//! A [`Transport`] opens a device address into an input/output pair with raw
//! MIDI semantics: writes report how many bytes went out, `drain` waits until
//! they reached the device, and a non-blocking read with nothing pending fails
//! with [`io::ErrorKind::WouldBlock`].

pub mod memory;
pub mod system;

use std::io;

pub use self::memory::MemoryTransport;
pub use self::system::MidiTransport;

/// Read behavior of an input channel, fixed when it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// `read` waits until data arrives
    #[default]
    Blocking,
    /// `read` fails with `WouldBlock` when nothing is pending
    NonBlocking,
}

impl ReadMode {
    pub fn from_nonblocking(nonblocking: bool) -> Self {
        if nonblocking {
            ReadMode::NonBlocking
        } else {
            ReadMode::Blocking
        }
    }
}

/// Write half of a raw MIDI channel
pub trait RawOutput: Send {
    /// Write bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Wait until every written byte has been delivered
    fn drain(&mut self) -> io::Result<()>;

    /// Release the channel
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Read half of a raw MIDI channel
pub trait RawInput: Send {
    /// Read up to `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the channel
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Both halves of an opened device
pub struct Channels {
    pub input: Box<dyn RawInput>,
    pub output: Box<dyn RawOutput>,
}

/// Something that can open a device address into raw MIDI channels
pub trait Transport {
    /// Open `address`. The address is passed through unmodified.
    fn open(&self, address: &str, mode: ReadMode) -> io::Result<Channels>;
}
