//! Driver for the Novation Launchpad S
//!
//! The Launchpad S is an 8x8 grid of two-color pads with a column of side
//! buttons and a top row of "Automap" buttons, controlled over plain MIDI.
//! This crate provides:
//! - [`protocol`]: pure encoding of lighting commands and decoding of button
//!   events
//! - [`Launchpad`]: a session over a raw MIDI channel with double buffering,
//!   flashing and event polling
//! - [`transport`]: the channel seam, with a system MIDI backend and an
//!   in-memory loopback for tests

pub mod error;
pub mod launchpad;
pub mod protocol;
pub mod transport;

pub use error::{Error, Result};
pub use launchpad::Launchpad;
pub use protocol::{
    Brightness, Buffer, BufferingFlags, Color, Event, EventKind, Grid, GridKey, Note, NoteState,
};
pub use transport::{MemoryTransport, MidiTransport, ReadMode, Transport};
