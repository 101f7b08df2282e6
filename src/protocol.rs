//! Launchpad S wire protocol
//!
//! Encoding of outbound lighting commands and decoding of inbound button
//! messages. Everything here is pure: no I/O, no device state. Every message
//! is exactly three bytes; a full-grid update is 64 note messages back to back.
//!
//! ## Indexing
//!
//! ```text
//!  A0 A1 A2 A3 A4 A5 A6 A7         <- Automap row (control change 0x68-0x6F)
//!   0  1  2  3  4  5  6  7     8
//!  16 17 18 19 20 21 22 23    24
//!  32  .  .  .  .  .  .  .    40
//!  ..                         ..
//! 112  .  .  .  .  .  .  .   120
//! ```

pub mod color;
pub mod event;
pub mod grid;

use std::fmt;

pub use color::{Brightness, BufferWrite, Color};
pub use event::{decode_event, Event, EventKind};
pub use grid::Grid;

/// Rows in the main grid
pub const ROWS: usize = 8;

/// Columns in the main grid
pub const COLS: usize = 8;

/// Length of every message on the wire
pub const MESSAGE_LEN: usize = 3;

/// Length of a full-grid update
pub const GRID_MESSAGE_LEN: usize = MESSAGE_LEN * ROWS * COLS;

/// MIDI status bytes used by the device
pub mod status {
    /// Note on, used for lighting a pad and for inbound presses
    pub const NOTE_ON: u8 = 0x90;
    /// Note off
    pub const NOTE_OFF: u8 = 0x80;
    /// Control change, used for device control and the Automap row
    pub const CONTROL_CHANGE: u8 = 0xB0;
}

/// Controller numbers and data bytes of control change messages
pub mod control {
    /// Controller number carrying reset and double-buffering commands
    pub const DEVICE_CONTROL: u8 = 0x00;
    /// Data byte of the reset command
    pub const RESET: u8 = 0x00;
    /// Added to the double-buffering flags to form the data byte
    pub const BUFFERING_BASE: u8 = 0x20;
    /// Start automatic flashing
    pub const FLASH_ON: u8 = 0x28;
    /// Stop automatic flashing
    pub const FLASH_OFF: u8 = 0x21;
    /// Controller number of the first Automap button
    pub const AUTOMAP_BASE: u8 = 0x68;
}

/// A raw 3-byte message
pub type Message = [u8; MESSAGE_LEN];

/// Whether a pad is lit. The discriminant doubles as the MIDI status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NoteState {
    On = status::NOTE_ON,
    Off = status::NOTE_OFF,
}

impl NoteState {
    /// Status byte of this state
    pub const fn status(self) -> u8 {
        self as u8
    }
}

/// Device address of a grid pad, `16 * row + col`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey(u8);

impl GridKey {
    /// Key for a pad of the 8x8 grid, or `None` when out of range
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < ROWS && (col as usize) < COLS {
            Some(Self::encode(row, col))
        } else {
            None
        }
    }

    /// Unchecked key arithmetic. Also reaches the side column (col 8).
    pub const fn encode(row: u8, col: u8) -> Self {
        Self(row.wrapping_mul(0x10).wrapping_add(col))
    }

    /// Wrap a raw device byte
    pub const fn from_raw(key: u8) -> Self {
        Self(key)
    }

    /// Raw device byte
    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn row(self) -> u8 {
        self.0 / 16
    }

    /// Column, decoded with the same arithmetic as inbound events.
    /// Only low nibbles below 9 map back onto themselves.
    pub const fn col(self) -> u8 {
        (self.0 % 16) % 9
    }
}

/// A single pad update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub state: NoteState,
    pub key: GridKey,
    pub color: Color,
}

impl Note {
    pub const fn new(state: NoteState, key: GridKey, color: Color) -> Self {
        Self { state, key, color }
    }

    /// Lit pad
    pub const fn on(key: GridKey, color: Color) -> Self {
        Self::new(NoteState::On, key, color)
    }

    /// Dark pad
    pub const fn off(key: GridKey) -> Self {
        Self::new(NoteState::Off, key, Color::OFF)
    }

    pub const fn encode(&self) -> Message {
        encode_note(self)
    }
}

/// One of the two LED buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Buffer {
    #[default]
    Zero,
    One,
}

impl Buffer {
    /// The buffer that is not `self`
    pub const fn other(self) -> Self {
        match self {
            Buffer::Zero => Buffer::One,
            Buffer::One => Buffer::Zero,
        }
    }

    pub const fn index(self) -> u8 {
        match self {
            Buffer::Zero => 0,
            Buffer::One => 1,
        }
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Double-buffering control flags.
///
/// | bit | meaning                                                       |
/// |-----|---------------------------------------------------------------|
/// | 0   | display buffer 1 (clear: buffer 0)                            |
/// | 2   | update buffer 1 (clear: buffer 0)                             |
/// | 3   | flash: continually flip the displayed buffer                  |
/// | 4   | copy the new displayed buffer into the new updating buffer    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferingFlags(u8);

impl BufferingFlags {
    pub const DISPLAY_0: u8 = 0;
    pub const DISPLAY_1: u8 = 1;
    pub const UPDATE_0: u8 = 0;
    pub const UPDATE_1: u8 = 1 << 2;
    pub const FLASH: u8 = 1 << 3;
    pub const COPY: u8 = 1 << 4;

    const MASK: u8 = 0x1F;

    /// Select the displayed and updated buffers, no flash, no copy
    pub const fn new(display: Buffer, update: Buffer) -> Self {
        let display = match display {
            Buffer::Zero => Self::DISPLAY_0,
            Buffer::One => Self::DISPLAY_1,
        };
        let update = match update {
            Buffer::Zero => Self::UPDATE_0,
            Buffer::One => Self::UPDATE_1,
        };
        Self(display | update)
    }

    /// Raw flags; `None` when bits above the low five are set
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::MASK == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn with_flash(self) -> Self {
        Self(self.0 | Self::FLASH)
    }

    pub const fn with_copy(self) -> Self {
        Self(self.0 | Self::COPY)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn display(self) -> Buffer {
        if self.0 & Self::DISPLAY_1 != 0 {
            Buffer::One
        } else {
            Buffer::Zero
        }
    }

    pub const fn update(self) -> Buffer {
        if self.0 & Self::UPDATE_1 != 0 {
            Buffer::One
        } else {
            Buffer::Zero
        }
    }

    pub const fn flash(self) -> bool {
        self.0 & Self::FLASH != 0
    }

    pub const fn copy(self) -> bool {
        self.0 & Self::COPY != 0
    }
}

/// Encode a single pad update
pub const fn encode_note(note: &Note) -> Message {
    [note.state.status(), note.key.raw(), note.color.raw()]
}

/// Encode 64 pad updates, row-major, without framing
pub fn encode_notes<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<u8> {
    let mut data = Vec::with_capacity(GRID_MESSAGE_LEN);
    for note in notes {
        data.extend_from_slice(&note.encode());
    }
    data
}

/// Encode a double-buffering command
pub const fn encode_buffering_command(flags: BufferingFlags) -> Message {
    [
        status::CONTROL_CHANGE,
        control::DEVICE_CONTROL,
        control::BUFFERING_BASE + flags.bits(),
    ]
}

/// Turn every LED off and restore the default buffer configuration
pub const fn encode_reset() -> Message {
    [status::CONTROL_CHANGE, control::DEVICE_CONTROL, control::RESET]
}

pub const fn encode_flash_on() -> Message {
    [status::CONTROL_CHANGE, control::DEVICE_CONTROL, control::FLASH_ON]
}

pub const fn encode_flash_off() -> Message {
    [status::CONTROL_CHANGE, control::DEVICE_CONTROL, control::FLASH_OFF]
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
