//! Pad colors
//!
//! A color byte packs green and red brightness (0-3 each) with two flags used
//! while double buffering. There is no yellow channel: mixing red and green
//! gives yellow or amber.

/// Brightness of a single LED channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Brightness {
    Off = 0,
    Low = 1,
    Medium = 2,
    Full = 3,
}

impl Brightness {
    pub const ALL: [Brightness; 4] = [
        Brightness::Off,
        Brightness::Low,
        Brightness::Medium,
        Brightness::Full,
    ];

    pub const fn level(self) -> u8 {
        self as u8
    }

    const fn from_level(level: u8) -> Self {
        match level & 0x03 {
            0 => Brightness::Off,
            1 => Brightness::Low,
            2 => Brightness::Medium,
            _ => Brightness::Full,
        }
    }
}

/// How a note write interacts with the other buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferWrite {
    /// Only the updating buffer changes
    Normal,
    /// Clear the other buffer's copy of this LED
    Clear,
    /// Write this LED to both buffers
    Copy,
}

/// Device color byte, `16 * green + red + flags`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(u8);

impl Color {
    /// Clear the other buffer's copy of this LED
    pub const FLAG_CLEAR: u8 = 1 << 2;
    /// Write this LED to both buffers; overrides `FLAG_CLEAR`
    pub const FLAG_COPY: u8 = 1 << 3;

    const FLAG_MASK: u8 = Self::FLAG_CLEAR | Self::FLAG_COPY;

    pub const OFF: Color = Color::rgb(Brightness::Off, Brightness::Off);

    pub const RED_LOW: Color = Color::rgb(Brightness::Off, Brightness::Low);
    pub const RED_MEDIUM: Color = Color::rgb(Brightness::Off, Brightness::Medium);
    pub const RED_FULL: Color = Color::rgb(Brightness::Off, Brightness::Full);

    pub const GREEN_LOW: Color = Color::rgb(Brightness::Low, Brightness::Off);
    pub const GREEN_MEDIUM: Color = Color::rgb(Brightness::Medium, Brightness::Off);
    pub const GREEN_FULL: Color = Color::rgb(Brightness::Full, Brightness::Off);

    pub const YELLOW_LOW: Color = Color::rgb(Brightness::Low, Brightness::Low);
    pub const YELLOW_MEDIUM: Color = Color::rgb(Brightness::Medium, Brightness::Medium);
    pub const YELLOW_FULL: Color = Color::rgb(Brightness::Full, Brightness::Full);

    /// Build a color from channel brightness and buffer flags.
    ///
    /// Bits of `flags` other than `FLAG_CLEAR` and `FLAG_COPY` are dropped.
    pub const fn new(green: Brightness, red: Brightness, flags: u8) -> Self {
        Self(0x10 * green.level() + red.level() + (flags & Self::FLAG_MASK))
    }

    /// Color without buffer flags. Green comes first, as on the wire.
    pub const fn rgb(green: Brightness, red: Brightness) -> Self {
        Self::new(green, red, 0)
    }

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn green(self) -> Brightness {
        Brightness::from_level(self.0 >> 4)
    }

    pub const fn red(self) -> Brightness {
        Brightness::from_level(self.0)
    }

    pub const fn flags(self) -> u8 {
        self.0 & Self::FLAG_MASK
    }

    pub const fn with_clear(self) -> Self {
        Self(self.0 | Self::FLAG_CLEAR)
    }

    pub const fn with_copy(self) -> Self {
        Self(self.0 | Self::FLAG_COPY)
    }

    /// Effective double-buffer behavior of this color
    pub const fn buffer_write(self) -> BufferWrite {
        if self.0 & Self::FLAG_COPY != 0 {
            BufferWrite::Copy
        } else if self.0 & Self::FLAG_CLEAR != 0 {
            BufferWrite::Clear
        } else {
            BufferWrite::Normal
        }
    }

    pub const fn is_off(self) -> bool {
        matches!(self.green(), Brightness::Off) && matches!(self.red(), Brightness::Off)
    }
}
