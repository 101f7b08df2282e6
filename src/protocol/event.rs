//! Inbound button events

use std::fmt;

use super::{control, status, MESSAGE_LEN};

/// What happened to a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Grid or side button pressed
    Pressed,
    /// Grid or side button released
    Released,
    /// Top row button pressed
    AutomapPressed,
    /// Top row button released
    AutomapReleased,
}

impl EventKind {
    pub const fn is_press(self) -> bool {
        matches!(self, EventKind::Pressed | EventKind::AutomapPressed)
    }

    pub const fn is_automap(self) -> bool {
        matches!(self, EventKind::AutomapPressed | EventKind::AutomapReleased)
    }
}

/// A decoded button event.
///
/// For grid buttons `x` is the column and `y` the row. For Automap buttons `x`
/// is the button index and `y` is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub kind: EventKind,
    pub x: u8,
    pub y: u8,
}

impl Event {
    pub const fn new(kind: EventKind, x: u8, y: u8) -> Self {
        Self { kind, x, y }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Pressed => write!(f, "Pressed x:{} y:{}", self.x, self.y),
            EventKind::Released => write!(f, "Released x:{} y:{}", self.x, self.y),
            EventKind::AutomapPressed => write!(f, "AutomapPressed A{}", self.x),
            EventKind::AutomapReleased => write!(f, "AutomapReleased A{}", self.x),
        }
    }
}

/// Decode a message read from the device.
///
/// Returns `None` for short reads and for status bytes other than note on and
/// control change. The column arithmetic `(note % 16) % 9` matches the device
/// layout for columns 0-8; it is intentionally left as is.
pub fn decode_event(data: &[u8]) -> Option<Event> {
    if data.len() < MESSAGE_LEN {
        return None;
    }
    let (status_byte, note, velocity) = (data[0], data[1], data[2]);

    let pressed = velocity > 0;
    match status_byte {
        status::NOTE_ON => {
            let kind = if pressed {
                EventKind::Pressed
            } else {
                EventKind::Released
            };
            Some(Event::new(kind, (note % 16) % 9, note / 16))
        }
        status::CONTROL_CHANGE => {
            let kind = if pressed {
                EventKind::AutomapPressed
            } else {
                EventKind::AutomapReleased
            };
            Some(Event::new(kind, note.wrapping_sub(control::AUTOMAP_BASE), 0))
        }
        _ => None,
    }
}
