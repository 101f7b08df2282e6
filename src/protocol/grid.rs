//! Full 8x8 grid state

use super::{encode_notes, Color, GridKey, Note, NoteState, COLS, ROWS};

/// The 64 pads of the main grid, stored row-major.
///
/// Every slot always carries the key of its own position, so a `Grid` can be
/// sent as a full update without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    notes: [Note; ROWS * COLS],
}

impl Grid {
    /// All pads off
    pub fn new() -> Self {
        Self::filled(NoteState::Off, Color::OFF)
    }

    /// Every pad set to the same state and color
    pub fn filled(state: NoteState, color: Color) -> Self {
        let notes = std::array::from_fn(|index| {
            let key = GridKey::encode((index / COLS) as u8, (index % COLS) as u8);
            Note::new(state, key, color)
        });
        Self { notes }
    }

    fn index(row: u8, col: u8) -> Option<usize> {
        GridKey::new(row, col).map(|_| row as usize * COLS + col as usize)
    }

    /// Note at `row`, `col`
    pub fn get(&self, row: u8, col: u8) -> Option<&Note> {
        Self::index(row, col).map(|index| &self.notes[index])
    }

    /// Set the state and color of a pad. Out-of-range positions are ignored
    /// and return `false`.
    pub fn set(&mut self, row: u8, col: u8, state: NoteState, color: Color) -> bool {
        match Self::index(row, col) {
            Some(index) => {
                let note = &mut self.notes[index];
                note.state = state;
                note.color = color;
                true
            }
            None => false,
        }
    }

    /// Light a pad
    pub fn light(&mut self, row: u8, col: u8, color: Color) -> bool {
        self.set(row, col, NoteState::On, color)
    }

    /// Turn a pad off, keeping its color
    pub fn turn_off(&mut self, row: u8, col: u8) -> bool {
        match Self::index(row, col) {
            Some(index) => {
                self.notes[index].state = NoteState::Off;
                true
            }
            None => false,
        }
    }

    pub fn is_lit(&self, row: u8, col: u8) -> bool {
        self.get(row, col)
            .is_some_and(|note| note.state == NoteState::On)
    }

    /// Set every pad to the same state and color
    pub fn fill(&mut self, state: NoteState, color: Color) {
        for note in self.notes.iter_mut() {
            note.state = state;
            note.color = color;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    /// Full-grid update message, 192 bytes
    pub fn encode(&self) -> Vec<u8> {
        encode_notes(self.notes.iter())
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
