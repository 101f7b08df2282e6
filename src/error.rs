//! Errors returned by the device session

use std::io;

use thiserror::Error;

/// Launchpad session error.
///
/// Every failure is terminal for the call that produced it; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no Launchpad session")]
    NullSession,

    #[error("failed to open Launchpad at '{address}'")]
    OpeningFailed {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Launchpad session is not open")]
    Uninitialized,

    #[error("MIDI write incomplete: {written} of {expected} bytes")]
    WriteFailed {
        expected: usize,
        written: usize,
        #[source]
        source: Option<io::Error>,
    },

    #[error("failed to drain MIDI output")]
    DrainFailed(#[source] io::Error),

    #[error("failed to close MIDI channel")]
    CloseFailed(#[source] io::Error),

    #[error("required argument is missing")]
    ArgumentNull,

    #[error("grid update needs {expected} notes, got {actual}")]
    GridLength { expected: usize, actual: usize },

    #[error("failed to read MIDI input")]
    ReadFailed(#[source] io::Error),
}

impl Error {
    /// Numeric code of the error, as used by the C driver for this device
    pub fn code(&self) -> i32 {
        match self {
            Error::NullSession => -1,
            Error::OpeningFailed { .. } => -2,
            Error::Uninitialized => -3,
            Error::WriteFailed { .. } => -4,
            Error::DrainFailed(_) => -5,
            Error::CloseFailed(_) => -6,
            Error::ArgumentNull | Error::GridLength { .. } => -7,
            Error::ReadFailed(_) => -8,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
