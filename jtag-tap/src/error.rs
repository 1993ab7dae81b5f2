use std::{error::Error as StdError, fmt::Display, io};

use crate::state::TapState;

/// Errors returned by the TAP executor and the scan engine.
#[derive(Debug)]
pub enum Error {
    /// The handler no longer owns a transport.
    InvalidHandle,
    /// A transport call failed.
    Transport(io::Error),
    /// An instruction scan was empty or did not fit into a single transfer.
    LengthOverflow { bits: usize, max_bits: usize },
    /// A transition to a state that does not exist was requested.
    InvalidState(TapState),
    /// A caller supplied buffer cannot hold the requested number of bits.
    BufferTooSmall { needed: usize, got: usize },
    InvalidConfig(String),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Transport(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidHandle => write!(f, "JTAG handler has no transport"),
            Error::Transport(error) => write!(f, "Transport failure: {}", error),
            Error::LengthOverflow { bits: 0, .. } => write!(f, "Scan length must not be zero"),
            Error::LengthOverflow { bits, max_bits } => {
                write!(f, "Scan of {} bits exceeds the maximum of {} bits", bits, max_bits)
            }
            Error::InvalidState(state) => write!(f, "Cannot move TAP to state {}", state),
            Error::BufferTooSmall { needed, got } => {
                write!(f, "Buffer too small! Need {} bytes, but got {}", needed, got)
            }
            Error::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Transport(error) => Some(error),
            _ => None,
        }
    }
}

#[test]
fn display_zero_length() {
    let err = Error::LengthOverflow {
        bits: 0,
        max_bits: 256,
    };
    assert_eq!(err.to_string(), "Scan length must not be zero");
}

#[test]
fn transport_error_keeps_source() {
    let err: Error = io::Error::other("ioctl failed").into();
    assert!(err.source().is_some());
    assert_eq!(err.to_string(), "Transport failure: ioctl failed");
}
