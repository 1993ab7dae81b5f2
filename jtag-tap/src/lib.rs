//! # JTAG TAP
//!
//! Drives a JTAG Test Access Port through a byte-oriented transport: tracks the TAP
//! controller state and performs instruction and data register scans of arbitrary length.
//!
//! ## Architecture
//!
//! - **[`TapState`]**: the sixteen TAP controller states and their SVF names
//! - **[`Transport`] Trait**: what a platform driver must provide (frequency, transfer mode,
//!   state transitions and full-duplex transfers of at most one chunk)
//! - **[`Handler`]**: owns the transport and the last confirmed TAP state; all state
//!   transitions and scans go through it
//! - **[`ChunkPlan`]**: splits long data register scans into transport sized chunks
//!
//! ## Basic Usage
//!
//! ```ignore
//! use jtag_tap::{Config, Handler, TapState};
//!
//! let mut handler = Handler::initialize(my_transport, &Config::default())?;
//!
//! // Load a 10 bit instruction, then read a 32 bit data register
//! handler.ir_scan(10, &[0x09, 0x00], None, TapState::Idle)?;
//! let mut idcode = [0u8; 4];
//! handler.dr_scan(32, &[0; 4], Some(&mut idcode), TapState::Idle)?;
//! ```
//!
//! ## Bit Order
//!
//! Bit buffers are LSB first: the first bit shifted is bit 0 of byte 0.
//!
//! ## Error Handling
//!
//! Every operation that touches the transport returns [`Error`]. Nothing is retried; a failing
//! chunk aborts the rest of the scan. Name lookups never fail, they return `"???"` or
//! [`TapState::Invalid`] instead.
//!
//! ## Logging
//!
//! This crate uses the `log` crate. State transitions are logged at `debug`, per-chunk TDI/TDO
//! data at `trace` and transport failures at `error`.
pub mod chunk;
pub mod error;
pub mod handler;
pub mod scan;
pub mod state;
pub mod transport;

pub use chunk::{Chunk, ChunkPlan};
pub use error::Error;
pub use handler::{Builder, Config, DEFAULT_MAX_CHUNK_BYTES, Handler, MAX_CHUNK_BYTES_LIMIT};
pub use state::{TapState, UNKNOWN_STATE_NAME, name_of, state_of};
pub use transport::{
    ScanBuffer, ScanDescriptor, ScanDirection, ScanKind, TransferMode, TransitionRequest, Transport,
    set_clock_frequency, set_transfer_mode,
};
