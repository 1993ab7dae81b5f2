//! The contract between the TAP core and the driver that moves the physical pins.
use std::io;

use crate::{error::Error, state::TapState};

/// How the driver clocks bits onto the wire.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[repr(u32)]
pub enum TransferMode {
    /// Byte-parallel/serial engine (PSPI).
    #[default]
    Pspi = 0,
    /// Pin-level bitbanging over GPIO.
    Gpio = 1,
}

/// Which shift path a transfer goes through.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanKind {
    Ir,
    Dr,
}

/// Only full-duplex transfers are ever issued.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum ScanDirection {
    #[default]
    ReadWrite,
}

/// A request to move the TAP from its current state to `to`, optionally forcing a reset
/// and holding the destination for `cycles` clocks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TransitionRequest {
    pub reset: bool,
    pub cycles: u32,
    pub to: TapState,
}

impl TransitionRequest {
    pub fn goto(to: TapState) -> TransitionRequest {
        TransitionRequest {
            reset: false,
            cycles: 0,
            to,
        }
    }

    pub fn hold(to: TapState, cycles: u32) -> TransitionRequest {
        TransitionRequest {
            reset: false,
            cycles,
            to,
        }
    }
}

/// Byte buffer with a capacity fixed at construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl ScanBuffer {
    pub fn new(capacity: usize) -> ScanBuffer {
        ScanBuffer {
            data: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Replaces the contents with `bytes`.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.len() > self.capacity() {
            return Err(Error::BufferTooSmall {
                needed: bytes.len(),
                got: self.capacity(),
            });
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.data[bytes.len()..].fill(0);
        self.len = bytes.len();
        Ok(())
    }

    /// Zero-fills the buffer and sets its length to `len`.
    pub fn reset(&mut self, len: usize) -> Result<(), Error> {
        if len > self.capacity() {
            return Err(Error::BufferTooSmall {
                needed: len,
                got: self.capacity(),
            });
        }
        self.data.fill(0);
        self.len = len;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }
}

/// A single full-duplex transfer handed to the [`Transport`].
///
/// `tdi` holds the bits clocked out, the transport fills `tdo` with the bits captured.
/// Both always hold `ceil(length_bits / 8)` bytes.
#[derive(Clone, Debug)]
pub struct ScanDescriptor {
    length_bits: usize,
    tdi: ScanBuffer,
    tdo: ScanBuffer,
    pub end_state: TapState,
    pub kind: ScanKind,
    pub direction: ScanDirection,
}

impl ScanDescriptor {
    /// Creates an empty descriptor whose buffers hold `capacity` bytes.
    pub fn new(kind: ScanKind, capacity: usize) -> ScanDescriptor {
        ScanDescriptor {
            length_bits: 0,
            tdi: ScanBuffer::new(capacity),
            tdo: ScanBuffer::new(capacity),
            end_state: TapState::Invalid,
            kind,
            direction: ScanDirection::ReadWrite,
        }
    }

    /// Prepares the next transfer of `length_bits` bits taken from `tdi`.
    pub fn prepare(&mut self, length_bits: usize, tdi: &[u8], end_state: TapState) -> Result<(), Error> {
        let max_bits = 8 * self.capacity();
        if length_bits > max_bits {
            return Err(Error::LengthOverflow {
                bits: length_bits,
                max_bits,
            });
        }
        let num_bytes = length_bits.div_ceil(8);
        if tdi.len() != num_bytes {
            return Err(Error::BufferTooSmall {
                needed: num_bytes,
                got: tdi.len(),
            });
        }
        self.tdi.load(tdi)?;
        self.tdo.reset(num_bytes)?;
        self.length_bits = length_bits;
        self.end_state = end_state;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.tdi.capacity()
    }

    pub fn length_bits(&self) -> usize {
        self.length_bits
    }

    pub fn byte_count(&self) -> usize {
        self.tdi.len()
    }

    pub fn tdi(&self) -> &[u8] {
        self.tdi.as_slice()
    }

    pub fn tdo(&self) -> &[u8] {
        self.tdo.as_slice()
    }

    pub fn tdo_mut(&mut self) -> &mut [u8] {
        self.tdo.as_mut_slice()
    }
}

/// Trait that platform drivers implement to give the core access to the JTAG pins.
///
/// Every call blocks until the hardware has carried out the request.
pub trait Transport {
    /// Sets the TCK frequency in Hz.
    fn set_frequency(&mut self, hz: u32) -> io::Result<()>;

    /// Selects how bits are clocked out.
    fn set_mode(&mut self, mode: TransferMode) -> io::Result<()>;

    /// Moves the physical TAP as described by `request`.
    fn advance_state(&mut self, request: &TransitionRequest) -> io::Result<()>;

    /// Clocks `cycles` TCK pulses while staying in the current state.
    ///
    /// Drivers without a dedicated primitive keep the default, and callers fall back
    /// to [`Transport::advance_state`] with a hold count.
    fn run_test(&mut self, cycles: u32) -> io::Result<()> {
        let _ = cycles;
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    /// Shifts `descriptor.tdi()` through the selected register and fills `descriptor.tdo_mut()`
    /// with the captured bits. The TAP ends up in `descriptor.end_state`.
    fn transfer(&mut self, descriptor: &mut ScanDescriptor) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn set_frequency(&mut self, hz: u32) -> io::Result<()> {
        (**self).set_frequency(hz)
    }

    fn set_mode(&mut self, mode: TransferMode) -> io::Result<()> {
        (**self).set_mode(mode)
    }

    fn advance_state(&mut self, request: &TransitionRequest) -> io::Result<()> {
        (**self).advance_state(request)
    }

    fn run_test(&mut self, cycles: u32) -> io::Result<()> {
        (**self).run_test(cycles)
    }

    fn transfer(&mut self, descriptor: &mut ScanDescriptor) -> io::Result<()> {
        (**self).transfer(descriptor)
    }
}

/// Configures the TCK frequency. Failures are not retried.
pub fn set_clock_frequency<T: Transport + ?Sized>(transport: &mut T, hz: u32) -> Result<(), Error> {
    log::debug!("Set TCK frequency: {} Hz", hz);
    transport.set_frequency(hz).map_err(|e| {
        log::error!("Setting TCK frequency to {} Hz failed: {}", hz, e);
        Error::Transport(e)
    })
}

/// Selects the transfer mode. Failures are not retried.
pub fn set_transfer_mode<T: Transport + ?Sized>(transport: &mut T, mode: TransferMode) -> Result<(), Error> {
    log::debug!("Set transfer mode: {:?}", mode);
    transport.set_mode(mode).map_err(|e| {
        log::error!("Setting transfer mode {:?} failed: {}", mode, e);
        Error::Transport(e)
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buffer_rejects_overfill() {
        let mut buf = ScanBuffer::new(2);
        assert!(buf.load(&[1, 2, 3]).is_err());
        buf.load(&[0xAA]).unwrap();
        assert_eq!(buf.as_slice(), &[0xAA]);
        assert_eq!(buf.capacity(), 2);
    }

    #[test]
    fn buffer_load_clears_stale_bytes() {
        let mut buf = ScanBuffer::new(4);
        buf.load(&[1, 2, 3, 4]).unwrap();
        buf.load(&[9]).unwrap();
        buf.reset(4).unwrap();
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn descriptor_byte_counts_follow_length() {
        let mut desc = ScanDescriptor::new(ScanKind::Dr, 32);
        desc.prepare(13, &[0xFF, 0x1F], TapState::Idle).unwrap();
        assert_eq!(desc.byte_count(), 2);
        assert_eq!(desc.tdo().len(), 2);
        assert_eq!(desc.length_bits(), 13);
        assert_eq!(desc.direction, ScanDirection::ReadWrite);
    }

    #[test]
    fn descriptor_rejects_oversized_transfer() {
        let mut desc = ScanDescriptor::new(ScanKind::Ir, 1);
        match desc.prepare(9, &[0, 0], TapState::Idle) {
            Err(Error::LengthOverflow { bits, max_bits }) => {
                assert_eq!(bits, 9);
                assert_eq!(max_bits, 8);
            }
            other => panic!("expected LengthOverflow, got {:?}", other),
        }
    }

    #[test]
    fn descriptor_rejects_mismatched_tdi() {
        let mut desc = ScanDescriptor::new(ScanKind::Dr, 4);
        assert!(matches!(
            desc.prepare(16, &[0], TapState::Idle),
            Err(Error::BufferTooSmall { needed: 2, got: 1 })
        ));
    }
}
