//! # Kernel Driver Backend
//!
//! For JTAG masters that are exposed through the Linux JTAG subsystem as a character
//! device (usually `/dev/jtag0`).
//!
//! ## Example Usage
//!
//! ```ignore
//! use jtag_tap::{Config, TapState};
//!
//! let mut handler = open_handler("/dev/jtag0", &Config::default())?;
//! handler.set_tap_state(TapState::DrPause)?;
//! ```
use nix::{
    ioctl_readwrite, ioctl_write_int, ioctl_write_ptr,
    sys::ioctl::ioctl_param_type,
};
use std::{
    ffi::c_uint,
    fs::{File, OpenOptions},
    io,
    os::fd::AsRawFd,
    path::Path,
};

use jtag_tap::{
    Config, Error, Handler, ScanDescriptor, ScanKind, TapState, TransferMode, TransitionRequest,
    Transport,
};

/// Source state understood by the driver as "wherever the TAP is right now".
const JTAG_STATE_CURRENT: u8 = 16;

const JTAG_SIR_XFER: u8 = 0;
const JTAG_SDR_XFER: u8 = 1;

const JTAG_READ_WRITE_XFER: u8 = 3;

/// Defined in include/uapi/linux/jtag.h
#[repr(C)]
#[derive(Clone, Debug, Default)]
struct JtagTapState {
    reset: u8,
    from: u8,
    endstate: u8,
    tck: u8,
}

#[repr(C)]
#[derive(Clone, Debug, Default)]
struct JtagXfer {
    kind: u8,
    direction: u8,
    from: u8,
    endstate: u8,
    padding: u32,
    length: u32,
    tdio: u64,
}

const JTAG_IOCTL_MAGIC: u8 = 0xb2;

// Request a TAP state transition
ioctl_write_ptr!(jtag_set_state, JTAG_IOCTL_MAGIC, 0, JtagTapState);
// Set the TCK frequency in Hz
ioctl_write_ptr!(jtag_set_freq, JTAG_IOCTL_MAGIC, 1, c_uint);
// Perform a shift operation
ioctl_readwrite!(jtag_xfer, JTAG_IOCTL_MAGIC, 3, JtagXfer);
// Select PSPI or GPIO transfers
ioctl_write_ptr!(jtag_set_mode, JTAG_IOCTL_MAGIC, 5, c_uint);
// Clock TCK in the current state. The cycle count is passed by value.
ioctl_write_int!(jtag_run_test, JTAG_IOCTL_MAGIC, 7);

/// A JTAG master driven through the Linux JTAG character device.
pub struct KernelDriverTransport {
    file: File,
}

impl KernelDriverTransport {
    pub fn open(device_path: impl AsRef<Path>) -> io::Result<KernelDriverTransport> {
        let path = device_path.as_ref();
        log::debug!("Opening JTAG device: {}", path.display());
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;
        log::debug!("Device file opened successfully");
        Ok(KernelDriverTransport { file })
    }

    fn set_state(&self, reset: bool, endstate: TapState, tck: u8) -> io::Result<()> {
        let tap_state = JtagTapState {
            reset: reset as u8,
            from: JTAG_STATE_CURRENT,
            endstate: endstate as u8,
            tck,
        };
        log::trace!("Kernel driver set state: {:?}", tap_state);
        // SAFETY: The ioctl call is safe because:
        // - File descriptor is valid (self.file is open)
        // - tap_state lives for the duration of the call and matches the kernel layout
        unsafe {
            jtag_set_state(self.file.as_raw_fd(), &tap_state)?;
        }
        Ok(())
    }
}

impl Transport for KernelDriverTransport {
    fn set_frequency(&mut self, hz: u32) -> io::Result<()> {
        log::info!("Set freq: {} Hz", hz);
        let freq: c_uint = hz;
        // SAFETY: valid descriptor, pointer to a live c_uint
        unsafe {
            jtag_set_freq(self.file.as_raw_fd(), &freq)?;
        }
        Ok(())
    }

    fn set_mode(&mut self, mode: TransferMode) -> io::Result<()> {
        log::debug!("Kernel driver set mode: {:?}", mode);
        let mode = mode as c_uint;
        // SAFETY: valid descriptor, pointer to a live c_uint
        unsafe {
            jtag_set_mode(self.file.as_raw_fd(), &mode)?;
        }
        Ok(())
    }

    fn advance_state(&mut self, request: &TransitionRequest) -> io::Result<()> {
        // The kernel counts hold cycles in a single byte.
        let mut cycles = request.cycles;
        loop {
            let tck = cycles.min(u8::MAX as u32);
            self.set_state(request.reset, request.to, tck as u8)?;
            cycles -= tck;
            if cycles == 0 {
                return Ok(());
            }
        }
    }

    fn run_test(&mut self, cycles: u32) -> io::Result<()> {
        log::debug!("Kernel driver run test: cycles={}", cycles);
        // SAFETY: valid descriptor, the argument is a plain integer
        unsafe {
            jtag_run_test(self.file.as_raw_fd(), cycles as ioctl_param_type)?;
        }
        Ok(())
    }

    fn transfer(&mut self, descriptor: &mut ScanDescriptor) -> io::Result<()> {
        let num_bytes = descriptor.byte_count();
        log::debug!(
            "Kernel driver shift: kind={:?}, num_bits={}, num_bytes={}",
            descriptor.kind,
            descriptor.length_bits(),
            num_bytes
        );

        // The driver shifts in place: TDI goes in, TDO comes back in the same buffer.
        let mut tdio = descriptor.tdi().to_vec();
        let mut xfer = JtagXfer {
            kind: match descriptor.kind {
                ScanKind::Ir => JTAG_SIR_XFER,
                ScanKind::Dr => JTAG_SDR_XFER,
            },
            direction: JTAG_READ_WRITE_XFER,
            from: JTAG_STATE_CURRENT,
            endstate: descriptor.end_state as u8,
            padding: 0,
            length: descriptor.length_bits() as u32,
            tdio: tdio.as_mut_ptr() as u64,
        };
        // SAFETY: The ioctl call is safe because:
        // - File descriptor is valid (self.file is open)
        // - tdio is valid for the duration of the call
        // - tdio holds ceil(length / 8) bytes
        unsafe {
            jtag_xfer(self.file.as_raw_fd(), &mut xfer)?;
        }

        descriptor.tdo_mut().copy_from_slice(&tdio);
        Ok(())
    }
}

/// Opens the device at `device_path` and initializes a handler on it.
pub fn open_handler(
    device_path: impl AsRef<Path>,
    config: &Config,
) -> Result<Handler<KernelDriverTransport>, Error> {
    let transport = KernelDriverTransport::open(device_path)?;
    Handler::initialize(transport, config)
}

#[test]
fn kernel_struct_layouts() {
    assert_eq!(std::mem::size_of::<JtagTapState>(), 4);
    assert_eq!(std::mem::size_of::<JtagXfer>(), 24);
    assert_eq!(std::mem::offset_of!(JtagXfer, length), 8);
    assert_eq!(std::mem::offset_of!(JtagXfer, tdio), 16);
}
