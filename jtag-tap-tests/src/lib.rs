//! Shared fixtures for the integration tests: a transport that records every call.
use std::io;

use jtag_tap::{ScanDescriptor, ScanKind, TapState, TransferMode, TransitionRequest, Transport};

/// One call observed by the [`MockTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    SetFrequency(u32),
    SetMode(TransferMode),
    AdvanceState(TransitionRequest),
    RunTest(u32),
    Transfer(Transfer),
}

/// Snapshot of a [`ScanDescriptor`] as it was handed to the transport.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
    pub kind: ScanKind,
    pub bits: usize,
    pub tdi: Vec<u8>,
    pub end_state: TapState,
}

/// Loopback transport: TDO is the bitwise inverse of TDI, so captured data is easy to check.
#[derive(Default)]
pub struct MockTransport {
    pub calls: Vec<Call>,
    /// Fail the transfer with this (zero based) index.
    pub fail_transfer: Option<usize>,
    /// Fail every state transition request.
    pub fail_advance: bool,
    /// Fail state transition requests targeting this state.
    pub fail_advance_to: Option<TapState>,
    pub fail_frequency: bool,
    pub fail_mode: bool,
    /// Report run-test as supported.
    pub run_test_supported: bool,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport::default()
    }

    pub fn transfers(&self) -> Vec<&Transfer> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Transfer(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn transitions(&self) -> Vec<TransitionRequest> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::AdvanceState(r) => Some(*r),
                _ => None,
            })
            .collect()
    }
}

fn injected() -> io::Error {
    io::Error::other("injected failure")
}

impl Transport for MockTransport {
    fn set_frequency(&mut self, hz: u32) -> io::Result<()> {
        self.calls.push(Call::SetFrequency(hz));
        if self.fail_frequency { Err(injected()) } else { Ok(()) }
    }

    fn set_mode(&mut self, mode: TransferMode) -> io::Result<()> {
        self.calls.push(Call::SetMode(mode));
        if self.fail_mode { Err(injected()) } else { Ok(()) }
    }

    fn advance_state(&mut self, request: &TransitionRequest) -> io::Result<()> {
        self.calls.push(Call::AdvanceState(*request));
        if self.fail_advance || self.fail_advance_to == Some(request.to) {
            Err(injected())
        } else {
            Ok(())
        }
    }

    fn run_test(&mut self, cycles: u32) -> io::Result<()> {
        self.calls.push(Call::RunTest(cycles));
        if self.run_test_supported {
            Ok(())
        } else {
            Err(io::Error::from(io::ErrorKind::Unsupported))
        }
    }

    fn transfer(&mut self, descriptor: &mut ScanDescriptor) -> io::Result<()> {
        assert!(descriptor.length_bits() <= 8 * descriptor.capacity());
        assert_eq!(descriptor.byte_count(), descriptor.length_bits().div_ceil(8));
        let index = self.transfers().len();
        self.calls.push(Call::Transfer(Transfer {
            kind: descriptor.kind,
            bits: descriptor.length_bits(),
            tdi: descriptor.tdi().to_vec(),
            end_state: descriptor.end_state,
        }));
        if self.fail_transfer == Some(index) {
            return Err(injected());
        }
        let inverted: Vec<u8> = descriptor.tdi().iter().map(|b| !b).collect();
        descriptor.tdo_mut().copy_from_slice(&inverted);
        Ok(())
    }
}
