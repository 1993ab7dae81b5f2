//! Full-duplex shifts through the data and instruction registers.
//!
//! Bit buffers are LSB first: bit `n` of a scan lives in byte `n / 8`, bit `n % 8`.
use crate::{
    chunk::ChunkPlan,
    error::Error,
    handler::Handler,
    state::TapState,
    transport::{ScanDescriptor, ScanKind, Transport},
};

fn check_len(buf: &[u8], bits: usize) -> Result<(), Error> {
    let needed = bits.div_ceil(8);
    if buf.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            got: buf.len(),
        });
    }
    Ok(())
}

impl<T: Transport> Handler<T> {
    /// Shifts `num_bits` bits of `tdi` through the data register and leaves the TAP
    /// in `end_state`.
    ///
    /// Scans longer than one transfer are split; the TAP stays in DRSHIFT between the
    /// pieces. When `tdo` is given it receives the captured bits. A failing transfer aborts
    /// the scan, and bytes captured by earlier transfers stay in `tdo`.
    pub fn dr_scan(
        &mut self,
        num_bits: usize,
        tdi: &[u8],
        mut tdo: Option<&mut [u8]>,
        end_state: TapState,
    ) -> Result<(), Error> {
        self.transport()?;
        if !end_state.is_valid() {
            return Err(Error::InvalidState(end_state));
        }
        check_len(tdi, num_bits)?;
        if let Some(tdo) = tdo.as_deref() {
            check_len(tdo, num_bits)?;
        }
        if num_bits == 0 {
            // Nothing to shift, just honour the requested end state.
            return self.set_tap_state(end_state);
        }

        self.set_tap_state(TapState::DrShift)?;

        let mut descriptor = ScanDescriptor::new(ScanKind::Dr, self.max_chunk_bytes);
        for chunk in ChunkPlan::new(num_bits, self.max_chunk_bytes) {
            let chunk_end = if chunk.last { end_state } else { TapState::DrShift };
            let range = chunk.byte_offset..chunk.byte_offset + chunk.byte_count;
            descriptor.prepare(chunk.bits, &tdi[range.clone()], chunk_end)?;

            log::trace!(
                "ShiftDR chunk: offset={}, bits={}, end={}, TDI: {:02x?}",
                chunk.byte_offset,
                chunk.bits,
                chunk_end,
                descriptor.tdi()
            );
            if let Err(e) = self.transport()?.transfer(&mut descriptor) {
                log::error!("ShiftDR error: {}", e);
                return Err(Error::Transport(e));
            }
            log::trace!("ShiftDR chunk TDO: {:02x?}", descriptor.tdo());

            if let Some(tdo) = tdo.as_deref_mut() {
                tdo[range].copy_from_slice(descriptor.tdo());
            }
        }
        self.confirm_state(end_state);
        Ok(())
    }

    /// Shifts `num_bits` bits of `tdi` through the instruction register in one transfer
    /// and leaves the TAP in `end_state`.
    ///
    /// Instruction scans are never split. Empty scans and scans larger than a single
    /// transfer fail with [`Error::LengthOverflow`] before touching the hardware.
    pub fn ir_scan(
        &mut self,
        num_bits: usize,
        tdi: &[u8],
        tdo: Option<&mut [u8]>,
        end_state: TapState,
    ) -> Result<(), Error> {
        self.transport()?;
        let max_bits = 8 * self.max_chunk_bytes;
        if num_bits == 0 || num_bits.div_ceil(8) > self.max_chunk_bytes {
            log::error!("ir data len too long: {} bits", num_bits);
            return Err(Error::LengthOverflow {
                bits: num_bits,
                max_bits,
            });
        }
        if !end_state.is_valid() {
            return Err(Error::InvalidState(end_state));
        }
        let num_bytes = num_bits.div_ceil(8);
        check_len(tdi, num_bits)?;
        if let Some(tdo) = tdo.as_deref() {
            check_len(tdo, num_bits)?;
        }

        self.set_tap_state(TapState::IrShift)?;

        let mut descriptor = ScanDescriptor::new(ScanKind::Ir, self.max_chunk_bytes);
        descriptor.prepare(num_bits, &tdi[..num_bytes], end_state)?;
        log::trace!("ShiftIR bits={}, end={}, TDI: {:02x?}", num_bits, end_state, descriptor.tdi());
        if let Err(e) = self.transport()?.transfer(&mut descriptor) {
            log::error!("ShiftIR error: {}", e);
            return Err(Error::Transport(e));
        }
        log::trace!("ShiftIR TDO: {:02x?}", descriptor.tdo());

        if let Some(tdo) = tdo {
            tdo[..num_bytes].copy_from_slice(descriptor.tdo());
        }
        self.confirm_state(end_state);
        Ok(())
    }
}
