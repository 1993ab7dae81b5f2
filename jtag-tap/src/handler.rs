use crate::{
    error::Error,
    state::TapState,
    transport::{Transport, TransferMode, TransitionRequest, set_clock_frequency, set_transfer_mode},
};

/// Default capacity of a single transfer in bytes.
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 32;

/// Largest transfer capacity a [Config] accepts.
pub const MAX_CHUNK_BYTES_LIMIT: usize = 4096;

#[derive(Debug, Clone)]
pub struct Config {
    /// TCK frequency in Hz. Zero keeps whatever the driver is configured to.
    pub frequency_hz: u32,
    pub mode: TransferMode,
    /// Largest number of bytes handed to the transport in one transfer.
    /// Must be a power of two no larger than [MAX_CHUNK_BYTES_LIMIT].
    pub max_chunk_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frequency_hz: 0,
            mode: TransferMode::default(),
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
        }
    }
}

impl Config {
    fn validate(&self) -> Result<(), Error> {
        if !self.max_chunk_bytes.is_power_of_two() || self.max_chunk_bytes > MAX_CHUNK_BYTES_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "chunk size must be a power of two between 1 and {}, got {}",
                MAX_CHUNK_BYTES_LIMIT, self.max_chunk_bytes
            )));
        }
        Ok(())
    }
}

/// Builder to create a [Config]
///
/// # Example
///
/// ```
/// use jtag_tap::{Builder, TransferMode};
///
/// let config = Builder::new()
///     .frequency_hz(10_000_000)
///     .mode(TransferMode::Gpio)
///     .max_chunk_bytes(64)
///     .build();
/// assert_eq!(config.max_chunk_bytes, 64);
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Set the TCK frequency, zero leaves the driver default in place.
    pub fn frequency_hz(mut self, hz: u32) -> Self {
        self.config.frequency_hz = hz;
        self
    }

    pub fn mode(mut self, mode: TransferMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the capacity of a single transfer
    pub fn max_chunk_bytes(mut self, bytes: usize) -> Self {
        self.config.max_chunk_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// A JTAG session: the transport it exclusively owns and the last TAP state the hardware
/// confirmed.
///
/// All operations take `&mut self`, so a handler cannot be driven from two places at once.
/// Wrap it in a mutex if it ever has to be shared between threads.
#[derive(Debug)]
pub struct Handler<T: Transport> {
    transport: Option<T>,
    current_state: TapState,
    pub(crate) max_chunk_bytes: usize,
}

impl<T: Transport> Handler<T> {
    /// Takes ownership of `transport`, applies `config` and walks the TAP through
    /// RESET into RUN/IDLE. Any failure aborts the initialization.
    pub fn initialize(mut transport: T, config: &Config) -> Result<Handler<T>, Error> {
        config.validate()?;

        if config.frequency_hz > 0 {
            set_clock_frequency(&mut transport, config.frequency_hz)?;
        }
        set_transfer_mode(&mut transport, config.mode)?;

        let mut handler = Handler {
            transport: Some(transport),
            current_state: TapState::Reset,
            max_chunk_bytes: config.max_chunk_bytes,
        };
        handler.set_tap_state(TapState::Reset)?;
        handler.set_tap_state(TapState::Idle)?;
        log::info!(
            "JTAG initialized: mode={:?}, chunk={} bytes",
            config.mode,
            config.max_chunk_bytes
        );
        Ok(handler)
    }

    /// The last state a transport call confirmed.
    pub fn current_state(&self) -> TapState {
        self.current_state
    }

    pub fn max_chunk_bytes(&self) -> usize {
        self.max_chunk_bytes
    }

    /// Gives the transport back. The handler rejects every later operation.
    pub fn release(&mut self) -> Option<T> {
        self.transport.take()
    }

    pub(crate) fn transport(&mut self) -> Result<&mut T, Error> {
        self.transport.as_mut().ok_or(Error::InvalidHandle)
    }

    /// Records a state the hardware has reached.
    pub(crate) fn confirm_state(&mut self, state: TapState) {
        self.current_state = state;
        log::debug!("TapState: {}", state);
    }

    /// Moves the TAP to `state`. The cached state only changes once the transport
    /// reports success.
    pub fn set_tap_state(&mut self, state: TapState) -> Result<(), Error> {
        let transport = self.transport()?;
        if !state.is_valid() {
            return Err(Error::InvalidState(state));
        }
        if let Err(e) = transport.advance_state(&TransitionRequest::goto(state)) {
            log::error!("Setting TAP state {} failed: {}", state, e);
            return Err(Error::Transport(e));
        }
        self.confirm_state(state);
        Ok(())
    }

    /// Clocks `cycles` TCK pulses in the current state.
    ///
    /// Uses the transport's run-test primitive, or a hold request targeting the cached
    /// state when that is unavailable.
    pub fn wait_cycles(&mut self, cycles: u32) -> Result<(), Error> {
        let current = self.current_state;
        let transport = self.transport()?;
        match transport.run_test(cycles) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::debug!("run-test unavailable ({}), holding {} instead", e, current);
                self.run_state(current, cycles)
            }
        }
    }

    /// Moves to `state` and holds it for `cycles` clocks.
    pub fn run_state(&mut self, state: TapState, cycles: u32) -> Result<(), Error> {
        let transport = self.transport()?;
        if !state.is_valid() {
            return Err(Error::InvalidState(state));
        }
        if let Err(e) = transport.advance_state(&TransitionRequest::hold(state, cycles)) {
            log::error!("Holding TAP state {} for {} cycles failed: {}", state, cycles, e);
            return Err(Error::Transport(e));
        }
        self.confirm_state(state);
        Ok(())
    }
}
