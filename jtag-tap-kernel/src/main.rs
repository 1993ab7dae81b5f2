//! # JTAG TAP command-line tool
//!
//! Drives a JTAG master exposed by the Linux JTAG subsystem: moves the TAP between states
//! and performs instruction and data register scans from the command line.
pub mod backends;
mod hex;

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use clap_num::number_range;
use env_logger::Env;
use jtag_tap::{Builder, DEFAULT_MAX_CHUNK_BYTES, Handler, ScanKind, TapState, TransferMode};

use crate::backends::kernel_driver::{KernelDriverTransport, open_handler};

const MAX_FREQ_MHZ: u32 = 100;

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum Mode {
    /// Byte-parallel PSPI engine
    Pspi,
    /// GPIO bitbanging
    Gpio,
}

impl From<Mode> for TransferMode {
    fn from(value: Mode) -> Self {
        match value {
            Mode::Pspi => TransferMode::Pspi,
            Mode::Gpio => TransferMode::Gpio,
        }
    }
}

#[derive(Subcommand, Eq, PartialEq, Clone)]
enum Command {
    /// Move the TAP to the named state
    State { name: String },
    /// Shift a value through the data register
    Dr {
        bits: usize,
        /// Value to shift in, hex, most significant digit first
        tdi: String,
        #[arg(short, long, default_value = "IDLE", help = "State to end in")]
        end: String,
        #[arg(short, long, help = "Print the captured TDO bits")]
        capture: bool,
    },
    /// Shift a value through the instruction register
    Ir {
        bits: usize,
        tdi: String,
        #[arg(short, long, default_value = "IDLE", help = "State to end in")]
        end: String,
        #[arg(short, long, help = "Print the captured TDO bits")]
        capture: bool,
    },
    /// Clock TCK in the current state
    Runtest { cycles: u32 },
    /// List the known state names
    States,
}

fn frequency_range(s: &str) -> Result<u32, String> {
    number_range(s, 1, MAX_FREQ_MHZ)
}

#[derive(Parser)]
#[command(about = "JTAG TAP control over the Linux JTAG driver", long_about=None)]
struct Args {
    #[arg(short, long, help = "The JTAG device")]
    device: Option<PathBuf>,

    #[arg(short, long, value_parser = frequency_range, help = "Force running at frequency (MHz)")]
    frequency: Option<u32>,

    #[arg(short, long, value_enum, default_value = "pspi")]
    mode: Mode,

    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_BYTES, help = "Largest transfer in bytes")]
    chunk_bytes: usize,

    #[clap(subcommand)]
    command: Command,
}

/// Attempts to automatically find the JTAG character device
fn jtag_device_path() -> Option<PathBuf> {
    (0..4)
        .map(|i| PathBuf::from(format!("/dev/jtag{}", i)))
        .find(|p| p.exists())
}

fn parse_state(name: &str) -> Result<TapState, Box<dyn Error>> {
    match TapState::from_name(name) {
        TapState::Invalid => Err(format!("Unknown TAP state '{}'", name).into()),
        state => Ok(state),
    }
}

fn scan(
    handler: &mut Handler<KernelDriverTransport>,
    kind: ScanKind,
    bits: usize,
    tdi: &str,
    end: &str,
    capture: bool,
) -> Result<(), Box<dyn Error>> {
    let end_state = parse_state(end)?;
    let tdi = hex::parse_bits(tdi, bits)?;
    let mut tdo = vec![0u8; tdi.len()];
    let tdo_buf = if capture { Some(&mut tdo[..]) } else { None };
    match kind {
        ScanKind::Ir => handler.ir_scan(bits, &tdi, tdo_buf, end_state)?,
        ScanKind::Dr => handler.dr_scan(bits, &tdi, tdo_buf, end_state)?,
    }
    if capture {
        println!("{}", hex::format_bits(&tdo, bits));
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.command == Command::States {
        for state in TapState::ALL {
            println!("{}", state);
        }
        return Ok(());
    }

    let device_path = match args.device.or_else(jtag_device_path) {
        None => {
            println!("No JTAG device could be detected. Use --device <path> to specify one.");
            return Ok(());
        }
        Some(path) => path,
    };

    let config = Builder::new()
        .frequency_hz(args.frequency.map_or(0, |mhz| mhz * 1_000_000))
        .mode(args.mode.into())
        .max_chunk_bytes(args.chunk_bytes)
        .build();
    log::debug!("Config: {:?}", config);

    log::info!("Initializing JTAG from {}", device_path.display());
    let mut handler = open_handler(&device_path, &config).map_err(|e| {
        log::error!("Failed to initialize JTAG: {}", e);
        e
    })?;

    let start = Instant::now();
    match args.command {
        Command::State { name } => handler.set_tap_state(parse_state(&name)?)?,
        Command::Dr {
            bits,
            tdi,
            end,
            capture,
        } => scan(&mut handler, ScanKind::Dr, bits, &tdi, &end, capture)?,
        Command::Ir {
            bits,
            tdi,
            end,
            capture,
        } => scan(&mut handler, ScanKind::Ir, bits, &tdi, &end, capture)?,
        Command::Runtest { cycles } => handler.wait_cycles(cycles)?,
        Command::States => {}
    }
    log::info!(
        "completed in {} ms, TAP in {}",
        start.elapsed().as_millis(),
        handler.current_state()
    );
    Ok(())
}
