//! Hex strings are written most significant digit first, bit buffers are LSB first.
use std::{error::Error, fmt::Display};

#[derive(Debug, Eq, PartialEq)]
pub enum HexError {
    InvalidDigit(char),
    TooWide { bits: usize, digits: usize },
}

impl Display for HexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HexError::InvalidDigit(c) => write!(f, "Invalid hex digit '{}'", c),
            HexError::TooWide { bits, digits } => {
                write!(f, "Value with {} significant digits does not fit into {} bits", digits, bits)
            }
        }
    }
}

impl Error for HexError {}

/// Parses `text` into a buffer of `ceil(bits / 8)` bytes, byte 0 holding the lowest bits.
/// Set bits above `bits` are rejected.
pub fn parse_bits(text: &str, bits: usize) -> Result<Vec<u8>, HexError> {
    let digits = text
        .trim_start_matches("0x")
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_digit(16).map(|d| d as u8).ok_or(HexError::InvalidDigit(c)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = vec![0u8; bits.div_ceil(8)];
    for (i, digit) in digits.iter().rev().enumerate() {
        if *digit == 0 {
            continue;
        }
        let top_bit = 4 * i + (8 - digit.leading_zeros() as usize);
        if top_bit > bits {
            return Err(HexError::TooWide {
                bits,
                digits: digits.iter().skip_while(|d| **d == 0).count(),
            });
        }
        out[i / 2] |= *digit << (4 * (i % 2));
    }
    Ok(out)
}

/// Formats the lowest `bits` bits of `buf` as a hex string, most significant digit first.
pub fn format_bits(buf: &[u8], bits: usize) -> String {
    let num_digits = bits.div_ceil(4).max(1);
    (0..num_digits)
        .rev()
        .map(|i| {
            let byte = buf.get(i / 2).copied().unwrap_or(0);
            let mut nibble = (byte >> (4 * (i % 2))) & 0xf;
            let valid = bits.saturating_sub(4 * i).min(4);
            if valid < 4 {
                nibble &= (1 << valid) - 1;
            }
            char::from_digit(nibble as u32, 16).unwrap_or('0').to_ascii_uppercase()
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_is_lsb_first() {
        assert_eq!(parse_bits("1234", 16).unwrap(), vec![0x34, 0x12]);
        assert_eq!(parse_bits("0x3ff", 10).unwrap(), vec![0xff, 0x03]);
        assert_eq!(parse_bits("1", 32).unwrap(), vec![1, 0, 0, 0]);
    }

    #[test]
    fn parse_rejects_bits_above_length() {
        assert_eq!(
            parse_bits("7ff", 10),
            Err(HexError::TooWide { bits: 10, digits: 3 })
        );
        assert!(parse_bits("0003ff", 10).is_ok());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_bits("12g4", 16), Err(HexError::InvalidDigit('g')));
    }

    #[test]
    fn format_masks_unused_bits() {
        assert_eq!(format_bits(&[0x34, 0x12], 16), "1234");
        assert_eq!(format_bits(&[0xff, 0xff], 10), "3FF");
        assert_eq!(format_bits(&[0x01], 1), "1");
    }
}
