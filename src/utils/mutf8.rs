//! Modified UTF-8 as used by `CONSTANT_Utf8_info` entries.
//!
//! The class file format stores strings in a UTF-8 variant: `U+0000` is encoded as the two byte
//! sequence `0xC0 0x80`, and supplementary characters are written as two three-byte encoded
//! UTF-16 surrogates instead of one four-byte sequence. Four-byte forms never appear.

use crate::Result;

/// Decode modified UTF-8 bytes into a Rust string.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for truncated sequences, invalid lead bytes, raw `0x00`
/// bytes, four-byte forms, or unpaired surrogates.
pub fn decode(bytes: &[u8]) -> Result<String> {
    if bytes.iter().all(|&b| (0x01..0x80).contains(&b)) {
        // Plain ASCII without NUL is identical in both encodings
        return std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| malformed_error!("Invalid modified UTF-8 - {}", e));
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(u16::from(b0));
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1)?;
                let unit = (u16::from(b0 & 0x1F) << 6) | u16::from(b1);
                if unit != 0 && unit < 0x80 {
                    return Err(malformed_error!("Overlong modified UTF-8 sequence at {}", i));
                }
                units.push(unit);
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1)?;
                let b2 = continuation(bytes, i + 2)?;
                let unit = (u16::from(b0 & 0x0F) << 12) | (u16::from(b1) << 6) | u16::from(b2);
                if unit < 0x800 {
                    return Err(malformed_error!("Overlong modified UTF-8 sequence at {}", i));
                }
                units.push(unit);
                i += 3;
            }
            _ => {
                return Err(malformed_error!(
                    "Invalid modified UTF-8 lead byte 0x{:02X} at {}",
                    b0,
                    i
                ))
            }
        }
    }

    String::from_utf16(&units).map_err(|_| malformed_error!("Unpaired surrogate in modified UTF-8"))
}

fn continuation(bytes: &[u8], index: usize) -> Result<u8> {
    match bytes.get(index) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(b & 0x3F),
        Some(&b) => Err(malformed_error!(
            "Invalid modified UTF-8 continuation byte 0x{:02X} at {}",
            b,
            index
        )),
        None => Err(malformed_error!("Truncated modified UTF-8 sequence")),
    }
}

/// Encode a Rust string as modified UTF-8.
#[must_use]
pub fn encode(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}
