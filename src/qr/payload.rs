//! Segment grammar of the corrected data codewords.

use crate::error::DecodeFailure;
use crate::utils::bits::{BitReader, Charset};

pub(crate) const ALPHANUMERIC_TABLE: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Segment modes and their 4-bit indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Terminator,
    Numeric,
    Alphanumeric,
    StructuredAppend,
    Byte,
    Fnc1First,
    Eci,
    Kanji,
    Fnc1Second,
}

impl Mode {
    fn from_bits(bits: u32) -> Option<Self> {
        Some(match bits {
            0x0 => Mode::Terminator,
            0x1 => Mode::Numeric,
            0x2 => Mode::Alphanumeric,
            0x3 => Mode::StructuredAppend,
            0x4 => Mode::Byte,
            0x5 => Mode::Fnc1First,
            0x7 => Mode::Eci,
            0x8 => Mode::Kanji,
            0x9 => Mode::Fnc1Second,
            _ => return None,
        })
    }

    pub(crate) fn bits(self) -> u32 {
        match self {
            Mode::Terminator => 0x0,
            Mode::Numeric => 0x1,
            Mode::Alphanumeric => 0x2,
            Mode::StructuredAppend => 0x3,
            Mode::Byte => 0x4,
            Mode::Fnc1First => 0x5,
            Mode::Eci => 0x7,
            Mode::Kanji => 0x8,
            Mode::Fnc1Second => 0x9,
        }
    }

    /// Width of the character count field
    pub(crate) fn count_bits(self, version: u8) -> usize {
        let tier = match version {
            0..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match self {
            Mode::Numeric => [10, 12, 14][tier],
            Mode::Alphanumeric => [9, 11, 13][tier],
            Mode::Byte => [8, 16, 16][tier],
            Mode::Kanji => [8, 10, 12][tier],
            _ => 0,
        }
    }
}

/// Decoded message: display text plus the byte-level payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Payload {
    pub text: String,
    pub bytes: Vec<u8>,
}

fn malformed(reason: &str) -> DecodeFailure {
    DecodeFailure::Malformed(reason.to_string())
}

fn read(reader: &mut BitReader<'_>, n: usize) -> Result<u32, DecodeFailure> {
    reader.read(n).ok_or_else(|| malformed("segment runs past the data codewords"))
}

/// Parse the segment stream of a version-`version` symbol
pub(crate) fn decode_segments(data: &[u8], version: u8) -> Result<Payload, DecodeFailure> {
    let mut reader = BitReader::new(data);
    let mut payload = Payload::default();
    let mut charset = Charset::Guess;
    let mut fnc1 = false;

    while reader.available() >= 4 {
        let mode = Mode::from_bits(read(&mut reader, 4)?)
            .ok_or_else(|| malformed("unknown mode indicator"))?;
        match mode {
            Mode::Terminator => break,
            Mode::Fnc1First | Mode::Fnc1Second => {
                fnc1 = true;
                if mode == Mode::Fnc1Second {
                    read(&mut reader, 8)?;
                }
            }
            Mode::StructuredAppend => {
                // sequence number, total and parity
                read(&mut reader, 16)?;
            }
            Mode::Eci => charset = Charset::from_eci(read_eci(&mut reader)?),
            Mode::Numeric => {
                let count = read(&mut reader, mode.count_bits(version))? as usize;
                let text = decode_numeric(&mut reader, count)?;
                payload.bytes.extend_from_slice(text.as_bytes());
                payload.text.push_str(&text);
            }
            Mode::Alphanumeric => {
                let count = read(&mut reader, mode.count_bits(version))? as usize;
                let text = decode_alphanumeric(&mut reader, count, fnc1)?;
                payload.bytes.extend_from_slice(text.as_bytes());
                payload.text.push_str(&text);
            }
            Mode::Byte => {
                let count = read(&mut reader, mode.count_bits(version))? as usize;
                let mut bytes = Vec::with_capacity(count);
                for _ in 0..count {
                    bytes.push(read(&mut reader, 8)? as u8);
                }
                payload.text.push_str(&charset.decode(&bytes));
                payload.bytes.extend_from_slice(&bytes);
            }
            Mode::Kanji => {
                let count = read(&mut reader, mode.count_bits(version))? as usize;
                for _ in 0..count {
                    let sjis = kanji_to_shift_jis(read(&mut reader, 13)? as u16);
                    payload.bytes.extend_from_slice(&sjis.to_be_bytes());
                    payload.text.push(char::REPLACEMENT_CHARACTER);
                }
            }
        }
    }
    Ok(payload)
}

fn read_eci(reader: &mut BitReader<'_>) -> Result<u32, DecodeFailure> {
    let first = read(reader, 8)?;
    if first & 0x80 == 0 {
        Ok(first)
    } else if first & 0xC0 == 0x80 {
        Ok(((first & 0x3F) << 8) | read(reader, 8)?)
    } else if first & 0xE0 == 0xC0 {
        Ok(((first & 0x1F) << 16) | read(reader, 16)?)
    } else {
        Err(malformed("invalid ECI designator"))
    }
}

fn decode_numeric(reader: &mut BitReader<'_>, mut count: usize) -> Result<String, DecodeFailure> {
    let mut out = String::with_capacity(count);
    while count > 0 {
        let digits = count.min(3);
        let width = [4, 7, 10][digits - 1];
        let value = read(reader, width)?;
        if value >= 10u32.pow(digits as u32) {
            return Err(malformed("numeric group out of range"));
        }
        out.push_str(&format!("{value:0digits$}"));
        count -= digits;
    }
    Ok(out)
}

fn decode_alphanumeric(
    reader: &mut BitReader<'_>,
    mut count: usize,
    fnc1: bool,
) -> Result<String, DecodeFailure> {
    let mut raw = Vec::with_capacity(count);
    while count > 0 {
        if count >= 2 {
            let value = read(reader, 11)? as usize;
            if value >= 45 * 45 {
                return Err(malformed("alphanumeric pair out of range"));
            }
            raw.push(ALPHANUMERIC_TABLE[value / 45]);
            raw.push(ALPHANUMERIC_TABLE[value % 45]);
            count -= 2;
        } else {
            let value = read(reader, 6)? as usize;
            let c = ALPHANUMERIC_TABLE
                .get(value)
                .ok_or_else(|| malformed("alphanumeric character out of range"))?;
            raw.push(*c);
            count -= 1;
        }
    }
    if !fnc1 {
        return Ok(raw.into_iter().map(char::from).collect());
    }
    // "%%" is a literal percent, a lone "%" is the group separator
    let mut out = String::with_capacity(raw.len());
    let mut iter = raw.into_iter().peekable();
    while let Some(c) = iter.next() {
        if c == b'%' {
            if iter.peek() == Some(&b'%') {
                iter.next();
                out.push('%');
            } else {
                out.push('\u{1D}');
            }
        } else {
            out.push(c as char);
        }
    }
    Ok(out)
}

fn kanji_to_shift_jis(value: u16) -> u16 {
    let assembled = ((value / 0xC0) << 8) | (value % 0xC0);
    if assembled < 0x1F00 {
        assembled + 0x8140
    } else {
        assembled + 0xC140
    }
}
