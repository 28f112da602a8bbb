//! Corrected codewords to text: ASCII, C40, Text, ANSI X12, EDIFACT and Base 256 encodation.

use super::placement::{border_error_rate, extract, read_codewords};
use super::symbol::SymbolSize;
use crate::ecc::{ReedSolomonDecoder, galois};
use crate::error::DecodeFailure;
use crate::models::BitMatrix;
use crate::utils::bits::{BitReader, Charset, Message, MessageBuilder};
use tracing::trace;

/// Border mismatch above which a grid is not taken for a symbol
const MAX_BORDER_ERRORS: f32 = 0.2;

const C40_BASIC: &[u8; 40] = b"*** 0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const TEXT_BASIC: &[u8; 40] = b"*** 0123456789abcdefghijklmnopqrstuvwxyz";
const SHIFT2: &[u8; 27] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_";
const TEXT_SHIFT3: &[u8; 32] = b"`ABCDEFGHIJKLMNOPQRSTUVWXYZ{|}~\x7F";

const GROUP_SEPARATOR: u8 = 0x1D;
const UNLATCH: u32 = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encodation {
    Ascii,
    C40,
    Text,
    X12,
    Edifact,
    Base256,
    Pad,
}

fn malformed(reason: &str) -> DecodeFailure {
    DecodeFailure::Malformed(reason.to_string())
}

fn read(bits: &mut BitReader<'_>, n: usize) -> Result<u32, DecodeFailure> {
    bits.read(n).ok_or_else(|| malformed("codeword stream ends inside a segment"))
}

/// Decode a canonical (finder L at the bottom left) module grid
pub(crate) fn decode_symbol(symbol: &BitMatrix) -> Result<Message, DecodeFailure> {
    let size = SymbolSize::lookup(symbol.height(), symbol.width()).ok_or(DecodeFailure::NotFound)?;
    let border_errors = border_error_rate(symbol, size);
    if border_errors > MAX_BORDER_ERRORS {
        return Err(DecodeFailure::NotFound);
    }
    trace!(rows = size.rows, cols = size.cols, border_errors, "Data Matrix grid accepted");
    let codewords = read_codewords(&extract(symbol, size));
    let data = deinterleave_and_correct(&codewords, size)?;
    decode_codewords(&data)
}

/// Correct every interleaved block; returns the data codewords
pub(crate) fn deinterleave_and_correct(
    codewords: &[u8],
    size: &SymbolSize,
) -> Result<Vec<u8>, DecodeFailure> {
    if codewords.len() < size.total_codewords() {
        return Err(DecodeFailure::NotFound);
    }
    let blocks = size.blocks;
    let ecc_per_block = size.ecc_per_block();
    let rs = ReedSolomonDecoder::new(galois::data_matrix());
    let mut data = codewords[..size.data_codewords].to_vec();

    for b in 0..blocks {
        let data_indices: Vec<usize> = (b..size.data_codewords).step_by(blocks).collect();
        let mut block: Vec<u8> = data_indices.iter().map(|&i| codewords[i]).collect();
        block.extend((0..ecc_per_block).map(|j| codewords[size.data_codewords + j * blocks + b]));
        rs.decode_bytes(&mut block, ecc_per_block)
            .map_err(|_| DecodeFailure::ErrorCorrection)?;
        for (&i, &value) in data_indices.iter().zip(&block) {
            data[i] = value;
        }
    }
    Ok(data)
}

/// Interpret the data codewords
pub(crate) fn decode_codewords(data: &[u8]) -> Result<Message, DecodeFailure> {
    let mut bits = BitReader::new(data);
    let mut out = MessageBuilder::default();
    let mut trailer: &[u8] = &[];
    let mut mode = Encodation::Ascii;

    while mode != Encodation::Pad && bits.available() > 0 {
        mode = match mode {
            Encodation::Ascii => decode_ascii(&mut bits, &mut out, &mut trailer)?,
            Encodation::C40 | Encodation::Text => {
                decode_c40_text(&mut bits, &mut out, mode == Encodation::Text)?;
                Encodation::Ascii
            }
            Encodation::X12 => {
                decode_x12(&mut bits, &mut out)?;
                Encodation::Ascii
            }
            Encodation::Edifact => {
                decode_edifact(&mut bits, &mut out)?;
                Encodation::Ascii
            }
            Encodation::Base256 => {
                decode_base256(&mut bits, &mut out)?;
                Encodation::Ascii
            }
            Encodation::Pad => Encodation::Pad,
        };
    }
    out.extend(trailer);
    Ok(out.finish())
}

fn decode_ascii(
    bits: &mut BitReader<'_>,
    out: &mut MessageBuilder,
    trailer: &mut &'static [u8],
) -> Result<Encodation, DecodeFailure> {
    let mut upper_shift = false;
    while bits.available() >= 8 {
        let value = read(bits, 8)?;
        match value {
            0 => return Err(malformed("codeword 0 in ASCII encodation")),
            1..=128 => {
                let base = if upper_shift { 128 } else { 0 };
                out.push((value - 1 + base) as u8);
                upper_shift = false;
            }
            129 => return Ok(Encodation::Pad),
            130..=229 => {
                let pair = value - 130;
                out.push(b'0' + (pair / 10) as u8);
                out.push(b'0' + (pair % 10) as u8);
            }
            230 => return Ok(Encodation::C40),
            231 => return Ok(Encodation::Base256),
            232 => out.push(GROUP_SEPARATOR),
            // structured append and reader programming carry no text
            233 | 234 => {}
            235 => upper_shift = true,
            236 => {
                out.extend(b"[)>\x1E05\x1D");
                *trailer = b"\x1E\x04";
            }
            237 => {
                out.extend(b"[)>\x1E06\x1D");
                *trailer = b"\x1E\x04";
            }
            238 => return Ok(Encodation::X12),
            239 => return Ok(Encodation::Text),
            240 => return Ok(Encodation::Edifact),
            241 => {
                let eci = read_eci(bits)?;
                out.set_charset(Charset::from_eci(eci));
            }
            UNLATCH if bits.available() == 0 => {}
            _ => return Err(malformed("codeword not valid in ASCII encodation")),
        }
    }
    Ok(Encodation::Ascii)
}

fn read_eci(bits: &mut BitReader<'_>) -> Result<u32, DecodeFailure> {
    let first = read(bits, 8)?;
    if first == 0 {
        return Err(malformed("invalid ECI designator"));
    }
    if first <= 127 {
        return Ok(first - 1);
    }
    let second = read(bits, 8)?;
    if first <= 191 {
        return Ok((first - 128) * 254 + 127 + second.saturating_sub(1));
    }
    let third = read(bits, 8)?;
    Ok((first - 192) * 64516 + 16383 + second.saturating_sub(1) * 254 + third.saturating_sub(1))
}

/// Three base-40 values packed in two codewords; `None` on the unlatch codeword
fn read_triple(bits: &mut BitReader<'_>) -> Result<Option<[u32; 3]>, DecodeFailure> {
    if bits.available() < 16 {
        return Ok(None);
    }
    let first = read(bits, 8)?;
    if first == UNLATCH {
        return Ok(None);
    }
    let packed = (first << 8 | read(bits, 8)?).wrapping_sub(1);
    let c1 = packed / 1600;
    let c2 = packed % 1600 / 40;
    let c3 = packed % 40;
    Ok(Some([c1, c2, c3]))
}

fn decode_c40_text(bits: &mut BitReader<'_>, out: &mut MessageBuilder, text: bool) -> Result<(), DecodeFailure> {
    let basic = if text { TEXT_BASIC } else { C40_BASIC };
    let mut shift = 0;
    let mut upper_shift = false;
    fn emit(out: &mut MessageBuilder, value: u32, upper_shift: &mut bool) {
        let value = if *upper_shift { value + 128 } else { value };
        *upper_shift = false;
        out.push(value as u8);
    }

    while let Some(values) = read_triple(bits)? {
        for value in values {
            match shift {
                0 => match value {
                    0..=2 => shift = value + 1,
                    _ => {
                        let c = *basic
                            .get(value as usize)
                            .ok_or_else(|| malformed("C40/Text value out of range"))?;
                        emit(out, c as u32, &mut upper_shift);
                    }
                },
                1 => {
                    emit(out, value, &mut upper_shift);
                    shift = 0;
                }
                2 => {
                    match value {
                        0..=26 => emit(out, SHIFT2[value as usize] as u32, &mut upper_shift),
                        27 => out.push(GROUP_SEPARATOR),
                        30 => upper_shift = true,
                        _ => return Err(malformed("invalid shift 2 value")),
                    }
                    shift = 0;
                }
                _ => {
                    let c = if text {
                        *TEXT_SHIFT3
                            .get(value as usize)
                            .ok_or_else(|| malformed("invalid Text shift 3 value"))?
                            as u32
                    } else {
                        value + 96
                    };
                    emit(out, c, &mut upper_shift);
                    shift = 0;
                }
            }
        }
    }
    Ok(())
}

fn decode_x12(bits: &mut BitReader<'_>, out: &mut MessageBuilder) -> Result<(), DecodeFailure> {
    while let Some(values) = read_triple(bits)? {
        for value in values {
            let c = match value {
                0 => b'\r',
                1 => b'*',
                2 => b'>',
                3 => b' ',
                4..=13 => b'0' + (value - 4) as u8,
                14..=39 => b'A' + (value - 14) as u8,
                _ => return Err(malformed("X12 value out of range")),
            };
            out.push(c);
        }
    }
    Ok(())
}

fn decode_edifact(bits: &mut BitReader<'_>, out: &mut MessageBuilder) -> Result<(), DecodeFailure> {
    while bits.available() > 16 {
        for _ in 0..4 {
            let value = read(bits, 6)?;
            if value == 0x1F {
                // unlatch, then realign to the next codeword
                let offset = bits.position() % 8;
                if offset != 0 {
                    read(bits, 8 - offset)?;
                }
                return Ok(());
            }
            let value = if value & 0x20 == 0 { value | 0x40 } else { value };
            out.push(value as u8);
        }
    }
    Ok(())
}

fn unrandomize_255(value: u32, position: usize) -> u8 {
    let pseudo_random = ((149 * position) % 255 + 1) as i32;
    let v = value as i32 - pseudo_random;
    (if v >= 0 { v } else { v + 256 }) as u8
}

fn decode_base256(bits: &mut BitReader<'_>, out: &mut MessageBuilder) -> Result<(), DecodeFailure> {
    let mut position = 1 + bits.position() / 8;
    let mut next = |bits: &mut BitReader<'_>| -> Result<u8, DecodeFailure> {
        let value = read(bits, 8)?;
        let b = unrandomize_255(value, position);
        position += 1;
        Ok(b)
    };
    let d1 = next(bits)? as usize;
    let count = match d1 {
        0 => bits.available() / 8,
        1..=249 => d1,
        _ => 250 * (d1 - 249) + next(bits)? as usize,
    };
    let mut bytes = Vec::with_capacity(count);
    for _ in 0..count {
        bytes.push(next(bits)?);
    }
    out.extend(&bytes);
    Ok(())
}
