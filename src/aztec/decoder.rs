//! Upright Aztec grid to text: mode message, layer bits, correction, unstuffing and
//! the character-mode state machine.

use super::layout::{Geometry, core_radius, mode_message_positions, orientation_marks};
use super::modes::{Code, Mode};
use crate::ecc::{ReedSolomonDecoder, galois};
use crate::error::DecodeFailure;
use crate::models::BitMatrix;
use crate::utils::bits::{BitReader, Charset, Message, MessageBuilder};
use tracing::trace;

const GROUP_SEPARATOR: u8 = 0x1D;
/// Orientation mark mismatches tolerated before a turn is rejected
const MAX_MARK_ERRORS: usize = 2;

/// What the mode message says about the symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ModeMessage {
    pub geometry: Geometry,
    pub data_words: usize,
}

/// Quarter turns that bring the orientation marks of a core grid upright
pub(crate) fn orientation(core: &BitMatrix, compact: bool) -> Option<usize> {
    let center = core.width() / 2;
    let marks = orientation_marks(center, core_radius(compact));
    (0..4)
        .map(|turns| {
            let turned = core.rotate_quarters(turns);
            let errors = marks
                .iter()
                .filter(|((x, y), dark)| turned.get(*x, *y) != *dark)
                .count();
            (errors, turns)
        })
        .min()
        .filter(|&(errors, _)| errors <= MAX_MARK_ERRORS)
        .map(|(_, turns)| turns)
}

/// Read and correct the mode message around the centre of an upright grid
pub(crate) fn read_mode_message(
    grid: &BitMatrix,
    compact: bool,
) -> Result<ModeMessage, DecodeFailure> {
    let center = grid.width() / 2;
    let bits: Vec<bool> = mode_message_positions(center, compact)
        .iter()
        .map(|&(x, y)| grid.get(x, y))
        .collect();
    let mut nibbles: Vec<u16> = bits
        .chunks(4)
        .map(|c| c.iter().fold(0u16, |acc, &b| (acc << 1) | b as u16))
        .collect();
    let (data, ecc) = if compact { (2, 5) } else { (4, 6) };
    ReedSolomonDecoder::new(galois::aztec_param())
        .decode(&mut nibbles, ecc)
        .map_err(|_| DecodeFailure::NotFound)?;
    let value = nibbles[..data].iter().fold(0u32, |acc, &n| (acc << 4) | n as u32);
    let (layers, data_words) = if compact {
        ((value >> 6) + 1, (value & 0x3F) + 1)
    } else {
        ((value >> 11) + 1, (value & 0x7FF) + 1)
    };
    let geometry = Geometry::new(compact, layers as usize).ok_or(DecodeFailure::NotFound)?;
    if data_words as usize > geometry.total_words() {
        return Err(DecodeFailure::NotFound);
    }
    Ok(ModeMessage {
        geometry,
        data_words: data_words as usize,
    })
}

/// Raw layer bits of an upright symbol grid
pub(crate) fn extract_bits(grid: &BitMatrix, geometry: &Geometry) -> Vec<bool> {
    geometry
        .data_positions()
        .iter()
        .map(|&(x, y)| grid.get(x, y))
        .collect()
}

/// Correct the layer codewords and strip the stuffed bits from the data words
pub(crate) fn correct_bits(raw: &[bool], mode: &ModeMessage) -> Result<Vec<bool>, DecodeFailure> {
    let word_size = mode.geometry.word_size();
    let total_words = raw.len() / word_size;
    let offset = raw.len() % word_size;
    let mut words: Vec<u16> = raw[offset..]
        .chunks(word_size)
        .map(|c| c.iter().fold(0u16, |acc, &b| (acc << 1) | b as u16))
        .collect();
    let corrected = ReedSolomonDecoder::new(mode.geometry.field())
        .decode(&mut words, total_words - mode.data_words)
        .map_err(|_| DecodeFailure::ErrorCorrection)?;
    trace!(corrected, words = total_words, "Aztec codewords");

    let all_ones = (1u16 << word_size) - 1;
    let mut bits = Vec::with_capacity(mode.data_words * word_size);
    for &word in &words[..mode.data_words] {
        if word == 0 || word == all_ones {
            return Err(DecodeFailure::Malformed("codeword of all zeros or all ones".into()));
        }
        if word == 1 || word == all_ones - 1 {
            bits.extend(std::iter::repeat_n(word > 1, word_size - 1));
        } else {
            bits.extend((0..word_size).rev().map(|i| (word >> i) & 1 == 1));
        }
    }
    Ok(bits)
}

/// Run the character-mode state machine over corrected data bits
///
/// A shift returns to the mode it was invoked from, including a binary shift
/// invoked while shifted.
pub(crate) fn decode_bits(bits: &[bool]) -> Result<Message, DecodeFailure> {
    let mut reader = BitReader::from_bits(bits);
    let mut out = MessageBuilder::default();
    let (mut latch, mut current) = (Mode::Upper, Mode::Upper);
    while let Some(code) = reader.read(current.code_bits()) {
        match current.lookup(code) {
            Code::Char(b) => {
                out.push(b);
                current = latch;
            }
            Code::Pair(pair) => {
                out.extend(pair);
                current = latch;
            }
            Code::Latch(mode) => {
                latch = mode;
                current = mode;
            }
            Code::Shift(mode) => {
                latch = current;
                current = mode;
            }
            Code::BinaryShift => {
                latch = current;
                if !read_binary(&mut reader, &mut out) {
                    break;
                }
            }
            Code::Flag => {
                let Some(n) = reader.read(3) else { break };
                match n {
                    0 => out.push(GROUP_SEPARATOR),
                    7 => return Err(DecodeFailure::Malformed("FLG(7) is reserved".into())),
                    _ => {
                        let mut eci = 0u32;
                        for _ in 0..n {
                            let digit = reader
                                .read(4)
                                .filter(|d| (2..=11).contains(d))
                                .ok_or_else(|| DecodeFailure::Malformed("bad ECI digit".into()))?;
                            eci = eci * 10 + digit - 2;
                        }
                        out.set_charset(Charset::from_eci(eci));
                    }
                }
                current = latch;
            }
        }
    }
    Ok(out.finish())
}

/// Copy one binary-shift run; false when the stream ends inside it
fn read_binary(reader: &mut BitReader<'_>, out: &mut MessageBuilder) -> bool {
    let Some(mut length) = reader.read(5) else {
        return false;
    };
    if length == 0 {
        match reader.read(11) {
            Some(extra) => length = extra + 31,
            None => return false,
        }
    }
    for _ in 0..length {
        match reader.read(8) {
            Some(b) => out.push(b as u8),
            None => return false,
        }
    }
    true
}

/// Decode an upright grid whose centre is the bullseye centre
pub(crate) fn decode_grid(grid: &BitMatrix, mode: &ModeMessage) -> Result<Message, DecodeFailure> {
    if grid.width() != mode.geometry.matrix_size() {
        return Err(DecodeFailure::NotFound);
    }
    let raw = extract_bits(grid, &mode.geometry);
    let bits = correct_bits(&raw, mode)?;
    decode_bits(&bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aztec::encoder::{draw_symbol, encode, encode_bits, stuff_bits};
    use crate::models::ErrorCorrectionLevel;
    use pretty_assertions::assert_eq;

    fn round_trip(text: &str) -> String {
        let bits = encode_bits(text.as_bytes());
        decode_bits(bits.bits()).unwrap().text
    }

    fn decode_symbol(symbol: &BitMatrix) -> Result<Message, DecodeFailure> {
        let compact = symbol.width() <= 27 && orientation(&core(symbol, true), true) == Some(0);
        let mode = read_mode_message(symbol, compact)?;
        decode_grid(symbol, &mode)
    }

    fn core(symbol: &BitMatrix, compact: bool) -> BitMatrix {
        let radius = core_radius(compact);
        let center = symbol.width() / 2;
        let mut out = BitMatrix::square(2 * radius + 1);
        for y in 0..out.height() {
            for x in 0..out.width() {
                out.set(x, y, symbol.get(center - radius + x, center - radius + y));
            }
        }
        out
    }

    #[test]
    fn test_character_modes() {
        for text in [
            "HELLO WORLD",
            "hello world",
            "Mixed Case Text",
            "1234567890",
            "a\r\nb. c, d: e",
            "#$%&!?",
            "@\\^_`|~",
            "lower UPPER 12.5, done",
            "x\x01y\x7F",
        ] {
            assert_eq!(round_trip(text), text);
        }
    }

    #[test]
    fn test_binary_runs() {
        assert_eq!(round_trip("naïve café"), "naïve café");
        let long = "é".repeat(1500);
        assert_eq!(round_trip(&long), long);
        let bytes: Vec<u8> = (0u8..=255).collect();
        let decoded = decode_bits(encode_bits(&bytes).bits()).unwrap();
        assert_eq!(decoded.bytes, bytes);
    }

    #[test]
    fn test_flag_codes() {
        // PS, FLG(0), A
        let mut w = crate::utils::bits::BitWriter::new();
        w.append(0, 5);
        w.append(0, 5);
        w.append(0, 3);
        w.append(2, 5);
        assert_eq!(decode_bits(w.bits()).unwrap().text, "\x1DA");

        let mut reserved = crate::utils::bits::BitWriter::new();
        reserved.append(0, 5);
        reserved.append(0, 5);
        reserved.append(7, 3);
        assert!(matches!(decode_bits(reserved.bits()), Err(DecodeFailure::Malformed(_))));
    }

    #[test]
    fn test_padding_emits_nothing() {
        let mut bits = encode_bits(b"AB").bits().to_vec();
        bits.extend([true; 9]);
        assert_eq!(decode_bits(&bits).unwrap().text, "AB");
    }

    #[test]
    fn test_symbols_decode() {
        for (text, level) in [
            ("A", ErrorCorrectionLevel::Medium),
            ("Hello, Aztec!", ErrorCorrectionLevel::Low),
            ("Code 2D 0123456789", ErrorCorrectionLevel::High),
        ] {
            let symbol = encode(text, level).unwrap();
            assert_eq!(decode_symbol(&symbol).unwrap().text, text);
        }
        let long = "The quick brown fox jumps over the lazy dog. ".repeat(12);
        let symbol = encode(&long, ErrorCorrectionLevel::Medium).unwrap();
        assert!(symbol.width() > 27);
        assert_eq!(decode_symbol(&symbol).unwrap().text, long);
    }

    #[test]
    fn test_corrects_damage() {
        let text = "DAMAGE TOLERANCE";
        let mut symbol = encode(text, ErrorCorrectionLevel::High).unwrap();
        // flip a few modules in the outer layer
        for x in [0, 3, 6] {
            symbol.toggle(x, 0);
        }
        assert_eq!(decode_symbol(&symbol).unwrap().text, text);
    }

    #[test]
    fn test_heavy_damage_is_error_correction() {
        let geometry = Geometry::new(true, 2).unwrap();
        let words = stuff_bits(encode_bits(b"DAMAGED BEYOND REPAIR").bits(), geometry.word_size());
        let mut symbol = draw_symbol(&geometry, &words);
        // invert both data layers, leaving the mode message ring intact
        let center = symbol.width() / 2;
        for y in 0..symbol.height() {
            for x in 0..symbol.width() {
                if x.abs_diff(center).max(y.abs_diff(center)) > 5 {
                    symbol.toggle(x, y);
                }
            }
        }
        let mode = read_mode_message(&symbol, true).unwrap();
        assert_eq!(decode_grid(&symbol, &mode), Err(DecodeFailure::ErrorCorrection));
    }

    #[test]
    fn test_orientation_of_turned_cores() {
        let symbol = encode("TURNS", ErrorCorrectionLevel::Medium).unwrap();
        let upright = core(&symbol, true);
        for turns in 0..4 {
            let turned = upright.rotate_quarters(turns);
            assert_eq!(orientation(&turned, true), Some((4 - turns) % 4));
        }
        assert_eq!(orientation(&BitMatrix::square(11), true), None);
    }
}
