//! Text to Aztec symbol: greedy mode selection, bit stuffing, check words and
//! drawing the layers around the bullseye.

use super::layout::{
    Geometry, MAX_LAYERS, draw_bullseye, draw_reference_grid, mode_message_positions,
};
use super::modes::{ALL_MODES, Mode, is_text};
use crate::ecc::{ReedSolomonEncoder, galois};
use crate::error::{Result, ZebraError};
use crate::models::{BitMatrix, ErrorCorrectionLevel, Symbology};
use crate::utils::bits::BitWriter;
use tracing::debug;

/// Longest byte run one binary shift can carry
const MAX_BINARY_RUN: usize = 2047 + 31;
/// Compact symbols count data words in six bits
const MAX_COMPACT_WORDS: usize = 64;

/// Share of the symbol given to check words, in percent
fn ecc_percent(level: ErrorCorrectionLevel) -> usize {
    match level {
        ErrorCorrectionLevel::Low => 10,
        ErrorCorrectionLevel::Medium => 23,
        ErrorCorrectionLevel::Quartile => 36,
        ErrorCorrectionLevel::High => 50,
    }
}

/// Consecutive tokens `mode` can encode starting at `i`
fn run_in(mode: Mode, data: &[u8], mut i: usize) -> usize {
    let mut run = 0;
    while let Some((_, len)) = mode.code_for(data, i) {
        run += 1;
        i += len;
    }
    run
}

fn emit(out: &mut BitWriter, codes: &[(u32, usize)]) {
    for &(code, bits) in codes {
        out.append(code, bits);
    }
}

/// Character stream for `data`, starting in Upper
pub(crate) fn encode_bits(data: &[u8]) -> BitWriter {
    let mut out = BitWriter::new();
    let mut mode = Mode::Upper;
    let mut i = 0;
    while i < data.len() {
        if let Some((code, len)) = mode.code_for(data, i) {
            out.append(code, mode.code_bits());
            i += len;
            continue;
        }
        if !is_text(data, i) {
            if matches!(mode, Mode::Punct | Mode::Digit) {
                emit(&mut out, mode.latch_to(Mode::Upper));
                mode = Mode::Upper;
            }
            let mut end = i;
            while end < data.len() && end - i < MAX_BINARY_RUN && !is_text(data, end) {
                end += 1;
            }
            let run = end - i;
            out.append(31, 5);
            if run <= 31 {
                out.append(run as u32, 5);
            } else {
                out.append(0, 5);
                out.append((run - 31) as u32, 11);
            }
            for &b in &data[i..end] {
                out.append(b as u32, 8);
            }
            i = end;
            continue;
        }

        // a single token in another mode is shifted when the one after it fits here
        if mode != Mode::Punct {
            if let Some((code, len)) = Mode::Punct.code_for(data, i) {
                if Mode::Punct.code_for(data, i + len).is_none() {
                    out.append(0, mode.code_bits());
                    out.append(code, 5);
                    i += len;
                    continue;
                }
            }
        }
        if matches!(mode, Mode::Lower | Mode::Digit) {
            if let Some((code, len)) = Mode::Upper.code_for(data, i) {
                if Mode::Upper.code_for(data, i + len).is_none() {
                    let shift = if mode == Mode::Lower { 28 } else { 15 };
                    out.append(shift, mode.code_bits());
                    out.append(code, 5);
                    i += len;
                    continue;
                }
            }
        }

        let mut target = mode;
        let mut best = 0;
        for candidate in ALL_MODES {
            let run = run_in(candidate, data, i);
            if run > best {
                best = run;
                target = candidate;
            }
        }
        emit(&mut out, mode.latch_to(target));
        mode = target;
    }
    out
}

/// Pack `bits` into words, breaking all-zero and all-one words with a stuffed bit
pub(crate) fn stuff_bits(bits: &[bool], word_size: usize) -> Vec<u32> {
    let mask = (1u32 << word_size) - 2;
    let mut words = Vec::with_capacity(bits.len() / word_size + 1);
    let mut i = 0;
    while i < bits.len() {
        let mut word = 0u32;
        for j in 0..word_size {
            if bits.get(i + j).copied().unwrap_or(true) {
                word |= 1 << (word_size - 1 - j);
            }
        }
        if word & mask == mask {
            words.push(word & mask);
            i += word_size - 1;
        } else if word & mask == 0 {
            words.push(word | 1);
            i += word_size - 1;
        } else {
            words.push(word);
            i += word_size;
        }
    }
    words
}

/// Data words plus check words, laid out as the full bit stream of the data layers
fn layer_bits(words: &[u32], geometry: &Geometry) -> Vec<bool> {
    let word_size = geometry.word_size();
    let data: Vec<u16> = words.iter().map(|&w| w as u16).collect();
    let ecc = ReedSolomonEncoder::new(geometry.field(), geometry.total_words() - data.len())
        .encode(&data);
    let mut out = BitWriter::new();
    out.append(0, geometry.total_bits() % word_size);
    for &w in data.iter().chain(ecc.iter()) {
        out.append(w as u32, word_size);
    }
    out.bits().to_vec()
}

/// Layer count and data word count protected over GF(16)
pub(crate) fn mode_message(geometry: &Geometry, data_words: usize) -> Vec<bool> {
    let mut bits = BitWriter::new();
    let (words, ecc) = if geometry.compact {
        bits.append(geometry.layers as u32 - 1, 2);
        bits.append(data_words as u32 - 1, 6);
        (2, 5)
    } else {
        bits.append(geometry.layers as u32 - 1, 5);
        bits.append(data_words as u32 - 1, 11);
        (4, 6)
    };
    let nibbles: Vec<u16> = bits
        .to_bytes()
        .iter()
        .flat_map(|&b| [(b >> 4) as u16, (b & 15) as u16])
        .take(words)
        .collect();
    let checks = ReedSolomonEncoder::new(galois::aztec_param(), ecc).encode(&nibbles);
    let mut out = BitWriter::new();
    for &n in nibbles.iter().chain(checks.iter()) {
        out.append(n as u32, 4);
    }
    out.bits().to_vec()
}

/// Smallest symbol whose layers hold the stuffed words plus the requested check share
fn choose_geometry(bits: &[bool], ecc_bits: usize) -> Option<(Geometry, Vec<u32>)> {
    let needed = bits.len() + ecc_bits;
    let mut stuffed: Option<(usize, Vec<u32>)> = None;
    for i in 0..=MAX_LAYERS {
        let compact = i <= 3;
        let layers = if compact { i + 1 } else { i };
        let geometry = Geometry::new(compact, layers)?;
        if needed > geometry.total_bits() {
            continue;
        }
        let word_size = geometry.word_size();
        if stuffed.as_ref().is_none_or(|(size, _)| *size != word_size) {
            stuffed = Some((word_size, stuff_bits(bits, word_size)));
        }
        let Some((_, words)) = &stuffed else {
            continue;
        };
        if compact && words.len() > MAX_COMPACT_WORDS {
            continue;
        }
        let usable = geometry.total_bits() - geometry.total_bits() % word_size;
        if words.len() * word_size + ecc_bits <= usable {
            return Some((geometry, words.clone()));
        }
    }
    None
}

/// Draw a complete symbol for `data_words` already stuffed to the geometry's word size
pub(crate) fn draw_symbol(geometry: &Geometry, data_words: &[u32]) -> BitMatrix {
    let size = geometry.matrix_size();
    let center = size / 2;
    let mut matrix = BitMatrix::square(size);
    let bits = layer_bits(data_words, geometry);
    for (&(x, y), &bit) in geometry.data_positions().iter().zip(&bits) {
        if bit {
            matrix.set(x, y, true);
        }
    }
    let mode = mode_message(geometry, data_words.len());
    for (&(x, y), &bit) in mode_message_positions(center, geometry.compact).iter().zip(&mode) {
        if bit {
            matrix.set(x, y, true);
        }
    }
    draw_bullseye(&mut matrix, center, geometry.radius());
    draw_reference_grid(&mut matrix, geometry);
    matrix
}

/// Encode the UTF-8 bytes of `text` in the smallest symbol meeting `level`
pub(crate) fn encode(text: &str, level: ErrorCorrectionLevel) -> Result<BitMatrix> {
    if text.is_empty() {
        return Err(ZebraError::invalid_payload(Symbology::Aztec, "payload is empty"));
    }
    let bits = encode_bits(text.as_bytes());
    let ecc_bits = bits.len() * ecc_percent(level) / 100 + 11;
    let (geometry, words) = choose_geometry(bits.bits(), ecc_bits).ok_or_else(|| {
        ZebraError::invalid_payload(
            Symbology::Aztec,
            format!("{} data bits exceed 32 layers", bits.len()),
        )
    })?;
    debug!(
        compact = geometry.compact,
        layers = geometry.layers,
        data_words = words.len(),
        "encoded Aztec symbol"
    );
    Ok(draw_symbol(&geometry, &words))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(writer: &BitWriter) -> String {
        writer.bits().iter().map(|&b| if b { '1' } else { '0' }).collect()
    }

    #[test]
    fn test_upper_and_latch() {
        // A, latch lower, b
        assert_eq!(bits_of(&encode_bits(b"Ab")), "00010".to_owned() + "11100" + "00011");
    }

    #[test]
    fn test_punct_shift_and_pair() {
        // A, PS, '!', B
        assert_eq!(bits_of(&encode_bits(b"A!B")), "00010".to_owned() + "00000" + "00110" + "00011");
        // A, PS, ". "
        assert_eq!(bits_of(&encode_bits(b"A. ")), "00010".to_owned() + "00000" + "00011");
    }

    #[test]
    fn test_binary_shift_lengths() {
        let short = encode_bits(&[0x00, 0xFF]);
        assert_eq!(bits_of(&short), "11111".to_owned() + "00010" + "00000000" + "11111111");
        let long = encode_bits(&[0x80; 40]);
        assert_eq!(long.len(), 5 + 5 + 11 + 40 * 8);
        assert_eq!(&bits_of(&long)[10..21], "00000001001");
    }

    #[test]
    fn test_stuffing() {
        let bits: Vec<bool> = "000000111111".chars().map(|c| c == '1').collect();
        // 00000 gets a stuffed one, then the last bit is padded with ones and stuffed
        assert_eq!(stuff_bits(&bits, 6), vec![0b000001, 0b011111, 0b111110]);
    }

    #[test]
    fn test_mode_message_compact() {
        let geometry = Geometry::new(true, 1).unwrap();
        let bits = mode_message(&geometry, 3);
        assert_eq!(bits.len(), 28);
        assert_eq!(&bits[..8], &[false, false, false, false, false, false, true, false]);
    }

    #[test]
    fn test_symbol_growth() {
        assert_eq!(encode("A", ErrorCorrectionLevel::Medium).unwrap().width(), 15);
        let long = encode(&"Z".repeat(200), ErrorCorrectionLevel::Medium).unwrap();
        assert!(long.width() > 27);
        let high = encode(&"Z".repeat(40), ErrorCorrectionLevel::High).unwrap();
        let low = encode(&"Z".repeat(40), ErrorCorrectionLevel::Low).unwrap();
        assert!(high.width() >= low.width());
        assert!(encode("", ErrorCorrectionLevel::Medium).is_err());
        assert!(encode(&"\u{80}".repeat(2000), ErrorCorrectionLevel::Medium).is_err());
    }
}
