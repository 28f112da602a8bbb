//! QR symbol construction: segment encoding, block interleaving and mask selection.

use super::format::{FormatInfo, place_version};
use super::function_mask::{FunctionMask, alignment_centers};
use super::mask::{apply_mask, penalty};
use super::payload::{ALPHANUMERIC_TABLE, Mode};
use super::placement::place_codewords;
use super::tables::{data_codewords, dimension, ec_block_info, raw_data_modules};
use crate::ecc::{ReedSolomonEncoder, galois};
use crate::error::{Result, ZebraError};
use crate::models::{BitMatrix, ErrorCorrectionLevel, Symbology};
use crate::utils::bits::{BitWriter, ECI_UTF8};
use tracing::debug;

const PAD_BYTES: [u8; 2] = [0xEC, 0x11];

/// The single segment a payload is encoded as
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment<'a> {
    mode: Mode,
    text: &'a str,
    /// Prefix an ECI header declaring UTF-8
    utf8_eci: bool,
}

impl<'a> Segment<'a> {
    fn for_text(text: &'a str) -> Self {
        let mode = if text.bytes().all(|b| b.is_ascii_digit()) {
            Mode::Numeric
        } else if text.bytes().all(|b| ALPHANUMERIC_TABLE.contains(&b)) {
            Mode::Alphanumeric
        } else {
            Mode::Byte
        };
        Self {
            mode,
            text,
            utf8_eci: !text.is_ascii(),
        }
    }

    fn char_count(&self) -> usize {
        self.text.len()
    }

    /// Bits of the whole segment, header included, at `version`
    fn bit_len(&self, version: u8) -> Option<usize> {
        let n = self.char_count();
        let count_bits = self.mode.count_bits(version);
        if n >= 1 << count_bits {
            return None;
        }
        let body = match self.mode {
            Mode::Numeric => n / 3 * 10 + [0, 4, 7][n % 3],
            Mode::Alphanumeric => n / 2 * 11 + (n % 2) * 6,
            _ => n * 8,
        };
        let eci = if self.utf8_eci { 12 } else { 0 };
        Some(eci + 4 + count_bits + body)
    }

    fn write(&self, out: &mut BitWriter, version: u8) {
        if self.utf8_eci {
            out.append(Mode::Eci.bits(), 4);
            out.append(ECI_UTF8, 8);
        }
        out.append(self.mode.bits(), 4);
        out.append(self.char_count() as u32, self.mode.count_bits(version));
        let bytes = self.text.as_bytes();
        match self.mode {
            Mode::Numeric => {
                for group in bytes.chunks(3) {
                    let value = group.iter().fold(0u32, |acc, &d| acc * 10 + (d - b'0') as u32);
                    out.append(value, [0, 4, 7, 10][group.len()]);
                }
            }
            Mode::Alphanumeric => {
                let index = |c: u8| {
                    ALPHANUMERIC_TABLE
                        .iter()
                        .position(|&a| a == c)
                        .unwrap_or_default() as u32
                };
                for pair in bytes.chunks(2) {
                    match pair {
                        [a, b] => out.append(index(*a) * 45 + index(*b), 11),
                        [a] => out.append(index(*a), 6),
                        _ => {}
                    }
                }
            }
            _ => {
                for &b in bytes {
                    out.append(b as u32, 8);
                }
            }
        }
    }
}

/// Smallest version that holds `segment` at `level`
fn choose_version(segment: &Segment<'_>, level: ErrorCorrectionLevel) -> Option<(u8, usize)> {
    (1..=40u8).find_map(|version| {
        let capacity = data_codewords(version, level)? * 8;
        let used = segment.bit_len(version)?;
        (used <= capacity).then_some((version, capacity))
    })
}

/// Data codewords: segment, terminator, byte alignment and pad bytes
fn data_bytes(segment: &Segment<'_>, version: u8, capacity_bits: usize) -> Vec<u8> {
    let mut bits = BitWriter::new();
    segment.write(&mut bits, version);
    let terminator = (capacity_bits - bits.len()).min(4);
    bits.append(0, terminator);
    let align = (8 - bits.len() % 8) % 8;
    bits.append(0, align);
    let mut bytes = bits.to_bytes();
    let mut pad = PAD_BYTES.iter().cycle();
    while bytes.len() * 8 < capacity_bits {
        bytes.push(*pad.next().unwrap_or(&PAD_BYTES[0]));
    }
    bytes
}

/// Split into blocks, append check words and interleave
pub(crate) fn add_ecc_and_interleave(
    data: &[u8],
    version: u8,
    level: ErrorCorrectionLevel,
) -> Option<Vec<u8>> {
    let info = ec_block_info(version, level)?;
    let raw_codewords = raw_data_modules(version) / 8;
    let num_short_blocks = info.num_blocks - raw_codewords % info.num_blocks;
    let short_len = raw_codewords / info.num_blocks - info.ecc_per_block;
    let rs = ReedSolomonEncoder::new(galois::qr_code(), info.ecc_per_block);

    let mut blocks = Vec::with_capacity(info.num_blocks);
    let mut offset = 0;
    for i in 0..info.num_blocks {
        let len = short_len + usize::from(i >= num_short_blocks);
        let block = data.get(offset..offset + len)?;
        offset += len;
        blocks.push((block.to_vec(), rs.encode_bytes(block)));
    }

    let mut out = Vec::with_capacity(raw_codewords);
    for i in 0..=short_len {
        for (block, _) in &blocks {
            if let Some(&b) = block.get(i) {
                out.push(b);
            }
        }
    }
    for i in 0..info.ecc_per_block {
        for (_, ecc) in &blocks {
            out.push(ecc[i]);
        }
    }
    Some(out)
}

/// Finders, separators, timing and alignment patterns
fn draw_function_patterns(matrix: &mut BitMatrix, version: u8) {
    let size = matrix.width();
    for (x, y) in [(0, 0), (size - 7, 0), (0, size - 7)] {
        matrix.set_region(x, y, 7, 7);
        for i in 1..6 {
            matrix.set(x + i, y + 1, false);
            matrix.set(x + i, y + 5, false);
            matrix.set(x + 1, y + i, false);
            matrix.set(x + 5, y + i, false);
        }
    }
    for i in 8..size - 8 {
        matrix.set(i, 6, i % 2 == 0);
        matrix.set(6, i, i % 2 == 0);
    }
    for (cx, cy) in alignment_centers(version) {
        matrix.set_region(cx - 2, cy - 2, 5, 5);
        for i in 0..3 {
            matrix.set(cx - 1 + i, cy - 1, false);
            matrix.set(cx - 1 + i, cy + 1, false);
        }
        matrix.set(cx - 1, cy, false);
        matrix.set(cx + 1, cy, false);
    }
    place_version(matrix, version);
}

/// Encode `text` as the smallest QR symbol at `level`, choosing the lowest-penalty mask
pub(crate) fn encode(text: &str, level: ErrorCorrectionLevel) -> Result<BitMatrix> {
    if text.is_empty() {
        return Err(ZebraError::invalid_payload(Symbology::QrCode, "payload is empty"));
    }
    let segment = Segment::for_text(text);
    let (version, capacity_bits) = choose_version(&segment, level).ok_or_else(|| {
        ZebraError::invalid_payload(
            Symbology::QrCode,
            format!("{} bytes exceed version 40 capacity at {level:?}", text.len()),
        )
    })?;
    let data = data_bytes(&segment, version, capacity_bits);
    let codewords = add_ecc_and_interleave(&data, version, level).ok_or_else(|| {
        ZebraError::invalid_payload(Symbology::QrCode, "codeword layout mismatch")
    })?;

    let func = FunctionMask::new(version);
    let mut base = BitMatrix::square(dimension(version));
    draw_function_patterns(&mut base, version);
    place_codewords(&mut base, &codewords, &func);

    let (mask, symbol) = (0..8u8)
        .map(|mask| {
            let mut candidate = base.clone();
            apply_mask(&mut candidate, mask, &func);
            FormatInfo { level, mask }.place(&mut candidate);
            (mask, candidate)
        })
        .min_by_key(|(_, candidate)| penalty(candidate))
        .ok_or_else(|| ZebraError::invalid_payload(Symbology::QrCode, "no mask candidate"))?;
    debug!(version, ?level, mask, mode = ?segment.mode, "encoded QR symbol");
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection() {
        assert_eq!(Segment::for_text("0123").mode, Mode::Numeric);
        assert_eq!(Segment::for_text("HELLO WORLD").mode, Mode::Alphanumeric);
        assert_eq!(Segment::for_text("hello").mode, Mode::Byte);
        assert!(Segment::for_text("zaż").utf8_eci);
        assert!(!Segment::for_text("plain").utf8_eci);
    }

    #[test]
    fn test_hello_world_data_codewords() {
        // "HELLO WORLD" at 1-M from the standard's worked example
        let segment = Segment::for_text("HELLO WORLD");
        let (version, capacity) = choose_version(&segment, ErrorCorrectionLevel::Medium).unwrap();
        assert_eq!(version, 1);
        let data = data_bytes(&segment, version, capacity);
        assert_eq!(
            data,
            vec![32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236, 17, 236, 17]
        );
        let codewords = add_ecc_and_interleave(&data, 1, ErrorCorrectionLevel::Medium).unwrap();
        assert_eq!(
            &codewords[16..],
            &[196, 35, 39, 119, 235, 215, 231, 226, 93, 23]
        );
    }

    #[test]
    fn test_version_grows_with_payload() {
        let small = encode("1", ErrorCorrectionLevel::Low).unwrap();
        assert_eq!(small.width(), 21);
        let big = encode(&"A".repeat(200), ErrorCorrectionLevel::High).unwrap();
        assert!(big.width() > 21);
        let max = "7".repeat(7089);
        assert_eq!(encode(&max, ErrorCorrectionLevel::Low).unwrap().width(), 177);
        assert!(encode(&"7".repeat(7090), ErrorCorrectionLevel::Low).is_err());
    }

    #[test]
    fn test_interleaving_mixes_blocks() {
        // 5-Q: two blocks of 15 and two of 16 data codewords
        let data: Vec<u8> = (0..62).collect();
        let out = add_ecc_and_interleave(&data, 5, ErrorCorrectionLevel::Quartile).unwrap();
        assert_eq!(out.len(), 134);
        assert_eq!(&out[..4], &[0, 15, 30, 46]);
        assert_eq!(out[60], 45);
        assert_eq!(out[61], 61);
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(encode("", ErrorCorrectionLevel::Medium).is_err());
    }
}
