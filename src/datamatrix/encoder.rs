//! ASCII encodation, padding, check words and symbol assembly.

use super::placement::{assemble, place_codewords};
use super::symbol::SymbolSize;
use crate::ecc::{ReedSolomonEncoder, galois};
use crate::error::{Result, ZebraError};
use crate::models::{BitMatrix, Symbology};
use tracing::debug;

pub(crate) const PAD: u8 = 129;
pub(crate) const UPPER_SHIFT: u8 = 235;

/// ASCII encodation: digit pairs, printable ASCII and upper-shifted high bytes
pub(crate) fn encode_ascii(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match bytes.get(i + 1) {
            Some(&next) if b.is_ascii_digit() && next.is_ascii_digit() => {
                out.push(130 + (b - b'0') * 10 + (next - b'0'));
                i += 2;
                continue;
            }
            _ => {}
        }
        if b < 128 {
            out.push(b + 1);
        } else {
            out.push(UPPER_SHIFT);
            out.push(b - 128 + 1);
        }
        i += 1;
    }
    out
}

/// Fill to `capacity` with the first pad literal and then 253-state randomized pads
pub(crate) fn pad_codewords(codewords: &mut Vec<u8>, capacity: usize) {
    if codewords.len() < capacity {
        codewords.push(PAD);
    }
    while codewords.len() < capacity {
        let position = codewords.len() + 1;
        let pseudo_random = (149 * position) % 253 + 1;
        let value = PAD as usize + pseudo_random;
        let value = if value <= 254 { value } else { value - 254 };
        codewords.push(value as u8);
    }
}

/// Append interleaved check words to the data codewords of `size`
pub(crate) fn add_ecc(data: &[u8], size: &SymbolSize) -> Vec<u8> {
    let blocks = size.blocks;
    let ecc_per_block = size.ecc_per_block();
    let rs = ReedSolomonEncoder::new(galois::data_matrix(), ecc_per_block);
    let mut out = data.to_vec();
    out.resize(size.total_codewords(), 0);
    for b in 0..blocks {
        let block: Vec<u8> = data.iter().skip(b).step_by(blocks).copied().collect();
        for (j, &check) in rs.encode_bytes(&block).iter().enumerate() {
            out[data.len() + j * blocks + b] = check;
        }
    }
    out
}

/// Build a symbol of `size` from already padded data codewords
pub(crate) fn encode_symbol(data: &[u8], size: &SymbolSize) -> BitMatrix {
    let codewords = add_ecc(data, size);
    assemble(&place_codewords(&codewords, size), size)
}

/// Encode `text` (its UTF-8 bytes) as the smallest square ECC200 symbol
pub(crate) fn encode(text: &str) -> Result<BitMatrix> {
    if text.is_empty() {
        return Err(ZebraError::invalid_payload(Symbology::DataMatrix, "payload is empty"));
    }
    let mut codewords = encode_ascii(text.as_bytes());
    let size = SymbolSize::smallest_square(codewords.len()).ok_or_else(|| {
        ZebraError::invalid_payload(
            Symbology::DataMatrix,
            format!("{} codewords exceed the 144x144 capacity", codewords.len()),
        )
    })?;
    let used = codewords.len();
    pad_codewords(&mut codewords, size.data_codewords);
    debug!(rows = size.rows, cols = size.cols, used, "encoded Data Matrix symbol");
    Ok(encode_symbol(&codewords, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_encodation() {
        assert_eq!(encode_ascii(b"A1"), vec![66, 50]);
        assert_eq!(encode_ascii(b"123"), vec![142, 52]);
        assert_eq!(encode_ascii(&[0xE9]), vec![UPPER_SHIFT, 0x6A]);
    }

    #[test]
    fn test_pad_sequence() {
        let mut codewords = vec![66];
        pad_codewords(&mut codewords, 5);
        assert_eq!(codewords, vec![66, 129, 70, 220, 115]);
    }

    #[test]
    fn test_known_check_words() {
        // "123456" in a 10x10 symbol
        let size = SymbolSize::lookup(10, 10).unwrap();
        let codewords = add_ecc(&[142, 164, 186], size);
        assert_eq!(codewords, vec![142, 164, 186, 114, 25, 5, 88, 102]);
    }

    #[test]
    fn test_capacity_limit() {
        assert_eq!(encode("A").unwrap().width(), 10);
        assert_eq!(encode(&"9".repeat(3116)).unwrap().width(), 144);
        assert!(encode(&"9".repeat(3118)).is_err());
        assert!(encode("").is_err());
    }
}
