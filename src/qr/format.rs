//! Format and version information: BCH-protected words around the finders.

use crate::models::{BitMatrix, ErrorCorrectionLevel};

const FORMAT_GENERATOR: u32 = 0x537;
const FORMAT_MASK: u32 = 0x5412;
const VERSION_GENERATOR: u32 = 0x1F25;

/// Most bit flips a format or version word may carry and still be trusted
const MAX_BCH_DISTANCE: u32 = 3;

/// Error-correction level and mask pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FormatInfo {
    pub level: ErrorCorrectionLevel,
    pub mask: u8,
}

fn level_bits(level: ErrorCorrectionLevel) -> u32 {
    match level {
        ErrorCorrectionLevel::Low => 0b01,
        ErrorCorrectionLevel::Medium => 0b00,
        ErrorCorrectionLevel::Quartile => 0b11,
        ErrorCorrectionLevel::High => 0b10,
    }
}

fn level_from_bits(bits: u32) -> ErrorCorrectionLevel {
    match bits & 0b11 {
        0b01 => ErrorCorrectionLevel::Low,
        0b00 => ErrorCorrectionLevel::Medium,
        0b11 => ErrorCorrectionLevel::Quartile,
        _ => ErrorCorrectionLevel::High,
    }
}

/// Remainder of `data << (degree)` divided by `generator`
fn bch_remainder(data: u32, generator: u32) -> u32 {
    let degree = 31 - generator.leading_zeros();
    let mut value = data << degree;
    while value != 0 && 31 - value.leading_zeros() >= degree {
        value ^= generator << (31 - value.leading_zeros() - degree);
    }
    value
}

impl FormatInfo {
    /// 15-bit masked word
    pub(crate) fn encode(self) -> u32 {
        let data = (level_bits(self.level) << 3) | self.mask as u32;
        ((data << 10) | bch_remainder(data, FORMAT_GENERATOR)) ^ FORMAT_MASK
    }

    /// Closest valid word to either copy
    pub(crate) fn decode(first: u32, second: u32) -> Option<Self> {
        let mut best: Option<(u32, u32)> = None;
        for data in 0..32u32 {
            let candidate = ((data << 10) | bch_remainder(data, FORMAT_GENERATOR)) ^ FORMAT_MASK;
            for word in [first, second] {
                let distance = (candidate ^ word).count_ones();
                if best.is_none_or(|(d, _)| distance < d) {
                    best = Some((distance, data));
                }
            }
        }
        let (distance, data) = best?;
        (distance <= MAX_BCH_DISTANCE).then(|| FormatInfo {
            level: level_from_bits(data >> 3),
            mask: (data & 0b111) as u8,
        })
    }

    /// Write both copies plus the dark module
    pub(crate) fn place(self, matrix: &mut BitMatrix) {
        let bits = self.encode();
        let size = matrix.width();
        for (i, (x, y)) in first_copy_positions().into_iter().enumerate() {
            matrix.set(x, y, (bits >> i) & 1 == 1);
        }
        for (i, (x, y)) in second_copy_positions(size).into_iter().enumerate() {
            matrix.set(x, y, (bits >> i) & 1 == 1);
        }
        matrix.set(8, size - 8, true);
    }

    pub(crate) fn read(matrix: &BitMatrix) -> Option<Self> {
        let size = matrix.width();
        let gather = |positions: [(usize, usize); 15]| {
            positions
                .into_iter()
                .enumerate()
                .fold(0u32, |acc, (i, (x, y))| acc | ((matrix.get(x, y) as u32) << i))
        };
        Self::decode(gather(first_copy_positions()), gather(second_copy_positions(size)))
    }
}

/// (x, y) of bit i of the copy around the top-left finder
fn first_copy_positions() -> [(usize, usize); 15] {
    let mut out = [(0, 0); 15];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
    }
    out
}

/// (x, y) of bit i of the copy split between the other two finders
fn second_copy_positions(size: usize) -> [(usize, usize); 15] {
    let mut out = [(0, 0); 15];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        };
    }
    out
}

/// 18-bit version word for versions 7 and up
pub(crate) fn encode_version(version: u8) -> u32 {
    let v = version as u32;
    (v << 12) | bch_remainder(v, VERSION_GENERATOR)
}

pub(crate) fn place_version(matrix: &mut BitMatrix, version: u8) {
    if version < 7 {
        return;
    }
    let bits = encode_version(version);
    let size = matrix.width();
    for i in 0..18 {
        let dark = (bits >> i) & 1 == 1;
        let a = size - 11 + i % 3;
        let b = i / 3;
        matrix.set(a, b, dark);
        matrix.set(b, a, dark);
    }
}

/// Version from the two version blocks; `None` for small symbols or unreadable blocks
pub(crate) fn read_version(matrix: &BitMatrix) -> Option<u8> {
    let size = matrix.width();
    if size < 45 {
        return None;
    }
    let (mut top_right, mut bottom_left) = (0u32, 0u32);
    for i in 0..18 {
        let a = size - 11 + i % 3;
        let b = i / 3;
        top_right |= (matrix.get(a, b) as u32) << i;
        bottom_left |= (matrix.get(b, a) as u32) << i;
    }
    (7..=40u8)
        .map(|v| {
            let word = encode_version(v);
            let distance = (word ^ top_right)
                .count_ones()
                .min((word ^ bottom_left).count_ones());
            (distance, v)
        })
        .min()
        .filter(|&(distance, _)| distance <= MAX_BCH_DISTANCE)
        .map(|(_, v)| v)
}
