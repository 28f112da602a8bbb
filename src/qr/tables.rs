//! Version capacity tables for QR Code model 2.

use crate::models::ErrorCorrectionLevel;

/// Error-correction block layout of one version and level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EcBlockInfo {
    pub num_blocks: usize,
    pub ecc_per_block: usize,
}

// Index: [ec_level][version]
const ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

const NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

pub(crate) fn ec_block_info(version: u8, level: ErrorCorrectionLevel) -> Option<EcBlockInfo> {
    if !(1..=40).contains(&version) {
        return None;
    }
    let idx = level_index(level);
    let ecc = ECC_CODEWORDS_PER_BLOCK[idx][version as usize];
    let blocks = NUM_ERROR_CORRECTION_BLOCKS[idx][version as usize];
    if ecc <= 0 || blocks <= 0 {
        return None;
    }
    Some(EcBlockInfo {
        num_blocks: blocks as usize,
        ecc_per_block: ecc as usize,
    })
}

fn level_index(level: ErrorCorrectionLevel) -> usize {
    match level {
        ErrorCorrectionLevel::Low => 0,
        ErrorCorrectionLevel::Medium => 1,
        ErrorCorrectionLevel::Quartile => 2,
        ErrorCorrectionLevel::High => 3,
    }
}

/// Side length in modules
pub(crate) fn dimension(version: u8) -> usize {
    17 + 4 * version as usize
}

/// Version whose side length is `dimension`, if any
pub(crate) fn version_for_dimension(dimension: usize) -> Option<u8> {
    if dimension < 21 || (dimension - 17) % 4 != 0 {
        return None;
    }
    let version = (dimension - 17) / 4;
    (version <= 40).then_some(version as u8)
}

/// Modules available for codewords and remainder bits
pub(crate) fn raw_data_modules(version: u8) -> usize {
    let v = version as usize;
    let mut result = (16 * v + 128) * v + 64;
    if v >= 2 {
        let num_align = v / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if v >= 7 {
            result -= 36;
        }
    }
    result
}

/// Data codewords (total minus check words)
pub(crate) fn data_codewords(version: u8, level: ErrorCorrectionLevel) -> Option<usize> {
    let info = ec_block_info(version, level)?;
    Some(raw_data_modules(version) / 8 - info.num_blocks * info.ecc_per_block)
}

/// Alignment pattern centre coordinates, shared by both axes
pub(crate) fn alignment_pattern_positions(version: u8) -> Vec<usize> {
    if version <= 1 {
        return Vec::new();
    }
    let v = version as usize;
    let num_align = v / 7 + 2;
    let step = (v * 8 + num_align * 3 + 5) / (num_align * 4 - 4) * 2;
    let mut positions: Vec<usize> = (0..num_align - 1)
        .map(|i| dimension(version) - 7 - i * step)
        .collect();
    positions.push(6);
    positions.reverse();
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_info() {
        let info = ec_block_info(1, ErrorCorrectionLevel::Medium).unwrap();
        assert_eq!(info, EcBlockInfo { num_blocks: 1, ecc_per_block: 10 });
        let info = ec_block_info(40, ErrorCorrectionLevel::High).unwrap();
        assert_eq!(info, EcBlockInfo { num_blocks: 81, ecc_per_block: 30 });
        assert!(ec_block_info(0, ErrorCorrectionLevel::Low).is_none());
        assert!(ec_block_info(41, ErrorCorrectionLevel::Low).is_none());
    }

    #[test]
    fn test_capacities() {
        assert_eq!(raw_data_modules(1), 208);
        assert_eq!(raw_data_modules(7), 1568);
        assert_eq!(data_codewords(1, ErrorCorrectionLevel::Low), Some(19));
        assert_eq!(data_codewords(1, ErrorCorrectionLevel::High), Some(9));
        assert_eq!(data_codewords(40, ErrorCorrectionLevel::Low), Some(2956));
    }

    #[test]
    fn test_alignment_positions() {
        assert!(alignment_pattern_positions(1).is_empty());
        assert_eq!(alignment_pattern_positions(2), vec![6, 18]);
        assert_eq!(alignment_pattern_positions(7), vec![6, 22, 38]);
        assert_eq!(alignment_pattern_positions(32), vec![6, 34, 60, 86, 112, 138]);
        assert_eq!(alignment_pattern_positions(36), vec![6, 24, 50, 76, 102, 128, 154]);
    }

    #[test]
    fn test_dimension_round_trip() {
        assert_eq!(dimension(1), 21);
        assert_eq!(version_for_dimension(177), Some(40));
        assert_eq!(version_for_dimension(22), None);
        assert_eq!(version_for_dimension(181), None);
    }
}
