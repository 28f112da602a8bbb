//! Luminance to black/white conversion.
//!
//! `true` in the resulting [`BitMatrix`] means a dark pixel.

use crate::config;
use crate::error::{Result, ZebraError};
use crate::models::{BitMatrix, LuminanceGrid};

/// Side length of a thresholding block
pub const BLOCK_SIZE: usize = 8;

/// Block-local adaptive thresholding
///
/// Each 8x8 block gets the midpoint of its min/max luminance as threshold, or the
/// global average when its spread is below the contrast floor. Thresholds are then
/// averaged over the 3x3 neighbourhood of blocks to soften block seams.
pub fn binarize(grid: &LuminanceGrid) -> Result<BitMatrix> {
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return Err(ZebraError::Binarization);
    }
    let data = grid.data();
    let min_contrast = config::min_block_contrast() as u32;

    let blocks_x = width.div_ceil(BLOCK_SIZE);
    let blocks_y = height.div_ceil(BLOCK_SIZE);
    let global_avg = (data.iter().map(|&v| v as u64).sum::<u64>() / data.len() as u64) as u32;

    let mut thresholds = vec![0u32; blocks_x * blocks_y];
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let (mut min, mut max) = (255u32, 0u32);
            for y in by * BLOCK_SIZE..((by + 1) * BLOCK_SIZE).min(height) {
                let row = &data[y * width..(y + 1) * width];
                for &v in &row[bx * BLOCK_SIZE..((bx + 1) * BLOCK_SIZE).min(width)] {
                    min = min.min(v as u32);
                    max = max.max(v as u32);
                }
            }
            thresholds[by * blocks_x + bx] = if max - min >= min_contrast {
                (min + max) / 2
            } else {
                global_avg
            };
        }
    }

    let mut binary = BitMatrix::new(width, height);
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let mut sum = 0u32;
            let mut count = 0u32;
            for ny in by.saturating_sub(1)..=(by + 1).min(blocks_y - 1) {
                for nx in bx.saturating_sub(1)..=(bx + 1).min(blocks_x - 1) {
                    sum += thresholds[ny * blocks_x + nx];
                    count += 1;
                }
            }
            let threshold = sum / count;
            for y in by * BLOCK_SIZE..((by + 1) * BLOCK_SIZE).min(height) {
                for x in bx * BLOCK_SIZE..((bx + 1) * BLOCK_SIZE).min(width) {
                    if (data[y * width + x] as u32) < threshold {
                        binary.set(x, y, true);
                    }
                }
            }
        }
    }

    Ok(binary)
}

/// Global thresholding at Otsu's optimal level
///
/// A uniform grid comes back all light.
pub fn otsu_binarize(grid: &LuminanceGrid) -> Result<BitMatrix> {
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return Err(ZebraError::Binarization);
    }
    let threshold = calculate_otsu_threshold(grid.data());
    Ok(threshold_binarize(grid, threshold))
}

/// Fixed global threshold
pub fn threshold_binarize(grid: &LuminanceGrid, threshold: u8) -> BitMatrix {
    let (width, height) = (grid.width(), grid.height());
    let mut binary = BitMatrix::new(width, height);
    for (idx, &v) in grid.data().iter().enumerate() {
        if v < threshold {
            binary.set(idx % width, idx / width, true);
        }
    }
    binary
}

/// Calculate Otsu's optimal threshold; 0 when the histogram has one level
fn calculate_otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best_variance = 0.0;
    let mut best_threshold = 0u8;
    let mut below_count = 0.0;
    let mut below_sum = 0.0;

    for threshold in 1..=255usize {
        below_count += histogram[threshold - 1] as f64;
        below_sum += (threshold - 1) as f64 * histogram[threshold - 1] as f64;
        let above_count = total - below_count;
        if below_count == 0.0 || above_count == 0.0 {
            continue;
        }
        let mean_below = below_sum / below_count;
        let mean_above = (total_sum - below_sum) / above_count;
        let variance = below_count * above_count * (mean_below - mean_above).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_threshold = threshold as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> LuminanceGrid {
        let data = (0..width * height).map(|i| f(i % width, i / width)).collect();
        LuminanceGrid::new(width, height, data).unwrap()
    }

    #[test]
    fn test_zero_area_fails() {
        let empty = LuminanceGrid::new(0, 0, vec![]).unwrap();
        assert_eq!(binarize(&empty), Err(ZebraError::Binarization));
        assert_eq!(otsu_binarize(&empty), Err(ZebraError::Binarization));
    }

    #[test]
    fn test_uniform_grid_is_all_light() {
        let white = grid(40, 30, |_, _| 255);
        assert_eq!(binarize(&white).unwrap().count_ones(), 0);
        let gray = grid(40, 30, |_, _| 128);
        assert_eq!(binarize(&gray).unwrap().count_ones(), 0);
        assert_eq!(otsu_binarize(&gray).unwrap().count_ones(), 0);
    }

    #[test]
    fn test_uneven_illumination() {
        // Stripes of width 4 on a background that brightens left to right
        let g = grid(64, 16, |x, _| {
            let base = 60 + (x as u32 * 3) as u8;
            if (x / 4) % 2 == 0 { base / 3 } else { base }
        });
        let binary = binarize(&g).unwrap();
        for x in 0..64 {
            assert_eq!(binary.get(x, 8), (x / 4) % 2 == 0, "column {x}");
        }
    }

    #[test]
    fn test_deterministic() {
        let g = grid(33, 17, |x, y| ((x * 7 + y * 13) % 256) as u8);
        assert_eq!(binarize(&g).unwrap(), binarize(&g).unwrap());
    }

    #[test]
    fn test_otsu_separates_two_levels() {
        let g = grid(10, 10, |x, _| if x < 5 { 20 } else { 220 });
        let binary = otsu_binarize(&g).unwrap();
        assert!(binary.get(0, 0));
        assert!(!binary.get(9, 9));
    }
}
