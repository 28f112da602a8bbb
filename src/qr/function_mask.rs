use super::tables::{alignment_pattern_positions, dimension};
use crate::models::BitMatrix;

/// Function module mask for one QR version
///
/// `true` marks finder, separator, timing, alignment, format and version modules;
/// everything else carries codeword bits.
pub(crate) struct FunctionMask {
    mask: BitMatrix,
}

impl FunctionMask {
    pub(crate) fn new(version: u8) -> Self {
        let size = dimension(version);
        let mut mask = BitMatrix::square(size);

        // finders with their separators
        Self::mark_finder_area(&mut mask, 0, 0);
        Self::mark_finder_area(&mut mask, size - 7, 0);
        Self::mark_finder_area(&mut mask, 0, size - 7);

        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        for (cx, cy) in alignment_centers(version) {
            mask.set_region(cx - 2, cy - 2, 5, 5);
        }

        // format words and the dark module
        mask.set_region(0, 8, 9, 1);
        mask.set_region(8, 0, 1, 9);
        mask.set_region(size - 8, 8, 8, 1);
        mask.set_region(8, size - 8, 1, 8);

        if version >= 7 {
            mask.set_region(size - 11, 0, 3, 6);
            mask.set_region(0, size - 11, 6, 3);
        }

        Self { mask }
    }

    pub(crate) fn size(&self) -> usize {
        self.mask.width()
    }

    pub(crate) fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    pub(crate) fn data_modules_count(&self) -> usize {
        self.size() * self.size() - self.mask.count_ones()
    }

    fn mark_finder_area(mask: &mut BitMatrix, x: usize, y: usize) {
        let start_x = x.saturating_sub(1);
        let start_y = y.saturating_sub(1);
        mask.set_region(start_x, start_y, x + 8 - start_x, y + 8 - start_y);
    }
}

/// Alignment pattern centres, skipping the three that would overlap finders
pub(crate) fn alignment_centers(version: u8) -> Vec<(usize, usize)> {
    let positions = alignment_pattern_positions(version);
    let last = positions.len().saturating_sub(1);
    let mut centers = Vec::new();
    for (i, &cx) in positions.iter().enumerate() {
        for (j, &cy) in positions.iter().enumerate() {
            let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
            if !corner {
                centers.push((cx, cy));
            }
        }
    }
    centers
}
