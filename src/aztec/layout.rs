//! Aztec symbol geometry: sizes, data layer walk, bullseye, orientation marks,
//! reference grid and the mode message ring.

use crate::ecc::galois::{self, GaloisField};
use crate::models::BitMatrix;

pub(crate) const MAX_LAYERS: usize = 32;
pub(crate) const MAX_COMPACT_LAYERS: usize = 4;

/// Layer count and symbol family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub compact: bool,
    pub layers: usize,
}

impl Geometry {
    pub(crate) fn new(compact: bool, layers: usize) -> Option<Self> {
        let max = if compact { MAX_COMPACT_LAYERS } else { MAX_LAYERS };
        (1..=max).contains(&layers).then_some(Self { compact, layers })
    }

    /// Side length without reference grid lines
    pub(crate) fn base_size(&self) -> usize {
        (if self.compact { 11 } else { 14 }) + self.layers * 4
    }

    pub(crate) fn matrix_size(&self) -> usize {
        let base = self.base_size();
        if self.compact {
            base
        } else {
            base + 1 + 2 * ((base / 2 - 1) / 15)
        }
    }

    /// Bits the data layers hold
    pub(crate) fn total_bits(&self) -> usize {
        ((if self.compact { 88 } else { 112 }) + 16 * self.layers) * self.layers
    }

    pub(crate) fn word_size(&self) -> usize {
        match self.layers {
            1..=2 => 6,
            3..=8 => 8,
            9..=22 => 10,
            _ => 12,
        }
    }

    pub(crate) fn field(&self) -> &'static GaloisField {
        match self.word_size() {
            6 => galois::aztec_data_6(),
            8 => galois::data_matrix(),
            10 => galois::aztec_data_10(),
            _ => galois::aztec_data_12(),
        }
    }

    /// Codewords the data layers hold
    pub(crate) fn total_words(&self) -> usize {
        self.total_bits() / self.word_size()
    }

    /// Ring distance of the orientation marks and mode message from the centre
    pub(crate) fn radius(&self) -> usize {
        core_radius(self.compact)
    }

    /// Matrix coordinate of each base coordinate, skipping reference grid lines
    fn alignment_map(&self) -> Vec<usize> {
        let base = self.base_size();
        if self.compact {
            return (0..base).collect();
        }
        let size = self.matrix_size();
        let (orig_center, center) = (base / 2, size / 2);
        let mut map = vec![0; base];
        for i in 0..orig_center {
            let offset = i + i / 15;
            map[orig_center - i - 1] = center - offset - 1;
            map[orig_center + i] = center + offset + 1;
        }
        map
    }

    /// Module of every data bit, in stream order
    pub(crate) fn data_positions(&self) -> Vec<(usize, usize)> {
        let map = self.alignment_map();
        let base = self.base_size();
        let mut positions = vec![(0, 0); self.total_bits()];
        let mut row_offset = 0;
        for i in 0..self.layers {
            let row_size = (self.layers - i) * 4 + if self.compact { 9 } else { 12 };
            let low = i * 2;
            let high = base - 1 - low;
            for j in 0..row_size {
                let column = j * 2;
                for k in 0..2 {
                    positions[row_offset + column + k] = (map[low + k], map[low + j]);
                    positions[row_offset + 2 * row_size + column + k] = (map[low + j], map[high - k]);
                    positions[row_offset + 4 * row_size + column + k] = (map[high - k], map[high - j]);
                    positions[row_offset + 6 * row_size + column + k] = (map[high - j], map[low + k]);
                }
            }
            row_offset += row_size * 8;
        }
        positions
    }
}

pub(crate) fn core_radius(compact: bool) -> usize {
    if compact { 5 } else { 7 }
}

/// Modules of the mode message around `center`, in bit order
pub(crate) fn mode_message_positions(center: usize, compact: bool) -> Vec<(usize, usize)> {
    if compact {
        let mut positions = vec![(0, 0); 28];
        for i in 0..7 {
            let offset = center - 3 + i;
            positions[i] = (offset, center - 5);
            positions[i + 7] = (center + 5, offset);
            positions[20 - i] = (offset, center + 5);
            positions[27 - i] = (center - 5, offset);
        }
        positions
    } else {
        let mut positions = vec![(0, 0); 40];
        for i in 0..10 {
            let offset = center - 5 + i + i / 5;
            positions[i] = (offset, center - 7);
            positions[i + 10] = (center + 7, offset);
            positions[29 - i] = (offset, center + 7);
            positions[39 - i] = (center - 7, offset);
        }
        positions
    }
}

/// Orientation mark modules and their colours in an upright symbol
pub(crate) fn orientation_marks(center: usize, radius: usize) -> [((usize, usize), bool); 12] {
    let (lo, hi) = (center - radius, center + radius);
    [
        ((lo, lo), true),
        ((lo + 1, lo), true),
        ((lo, lo + 1), true),
        ((hi, lo), true),
        ((hi, lo + 1), true),
        ((hi, hi - 1), true),
        ((hi - 1, lo), false),
        ((hi, hi), false),
        ((hi - 1, hi), false),
        ((lo, hi), false),
        ((lo + 1, hi), false),
        ((lo, hi - 1), false),
    ]
}

/// Concentric squares at even ring distances below `radius`, then the marks
pub(crate) fn draw_bullseye(matrix: &mut BitMatrix, center: usize, radius: usize) {
    for ring in (0..radius).step_by(2) {
        for j in center - ring..=center + ring {
            matrix.set(j, center - ring, true);
            matrix.set(j, center + ring, true);
            matrix.set(center - ring, j, true);
            matrix.set(center + ring, j, true);
        }
    }
    for ((x, y), dark) in orientation_marks(center, radius) {
        if dark {
            matrix.set(x, y, true);
        }
    }
}

/// Dashed lines every 16 modules from the centre of full-range symbols
pub(crate) fn draw_reference_grid(matrix: &mut BitMatrix, geometry: &Geometry) {
    if geometry.compact {
        return;
    }
    let size = geometry.matrix_size();
    let center = size / 2;
    let half_base = geometry.base_size() / 2;
    let (mut i, mut j) = (0, 0);
    while i + 1 < half_base {
        let mut k = center & 1;
        while k < size {
            matrix.set(center - j, k, true);
            matrix.set(center + j, k, true);
            matrix.set(k, center - j, true);
            matrix.set(k, center + j, true);
            k += 2;
        }
        i += 15;
        j += 16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sizes() {
        let compact = Geometry::new(true, 1).unwrap();
        assert_eq!((compact.matrix_size(), compact.total_bits(), compact.word_size()), (15, 104, 6));
        let full = Geometry::new(false, 4).unwrap();
        assert_eq!((full.base_size(), full.matrix_size()), (30, 31));
        assert_eq!(Geometry::new(false, 32).unwrap().matrix_size(), 151);
        assert_eq!(Geometry::new(false, 32).unwrap().total_words(), 1664);
        assert!(Geometry::new(true, 5).is_none());
        assert!(Geometry::new(false, 0).is_none());
    }

    #[test]
    fn test_data_positions_are_distinct_and_outside_core() {
        for geometry in [
            Geometry::new(true, 1).unwrap(),
            Geometry::new(true, 4).unwrap(),
            Geometry::new(false, 5).unwrap(),
            Geometry::new(false, 12).unwrap(),
        ] {
            let positions = geometry.data_positions();
            let unique: HashSet<_> = positions.iter().copied().collect();
            assert_eq!(unique.len(), positions.len(), "{geometry:?}");
            let center = geometry.matrix_size() / 2;
            let core = geometry.radius();
            for &(x, y) in &positions {
                assert!(x.abs_diff(center) > core || y.abs_diff(center) > core);
                if !geometry.compact {
                    // never on a reference grid line
                    assert_ne!(x.abs_diff(center) % 16, 0, "{geometry:?} ({x}, {y})");
                    assert_ne!(y.abs_diff(center) % 16, 0, "{geometry:?} ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_mode_message_ring() {
        for compact in [true, false] {
            let radius = core_radius(compact);
            let center = 20;
            let positions = mode_message_positions(center, compact);
            let marks: HashSet<_> = orientation_marks(center, radius).iter().map(|m| m.0).collect();
            for &(x, y) in &positions {
                assert_eq!(x.abs_diff(center).max(y.abs_diff(center)), radius);
                assert!(!marks.contains(&(x, y)));
            }
            let unique: HashSet<_> = positions.iter().collect();
            assert_eq!(unique.len(), positions.len());
        }
    }

    #[test]
    fn test_bullseye_rings() {
        let mut matrix = BitMatrix::square(15);
        draw_bullseye(&mut matrix, 7, 5);
        for d in 0..5usize {
            assert_eq!(matrix.get(7 + d, 7), d % 2 == 0, "ring {d}");
            assert_eq!(matrix.get(7, 7 - d), d % 2 == 0, "ring {d}");
        }
        assert!(matrix.get(2, 2) && matrix.get(3, 2) && matrix.get(2, 3));
        assert!(!matrix.get(12, 12));
    }
}
