use std::fmt;

/// Compact bit matrix for storing binary data
///
/// Used both for thresholded images (`true` = dark pixel) and for symbol module
/// grids (`true` = dark module).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

/// Thresholded image, one bit per pixel
pub type BinaryBitmap = BitMatrix;

/// Symbol module grid produced by encoders and consumed by the rasterizer
pub type ModuleMatrix = BitMatrix;

impl BitMatrix {
    /// Create a new bit matrix with given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_needed = (width * height).div_ceil(8);
        Self {
            width,
            height,
            data: vec![0; bytes_needed],
        }
    }

    /// Create a square matrix
    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Build a single-row matrix from a bar sequence (`true` = bar module)
    pub fn from_row(modules: &[bool]) -> Self {
        let mut matrix = Self::new(modules.len(), 1);
        for (x, &dark) in modules.iter().enumerate() {
            matrix.set(x, 0, dark);
        }
        matrix
    }

    /// Get matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get bit at (x, y)
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y * self.width + x;
        (self.data[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Get bit at signed coordinates, treating everything outside as light
    pub fn get_i(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.get(x as usize, y as usize)
    }

    /// Set bit at (x, y)
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        if value {
            self.data[index / 8] |= 1 << (index % 8);
        } else {
            self.data[index / 8] &= !(1 << (index % 8));
        }
    }

    /// Toggle bit at (x, y)
    pub fn toggle(&mut self, x: usize, y: usize) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        self.data[index / 8] ^= 1 << (index % 8);
    }

    /// Set every bit in the rectangle starting at (left, top)
    pub fn set_region(&mut self, left: usize, top: usize, width: usize, height: usize) {
        for y in top..(top + height).min(self.height) {
            for x in left..(left + width).min(self.width) {
                self.set(x, y, true);
            }
        }
    }

    /// Clear all bits to 0
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Bits of one row, left to right
    pub fn row(&self, y: usize) -> Vec<bool> {
        (0..self.width).map(|x| self.get(x, y)).collect()
    }

    /// Bits of one column, top to bottom
    pub fn column(&self, x: usize) -> Vec<bool> {
        (0..self.height).map(|y| self.get(x, y)).collect()
    }

    /// Rotate a quarter turn clockwise
    ///
    /// A bit at (x, y) moves to (height - 1 - y, x).
    pub fn rotate_90(&self) -> Self {
        let mut out = Self::new(self.height, self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    out.set(self.height - 1 - y, x, true);
                }
            }
        }
        out
    }

    /// Rotate clockwise by `quarters` quarter turns
    pub fn rotate_quarters(&self, quarters: usize) -> Self {
        let mut out = self.clone();
        for _ in 0..quarters % 4 {
            out = out.rotate_90();
        }
        out
    }

    /// Mirror across the main diagonal
    pub fn transpose(&self) -> Self {
        let mut out = Self::new(self.height, self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    out.set(y, x, true);
                }
            }
        }
        out
    }

    /// Tight bounding box of all set bits as (left, top, right, bottom), inclusive
    pub fn dark_extent(&self) -> Option<(usize, usize, usize, usize)> {
        let mut left = usize::MAX;
        let mut top = usize::MAX;
        let mut right = 0usize;
        let mut bottom = 0usize;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    left = left.min(x);
                    top = top.min(y);
                    right = right.max(x);
                    bottom = bottom.max(y);
                }
            }
        }
        (left != usize::MAX).then_some((left, top, right, bottom))
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get(x, y) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_matrix() {
        let mut matrix = BitMatrix::new(8, 8);
        assert_eq!(matrix.width(), 8);
        assert_eq!(matrix.height(), 8);

        matrix.set(3, 4, true);
        assert!(matrix.get(3, 4));
        assert!(!matrix.get(3, 3));

        matrix.toggle(3, 4);
        assert!(!matrix.get(3, 4));

        matrix.set(1, 1, true);
        matrix.clear();
        assert_eq!(matrix.count_ones(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::new(8, 8);
        matrix.set(10, 10, true);
        assert!(!matrix.get(10, 10));
        assert!(!matrix.get_i(-1, 3));
    }

    #[test]
    fn test_rotate_and_transpose() {
        let mut matrix = BitMatrix::new(3, 2);
        matrix.set(0, 0, true);
        matrix.set(2, 1, true);

        let rotated = matrix.rotate_90();
        assert_eq!((rotated.width(), rotated.height()), (2, 3));
        assert!(rotated.get(1, 0));
        assert!(rotated.get(0, 2));
        assert_eq!(matrix.rotate_quarters(4), matrix);

        let transposed = matrix.transpose();
        assert!(transposed.get(0, 0));
        assert!(transposed.get(1, 2));
    }

    #[test]
    fn test_dark_extent() {
        let mut matrix = BitMatrix::new(10, 10);
        assert_eq!(matrix.dark_extent(), None);
        matrix.set_region(2, 3, 4, 2);
        assert_eq!(matrix.dark_extent(), Some((2, 3, 5, 4)));
    }
}
