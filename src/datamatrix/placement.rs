//! Codeword placement in the mapping matrix and the region borders around it.

use super::symbol::SymbolSize;
use crate::models::BitMatrix;

/// Module (row, col) of each codeword bit, most significant first
pub(crate) struct Layout {
    pub codewords: Vec<[(usize, usize); 8]>,
    /// Bottom-right corner was left unused and takes the fixed fill pattern
    pub fill_corner: bool,
}

struct Walker {
    rows: i32,
    cols: i32,
    visited: Vec<bool>,
    codewords: Vec<[(usize, usize); 8]>,
}

impl Walker {
    fn index(&self, row: i32, col: i32) -> usize {
        (row * self.cols + col) as usize
    }

    /// Wrap positions that fall off the top or left edge
    fn module(&mut self, mut row: i32, mut col: i32) -> (usize, usize) {
        if row < 0 {
            row += self.rows;
            col += 4 - ((self.rows + 4) % 8);
        }
        if col < 0 {
            col += self.cols;
            row += 4 - ((self.cols + 4) % 8);
        }
        let i = self.index(row, col);
        self.visited[i] = true;
        (row as usize, col as usize)
    }

    fn push(&mut self, cells: [(i32, i32); 8]) {
        let placed = cells.map(|(r, c)| self.module(r, c));
        self.codewords.push(placed);
    }

    fn utah(&mut self, r: i32, c: i32) {
        self.push([
            (r - 2, c - 2),
            (r - 2, c - 1),
            (r - 1, c - 2),
            (r - 1, c - 1),
            (r - 1, c),
            (r, c - 2),
            (r, c - 1),
            (r, c),
        ]);
    }

    fn is_free(&self, row: i32, col: i32) -> bool {
        !self.visited[self.index(row, col)]
    }
}

/// Diagonal codeword walk over a `rows` x `cols` mapping matrix
pub(crate) fn layout(rows: usize, cols: usize) -> Layout {
    let (nr, nc) = (rows as i32, cols as i32);
    let mut w = Walker {
        rows: nr,
        cols: nc,
        visited: vec![false; rows * cols],
        codewords: Vec::new(),
    };

    let (mut row, mut col) = (4i32, 0i32);
    loop {
        if row == nr && col == 0 {
            w.push([
                (nr - 1, 0),
                (nr - 1, 1),
                (nr - 1, 2),
                (0, nc - 2),
                (0, nc - 1),
                (1, nc - 1),
                (2, nc - 1),
                (3, nc - 1),
            ]);
        }
        if row == nr - 2 && col == 0 && nc % 4 != 0 {
            w.push([
                (nr - 3, 0),
                (nr - 2, 0),
                (nr - 1, 0),
                (0, nc - 4),
                (0, nc - 3),
                (0, nc - 2),
                (0, nc - 1),
                (1, nc - 1),
            ]);
        }
        if row == nr - 2 && col == 0 && nc % 8 == 4 {
            w.push([
                (nr - 3, 0),
                (nr - 2, 0),
                (nr - 1, 0),
                (0, nc - 2),
                (0, nc - 1),
                (1, nc - 1),
                (2, nc - 1),
                (3, nc - 1),
            ]);
        }
        if row == nr + 4 && col == 2 && nc % 8 == 0 {
            w.push([
                (nr - 1, 0),
                (nr - 1, nc - 1),
                (0, nc - 3),
                (0, nc - 2),
                (0, nc - 1),
                (1, nc - 3),
                (1, nc - 2),
                (1, nc - 1),
            ]);
        }

        // up and to the right
        loop {
            if row < nr && col >= 0 && w.is_free(row, col) {
                w.utah(row, col);
            }
            row -= 2;
            col += 2;
            if !(row >= 0 && col < nc) {
                break;
            }
        }
        row += 1;
        col += 3;

        // down and to the left
        loop {
            if row >= 0 && col < nc && w.is_free(row, col) {
                w.utah(row, col);
            }
            row += 2;
            col -= 2;
            if !(row < nr && col >= 0) {
                break;
            }
        }
        row += 3;
        col += 1;

        if !(row < nr || col < nc) {
            break;
        }
    }

    let fill_corner = w.is_free(nr - 1, nc - 1);
    Layout {
        codewords: w.codewords,
        fill_corner,
    }
}

/// Write codewords into a fresh mapping matrix for `size`
pub(crate) fn place_codewords(codewords: &[u8], size: &SymbolSize) -> BitMatrix {
    let (rows, cols) = (size.mapping_rows(), size.mapping_cols());
    let layout = layout(rows, cols);
    let mut mapping = BitMatrix::new(cols, rows);
    for (cells, &byte) in layout.codewords.iter().zip(codewords) {
        for (bit, &(r, c)) in cells.iter().enumerate() {
            mapping.set(c, r, (byte >> (7 - bit)) & 1 == 1);
        }
    }
    if layout.fill_corner {
        mapping.set(cols - 1, rows - 1, true);
        mapping.set(cols - 2, rows - 2, true);
    }
    mapping
}

/// Read every codeword back out of a mapping matrix
pub(crate) fn read_codewords(mapping: &BitMatrix) -> Vec<u8> {
    layout(mapping.height(), mapping.width())
        .codewords
        .iter()
        .map(|cells| {
            cells
                .iter()
                .fold(0u8, |acc, &(r, c)| (acc << 1) | mapping.get(c, r) as u8)
        })
        .collect()
}

/// Symbol position of mapping module (mx, my)
fn symbol_position(size: &SymbolSize, mx: usize, my: usize) -> (usize, usize) {
    let x = mx / size.region_cols * (size.region_cols + 2) + 1 + mx % size.region_cols;
    let y = my / size.region_rows * (size.region_rows + 2) + 1 + my % size.region_rows;
    (x, y)
}

/// Whether symbol module (x, y) is dark in every valid symbol of `size` (border modules only)
pub(crate) fn border_module(size: &SymbolSize, x: usize, y: usize) -> Option<bool> {
    let (lx, ly) = (x % (size.region_cols + 2), y % (size.region_rows + 2));
    if lx == 0 || ly == size.region_rows + 1 {
        Some(true)
    } else if ly == 0 {
        Some(lx % 2 == 0)
    } else if lx == size.region_cols + 1 {
        Some(ly % 2 == 1)
    } else {
        None
    }
}

/// Surround the mapping matrix with per-region finder and timing edges
pub(crate) fn assemble(mapping: &BitMatrix, size: &SymbolSize) -> BitMatrix {
    let mut symbol = BitMatrix::new(size.cols, size.rows);
    for y in 0..size.rows {
        for x in 0..size.cols {
            if let Some(dark) = border_module(size, x, y) {
                symbol.set(x, y, dark);
            }
        }
    }
    for my in 0..mapping.height() {
        for mx in 0..mapping.width() {
            let (x, y) = symbol_position(size, mx, my);
            symbol.set(x, y, mapping.get(mx, my));
        }
    }
    symbol
}

/// Strip region edges, leaving the mapping matrix
pub(crate) fn extract(symbol: &BitMatrix, size: &SymbolSize) -> BitMatrix {
    let mut mapping = BitMatrix::new(size.mapping_cols(), size.mapping_rows());
    for my in 0..mapping.height() {
        for mx in 0..mapping.width() {
            let (x, y) = symbol_position(size, mx, my);
            mapping.set(mx, my, symbol.get(x, y));
        }
    }
    mapping
}

/// Fraction of region-edge modules that disagree with the expected pattern
pub(crate) fn border_error_rate(symbol: &BitMatrix, size: &SymbolSize) -> f32 {
    let (mut total, mut wrong) = (0usize, 0usize);
    for y in 0..size.rows {
        for x in 0..size.cols {
            if let Some(dark) = border_module(size, x, y) {
                total += 1;
                wrong += usize::from(symbol.get(x, y) != dark);
            }
        }
    }
    wrong as f32 / total.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_covers_mapping_once() {
        for (rows, cols, codewords, corner) in
            [(8, 8, 8, false), (10, 10, 12, true), (6, 16, 12, false), (132, 132, 2178, false)]
        {
            let layout = layout(rows, cols);
            assert_eq!(layout.codewords.len(), codewords);
            assert_eq!(layout.fill_corner, corner);
            let mut seen = std::collections::HashSet::new();
            for cell in layout.codewords.iter().flatten() {
                assert!(seen.insert(*cell), "module {cell:?} placed twice");
            }
        }
    }

    #[test]
    fn test_first_codewords_of_smallest_symbol() {
        let layout = layout(8, 8);
        assert_eq!(
            layout.codewords[0],
            [(2, 6), (2, 7), (3, 6), (3, 7), (3, 0), (4, 6), (4, 7), (4, 0)]
        );
        assert_eq!(
            layout.codewords[1],
            [(0, 0), (0, 1), (1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn test_codewords_survive_assembly() {
        let size = SymbolSize::lookup(32, 32).unwrap();
        let codewords: Vec<u8> = (0..size.total_codewords()).map(|i| (i * 37 % 256) as u8).collect();
        let symbol = assemble(&place_codewords(&codewords, size), size);
        assert_eq!(border_error_rate(&symbol, size), 0.0);
        assert_eq!(read_codewords(&extract(&symbol, size)), codewords);
    }

    #[test]
    fn test_border_pattern() {
        let size = SymbolSize::lookup(10, 10).unwrap();
        let symbol = assemble(&BitMatrix::new(8, 8), size);
        // solid left column and bottom row
        assert!((0..10).all(|y| symbol.get(0, y)));
        assert!((0..10).all(|x| symbol.get(x, 9)));
        // alternating top row and right column, light top-right corner
        assert_eq!(symbol.row(0), (0..10).map(|x| x % 2 == 0).collect::<Vec<_>>());
        assert_eq!(symbol.column(9), (0..10).map(|y| y % 2 == 1).collect::<Vec<_>>());
    }
}
