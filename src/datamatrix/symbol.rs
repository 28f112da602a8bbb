//! ECC200 symbol sizes and their codeword budgets.

/// One ECC200 symbol size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SymbolSize {
    pub rows: usize,
    pub cols: usize,
    /// Data modules per region, excluding its finder and timing edges
    pub region_rows: usize,
    pub region_cols: usize,
    pub regions_vertical: usize,
    pub regions_horizontal: usize,
    pub data_codewords: usize,
    pub ecc_codewords: usize,
    pub blocks: usize,
}

#[allow(clippy::too_many_arguments)]
const fn size(
    rows: usize,
    cols: usize,
    region_rows: usize,
    region_cols: usize,
    regions_vertical: usize,
    regions_horizontal: usize,
    data_codewords: usize,
    ecc_codewords: usize,
    blocks: usize,
) -> SymbolSize {
    SymbolSize {
        rows,
        cols,
        region_rows,
        region_cols,
        regions_vertical,
        regions_horizontal,
        data_codewords,
        ecc_codewords,
        blocks,
    }
}

/// Square sizes followed by rectangular ones, each ascending
pub(crate) const SYMBOL_SIZES: [SymbolSize; 30] = [
    size(10, 10, 8, 8, 1, 1, 3, 5, 1),
    size(12, 12, 10, 10, 1, 1, 5, 7, 1),
    size(14, 14, 12, 12, 1, 1, 8, 10, 1),
    size(16, 16, 14, 14, 1, 1, 12, 12, 1),
    size(18, 18, 16, 16, 1, 1, 18, 14, 1),
    size(20, 20, 18, 18, 1, 1, 22, 18, 1),
    size(22, 22, 20, 20, 1, 1, 30, 20, 1),
    size(24, 24, 22, 22, 1, 1, 36, 24, 1),
    size(26, 26, 24, 24, 1, 1, 44, 28, 1),
    size(32, 32, 14, 14, 2, 2, 62, 36, 1),
    size(36, 36, 16, 16, 2, 2, 86, 42, 1),
    size(40, 40, 18, 18, 2, 2, 114, 48, 1),
    size(44, 44, 20, 20, 2, 2, 144, 56, 1),
    size(48, 48, 22, 22, 2, 2, 174, 68, 1),
    size(52, 52, 24, 24, 2, 2, 204, 84, 2),
    size(64, 64, 14, 14, 4, 4, 280, 112, 2),
    size(72, 72, 16, 16, 4, 4, 368, 144, 4),
    size(80, 80, 18, 18, 4, 4, 456, 192, 4),
    size(88, 88, 20, 20, 4, 4, 576, 224, 4),
    size(96, 96, 22, 22, 4, 4, 696, 272, 4),
    size(104, 104, 24, 24, 4, 4, 816, 336, 6),
    size(120, 120, 18, 18, 6, 6, 1050, 408, 6),
    size(132, 132, 20, 20, 6, 6, 1304, 496, 8),
    size(144, 144, 22, 22, 6, 6, 1558, 620, 10),
    size(8, 18, 6, 16, 1, 1, 5, 7, 1),
    size(8, 32, 6, 14, 1, 2, 10, 11, 1),
    size(12, 26, 10, 24, 1, 1, 16, 14, 1),
    size(12, 36, 10, 16, 1, 2, 22, 18, 1),
    size(16, 36, 14, 16, 1, 2, 32, 24, 1),
    size(16, 48, 14, 22, 1, 2, 49, 28, 1),
];

impl SymbolSize {
    /// Size with exactly these module dimensions
    pub(crate) fn lookup(rows: usize, cols: usize) -> Option<&'static SymbolSize> {
        SYMBOL_SIZES.iter().find(|s| s.rows == rows && s.cols == cols)
    }

    /// Smallest square size holding `data_codewords`
    pub(crate) fn smallest_square(data_codewords: usize) -> Option<&'static SymbolSize> {
        SYMBOL_SIZES
            .iter()
            .filter(|s| s.is_square())
            .find(|s| s.data_codewords >= data_codewords)
    }

    pub(crate) fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Rows of the mapping matrix the codewords are placed in
    pub(crate) fn mapping_rows(&self) -> usize {
        self.region_rows * self.regions_vertical
    }

    pub(crate) fn mapping_cols(&self) -> usize {
        self.region_cols * self.regions_horizontal
    }

    pub(crate) fn ecc_per_block(&self) -> usize {
        self.ecc_codewords / self.blocks
    }

    pub(crate) fn total_codewords(&self) -> usize {
        self.data_codewords + self.ecc_codewords
    }
}
