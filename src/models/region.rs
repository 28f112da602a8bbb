use super::Point;

/// Candidate symbol location produced by a detector
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Approximate corners in image pixels
    pub corners: [Point; 4],
    /// Estimated module size in pixels
    pub module_size: f32,
    pub(crate) locator: Locator,
}

/// Symbology-specific anchor the matching decoder starts from
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Locator {
    /// Start guard of a linear symbol on one scan row
    Row {
        /// Row index in the (possibly rotated) bitmap
        y: usize,
        /// Row was taken from the bitmap rotated a quarter turn clockwise
        rotated: bool,
        /// Runs were read right to left
        reversed: bool,
        /// Index of the first start-guard run
        start: usize,
    },
    /// Three QR finder pattern centres
    Finders {
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        dimension: usize,
    },
    /// Axis-aligned Data Matrix border
    Border {
        /// Top-left pixel of the symbol
        origin: Point,
        module_width: f32,
        module_height: f32,
        cols: usize,
        rows: usize,
        /// Clockwise quarter turns that bring the finder L to the bottom left
        quarter_turns: usize,
    },
    /// Centre of an Aztec bullseye
    Bullseye { center: Point },
}

impl Region {
    pub(crate) fn new(corners: [Point; 4], module_size: f32, locator: Locator) -> Self {
        Self {
            corners,
            module_size,
            locator,
        }
    }
}
