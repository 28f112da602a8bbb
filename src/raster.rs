//! Module matrix to pixels.
//!
//! A one-row matrix is a linear symbol and is stretched to the full output height.
//! Anything taller is scaled by the largest whole number of pixels per module that
//! fits. The symbol is centred; whatever is left around it is background.

use crate::error::Result;
use crate::models::{BitMatrix, Color, PixelBuffer, PixelFormat};

/// Render `modules` with a quiet zone of `margin` modules on every side
///
/// The output is at least `width` x `height` and never smaller than the symbol
/// plus its quiet zone at one pixel per module.
pub fn rasterize(
    modules: &BitMatrix,
    width: usize,
    height: usize,
    margin: usize,
    foreground: Color,
    background: Color,
) -> Result<PixelBuffer> {
    let linear = modules.height() == 1;
    let (cols, rows) = (modules.width() + 2 * margin, modules.height() + 2 * margin);
    let out_w = width.max(cols);
    let out_h = if linear { height.max(1) } else { height.max(rows) };

    let scale_x = out_w / cols;
    let scale_y = if linear { 1 } else { out_h / rows };
    let scale = if linear { scale_x } else { scale_x.min(scale_y) };
    let symbol_w = modules.width() * scale;
    let symbol_h = if linear { out_h } else { modules.height() * scale };
    let left = (out_w - symbol_w) / 2;
    let top = (out_h - symbol_h) / 2;

    let fg = foreground.rgba();
    let bg = background.rgba();
    let mut data = Vec::with_capacity(out_w * out_h * 4);
    for y in 0..out_h {
        for x in 0..out_w {
            let inside = x >= left && x < left + symbol_w && y >= top && y < top + symbol_h;
            let dark = inside && {
                let mx = (x - left) / scale;
                let my = if linear { 0 } else { (y - top) / scale };
                modules.get(mx, my)
            };
            data.extend_from_slice(if dark { &fg } else { &bg });
        }
    }
    PixelBuffer::new(out_w, out_h, PixelFormat::Rgba, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(buffer: &PixelBuffer, x: usize, y: usize) -> [u8; 4] {
        let i = (y * buffer.width() + x) * 4;
        let d = buffer.data();
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    }

    #[test]
    fn test_matrix_scaled_and_centred() {
        let mut modules = BitMatrix::square(3);
        modules.set(0, 0, true);
        modules.set(2, 2, true);
        // 5 modules with margin; 23 px wide fits a scale of 4 with 3 px to spare
        let out = rasterize(&modules, 23, 23, 1, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!((out.width(), out.height()), (23, 23));
        let left = (23 - 12) / 2;
        assert_eq!(pixel(&out, left, left), [0, 0, 0, 255]);
        assert_eq!(pixel(&out, left - 1, left), [255, 255, 255, 255]);
        assert_eq!(pixel(&out, left + 4, left), [255, 255, 255, 255]);
        assert_eq!(pixel(&out, left + 11, left + 11), [0, 0, 0, 255]);
    }

    #[test]
    fn test_linear_stretches_to_height() {
        let modules = BitMatrix::from_row(&[true, false, true, true]);
        let out = rasterize(&modules, 60, 20, 2, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!((out.width(), out.height()), (60, 20));
        // 8 columns at 7 px, 4 px spare
        let left = (60 - 4 * 7) / 2;
        for y in [0, 19] {
            assert_eq!(pixel(&out, left, y)[0], 0);
            assert_eq!(pixel(&out, left + 7, y)[0], 255);
        }
    }

    #[test]
    fn test_output_never_smaller_than_symbol() {
        let modules = BitMatrix::square(21);
        let out = rasterize(&modules, 10, 10, 4, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!((out.width(), out.height()), (29, 29));
    }

    #[test]
    fn test_custom_colours() {
        let modules = BitMatrix::from_row(&[true]);
        let out = rasterize(&modules, 1, 1, 0, Color(0xFF112233), Color::WHITE).unwrap();
        assert_eq!(pixel(&out, 0, 0), [0x11, 0x22, 0x33, 0xFF]);
    }
}
