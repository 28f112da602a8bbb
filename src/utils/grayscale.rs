//! Luminance extraction for every supported pixel layout.
//!
//! Y = 0.299*R + 0.587*G + 0.114*B using integer arithmetic:
//! Y = (76*R + 150*G + 29*B) >> 8

use crate::error::{Result, ZebraError};
use crate::models::{LuminanceGrid, PixelBuffer, PixelFormat};
use rayon::prelude::*;

const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Buffers at least this large are converted row-parallel
const PARALLEL_THRESHOLD: usize = 1 << 20;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Normalize any pixel buffer into a luminance grid
///
/// Alpha is ignored. NV21 contributes only its Y plane.
pub fn normalize(buffer: &PixelBuffer) -> Result<LuminanceGrid> {
    let (width, height) = (buffer.width(), buffer.height());
    let data = buffer.data();
    let expected = buffer.format().buffer_len(width, height);
    if data.len() < expected {
        return Err(ZebraError::InvalidBuffer(format!(
            "expected {expected} bytes, got {}",
            data.len()
        )));
    }

    let gray = match buffer.format() {
        PixelFormat::Rgb => rgb_to_grayscale(data, width, height),
        PixelFormat::Rgba => rgba_to_grayscale(data, width, height),
        PixelFormat::Grayscale => data[..width * height].to_vec(),
        PixelFormat::Nv21 => data[..width * height].to_vec(),
    };
    LuminanceGrid::new(width, height, gray)
}

/// Convert packed RGB to luminance
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    packed_to_grayscale::<3>(rgb, width, height)
}

/// Convert packed RGBA to luminance, ignoring alpha
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    packed_to_grayscale::<4>(rgba, width, height)
}

fn packed_to_grayscale<const BPP: usize>(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pixel_count = width * height;
    let mut gray = vec![0u8; pixel_count];
    if width == 0 {
        return gray;
    }

    let convert_row = |(y, row): (usize, &mut [u8])| {
        let src = &pixels[y * width * BPP..(y + 1) * width * BPP];
        for (out, px) in row.iter_mut().zip(src.chunks_exact(BPP)) {
            *out = luma(px[0], px[1], px[2]);
        }
    };

    if pixel_count >= PARALLEL_THRESHOLD {
        gray.par_chunks_mut(width).enumerate().for_each(convert_row);
    } else {
        gray.chunks_mut(width).enumerate().for_each(convert_row);
    }
    gray
}

/// Expand an NV21 frame to packed RGBA (BT.601, full alpha)
pub fn nv21_to_rgba(nv21: &[u8], width: usize, height: usize) -> Vec<u8> {
    let frame = width * height;
    let chroma_stride = 2 * width.div_ceil(2);
    let mut out = vec![0u8; frame * 4];

    for y in 0..height {
        for x in 0..width {
            let c = nv21.get(y * width + x).copied().unwrap_or(0) as i32;
            let uv = frame + (y / 2) * chroma_stride + (x / 2) * 2;
            let e = nv21.get(uv).copied().unwrap_or(128) as i32 - 128;
            let d = nv21.get(uv + 1).copied().unwrap_or(128) as i32 - 128;

            let r = c + ((359 * e) >> 8);
            let g = c - ((88 * d + 183 * e) >> 8);
            let b = c + ((454 * d) >> 8);

            let o = (y * width + x) * 4;
            out[o] = r.clamp(0, 255) as u8;
            out[o + 1] = g.clamp(0, 255) as u8;
            out[o + 2] = b.clamp(0, 255) as u8;
            out[o + 3] = 0xFF;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_grayscale() {
        let gray = rgb_to_grayscale(&[255, 255, 255], 1, 1);
        assert!(gray[0] >= 254);

        let gray = rgb_to_grayscale(&[0, 0, 0], 1, 1);
        assert_eq!(gray[0], 0);

        let gray = rgb_to_grayscale(&[255, 0, 0], 1, 1);
        assert!(gray[0] > 0 && gray[0] < 255);

        let gray = rgb_to_grayscale(&[0, 255, 0], 1, 1);
        assert!(gray[0] > 100);

        let img = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        assert_eq!(rgb_to_grayscale(&img, 2, 2).len(), 4);
    }

    #[test]
    fn test_rgba_ignores_alpha() {
        let opaque = rgba_to_grayscale(&[10, 200, 30, 255], 1, 1);
        let clear = rgba_to_grayscale(&[10, 200, 30, 0], 1, 1);
        assert_eq!(opaque, clear);
    }

    #[test]
    fn test_normalize_formats_agree() {
        let rgb = PixelBuffer::new(2, 1, PixelFormat::Rgb, vec![0, 0, 0, 255, 255, 255]).unwrap();
        let gray = PixelBuffer::new(2, 1, PixelFormat::Grayscale, vec![0, 254]).unwrap();
        assert_eq!(normalize(&rgb).unwrap(), normalize(&gray).unwrap());
    }

    #[test]
    fn test_nv21_uses_luma_plane() {
        let mut frame = vec![90u8; 16];
        frame.extend_from_slice(&[128; 8]);
        let buffer = PixelBuffer::new(4, 4, PixelFormat::Nv21, frame.clone()).unwrap();
        let grid = normalize(&buffer).unwrap();
        assert!(grid.data().iter().all(|&l| l == 90));

        let rgba = nv21_to_rgba(&frame, 4, 4);
        assert_eq!(&rgba[0..4], &[90, 90, 90, 255]);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (w, h) = (1024, 1025);
        let rgb: Vec<u8> = (0..w * h * 3).map(|i| (i % 251) as u8).collect();
        let parallel = rgb_to_grayscale(&rgb, w, h);
        let serial: Vec<u8> = rgb.chunks_exact(3).map(|p| luma(p[0], p[1], p[2])).collect();
        assert_eq!(parallel, serial);
    }
}
