use crate::error::{Result, ZebraError};

/// Byte layout of a [`PixelBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 3 bytes per pixel, R G B
    Rgb,
    /// 4 bytes per pixel, R G B A
    Rgba,
    /// 1 byte per pixel
    Grayscale,
    /// Full-resolution Y plane followed by interleaved V/U at quarter resolution
    Nv21,
}

impl PixelFormat {
    /// Exact byte length of a `width` x `height` buffer in this layout
    pub fn buffer_len(self, width: usize, height: usize) -> usize {
        match self {
            PixelFormat::Rgb => width * height * 3,
            PixelFormat::Rgba => width * height * 4,
            PixelFormat::Grayscale => width * height,
            PixelFormat::Nv21 => width * height + 2 * width.div_ceil(2) * height.div_ceil(2),
        }
    }
}

/// Raw image handed to the engine by a caller
///
/// The byte length always matches the declared format and dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw bytes, validating their length against the declared layout
    pub fn new(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ZebraError::InvalidBuffer(format!(
                "zero-area buffer {width}x{height}"
            )));
        }
        let expected = format.buffer_len(width, height);
        if data.len() < expected {
            return Err(ZebraError::InvalidBuffer(format!(
                "{:?} buffer of {width}x{height} needs {expected} bytes, got {}",
                format,
                data.len()
            )));
        }
        let mut data = data;
        data.truncate(expected);
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Uniform grayscale buffer, mostly useful for tests
    pub fn filled(width: usize, height: usize, luma: u8) -> Result<Self> {
        Self::new(
            width,
            height,
            PixelFormat::Grayscale,
            vec![luma; width * height],
        )
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel layout
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Give up ownership of the raw bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Convert a decoded `image` crate picture into an RGBA buffer
    pub fn from_dynamic_image(img: &image::DynamicImage) -> Result<Self> {
        let rgba = img.to_rgba8();
        let (w, h) = (rgba.width() as usize, rgba.height() as usize);
        Self::new(w, h, PixelFormat::Rgba, rgba.into_raw())
    }

    /// Expand into an `image` crate RGBA picture, e.g. for saving as PNG
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        let rgba = match self.format {
            PixelFormat::Rgba => self.data.clone(),
            PixelFormat::Rgb => self
                .data
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 0xFF])
                .collect(),
            PixelFormat::Grayscale => self.data.iter().flat_map(|&l| [l, l, l, 0xFF]).collect(),
            PixelFormat::Nv21 => crate::utils::grayscale::nv21_to_rgba(
                &self.data,
                self.width,
                self.height,
            ),
        };
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, rgba)
    }
}

/// Single-channel brightness image, one byte per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuminanceGrid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl LuminanceGrid {
    /// Wrap luminance bytes; `data` must hold `width * height` bytes
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(ZebraError::InvalidBuffer(format!(
                "luminance grid {width}x{height} needs {} bytes, got {}",
                width * height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luminance at (x, y)
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Row-major luminance bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// ARGB colour, `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Opaque black
    pub const BLACK: Color = Color(0xFF00_0000);
    /// Opaque white
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    /// Channels in R, G, B, A order
    pub fn rgba(self) -> [u8; 4] {
        let [a, r, g, b] = self.0.to_be_bytes();
        [r, g, b, a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_length_validation() {
        assert!(PixelBuffer::new(4, 4, PixelFormat::Rgb, vec![0; 48]).is_ok());
        assert!(matches!(
            PixelBuffer::new(4, 4, PixelFormat::Rgba, vec![0; 48]),
            Err(ZebraError::InvalidBuffer(_))
        ));
        assert!(PixelBuffer::new(0, 4, PixelFormat::Grayscale, vec![]).is_err());
    }

    #[test]
    fn test_nv21_length_rounds_chroma_up() {
        assert_eq!(PixelFormat::Nv21.buffer_len(4, 4), 16 + 8);
        assert_eq!(PixelFormat::Nv21.buffer_len(3, 3), 9 + 8);
    }

    #[test]
    fn test_color_channels() {
        assert_eq!(Color::BLACK.rgba(), [0, 0, 0, 255]);
        assert_eq!(Color(0x80102030).rgba(), [0x10, 0x20, 0x30, 0x80]);
    }

    #[test]
    fn test_rgba_image_round_trip() {
        let buffer = PixelBuffer::filled(3, 2, 200).unwrap();
        let img = buffer.to_rgba_image().unwrap();
        assert_eq!(img.get_pixel(2, 1).0, [200, 200, 200, 255]);
        let back = PixelBuffer::from_dynamic_image(&image::DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!(back.format(), PixelFormat::Rgba);
        assert_eq!(back.width(), 3);
    }
}
