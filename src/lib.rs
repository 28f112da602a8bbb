//! Zebra - multi-symbology barcode scanning and generation in pure Rust
//!
//! Scanning takes a [`PixelBuffer`] through luminance normalization, block-adaptive
//! binarization and the detector/decoder pair of every requested [`Symbology`].
//! Generation encodes text into a [`ModuleMatrix`] and rasterizes it.
//!
//! ```no_run
//! use zebra::{DecodeRequest, EncodeRequest, Symbology};
//!
//! let image = zebra::generate(&EncodeRequest::new("123456789012", Symbology::UpcA))?;
//! let request = DecodeRequest::default().with_format(Symbology::UpcA);
//! let result = zebra::scan(&image, &request)?;
//! assert_eq!(result.text(), Some("123456789012"));
//! # Ok::<(), zebra::ZebraError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Environment-overridable defaults
pub mod config;
/// Galois fields and Reed-Solomon coding
pub mod ecc;
/// Error taxonomy
pub mod error;
/// Core data structures (requests, results, pixel buffers, bit matrices)
pub mod models;
/// Module matrix rasterization
pub mod raster;
/// Utility functions (grayscale, binarization, geometry, bit streams)
pub mod utils;

mod aztec;
mod datamatrix;
mod linear;
mod pipeline;
mod qr;
mod registry;
mod task;

pub use error::{Result, ZebraError};
pub use models::{
    BinaryBitmap, BitMatrix, BoundingBox, Color, DecodeRequest, DecodeResult, EncodeRequest,
    ErrorCorrectionLevel, LuminanceGrid, ModuleMatrix, PixelBuffer, PixelFormat, Point, Symbology,
};
pub use task::Task;

use tracing::instrument;

/// Scan `image` for the first symbol of any requested format
///
/// Hard failures (bad buffer, empty or wholly unsupported format set) are returned
/// as `Err`. Everything else, including a located but unreadable symbol and an
/// expired timeout, is a [`DecodeResult`].
#[instrument(level = "debug", skip_all, fields(formats = request.formats.len()))]
pub fn scan(image: &PixelBuffer, request: &DecodeRequest) -> Result<DecodeResult> {
    pipeline::scan(image, request, None)
}

/// Scan `image` for every distinct symbol of the requested formats
///
/// When nothing decodes the list holds a single `NotFound` or `Error` entry.
#[instrument(level = "debug", skip_all, fields(formats = request.formats.len()))]
pub fn scan_multiple(image: &PixelBuffer, request: &DecodeRequest) -> Result<Vec<DecodeResult>> {
    pipeline::scan_multiple(image, request, None)
}

/// Encode `text` into modules; linear symbologies produce a single row
pub fn encode(text: &str, symbology: Symbology, level: ErrorCorrectionLevel) -> Result<ModuleMatrix> {
    pipeline::encode(text, symbology, level)
}

/// Encode and rasterize a symbol into an RGBA buffer
#[instrument(level = "debug", skip_all, fields(symbology = %request.symbology))]
pub fn generate(request: &EncodeRequest) -> Result<PixelBuffer> {
    let modules = encode(&request.text, request.symbology, request.ec_level)?;
    raster::rasterize(
        &modules,
        request.width,
        request.height,
        request.margin,
        request.foreground,
        request.background,
    )
}

/// Scanner bound to one request
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    request: DecodeRequest,
}

impl Scanner {
    /// Scanner for `request`
    pub fn new(request: DecodeRequest) -> Self {
        Self { request }
    }

    /// The request every scan uses
    pub fn request(&self) -> &DecodeRequest {
        &self.request
    }

    /// See [`scan`]
    pub fn scan(&self, image: &PixelBuffer) -> Result<DecodeResult> {
        scan(image, &self.request)
    }

    /// See [`scan_multiple`]
    pub fn scan_multiple(&self, image: &PixelBuffer) -> Result<Vec<DecodeResult>> {
        scan_multiple(image, &self.request)
    }

    /// Scan on the rayon pool; dropping the task cancels the scan at its next
    /// checkpoint
    pub fn scan_async(&self, image: PixelBuffer) -> Task<Result<DecodeResult>> {
        let request = self.request.clone();
        Task::spawn(move |cancel| pipeline::scan(&image, &request, Some(cancel)))
    }
}

/// Symbol generator
#[derive(Debug, Clone, Copy, Default)]
pub struct Generator;

impl Generator {
    /// A generator
    pub fn new() -> Self {
        Self
    }

    /// See [`generate`]
    pub fn generate(&self, request: &EncodeRequest) -> Result<PixelBuffer> {
        generate(request)
    }

    /// Generate on the rayon pool
    pub fn generate_async(&self, request: EncodeRequest) -> Task<Result<PixelBuffer>> {
        Task::spawn(move |_| generate(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::block_on;

    #[test]
    fn test_generate_then_scan_qr() {
        let image = generate(&EncodeRequest::new("zebra", Symbology::QrCode)).unwrap();
        assert_eq!((image.width(), image.height()), (300, 300));
        let result = Scanner::default().scan(&image).unwrap();
        assert_eq!(result.text(), Some("zebra"));
    }

    #[test]
    fn test_upc_a_example() {
        let image = generate(&EncodeRequest::new("123456789012", Symbology::UpcA)).unwrap();
        let request = DecodeRequest::default().with_format(Symbology::UpcA);
        let result = scan(&image, &request).unwrap();
        assert_eq!(result.text(), Some("123456789012"));
        assert_eq!(result.symbology(), Some(Symbology::UpcA));
    }

    #[test]
    fn test_async_round_trip() {
        let generator = Generator::new();
        let request = EncodeRequest::new("ASYNC", Symbology::Aztec).size(200, 200);
        let image = block_on(generator.generate_async(request)).unwrap();
        let scanner = Scanner::new(DecodeRequest::default().with_format(Symbology::Aztec));
        let result = block_on(scanner.scan_async(image)).unwrap();
        assert_eq!(result.text(), Some("ASYNC"));
    }

    #[test]
    fn test_blank_image_not_found() {
        let image = PixelBuffer::filled(120, 80, 200).unwrap();
        assert_eq!(scan(&image, &DecodeRequest::accurate()).unwrap(), DecodeResult::NotFound);
    }

    #[test]
    fn test_hard_failures_are_err() {
        let image = PixelBuffer::filled(10, 10, 0).unwrap();
        let empty = DecodeRequest::default().with_formats(std::iter::empty());
        assert_eq!(scan(&image, &empty).unwrap_err(), ZebraError::EmptyRequest);
        assert!(matches!(
            generate(&EncodeRequest::new("x", Symbology::MaxiCode)),
            Err(ZebraError::UnsupportedSymbology(Symbology::MaxiCode))
        ));
    }
}
