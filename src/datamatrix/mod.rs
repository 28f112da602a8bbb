//! Data Matrix ECC200
//!
//! The detector finds the solid finder L and the alternating timing edges of an
//! axis-aligned symbol, counts modules from the timing edges and records how many
//! quarter turns bring the L to the bottom left. Decoding samples the grid, turns it
//! upright, strips the region borders and walks the diagonal codeword placement.

pub(crate) mod decoder;
pub(crate) mod detector;
pub(crate) mod encoder;
pub(crate) mod placement;
pub(crate) mod symbol;

use crate::error::{DecodeFailure, Result};
use crate::models::{
    BitMatrix, DecodeRequest, Decoded, ErrorCorrectionLevel, Locator, Point, Region, Symbology,
};
use crate::registry::{Decode, Detect, Encode, ScanImage};
use crate::utils::geometry::{PerspectiveTransform, sample_grid};
use tracing::trace;

/// Data Matrix capability set
pub(crate) struct DataMatrixCodec;

impl Detect for DataMatrixCodec {
    fn detect(&self, image: &ScanImage, request: &DecodeRequest) -> Vec<Region> {
        let regions = detector::detect(image.bitmap(), request.pure_barcode);
        trace!(candidates = regions.len(), "Data Matrix borders");
        regions
    }
}

impl Decode for DataMatrixCodec {
    fn decode(
        &self,
        image: &ScanImage,
        region: &Region,
        _request: &DecodeRequest,
    ) -> std::result::Result<Decoded, DecodeFailure> {
        let Locator::Border {
            origin,
            module_width,
            module_height,
            cols,
            rows,
            quarter_turns,
        } = region.locator
        else {
            return Err(DecodeFailure::NotFound);
        };
        let (w, h) = (cols as f32 * module_width, rows as f32 * module_height);
        let transform = PerspectiveTransform::from_points(
            &[
                Point::new(0.0, 0.0),
                Point::new(cols as f32, 0.0),
                Point::new(cols as f32, rows as f32),
                Point::new(0.0, rows as f32),
            ],
            &[
                origin,
                origin.translate(w, 0.0),
                origin.translate(w, h),
                origin.translate(0.0, h),
            ],
        )
        .ok_or(DecodeFailure::NotFound)?;
        let grid = sample_grid(image.bitmap(), &transform, cols, rows).ok_or(DecodeFailure::NotFound)?;
        let message = decoder::decode_symbol(&grid.rotate_quarters(quarter_turns))?;
        Ok(Decoded::new(message.text, Symbology::DataMatrix, region.corners.to_vec())
            .with_raw(message.bytes))
    }
}

impl Encode for DataMatrixCodec {
    /// ECC200 check words are fixed per size, so `level` has no effect
    fn encode(&self, text: &str, _level: ErrorCorrectionLevel) -> Result<BitMatrix> {
        encoder::encode(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(symbol: &BitMatrix, scale: usize, margin: usize) -> BitMatrix {
        let mut out = BitMatrix::new(
            (symbol.width() + 2 * margin) * scale,
            (symbol.height() + 2 * margin) * scale,
        );
        for y in 0..symbol.height() {
            for x in 0..symbol.width() {
                if symbol.get(x, y) {
                    out.set_region((x + margin) * scale, (y + margin) * scale, scale, scale);
                }
            }
        }
        out
    }

    fn scan(bitmap: BitMatrix, request: &DecodeRequest) -> std::result::Result<Decoded, DecodeFailure> {
        let image = ScanImage::new(bitmap);
        let mut failure = DecodeFailure::NotFound;
        for region in DataMatrixCodec.detect(&image, request) {
            match DataMatrixCodec.decode(&image, &region, request) {
                Ok(decoded) => return Ok(decoded),
                Err(err) if err.is_corrupt_symbol() => failure = err,
                Err(_) => {}
            }
        }
        Err(failure)
    }

    #[test]
    fn test_round_trip_through_image() {
        let text = "Data Matrix 0123456789";
        let symbol = DataMatrixCodec.encode(text, ErrorCorrectionLevel::Medium).unwrap();
        let decoded = scan(render(&symbol, 4, 2), &DecodeRequest::default()).unwrap();
        assert_eq!(decoded.text, text);
        assert_eq!(decoded.symbology, Symbology::DataMatrix);
        assert_eq!(decoded.corners[0], Point::new(8.0, 8.0));
    }

    #[test]
    fn test_rotated_symbols() {
        let symbol = DataMatrixCodec.encode("ROTATE ME", ErrorCorrectionLevel::Low).unwrap();
        for turns in 1..4 {
            let bitmap = render(&symbol.rotate_quarters(turns), 3, 3);
            assert_eq!(scan(bitmap, &DecodeRequest::default()).unwrap().text, "ROTATE ME");
        }
    }

    #[test]
    fn test_pure_barcode_without_quiet_zone() {
        let symbol = DataMatrixCodec.encode("PURE", ErrorCorrectionLevel::Low).unwrap();
        let request = DecodeRequest::default().pure_barcode(true);
        assert_eq!(scan(render(&symbol, 5, 0), &request).unwrap().text, "PURE");
    }

    #[test]
    fn test_wrong_locator_is_not_found() {
        let image = ScanImage::new(BitMatrix::square(20));
        let region = Region::new(
            [Point::default(); 4],
            1.0,
            Locator::Bullseye {
                center: Point::new(10.0, 10.0),
            },
        );
        assert_eq!(
            DataMatrixCodec.decode(&image, &region, &DecodeRequest::default()),
            Err(DecodeFailure::NotFound)
        );
    }
}
