//! QR Code model 2, versions 1 to 40
//!
//! Detection finds 1:1:3:1:1 finder patterns and proposes every plausible
//! (top-left, top-right, bottom-left) triple. Decoding maps the finder centres and,
//! from version 2 on, the bottom-right alignment pattern onto module space, samples
//! the grid and reads it through [`decoder::decode_matrix`].

pub(crate) mod decoder;
pub(crate) mod encoder;
pub(crate) mod finder;
pub(crate) mod format;
pub(crate) mod function_mask;
pub(crate) mod mask;
pub(crate) mod payload;
pub(crate) mod placement;
pub(crate) mod tables;

use crate::error::{DecodeFailure, Result};
use crate::models::{
    BitMatrix, DecodeRequest, Decoded, ErrorCorrectionLevel, Locator, Point, Region, Symbology,
};
use crate::registry::{Decode, Detect, Encode, ScanImage};
use crate::utils::geometry::{PerspectiveTransform, sample_grid};
use finder::{FinderDetector, find_alignment, order_finder_patterns};
use tracing::trace;

/// QR Code capability set
pub(crate) struct QrCodec;

/// Module-space to image-space mapping for one finder triple
struct Frame {
    top_left: Point,
    /// One module step along the top edge
    x_step: Point,
    /// One module step along the left edge
    y_step: Point,
}

impl Frame {
    fn new(top_left: Point, top_right: Point, bottom_left: Point, dimension: usize) -> Self {
        let span = (dimension - 7) as f32;
        Self {
            top_left,
            x_step: Point::new(
                (top_right.x - top_left.x) / span,
                (top_right.y - top_left.y) / span,
            ),
            y_step: Point::new(
                (bottom_left.x - top_left.x) / span,
                (bottom_left.y - top_left.y) / span,
            ),
        }
    }

    /// Image position of module-space point (mx, my), finder centres at 3.5
    fn project(&self, mx: f32, my: f32) -> Point {
        let (dx, dy) = (mx - 3.5, my - 3.5);
        Point::new(
            self.top_left.x + dx * self.x_step.x + dy * self.y_step.x,
            self.top_left.y + dx * self.x_step.y + dy * self.y_step.y,
        )
    }

    fn module_size(&self) -> f32 {
        let origin = Point::default();
        (self.x_step.distance(&origin) + self.y_step.distance(&origin)) / 2.0
    }
}

fn finder_region(top_left: Point, top_right: Point, bottom_left: Point, dimension: usize) -> Region {
    let frame = Frame::new(top_left, top_right, bottom_left, dimension);
    let d = dimension as f32;
    let corners = [(0.0, 0.0), (d, 0.0), (d, d), (0.0, d)].map(|(x, y)| frame.project(x, y));
    Region::new(
        corners,
        frame.module_size(),
        Locator::Finders {
            top_left,
            top_right,
            bottom_left,
            dimension,
        },
    )
}

/// Treat the dark extent of the bitmap as one upright symbol
fn pure_region(bitmap: &BitMatrix) -> Option<Region> {
    let (left, top, right, bottom) = bitmap.dark_extent()?;
    let finder_width = (left..=right).take_while(|&x| bitmap.get(x, top)).count();
    let module = finder_width as f32 / 7.0;
    if module < 1.0 {
        return None;
    }
    let dimension = ((right - left + 1) as f32 / module).round() as usize;
    tables::version_for_dimension(dimension)?;
    let inset = 3.5 * module;
    let (l, t) = (left as f32, top as f32);
    let (r, b) = ((right + 1) as f32, (bottom + 1) as f32);
    Some(finder_region(
        Point::new(l + inset, t + inset),
        Point::new(r - inset, t + inset),
        Point::new(l + inset, b - inset),
        dimension,
    ))
}

/// Perspective transform from module space, refined by the alignment pattern when found
fn module_transform(
    bitmap: &BitMatrix,
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    dimension: usize,
) -> Option<PerspectiveTransform> {
    let frame = Frame::new(top_left, top_right, bottom_left, dimension);
    let d = dimension as f32;
    let mut fourth = (Point::new(d - 3.5, d - 3.5), frame.project(d - 3.5, d - 3.5));
    if dimension > 21 {
        let module = frame.module_size();
        let expected = frame.project(d - 6.5, d - 6.5);
        if let Some(found) = find_alignment(bitmap, expected, module, module * 4.0) {
            fourth = (Point::new(d - 6.5, d - 6.5), found);
        }
    }
    PerspectiveTransform::from_points(
        &[
            Point::new(3.5, 3.5),
            Point::new(d - 3.5, 3.5),
            fourth.0,
            Point::new(3.5, d - 3.5),
        ],
        &[top_left, top_right, fourth.1, bottom_left],
    )
}

impl Detect for QrCodec {
    fn detect(&self, image: &ScanImage, request: &DecodeRequest) -> Vec<Region> {
        let bitmap = image.bitmap();
        let mut regions = Vec::new();
        if request.pure_barcode {
            regions.extend(pure_region(bitmap));
        }

        let finders = FinderDetector::detect(bitmap, request.try_harder);
        let mut triples = Vec::new();
        for i in 0..finders.len() {
            for j in i + 1..finders.len() {
                for k in j + 1..finders.len() {
                    let (a, b, c) = (&finders[i], &finders[j], &finders[k]);
                    if let Some((tl, tr, bl, dimension)) = order_finder_patterns(a, b, c) {
                        triples.push((a.count + b.count + c.count, tl, tr, bl, dimension));
                    }
                }
            }
        }
        triples.sort_by(|a, b| b.0.cmp(&a.0));
        regions.extend(
            triples
                .into_iter()
                .map(|(_, tl, tr, bl, dimension)| finder_region(tl, tr, bl, dimension)),
        );
        trace!(finders = finders.len(), candidates = regions.len(), "QR finder triples");
        regions
    }
}

impl Decode for QrCodec {
    fn decode(
        &self,
        image: &ScanImage,
        region: &Region,
        _request: &DecodeRequest,
    ) -> std::result::Result<Decoded, DecodeFailure> {
        let Locator::Finders {
            top_left,
            top_right,
            bottom_left,
            dimension,
        } = region.locator
        else {
            return Err(DecodeFailure::NotFound);
        };
        let bitmap = image.bitmap();
        let mut failure = DecodeFailure::NotFound;
        // the estimate may be one version off
        for dim in [dimension, dimension + 4, dimension.saturating_sub(4)] {
            if tables::version_for_dimension(dim).is_none() {
                continue;
            }
            let Some(transform) = module_transform(bitmap, top_left, top_right, bottom_left, dim)
            else {
                continue;
            };
            let Some(grid) = sample_grid(bitmap, &transform, dim, dim) else {
                continue;
            };
            match decoder::decode_matrix(&grid) {
                Ok(payload) => {
                    let d = dim as f32;
                    let corners = [(0.0, 0.0), (d, 0.0), (d, d), (0.0, d)]
                        .iter()
                        .map(|&(x, y)| transform.transform(&Point::new(x, y)))
                        .collect();
                    return Ok(Decoded::new(payload.text, Symbology::QrCode, corners)
                        .with_raw(payload.bytes));
                }
                Err(err) if err.is_corrupt_symbol() && !failure.is_corrupt_symbol() => {
                    failure = err;
                }
                Err(_) => {}
            }
        }
        Err(failure)
    }
}

impl Encode for QrCodec {
    fn encode(&self, text: &str, level: ErrorCorrectionLevel) -> Result<BitMatrix> {
        encoder::encode(text, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scale a module grid by `scale` pixels per module inside a `margin`-module border
    fn render(symbol: &BitMatrix, scale: usize, margin: usize) -> BitMatrix {
        let size = (symbol.width() + 2 * margin) * scale;
        let mut out = BitMatrix::square(size);
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
        for region in QrCodec.detect(&image, request) {
            match QrCodec.decode(&image, &region, request) {
                Ok(decoded) => return Ok(decoded),
                Err(err) => failure = err,
            }
        }
        Err(failure)
    }

    #[test]
    fn test_detect_and_decode_rendered_symbol() {
        let symbol = QrCodec.encode("hello zebra", ErrorCorrectionLevel::Medium).unwrap();
        let decoded = scan(render(&symbol, 4, 4), &DecodeRequest::default()).unwrap();
        assert_eq!(decoded.text, "hello zebra");
        assert_eq!(decoded.raw.as_deref(), Some("hello zebra".as_bytes()));
        let corner = decoded.corners[0];
        assert!((corner.x - 16.0).abs() < 1.0 && (corner.y - 16.0).abs() < 1.0, "{corner:?}");
    }

    #[test]
    fn test_rotated_symbol_with_alignment_pattern() {
        let text = "ROTATED SYMBOL WITH AN ALIGNMENT PATTERN";
        let symbol = QrCodec.encode(text, ErrorCorrectionLevel::High).unwrap();
        assert!(symbol.width() > 21);
        let bitmap = render(&symbol, 3, 4).rotate_quarters(3);
        assert_eq!(scan(bitmap, &DecodeRequest::default()).unwrap().text, text);
    }

    #[test]
    fn test_pure_barcode_region() {
        let symbol = QrCodec.encode("PURE", ErrorCorrectionLevel::Low).unwrap();
        let bitmap = render(&symbol, 5, 2);
        let region = pure_region(&bitmap).unwrap();
        let Locator::Finders { dimension, .. } = region.locator else {
            panic!("unexpected locator");
        };
        assert_eq!(dimension, 21);
        let request = DecodeRequest::default().pure_barcode(true);
        assert_eq!(scan(bitmap, &request).unwrap().text, "PURE");
    }

    #[test]
    fn test_blank_image_has_no_candidates() {
        let image = ScanImage::new(BitMatrix::square(100));
        assert!(QrCodec.detect(&image, &DecodeRequest::default()).is_empty());
    }
}
