//! Aztec Code, compact and full-range
//!
//! Detection looks for the concentric rings of the bullseye. Decoding samples the core
//! around the centre, turns it upright with the orientation marks, reads the mode
//! message for the layer count and then samples and reads the whole symbol.

pub(crate) mod decoder;
pub(crate) mod detector;
pub(crate) mod encoder;
pub(crate) mod layout;
pub(crate) mod modes;

use crate::error::{DecodeFailure, Result};
use crate::models::{
    BitMatrix, DecodeRequest, Decoded, ErrorCorrectionLevel, Locator, Point, Region, Symbology,
};
use crate::registry::{Decode, Detect, Encode, ScanImage};
use crate::utils::bits::Message;
use crate::utils::geometry::{PerspectiveTransform, sample_grid};
use detector::Bullseye;
use layout::core_radius;
use tracing::trace;

/// Share of dark (or light) modules a bullseye ring needs
const RING_FILL: f32 = 0.85;
/// Most bullseye candidates handed to the decoder
const MAX_CANDIDATES: usize = 6;

/// Aztec capability set
pub(crate) struct AztecCodec;

/// Image corners of an `n` x `n` module square centred on the bullseye
fn square_corners(b: &Bullseye, n: usize) -> [Point; 4] {
    let (hw, hh) = (n as f32 / 2.0 * b.module_width, n as f32 / 2.0 * b.module_height);
    let c = b.center;
    [
        c.translate(-hw, -hh),
        c.translate(hw, -hh),
        c.translate(hw, hh),
        c.translate(-hw, hh),
    ]
}

fn sample_square(bitmap: &BitMatrix, b: &Bullseye, n: usize) -> Option<BitMatrix> {
    let side = n as f32;
    let transform = PerspectiveTransform::from_points(
        &[
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ],
        &square_corners(b, n),
    )?;
    sample_grid(bitmap, &transform, n, n)
}

/// Share of modules matching `dark` on the square ring `d` modules from the centre of `core`
fn ring_fill(core: &BitMatrix, d: usize, dark: bool) -> f32 {
    let c = core.width() / 2;
    let (mut hits, mut total) = (0usize, 0usize);
    for y in 0..core.height() {
        for x in 0..core.width() {
            if x.abs_diff(c).max(y.abs_diff(c)) == d {
                total += 1;
                hits += (core.get(x, y) == dark) as usize;
            }
        }
    }
    hits as f32 / total.max(1) as f32
}

/// Dark centre ringed by light, dark, light and dark squares; reference grid
/// crossings only match along their two lines
fn has_core_rings(bitmap: &BitMatrix, b: &Bullseye) -> bool {
    let Some(core) = sample_square(bitmap, b, 9) else {
        return false;
    };
    core.get(4, 4) && (1..=4).all(|d| ring_fill(&core, d, d % 2 == 0) >= RING_FILL)
}

/// Full-range symbols have a light ring at distance 5 and a dark one at 6
fn looks_full(bitmap: &BitMatrix, b: &Bullseye) -> bool {
    let Some(core) = sample_square(bitmap, b, 15) else {
        return false;
    };
    ring_fill(&core, 5, false) >= RING_FILL && ring_fill(&core, 6, true) >= RING_FILL
}

/// Decoded message and symbol side for one symbol family
fn read_symbol(
    bitmap: &BitMatrix,
    b: &Bullseye,
    compact: bool,
) -> std::result::Result<(Message, usize), DecodeFailure> {
    let core = sample_square(bitmap, b, 2 * core_radius(compact) + 1)
        .ok_or(DecodeFailure::NotFound)?;
    let turns = decoder::orientation(&core, compact).ok_or(DecodeFailure::NotFound)?;
    let mode = decoder::read_mode_message(&core.rotate_quarters(turns), compact)?;
    let size = mode.geometry.matrix_size();
    trace!(
        compact,
        layers = mode.geometry.layers,
        data_words = mode.data_words,
        turns,
        "Aztec mode message"
    );
    let grid = sample_square(bitmap, b, size)
        .ok_or(DecodeFailure::NotFound)?
        .rotate_quarters(turns);
    Ok((decoder::decode_grid(&grid, &mode)?, size))
}

impl Detect for AztecCodec {
    fn detect(&self, image: &ScanImage, request: &DecodeRequest) -> Vec<Region> {
        let bitmap = image.bitmap();
        let regions: Vec<Region> = detector::detect(bitmap, request.try_harder)
            .iter()
            .filter(|b| has_core_rings(bitmap, b))
            .take(MAX_CANDIDATES)
            .map(|b| {
                Region::new(
                    square_corners(b, 2 * core_radius(true) + 1),
                    b.module_size(),
                    Locator::Bullseye { center: b.center },
                )
            })
            .collect();
        trace!(candidates = regions.len(), "Aztec bullseyes");
        regions
    }
}

impl Decode for AztecCodec {
    fn decode(
        &self,
        image: &ScanImage,
        region: &Region,
        _request: &DecodeRequest,
    ) -> std::result::Result<Decoded, DecodeFailure> {
        let Locator::Bullseye { center } = region.locator else {
            return Err(DecodeFailure::NotFound);
        };
        let bitmap = image.bitmap();
        let bullseye = detector::measure(bitmap, center).ok_or(DecodeFailure::NotFound)?;
        let order = if looks_full(bitmap, &bullseye) {
            [false, true]
        } else {
            [true, false]
        };
        let mut failure = DecodeFailure::NotFound;
        for compact in order {
            match read_symbol(bitmap, &bullseye, compact) {
                Ok((message, size)) => {
                    let corners = square_corners(&bullseye, size).to_vec();
                    return Ok(Decoded::new(message.text, Symbology::Aztec, corners)
                        .with_raw(message.bytes));
                }
                Err(err) if err.is_corrupt_symbol() => failure = err,
                Err(_) => {}
            }
        }
        Err(failure)
    }
}

impl Encode for AztecCodec {
    fn encode(&self, text: &str, level: ErrorCorrectionLevel) -> Result<BitMatrix> {
        encoder::encode(text, level)
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

    fn scan(bitmap: BitMatrix) -> std::result::Result<Decoded, DecodeFailure> {
        let image = ScanImage::new(bitmap);
        let request = DecodeRequest::default();
        let mut failure = DecodeFailure::NotFound;
        for region in AztecCodec.detect(&image, &request) {
            match AztecCodec.decode(&image, &region, &request) {
                Ok(decoded) => return Ok(decoded),
                Err(err) if err.is_corrupt_symbol() => failure = err,
                Err(_) => {}
            }
        }
        Err(failure)
    }

    #[test]
    fn test_compact_round_trip_through_image() {
        let text = "Aztec 2D";
        let symbol = AztecCodec.encode(text, ErrorCorrectionLevel::Medium).unwrap();
        let decoded = scan(render(&symbol, 4, 2)).unwrap();
        assert_eq!(decoded.text, text);
        assert_eq!(decoded.symbology, Symbology::Aztec);
        let corner = decoded.corners[0];
        assert!((corner.x - 8.0).abs() < 1.0 && (corner.y - 8.0).abs() < 1.0, "{corner:?}");
    }

    #[test]
    fn test_full_range_round_trip() {
        let text = "Full range Aztec symbols carry a reference grid. ".repeat(4);
        let symbol = AztecCodec.encode(&text, ErrorCorrectionLevel::Quartile).unwrap();
        assert!(symbol.width() > 27);
        assert_eq!(scan(render(&symbol, 3, 3)).unwrap().text, text);
    }

    fn digits(n: usize) -> String {
        (0..n).map(|i| char::from(b'0' + (i * 7 % 10) as u8)).collect()
    }

    /// Digit payload that grows the symbol to exactly `size` modules
    fn full_range_symbol(size: usize) -> (String, BitMatrix) {
        let width = |n: usize| {
            AztecCodec
                .encode(&digits(n), ErrorCorrectionLevel::Low)
                .map_or(usize::MAX, |m| m.width())
        };
        let (mut lo, mut hi) = (1usize, 6000usize);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if width(mid) >= size {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        let text = digits(lo);
        let symbol = AztecCodec.encode(&text, ErrorCorrectionLevel::Low).unwrap();
        (text, symbol)
    }

    #[test]
    fn test_large_full_range_round_trip() {
        // 14, 22 and 32 layers
        for size in [75, 109, 151] {
            let (text, symbol) = full_range_symbol(size);
            assert_eq!(symbol.width(), size);
            let decoded = scan(render(&symbol, 2, 2)).unwrap();
            assert_eq!(decoded.text, text, "{size}x{size}");
        }
    }

    #[test]
    fn test_grid_crossings_are_not_bullseyes() {
        let (_, symbol) = full_range_symbol(75);
        let image = ScanImage::new(render(&symbol, 3, 2));
        let regions = AztecCodec.detect(&image, &DecodeRequest::default());
        assert!(!regions.is_empty());
        // symbol centre module 37, shifted by the margin, at 3 px per module
        let centre = (37.0 + 2.0 + 0.5) * 3.0;
        for region in regions {
            let Locator::Bullseye { center } = region.locator else {
                panic!("expected a bullseye locator");
            };
            assert!((center.x - centre).abs() < 3.0 && (center.y - centre).abs() < 3.0);
        }
    }

    #[test]
    fn test_rotated_symbols() {
        let symbol = AztecCodec.encode("SPIN", ErrorCorrectionLevel::Low).unwrap();
        for turns in 1..4 {
            let bitmap = render(&symbol.rotate_quarters(turns), 3, 2);
            assert_eq!(scan(bitmap).unwrap().text, "SPIN");
        }
    }

    #[test]
    fn test_blank_image_has_no_regions() {
        let image = ScanImage::new(BitMatrix::new(64, 64));
        assert!(AztecCodec.detect(&image, &DecodeRequest::default()).is_empty());
    }

    #[test]
    fn test_wrong_locator_is_not_found() {
        let image = ScanImage::new(BitMatrix::square(20));
        let region = Region::new(
            [Point::default(); 4],
            1.0,
            Locator::Row {
                y: 3,
                rotated: false,
                reversed: false,
                start: 0,
            },
        );
        assert_eq!(
            AztecCodec.decode(&image, &region, &DecodeRequest::default()),
            Err(DecodeFailure::NotFound)
        );
    }
}
