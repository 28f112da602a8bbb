//! Linear (1D) symbologies
//!
//! Every linear reader works on one scan row at a time, expressed as alternating
//! run lengths. Detection proposes rows and start-guard positions; decoding matches
//! the symbology's bar patterns from that start. Encoders emit one row of modules
//! (`true` = bar) without quiet zones.

pub mod codabar;
pub mod code128;
pub mod code39;
pub mod code93;
pub mod itf;
pub mod upc_ean;

pub(crate) use codabar::Codabar;
pub(crate) use code39::Code39;
pub(crate) use code93::Code93;
pub(crate) use code128::Code128;
pub(crate) use itf::Itf;
pub(crate) use upc_ean::{Ean8, Ean13, UpcA, UpcE};

use crate::config;
use crate::error::{DecodeFailure, Result};
use crate::models::{
    BitMatrix, DecodeRequest, Decoded, ErrorCorrectionLevel, Locator, Point, Region, Symbology,
};
use crate::registry::{Decode, Detect, Encode, ScanImage};
use tracing::trace;

/// Alternating run lengths of one scan row
///
/// Run 0 is always light (possibly empty), so odd indices are bars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRuns {
    runs: Vec<u32>,
    offsets: Vec<usize>,
    width: usize,
}

impl RowRuns {
    /// Split a row of pixels (`true` = dark) into runs
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut runs = Vec::new();
        let mut offsets = Vec::new();
        let mut current = false;
        let mut start = 0usize;
        let mut len = 0u32;
        for (x, &dark) in bits.iter().enumerate() {
            if dark != current {
                runs.push(len);
                offsets.push(start);
                current = dark;
                start = x;
                len = 0;
            }
            len += 1;
        }
        runs.push(len);
        offsets.push(start);
        Self {
            runs,
            offsets,
            width: bits.len(),
        }
    }

    /// Number of runs
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether the row has no runs
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Run lengths
    pub fn runs(&self) -> &[u32] {
        &self.runs
    }

    /// `n` runs starting at `start`, if the row is long enough
    pub fn window(&self, start: usize, n: usize) -> Option<&[u32]> {
        self.runs.get(start..start + n)
    }

    /// Pixel where run `i` starts; one past the row for `i == len()`
    pub fn offset(&self, i: usize) -> usize {
        self.offsets.get(i).copied().unwrap_or(self.width)
    }

    /// Sum of `n` runs starting at `start`
    pub fn span(&self, start: usize, n: usize) -> u32 {
        self.runs.iter().skip(start).take(n).sum()
    }

    /// Bar-run indices, the only places a start guard can begin
    pub fn bar_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (1..self.runs.len()).step_by(2)
    }

    /// Light run before bar `i` is at least `min` pixels or reaches the row start
    pub fn quiet_before(&self, i: usize, min: f32) -> bool {
        i == 1 || (i >= 1 && self.runs[i - 1] as f32 >= min)
    }

    /// Light run after run `i` is at least `min` pixels or reaches the row end
    pub fn quiet_after(&self, i: usize, min: f32) -> bool {
        i + 1 >= self.runs.len() - 1 || self.runs[i + 1] as f32 >= min
    }
}

/// Weighted distance between observed runs and an ideal pattern, relative to its size
///
/// Returns `f32::INFINITY` when any single element strays by more than
/// `max_individual` module widths.
pub fn pattern_variance(counters: &[u32], pattern: &[u32], max_individual: f32) -> f32 {
    let total: u32 = counters.iter().sum();
    let pattern_len: u32 = pattern.iter().sum();
    if total < pattern_len || total == 0 {
        return f32::INFINITY;
    }
    let unit = total as f32 / pattern_len as f32;
    let max_individual = max_individual * unit;
    let mut variance = 0.0f32;
    for (&c, &p) in counters.iter().zip(pattern) {
        let diff = (c as f32 - p as f32 * unit).abs();
        if diff > max_individual {
            return f32::INFINITY;
        }
        variance += diff;
    }
    variance / total as f32
}

/// Narrow/wide classification: index of the `wide` widest elements as a bit mask
///
/// Bit `n - 1 - i` is set when element `i` is wide. Returns `None` unless exactly
/// `wide` elements stand clearly above the rest.
pub fn wide_mask(counters: &[u32], wide: usize) -> Option<u32> {
    let mut sorted: Vec<u32> = counters.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    if wide == 0 || wide >= sorted.len() {
        return None;
    }
    let narrowest_wide = sorted[wide - 1];
    let widest_narrow = sorted[wide];
    if narrowest_wide <= widest_narrow {
        return None;
    }
    // wide elements should be clearly wider than narrow ones
    if (narrowest_wide as f32) < widest_narrow as f32 * 1.5 {
        return None;
    }
    let n = counters.len();
    Some(
        counters
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c >= narrowest_wide)
            .fold(0u32, |acc, (i, _)| acc | (1 << (n - 1 - i))),
    )
}

/// Append `widths` as alternating modules, starting with a bar when `bar` is set
pub(crate) fn push_widths(out: &mut Vec<bool>, widths: &[u32], mut bar: bool) {
    for &w in widths {
        out.extend(std::iter::repeat_n(bar, w as usize));
        bar = !bar;
    }
}

/// Mod-10 check digit with weight 3 on the rightmost payload digit
pub(crate) fn mod10_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// A row decode: text plus the run span it covered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMatch {
    /// Decoded text
    pub text: String,
    /// Symbology actually read (UPC-A is read through EAN-13)
    pub symbology: Symbology,
    /// First run of the symbol
    pub start: usize,
    /// One past the last run of the symbol
    pub end: usize,
}

/// One linear symbology, row by row
pub(crate) trait RowCodec: Send + Sync {
    fn symbology(&self) -> Symbology;

    /// Bar indices where a start guard with its quiet zone begins
    fn find_starts(&self, runs: &RowRuns) -> Vec<usize>;

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure>;

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>>;
}

/// Adapts a [`RowCodec`] to the registry capabilities
pub(crate) struct LinearCodec<C>(pub C);

/// Rows visited for one orientation: every row when thorough, otherwise a sparse
/// sample from the middle outwards
fn scan_rows(height: usize, try_harder: bool) -> Vec<usize> {
    if height == 0 {
        return Vec::new();
    }
    let (step, max_lines) = if try_harder {
        (1, height)
    } else {
        ((height >> 5).max(1), config::linear_rows())
    };
    let middle = height / 2;
    let reach = middle.max(height - middle);
    let mut rows = Vec::with_capacity(max_lines);
    for i in 0usize.. {
        let offset = step * i.div_ceil(2);
        if rows.len() == max_lines || offset > reach {
            break;
        }
        let y = if i % 2 == 0 {
            middle.checked_sub(offset)
        } else {
            Some(middle + offset)
        };
        if let Some(y) = y.filter(|&y| y < height) {
            rows.push(y);
        }
    }
    rows
}

fn row_bits(bitmap: &BitMatrix, y: usize, reversed: bool) -> Vec<bool> {
    let mut bits = bitmap.row(y);
    if reversed {
        bits.reverse();
    }
    bits
}

impl<C: RowCodec> Detect for LinearCodec<C> {
    fn detect(&self, image: &ScanImage, request: &DecodeRequest) -> Vec<Region> {
        let mut regions = Vec::new();
        let orientations: &[(bool, bool)] = if request.try_harder {
            &[(false, false), (false, true), (true, false), (true, true)]
        } else {
            &[(false, false)]
        };
        for &(rotated, reversed) in orientations {
            let bitmap = if rotated {
                image.rotated()
            } else {
                image.bitmap()
            };
            for y in scan_rows(bitmap.height(), request.try_harder) {
                let runs = RowRuns::from_bits(&row_bits(bitmap, y, reversed));
                for start in self.0.find_starts(&runs) {
                    let x = runs.offset(start) as f32;
                    let corner = Point::new(x, y as f32);
                    regions.push(Region::new(
                        [corner; 4],
                        runs.runs()[start] as f32,
                        Locator::Row {
                            y,
                            rotated,
                            reversed,
                            start,
                        },
                    ));
                }
            }
        }
        trace!(
            symbology = %self.0.symbology(),
            candidates = regions.len(),
            "linear start guards"
        );
        regions
    }
}

impl<C: RowCodec> Decode for LinearCodec<C> {
    fn decode(
        &self,
        image: &ScanImage,
        region: &Region,
        request: &DecodeRequest,
    ) -> std::result::Result<Decoded, DecodeFailure> {
        let Locator::Row {
            y,
            rotated,
            reversed,
            start,
        } = region.locator
        else {
            return Err(DecodeFailure::NotFound);
        };
        let bitmap = if rotated {
            image.rotated()
        } else {
            image.bitmap()
        };
        let bits = row_bits(bitmap, y, reversed);
        let runs = RowRuns::from_bits(&bits);
        let found = self.0.decode_row(&runs, start, request)?;

        let (x0, x1) = (runs.offset(found.start), runs.offset(found.end));
        let (top, bottom) = repeated_rows(bitmap, &bits, y, x0, x1, reversed);
        let (left, right) = if reversed {
            (bitmap.width() - x1, bitmap.width() - x0)
        } else {
            (x0, x1)
        };
        let corners = [
            (left, top),
            (right, top),
            (right, bottom + 1),
            (left, bottom + 1),
        ]
        .into_iter()
        .map(|(x, y)| {
            if rotated {
                // rotated (x, y) came from original (y, H - x)
                Point::new(y as f32, (image.height() - x) as f32)
            } else {
                Point::new(x as f32, y as f32)
            }
        })
        .collect();
        Ok(Decoded::new(found.text, found.symbology, corners))
    }
}

/// Rows above and below `y` whose pixels in `[x0, x1)` repeat row `y` exactly
fn repeated_rows(
    bitmap: &BitMatrix,
    bits: &[bool],
    y: usize,
    x0: usize,
    x1: usize,
    reversed: bool,
) -> (usize, usize) {
    let same = |row: usize| row_bits(bitmap, row, reversed)[x0..x1] == bits[x0..x1];
    let mut top = y;
    while top > 0 && same(top - 1) {
        top -= 1;
    }
    let mut bottom = y;
    while bottom + 1 < bitmap.height() && same(bottom + 1) {
        bottom += 1;
    }
    (top, bottom)
}

impl<C: RowCodec> Encode for LinearCodec<C> {
    fn encode(&self, text: &str, _level: ErrorCorrectionLevel) -> Result<BitMatrix> {
        Ok(BitMatrix::from_row(&self.0.encode_modules(text)?))
    }
}
