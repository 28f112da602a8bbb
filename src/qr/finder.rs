//! Finder and alignment pattern location by 1:1:3:1:1 run-ratio scanning

use crate::linear::RowRuns;
use crate::models::{BitMatrix, Point};

/// Most finder candidates kept for triple selection
const MAX_CANDIDATES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FinderPattern {
    pub center: Point,
    pub module_size: f32,
    /// Scan rows that confirmed this pattern
    pub count: usize,
}

impl FinderPattern {
    pub(crate) fn new(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            count: 1,
        }
    }

    fn about_equals(&self, other: &FinderPattern) -> bool {
        let tolerance = self.module_size.max(other.module_size) * 2.0;
        (self.center.x - other.center.x).abs() <= tolerance
            && (self.center.y - other.center.y).abs() <= tolerance
            && (self.module_size - other.module_size).abs() <= self.module_size.max(1.0)
    }

    fn combine(&mut self, other: &FinderPattern) {
        let total = (self.count + other.count) as f32;
        let (a, b) = (self.count as f32 / total, other.count as f32 / total);
        self.center = Point::new(
            self.center.x * a + other.center.x * b,
            self.center.y * a + other.center.y * b,
        );
        self.module_size = self.module_size * a + other.module_size * b;
        self.count += other.count;
    }
}

pub(crate) struct FinderDetector;

impl FinderDetector {
    /// Finder candidates, most frequently confirmed first
    pub(crate) fn detect(matrix: &BitMatrix, try_harder: bool) -> Vec<FinderPattern> {
        let height = matrix.height();
        let row_step = if try_harder { 1 } else { (3 * height / 388).max(1) };
        let mut merged: Vec<FinderPattern> = Vec::new();

        for y in (0..height).step_by(row_step) {
            for candidate in Self::scan_row(matrix, y) {
                match merged.iter_mut().find(|m| m.about_equals(&candidate)) {
                    Some(existing) => existing.combine(&candidate),
                    None => merged.push(candidate),
                }
            }
        }

        merged.sort_by(|a, b| b.count.cmp(&a.count));
        merged.truncate(MAX_CANDIDATES);
        merged
    }

    fn scan_row(matrix: &BitMatrix, y: usize) -> Vec<FinderPattern> {
        let runs = RowRuns::from_bits(&matrix.row(y));
        let mut candidates = Vec::new();
        for i in runs.bar_indices() {
            let Some(window) = runs.window(i, 5) else {
                break;
            };
            if !Self::quick_ratio_check(window) || !Self::check_ratios(window) {
                continue;
            }
            let center_x =
                runs.offset(i) as f32 + (window[0] + window[1]) as f32 + window[2] as f32 / 2.0;
            let Some((center_y, v_unit)) =
                Self::cross_check(matrix, center_x as usize, y, Axis::Vertical)
            else {
                continue;
            };
            let Some((center_x, h_unit)) =
                Self::cross_check(matrix, center_x as usize, center_y as usize, Axis::Horizontal)
            else {
                continue;
            };
            candidates.push(FinderPattern::new(center_x, center_y, (v_unit + h_unit) / 2.0));
        }
        candidates
    }

    /// Integer pre-filter before the float ratio test
    fn quick_ratio_check(lengths: &[u32]) -> bool {
        let total: u32 = lengths.iter().sum();
        if total < 7 {
            return false;
        }
        let outer = lengths[0].min(lengths[4]).max(1);
        lengths[2] >= outer * 2 && lengths[2] <= outer * 5
    }

    fn check_ratios(lengths: &[u32]) -> bool {
        let total: u32 = lengths.iter().sum();
        let unit = total as f32 / 7.0;
        let tolerance = unit / 2.0;
        lengths
            .iter()
            .zip([1.0f32, 1.0, 3.0, 1.0, 1.0])
            .all(|(&len, expected)| (len as f32 - expected * unit).abs() < tolerance * expected)
    }

    /// Re-measure the pattern through `(x, y)` along `axis`; returns its centre on that
    /// axis and the module size
    fn cross_check(matrix: &BitMatrix, x: usize, y: usize, axis: Axis) -> Option<(f32, f32)> {
        let line = match axis {
            Axis::Vertical => matrix.column(x),
            Axis::Horizontal => matrix.row(y),
        };
        let at = match axis {
            Axis::Vertical => y,
            Axis::Horizontal => x,
        };
        if !*line.get(at)? {
            return None;
        }
        let mut counts = [0u32; 5];
        let mut i = at as isize;
        // centre run and outward, walking back
        for (state, color) in [(2usize, true), (1, false), (0, true)] {
            while i >= 0 && line[i as usize] == color {
                counts[state] += 1;
                i -= 1;
            }
            if counts[state] == 0 {
                return None;
            }
        }
        let mut i = at as isize + 1;
        for (state, color) in [(2usize, true), (3, false), (4, true)] {
            let before = counts[state];
            while (i as usize) < line.len() && line[i as usize] == color {
                counts[state] += 1;
                i += 1;
            }
            if state != 2 && counts[state] == before {
                return None;
            }
        }
        if !Self::check_ratios(&counts) {
            return None;
        }
        let end = i as f32;
        let center = end - (counts[4] + counts[3]) as f32 - counts[2] as f32 / 2.0;
        Some((center, counts.iter().sum::<u32>() as f32 / 7.0))
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Vertical,
    Horizontal,
}

/// Order three finders as (top-left, top-right, bottom-left) and estimate the symbol side
///
/// The top-left finder sits at the right angle; the cross product sign puts the
/// other two clockwise.
pub(crate) fn order_finder_patterns(
    a: &FinderPattern,
    b: &FinderPattern,
    c: &FinderPattern,
) -> Option<(Point, Point, Point, usize)> {
    let patterns = [a, b, c];
    if patterns.iter().any(|p| p.module_size < 1.0) {
        return None;
    }
    let sizes = patterns.map(|p| p.module_size);
    let (min, max) = (
        sizes.iter().copied().fold(f32::INFINITY, f32::min),
        sizes.iter().copied().fold(0.0f32, f32::max),
    );
    if max > min * 1.5 {
        return None;
    }

    let mut best_idx = 0usize;
    let mut best_cos = f32::INFINITY;
    for i in 0..3 {
        let p = &patterns[i].center;
        let p1 = &patterns[(i + 1) % 3].center;
        let p2 = &patterns[(i + 2) % 3].center;
        let (v1x, v1y) = (p1.x - p.x, p1.y - p.y);
        let (v2x, v2y) = (p2.x - p.x, p2.y - p.y);
        let denom = (v1x * v1x + v1y * v1y).sqrt() * (v2x * v2x + v2y * v2y).sqrt();
        if denom == 0.0 {
            continue;
        }
        let cos = ((v1x * v2x + v1y * v2y) / denom).abs();
        if cos < best_cos {
            best_cos = cos;
            best_idx = i;
        }
    }
    // the corner angle must be roughly square
    if best_cos > 0.25 {
        return None;
    }

    let tl = patterns[best_idx];
    let p1 = patterns[(best_idx + 1) % 3];
    let p2 = patterns[(best_idx + 2) % 3];
    let (tr, bl) = if Point::cross(&tl.center, &p1.center, &p2.center) > 0.0 {
        (p1, p2)
    } else {
        (p2, p1)
    };

    let avg_module = sizes.iter().sum::<f32>() / 3.0;
    let d_tr = tl.center.distance(&tr.center);
    let d_bl = tl.center.distance(&bl.center);
    if (d_tr - d_bl).abs() > d_tr.max(d_bl) * 0.2 {
        return None;
    }
    let dimension = estimate_dimension((d_tr + d_bl) / 2.0, avg_module)?;
    Some((tl.center, tr.center, bl.center, dimension))
}

/// Nearest valid side length (4v + 17) for a finder-centre distance
pub(crate) fn estimate_dimension(distance: f32, module_size: f32) -> Option<usize> {
    let modules = (distance / module_size).round() as isize + 7;
    let dimension = match modules & 3 {
        0 => modules + 1,
        2 => modules - 1,
        3 => modules + 2,
        _ => modules,
    };
    (21..=177).contains(&dimension).then_some(dimension as usize)
}

/// Look for the alignment pattern's dark centre near `expected`
///
/// Scans rows within `radius` pixels for a light-dark-light 1:1:1 run whose dark run
/// is one module wide, then confirms it vertically.
pub(crate) fn find_alignment(
    matrix: &BitMatrix,
    expected: Point,
    module_size: f32,
    radius: f32,
) -> Option<Point> {
    let left = (expected.x - radius).max(0.0) as usize;
    let right = ((expected.x + radius) as usize).min(matrix.width().saturating_sub(1));
    let top = (expected.y - radius).max(0.0) as usize;
    let bottom = ((expected.y + radius) as usize).min(matrix.height().saturating_sub(1));
    if left >= right || top >= bottom {
        return None;
    }
    let near = |len: u32| (len as f32 - module_size).abs() < module_size / 2.0 + 1.0;

    let mut best: Option<(f32, Point)> = None;
    for y in top..=bottom {
        let bits: Vec<bool> = (left..=right).map(|x| matrix.get(x, y)).collect();
        let runs = RowRuns::from_bits(&bits);
        for i in runs.bar_indices() {
            let Some(w) = runs.window(i - 1, 3) else {
                break;
            };
            if !(near(w[0]) && near(w[1]) && near(w[2])) {
                continue;
            }
            let cx = left as f32 + runs.offset(i) as f32 + w[1] as f32 / 2.0;
            let column = matrix.column(cx as usize);
            let mut up = y;
            while up > 0 && column[up - 1] {
                up -= 1;
            }
            let mut down = y;
            while down + 1 < column.len() && column[down + 1] {
                down += 1;
            }
            if !near((down - up + 1) as u32) {
                continue;
            }
            let candidate = Point::new(cx, (up + down + 1) as f32 / 2.0);
            let distance = candidate.distance(&expected);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, candidate));
            }
        }
    }
    best.map(|(_, p)| p)
}
