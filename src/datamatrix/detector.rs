//! Data Matrix location: a dark component whose box has two solid adjacent edges
//! (the finder L) and two alternating edges (the timing pattern).

use super::symbol::SymbolSize;
use crate::models::{BitMatrix, Locator, Point, Region};
use crate::utils::components::{ComponentBox, dark_components};

/// Components examined per image, largest first
const MAX_CANDIDATES: usize = 24;
const MIN_SIDE: usize = 8;
const SOLID: f32 = 0.9;
/// Timing edges are roughly half dark
const TIMING_MAX: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Top,
    Right,
    Bottom,
}

/// Fraction of dark pixels on the edge line `offset` pixels inside the box
fn edge_darkness(bitmap: &BitMatrix, b: &ComponentBox, side: Side, offset: usize) -> f32 {
    let line = edge_line(bitmap, b, side, offset);
    line.iter().filter(|&&d| d).count() as f32 / line.len().max(1) as f32
}

fn edge_line(bitmap: &BitMatrix, b: &ComponentBox, side: Side, offset: usize) -> Vec<bool> {
    match side {
        Side::Left => (b.top..=b.bottom).map(|y| bitmap.get(b.left + offset, y)).collect(),
        Side::Right => (b.top..=b.bottom).map(|y| bitmap.get(b.right - offset, y)).collect(),
        Side::Top => (b.left..=b.right).map(|x| bitmap.get(x, b.top + offset)).collect(),
        Side::Bottom => (b.left..=b.right).map(|x| bitmap.get(x, b.bottom - offset)).collect(),
    }
}

fn dark_runs(line: &[bool]) -> usize {
    let mut runs = 0;
    let mut previous = false;
    for &d in line {
        if d && !previous {
            runs += 1;
        }
        previous = d;
    }
    runs
}

/// Solid L sides and the quarter turns that bring them to the left and bottom
fn finder_orientation(bitmap: &BitMatrix, b: &ComponentBox) -> Option<(Side, Side, usize)> {
    let dark = |side| edge_darkness(bitmap, b, side, 0);
    let (left, top, right, bottom) = (dark(Side::Left), dark(Side::Top), dark(Side::Right), dark(Side::Bottom));
    let solid = |v: f32| v >= SOLID;
    let timing = |v: f32| v <= TIMING_MAX && v > 0.1;
    // (vertical solid side, horizontal solid side, turns)
    let options = [
        (Side::Left, Side::Bottom, 0, left, bottom, right, top),
        (Side::Left, Side::Top, 3, left, top, right, bottom),
        (Side::Right, Side::Top, 2, right, top, left, bottom),
        (Side::Right, Side::Bottom, 1, right, bottom, left, top),
    ];
    options
        .into_iter()
        .find(|&(_, _, _, v, h, ov, oh)| solid(v) && solid(h) && timing(ov) && timing(oh))
        .map(|(v, h, turns, ..)| (v, h, turns))
}

fn opposite(side: Side) -> Side {
    match side {
        Side::Left => Side::Right,
        Side::Right => Side::Left,
        Side::Top => Side::Bottom,
        Side::Bottom => Side::Top,
    }
}

/// Module counts across (cols) and down (rows) from the timing edges
fn count_modules(bitmap: &BitMatrix, b: &ComponentBox, vertical: Side, horizontal: Side) -> (usize, usize) {
    let across = opposite(horizontal);
    let down = opposite(vertical);
    let cols = 2 * dark_runs(&edge_line(bitmap, b, across, 0));
    let rows = 2 * dark_runs(&edge_line(bitmap, b, down, 0));
    if cols == 0 || rows == 0 {
        return (cols, rows);
    }
    // recount through the middle of the timing modules
    let inset_y = b.height() / rows / 2;
    let inset_x = b.width() / cols / 2;
    let cols_mid = 2 * dark_runs(&edge_line(bitmap, b, across, inset_y));
    let rows_mid = 2 * dark_runs(&edge_line(bitmap, b, down, inset_x));
    if cols_mid == cols && rows_mid == rows {
        (cols, rows)
    } else {
        (cols_mid.max(cols), rows_mid.max(rows))
    }
}

/// Region for one component box, if it carries a Data Matrix border
pub(crate) fn locate(bitmap: &BitMatrix, b: &ComponentBox) -> Option<Region> {
    if b.width() < MIN_SIDE || b.height() < MIN_SIDE {
        return None;
    }
    let (vertical, horizontal, quarter_turns) = finder_orientation(bitmap, b)?;
    let (cols, rows) = count_modules(bitmap, b, vertical, horizontal);
    let (canonical_rows, canonical_cols) = if quarter_turns % 2 == 1 { (cols, rows) } else { (rows, cols) };
    SymbolSize::lookup(canonical_rows, canonical_cols)?;

    let module_width = b.width() as f32 / cols as f32;
    let module_height = b.height() as f32 / rows as f32;
    if module_width < 1.0 || module_height < 1.0 {
        return None;
    }
    let (l, t) = (b.left as f32, b.top as f32);
    let (r, bt) = ((b.right + 1) as f32, (b.bottom + 1) as f32);
    Some(Region::new(
        [Point::new(l, t), Point::new(r, t), Point::new(r, bt), Point::new(l, bt)],
        (module_width + module_height) / 2.0,
        Locator::Border {
            origin: Point::new(l, t),
            module_width,
            module_height,
            cols,
            rows,
            quarter_turns,
        },
    ))
}

/// Candidate regions: the dark extent first when `pure`, then the largest components
pub(crate) fn detect(bitmap: &BitMatrix, pure: bool) -> Vec<Region> {
    let mut regions = Vec::new();
    if pure {
        if let Some((left, top, right, bottom)) = bitmap.dark_extent() {
            let extent = ComponentBox {
                left,
                top,
                right,
                bottom,
                pixels: 0,
            };
            regions.extend(locate(bitmap, &extent));
        }
    }
    for b in dark_components(bitmap).iter().take(MAX_CANDIDATES) {
        if let Some(region) = locate(bitmap, b) {
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
    }
    regions
}
