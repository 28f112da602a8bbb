//! Bullseye location by scanning for seven equal runs between two dark rings

use crate::linear::RowRuns;
use crate::models::{BitMatrix, Point};

/// Runs from the centre module out to the third light ring, on both sides
const INNER_RUNS: usize = 7;

/// Centre and module size of one bullseye
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bullseye {
    pub center: Point,
    pub module_width: f32,
    pub module_height: f32,
    count: usize,
}

impl Bullseye {
    pub(crate) fn module_size(&self) -> f32 {
        (self.module_width + self.module_height) / 2.0
    }

    fn about_equals(&self, other: &Bullseye) -> bool {
        let tolerance = self.module_size().max(other.module_size()) * 2.0;
        (self.center.x - other.center.x).abs() <= tolerance
            && (self.center.y - other.center.y).abs() <= tolerance
    }

    fn combine(&mut self, other: &Bullseye) {
        let total = (self.count + other.count) as f32;
        let (a, b) = (self.count as f32 / total, other.count as f32 / total);
        self.center = Point::new(
            self.center.x * a + other.center.x * b,
            self.center.y * a + other.center.y * b,
        );
        self.module_width = self.module_width * a + other.module_width * b;
        self.module_height = self.module_height * a + other.module_height * b;
        self.count += other.count;
    }
}

/// Inner runs of equal width flanked by dark runs at least half a module wide
fn ring_ratios(inner: &[u32], left: u32, right: u32) -> bool {
    let total: u32 = inner.iter().sum();
    if total < INNER_RUNS as u32 {
        return false;
    }
    let unit = total as f32 / INNER_RUNS as f32;
    let tolerance = unit / 2.0;
    inner.iter().all(|&len| (len as f32 - unit).abs() < tolerance)
        && left as f32 >= tolerance
        && right as f32 >= tolerance
}

/// Re-measure the rings through `at` on one line; returns the centre and module size
fn cross_check(line: &[bool], at: usize) -> Option<(f32, f32)> {
    if !*line.get(at)? {
        return None;
    }
    let mut inner = [0u32; INNER_RUNS];
    let centre = INNER_RUNS / 2;
    let mut i = at as isize;
    for state in (0..=centre).rev() {
        let color = (centre - state) % 2 == 0;
        while i >= 0 && line[i as usize] == color {
            inner[state] += 1;
            i -= 1;
        }
        if inner[state] == 0 {
            return None;
        }
    }
    let start = (i + 1) as usize;
    let mut left = 0;
    while i >= 0 && line[i as usize] {
        left += 1;
        i -= 1;
    }

    let mut j = at + 1;
    for state in centre..INNER_RUNS {
        let color = (state - centre) % 2 == 0;
        let before = inner[state];
        while j < line.len() && line[j] == color {
            inner[state] += 1;
            j += 1;
        }
        if state != centre && inner[state] == before {
            return None;
        }
    }
    let end = j;
    let mut right = 0;
    while j < line.len() && line[j] {
        right += 1;
        j += 1;
    }
    if !ring_ratios(&inner, left, right) {
        return None;
    }
    Some(((start + end) as f32 / 2.0, (end - start) as f32 / INNER_RUNS as f32))
}

fn scan_row(bitmap: &BitMatrix, y: usize) -> Vec<Bullseye> {
    let runs = RowRuns::from_bits(&bitmap.row(y));
    let mut candidates = Vec::new();
    for i in runs.bar_indices() {
        let Some(window) = runs.window(i, INNER_RUNS + 2) else {
            break;
        };
        if !ring_ratios(&window[1..=INNER_RUNS], window[0], window[INNER_RUNS + 1]) {
            continue;
        }
        let x = runs.offset(i + 1) as f32 + runs.span(i + 1, 3) as f32 + window[4] as f32 / 2.0;
        if let Some(bullseye) = measure(bitmap, Point::new(x, y as f32)) {
            candidates.push(bullseye);
        }
    }
    candidates
}

/// Confirm a bullseye near `guess` and refine its centre along both axes
pub(crate) fn measure(bitmap: &BitMatrix, guess: Point) -> Option<Bullseye> {
    let (x, y) = (guess.x as usize, guess.y as usize);
    let (cy, _) = cross_check(&bitmap.column(x), y)?;
    let (cx, width) = cross_check(&bitmap.row(cy as usize), x)?;
    let (cy, height) = cross_check(&bitmap.column(cx as usize), cy as usize)?;
    Some(Bullseye {
        center: Point::new(cx, cy),
        module_width: width,
        module_height: height,
        count: 1,
    })
}

/// Bullseye candidates, most frequently confirmed first
pub(crate) fn detect(bitmap: &BitMatrix, try_harder: bool) -> Vec<Bullseye> {
    let height = bitmap.height();
    let row_step = if try_harder { 1 } else { (3 * height / 388).max(1) };
    let mut merged: Vec<Bullseye> = Vec::new();
    for y in (0..height).step_by(row_step) {
        for candidate in scan_row(bitmap, y) {
            match merged.iter_mut().find(|m| m.about_equals(&candidate)) {
                Some(existing) => existing.combine(&candidate),
                None => merged.push(candidate),
            }
        }
    }
    merged.sort_by(|a, b| b.count.cmp(&a.count));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_rings(bitmap: &mut BitMatrix, cx: usize, cy: usize, unit: usize) {
        for ring in (0..5).step_by(2) {
            let r = ring * unit;
            let side = (2 * ring + 1) * unit;
            bitmap.set_region(cx - r, cy - r, side, unit);
            bitmap.set_region(cx - r, cy + r, side, unit);
            bitmap.set_region(cx - r, cy - r, unit, side);
            bitmap.set_region(cx + r, cy - r, unit, side);
        }
    }

    #[test]
    fn test_cross_check_line() {
        // dark ring, then 7 unit runs, then dark ring
        let mut line = vec![false; 4];
        for (i, n) in [3usize, 2, 2, 2, 2, 2, 2, 2, 3].iter().enumerate() {
            line.extend(std::iter::repeat_n(i % 2 == 0, *n));
        }
        line.extend([false; 4]);
        let (center, unit) = cross_check(&line, 14).unwrap();
        assert_eq!(center, 14.0);
        assert_eq!(unit, 2.0);
        assert!(cross_check(&line, 12).is_none());
    }

    #[test]
    fn test_finds_drawn_rings() {
        let mut bitmap = BitMatrix::new(80, 80);
        draw_rings(&mut bitmap, 40, 36, 3);
        let found = detect(&bitmap, false);
        assert_eq!(found.len(), 1);
        let b = found[0];
        assert!((b.center.x - 41.5).abs() < 1.0 && (b.center.y - 37.5).abs() < 1.0);
        assert!((b.module_size() - 3.0).abs() < 0.5);
    }

    #[test]
    fn test_ignores_plain_stripes() {
        let mut bitmap = BitMatrix::new(60, 60);
        for x in (0..60).step_by(4) {
            bitmap.set_region(x, 0, 2, 60);
        }
        assert!(detect(&bitmap, true).is_empty());
    }
}
