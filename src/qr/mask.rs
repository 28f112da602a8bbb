//! The eight data masks and the penalty score used to choose between them.

use super::function_mask::FunctionMask;
use crate::models::BitMatrix;

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// Whether mask `pattern` inverts the module at column `x`, row `y`
pub(crate) fn is_masked(pattern: u8, x: usize, y: usize) -> bool {
    match pattern {
        0 => (x + y) % 2 == 0,
        1 => y % 2 == 0,
        2 => x % 3 == 0,
        3 => (x + y) % 3 == 0,
        4 => (x / 3 + y / 2) % 2 == 0,
        5 => x * y % 2 + x * y % 3 == 0,
        6 => (x * y % 2 + x * y % 3) % 2 == 0,
        _ => ((x + y) % 2 + x * y % 3) % 2 == 0,
    }
}

/// XOR the mask over every data module; applying it twice restores the matrix
pub(crate) fn apply_mask(matrix: &mut BitMatrix, pattern: u8, func: &FunctionMask) {
    let size = func.size();
    for y in 0..size {
        for x in 0..size {
            if !func.is_function(x, y) && is_masked(pattern, x, y) {
                matrix.toggle(x, y);
            }
        }
    }
}

/// Penalty score over the finished symbol: runs, blocks, finder look-alikes and balance
pub(crate) fn penalty(matrix: &BitMatrix) -> u32 {
    let size = matrix.width();
    let mut score = 0;

    for y in 0..size {
        score += line_penalty(&matrix.row(y));
    }
    for x in 0..size {
        score += line_penalty(&matrix.column(x));
    }

    for y in 0..size.saturating_sub(1) {
        for x in 0..size.saturating_sub(1) {
            let c = matrix.get(x, y);
            if c == matrix.get(x + 1, y) && c == matrix.get(x, y + 1) && c == matrix.get(x + 1, y + 1)
            {
                score += PENALTY_N2;
            }
        }
    }

    let total = (size * size) as u32;
    let dark = matrix.count_ones() as u32;
    // smallest k with |dark/total - 1/2| <= (k+1)/20
    let k = ((dark * 20).abs_diff(total * 10)).div_ceil(total).saturating_sub(1);
    score + k * PENALTY_N4
}

/// Same-colour runs of five or more plus 1:1:3:1:1 patterns with four light modules on a side
fn line_penalty(line: &[bool]) -> u32 {
    let mut score = 0;
    let mut run = 0usize;
    let mut prev = None;
    for &m in line {
        if Some(m) == prev {
            run += 1;
        } else {
            if run >= 5 {
                score += PENALTY_N1 + (run as u32 - 5);
            }
            run = 1;
            prev = Some(m);
        }
    }
    if run >= 5 {
        score += PENALTY_N1 + (run as u32 - 5);
    }

    const CORE: [bool; 7] = [true, false, true, true, true, false, true];
    let light = |range: std::ops::Range<isize>| {
        range.into_iter().all(|i| {
            i < 0 || i as usize >= line.len() || !line[i as usize]
        })
    };
    for start in 0..line.len().saturating_sub(6) {
        if line[start..start + 7] == CORE {
            let s = start as isize;
            if light(s - 4..s) || light(s + 7..s + 11) {
                score += PENALTY_N3;
            }
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_patterns_at_origin() {
        for pattern in 0..8 {
            assert!(is_masked(pattern, 0, 0), "pattern {pattern}");
        }
        assert!(!is_masked(1, 0, 1));
        assert!(is_masked(2, 3, 1));
        assert!(!is_masked(4, 3, 0));
    }

    #[test]
    fn test_apply_mask_is_an_involution() {
        let func = FunctionMask::new(2);
        let mut matrix = BitMatrix::square(func.size());
        apply_mask(&mut matrix, 3, &func);
        assert!(matrix.count_ones() > 0);
        assert!(!matrix.get(0, 0));
        apply_mask(&mut matrix, 3, &func);
        assert_eq!(matrix.count_ones(), 0);
    }

    #[test]
    fn test_line_penalty() {
        assert_eq!(line_penalty(&[true; 5]), 3);
        assert_eq!(line_penalty(&[true; 7]), 5);
        assert_eq!(line_penalty(&[true, false, true, false]), 0);
        let finder = [
            false, false, false, false, true, false, true, true, true, false, true,
        ];
        assert_eq!(line_penalty(&finder), 40);
    }

    #[test]
    fn test_balanced_checkerboard_scores_low() {
        let mut matrix = BitMatrix::square(10);
        for y in 0..10 {
            for x in 0..10 {
                matrix.set(x, y, (x + y) % 2 == 0);
            }
        }
        assert_eq!(penalty(&matrix), 0);
        matrix.clear();
        assert!(penalty(&matrix) > 90);
    }
}
