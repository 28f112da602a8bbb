use super::function_mask::FunctionMask;
use crate::models::BitMatrix;

/// Data module coordinates in codeword order
///
/// Two-column strips are walked from the right edge, alternating upward and
/// downward; the vertical timing column is skipped.
pub(crate) fn data_positions(func: &FunctionMask) -> Vec<(usize, usize)> {
    let size = func.size();
    let mut positions = Vec::with_capacity(func.data_modules_count());
    let mut right = size as isize - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        let upward = ((right + 1) & 2) == 0;
        for vert in 0..size {
            let y = if upward { size - 1 - vert } else { vert };
            for j in 0..2 {
                let x = (right - j) as usize;
                if !func.is_function(x, y) {
                    positions.push((x, y));
                }
            }
        }
        right -= 2;
    }
    positions
}

/// Write codewords MSB first; leftover modules stay light
pub(crate) fn place_codewords(matrix: &mut BitMatrix, codewords: &[u8], func: &FunctionMask) {
    for (i, (x, y)) in data_positions(func).into_iter().enumerate() {
        let Some(&byte) = codewords.get(i / 8) else {
            break;
        };
        matrix.set(x, y, (byte >> (7 - i % 8)) & 1 == 1);
    }
}

/// Read every whole codeword back out of an unmasked matrix
pub(crate) fn read_codewords(matrix: &BitMatrix, func: &FunctionMask) -> Vec<u8> {
    let positions = data_positions(func);
    positions
        .chunks_exact(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |acc, &(x, y)| (acc << 1) | matrix.get(x, y) as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_starts_bottom_right() {
        let func = FunctionMask::new(1);
        let positions = data_positions(&func);
        assert_eq!(&positions[..4], &[(20, 20), (19, 20), (20, 19), (19, 19)]);
        assert_eq!(positions.len(), 208);
        assert!(positions.iter().all(|&(x, _)| x != 6));
    }

    #[test]
    fn test_place_then_read() {
        let func = FunctionMask::new(5);
        let codewords: Vec<u8> = (0..134u32).map(|i| (i * 37 + 11) as u8).collect();
        let mut matrix = BitMatrix::square(func.size());
        place_codewords(&mut matrix, &codewords, &func);
        assert_eq!(read_codewords(&matrix, &func), codewords);
    }
}
