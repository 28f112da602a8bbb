//! Connected dark components of a bitmap (8-connectivity).

use crate::models::BitMatrix;
use std::collections::HashMap;

/// Bounding box of one dark component, inclusive pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentBox {
    /// Leftmost column
    pub left: usize,
    /// Topmost row
    pub top: usize,
    /// Rightmost column
    pub right: usize,
    /// Bottom row
    pub bottom: usize,
    /// Dark pixels in the component
    pub pixels: usize,
}

impl ComponentBox {
    /// Width in pixels
    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }
}

/// Union-find over provisional labels
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        // label 0 is background
        Self { parent: vec![0] }
    }

    fn make(&mut self) -> u32 {
        let label = self.parent.len() as u32;
        self.parent.push(label);
        label
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    fn union(&mut self, x: u32, y: u32) {
        let (rx, ry) = (self.find(x), self.find(y));
        if rx != ry {
            self.parent[rx.max(ry) as usize] = rx.min(ry);
        }
    }
}

/// Label dark components and return their bounding boxes, largest area first
pub fn dark_components(matrix: &BitMatrix) -> Vec<ComponentBox> {
    let (width, height) = (matrix.width(), matrix.height());
    let mut labels = vec![0u32; width * height];
    let mut uf = UnionFind::new();

    for y in 0..height {
        for x in 0..width {
            if !matrix.get(x, y) {
                continue;
            }
            let mut neighbours = [0u32; 4];
            if x > 0 {
                neighbours[0] = labels[y * width + x - 1];
            }
            if y > 0 {
                neighbours[1] = labels[(y - 1) * width + x];
                if x > 0 {
                    neighbours[2] = labels[(y - 1) * width + x - 1];
                }
                if x + 1 < width {
                    neighbours[3] = labels[(y - 1) * width + x + 1];
                }
            }
            let label = match neighbours.iter().copied().filter(|&l| l != 0).min() {
                Some(min) => {
                    for &l in neighbours.iter().filter(|&&l| l != 0 && l != min) {
                        uf.union(min, l);
                    }
                    min
                }
                None => uf.make(),
            };
            labels[y * width + x] = label;
        }
    }

    let mut boxes: HashMap<u32, ComponentBox> = HashMap::new();
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x];
            if label == 0 {
                continue;
            }
            let root = uf.find(label);
            let entry = boxes.entry(root).or_insert(ComponentBox {
                left: x,
                top: y,
                right: x,
                bottom: y,
                pixels: 0,
            });
            entry.left = entry.left.min(x);
            entry.top = entry.top.min(y);
            entry.right = entry.right.max(x);
            entry.bottom = entry.bottom.max(y);
            entry.pixels += 1;
        }
    }

    let mut out: Vec<ComponentBox> = boxes.into_values().collect();
    out.sort_by_key(|b| (std::cmp::Reverse(b.width() * b.height()), b.top, b.left));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_square() {
        let mut matrix = BitMatrix::new(10, 10);
        matrix.set_region(2, 2, 2, 2);
        let regions = dark_components(&matrix);
        assert_eq!(regions.len(), 1);
        let b = regions[0];
        assert_eq!((b.left, b.top, b.right, b.bottom, b.pixels), (2, 2, 3, 3, 4));
    }

    #[test]
    fn test_diagonal_neighbours_join() {
        let mut matrix = BitMatrix::new(6, 6);
        for i in 0..5 {
            matrix.set(i, i, true);
        }
        // anti-diagonal touching only through the upper-right neighbour
        matrix.set(5, 0, true);
        matrix.set(4, 1, true);
        matrix.set(3, 2, true);
        let regions = dark_components(&matrix);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].width(), 6);
    }

    #[test]
    fn test_u_shape_merges_late() {
        // two arms only meet on the bottom row
        let mut matrix = BitMatrix::new(7, 5);
        matrix.set_region(0, 0, 1, 5);
        matrix.set_region(6, 0, 1, 5);
        matrix.set_region(0, 4, 7, 1);
        matrix.set_region(3, 0, 1, 2);
        let regions = dark_components(&matrix);
        assert_eq!(regions.len(), 2);
        assert_eq!((regions[0].width(), regions[0].height()), (7, 5));
        assert_eq!(regions[1].pixels, 2);
    }
}
