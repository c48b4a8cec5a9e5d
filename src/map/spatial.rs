use std::collections::HashMap;

/// Spatial hash grid over screen pixels, used to pick the marker under the cursor
#[derive(Clone, Debug)]
pub struct SpatialGrid<T> {
    /// Item indices per (cell_x, cell_y)
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Items with their pixel positions
    items: Vec<(i32, i32, T)>,
    /// Cell size in pixels
    cell_size: i32,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: i32) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size: cell_size.max(1),
        }
    }

    #[inline(always)]
    fn to_cell(&self, x: i32, y: i32) -> (i32, i32) {
        (x.div_euclid(self.cell_size), y.div_euclid(self.cell_size))
    }

    pub fn insert(&mut self, x: i32, y: i32, item: T) {
        let idx = self.items.len();
        self.items.push((x, y, item));
        let cell = self.to_cell(x, y);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Closest item within `radius` pixels, with its distance. Later
    /// insertions win ties, so items drawn on top are picked first.
    pub fn nearest(&self, x: i32, y: i32, radius: i32) -> Option<(&T, f64)> {
        let (cx, cy) = self.to_cell(x, y);
        let reach = (radius + self.cell_size - 1) / self.cell_size;
        let max_d2 = i64::from(radius) * i64::from(radius);

        let mut best: Option<(i64, usize)> = None;
        for gy in cy - reach..=cy + reach {
            for gx in cx - reach..=cx + reach {
                let Some(indices) = self.cells.get(&(gx, gy)) else {
                    continue;
                };
                for &idx in indices {
                    let (ix, iy, _) = &self.items[idx];
                    let dx = i64::from(ix - x);
                    let dy = i64::from(iy - y);
                    let d2 = dx * dx + dy * dy;
                    if d2 > max_d2 {
                        continue;
                    }
                    match best {
                        Some((bd, bi)) if d2 > bd || (d2 == bd && idx < bi) => {}
                        _ => best = Some((d2, idx)),
                    }
                }
            }
        }

        best.map(|(d2, idx)| (&self.items[idx].2, (d2 as f64).sqrt()))
    }

    /// Pixel position of the first item matching `pred`
    pub fn position_of(&self, mut pred: impl FnMut(&T) -> bool) -> Option<(i32, i32)> {
        self.items
            .iter()
            .find(|(_, _, item)| pred(item))
            .map(|&(x, y, _)| (x, y))
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for SpatialGrid<T> {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_within_radius() {
        let mut grid = SpatialGrid::new(8);
        grid.insert(10, 10, "a");
        grid.insert(30, 10, "b");
        grid.insert(-5, -5, "c");
        assert_eq!(grid.nearest(13, 14, 6), Some((&"a", 5.0)));
        assert_eq!(grid.nearest(27, 12, 6).map(|h| h.0), Some(&"b"));
        assert_eq!(grid.nearest(-3, -4, 6).map(|h| h.0), Some(&"c"));
        assert_eq!(grid.nearest(20, 10, 6), None);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_nearest_across_cells() {
        let mut grid = SpatialGrid::new(4);
        grid.insert(0, 0, 1);
        grid.insert(40, 0, 2);
        assert_eq!(grid.nearest(9, 0, 10).map(|h| h.0), Some(&1));
        assert_eq!(grid.nearest(31, 0, 10).map(|h| h.0), Some(&2));
    }

    #[test]
    fn test_topmost_wins_ties() {
        let mut grid = SpatialGrid::new(8);
        grid.insert(5, 5, "under");
        grid.insert(5, 5, "over");
        assert_eq!(grid.nearest(5, 5, 2), Some((&"over", 0.0)));
        assert_eq!(grid.position_of(|s| *s == "under"), Some((5, 5)));
    }

    #[test]
    fn test_empty() {
        let grid: SpatialGrid<u8> = SpatialGrid::default();
        assert!(grid.is_empty());
        assert_eq!(grid.nearest(0, 0, 100), None);
    }
}
