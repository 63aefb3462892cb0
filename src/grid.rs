/// Row-major flat grid. No per-cell objects, f32 friendly.
/// Terrain grids are square, but the type itself only tracks width and height.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy> Grid<T> {
    /// Wrap an existing row-major buffer. Returns None if the length does not match.
    pub fn from_vec(w: usize, h: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != w * h {
            return None;
        }
        Some(Self { data, w, h })
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Grid<f32> {
    /// (min, max) over all cells. Returns (inf, -inf) for an empty grid.
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_row_major() {
        let g = Grid::from_vec(3, 2, vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 7.0]).unwrap();
        assert_eq!(g.idx(2, 1), 5);
        assert_eq!(g.get(2, 1), 7.0);
        assert_eq!(g.get(0, 1), 3.0);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Grid::from_vec(2, 2, vec![0.0f32; 3]).is_none());
        let g = Grid::from_vec(2, 2, vec![1.0f32, -2.0, 3.0, 0.5]).unwrap();
        assert_eq!(g.min_max(), (-2.0, 3.0));
    }
}
