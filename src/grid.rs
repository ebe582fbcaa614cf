/// A row-major 2D raster. Unlike a globe tilemap the viewport does not wrap:
/// every layer of a render pass (land mask, elevation, shading) is a `Grid`
/// of the same logical size.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) outside {}x{}", self.width, self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Mutable access to one row, used by span fills.
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.data
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Whether (x, y) has all four axis neighbours inside the grid.
    pub fn is_interior(&self, x: usize, y: usize) -> bool {
        x > 0 && y > 0 && x + 1 < self.width && y + 1 < self.height
    }
}

/// Downsampling for coarse comparisons between rasters of different sizes.
impl<T: Clone + Copy> Grid<T> {
    /// Nearest-neighbour resample to `width` x `height`, sampling cell centres.
    pub fn resample_nearest(&self, width: usize, height: usize) -> Grid<T> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let sy = (((y as f64 + 0.5) * self.height as f64 / height as f64) as usize).min(self.height - 1);
            for x in 0..width {
                let sx = (((x as f64 + 0.5) * self.width as f64 / width as f64) as usize).min(self.width - 1);
                data.push(self.data[sy * self.width + sx]);
            }
        }
        Grid { width, height, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_are_row_major() {
        let mut grid = Grid::new_with(4, 3, 0u8);
        grid.set(3, 1, 7);
        assert_eq!(*grid.get(3, 1), 7);
        assert_eq!(grid.values()[4 + 3], 7);
    }

    #[test]
    fn test_iter_reports_coordinates() {
        let grid: Grid<u8> = Grid::new(3, 2);
        let coords: Vec<(usize, usize)> = grid.iter().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(coords[0], (0, 0));
        assert_eq!(coords[4], (1, 1));
        assert_eq!(coords.len(), 6);
    }

    #[test]
    fn test_interior() {
        let grid: Grid<u8> = Grid::new(3, 3);
        assert!(grid.is_interior(1, 1));
        assert!(!grid.is_interior(0, 1));
        assert!(!grid.is_interior(1, 2));
    }

    #[test]
    fn test_resample_nearest_halves() {
        let mut grid = Grid::new_with(4, 4, 0u8);
        for y in 0..4 {
            for x in 2..4 {
                grid.set(x, y, 1);
            }
        }
        let small = grid.resample_nearest(2, 2);
        assert_eq!(small.values(), &[0, 1, 0, 1]);
    }
}
