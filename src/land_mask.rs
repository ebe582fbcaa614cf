//! Land/ocean classification raster.
//!
//! Each land mass outline is projected into pixel space and filled with a
//! scanline even-odd rule, sampling pixel centres. Outlines are filled in
//! catalog order; the fixed geography has disjoint land masses, so overlap
//! handling (a later fill simply overwrites) never matters in practice.
//! Self-intersecting outlines are not repaired.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::projection::{GeoBounds, GeoPoint};

/// Identifier of a land mass within a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LandMassId(pub u8);

/// Classification of one mask pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaskCell {
    #[default]
    Ocean,
    Land(LandMassId),
}

impl MaskCell {
    pub fn is_land(&self) -> bool {
        matches!(self, MaskCell::Land(_))
    }
}

pub type LandMask = Grid<MaskCell>;

/// Rasterize land mass outlines into a mask of `width` x `height` pixels.
pub fn rasterize(
    land_masses: &[(&[GeoPoint], LandMassId)],
    bounds: &GeoBounds,
    width: usize,
    height: usize,
) -> LandMask {
    let mut mask = LandMask::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }

    for &(outline, id) in land_masses {
        let polygon: Vec<(f64, f64)> = outline
            .iter()
            .map(|p| bounds.to_pixel(*p, width as f64, height as f64))
            .collect();
        fill_polygon(&mut mask, &polygon, MaskCell::Land(id));
    }

    mask
}

/// Even-odd scanline fill. A pixel is inside when its centre is.
fn fill_polygon(mask: &mut LandMask, polygon: &[(f64, f64)], value: MaskCell) {
    let n = polygon.len();
    if n < 3 {
        return;
    }

    let (min_y, max_y) = polygon.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &(_, y)| {
        (lo.min(y), hi.max(y))
    });
    let first_row = (min_y - 0.5).ceil().max(0.0) as usize;
    let last_row = ((max_y - 0.5).floor().min(mask.height as f64 - 1.0)).max(-1.0);
    if last_row < 0.0 {
        return;
    }
    let last_row = last_row as usize;

    let width = mask.width;
    let mut crossings: Vec<f64> = Vec::with_capacity(16);

    for row in first_row..=last_row {
        let yc = row as f64 + 0.5;
        crossings.clear();

        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = polygon[i];
            let (xj, yj) = polygon[j];
            // Half-open rule: vertices on the scanline are counted once
            if (yi > yc) != (yj > yc) {
                crossings.push(xi + (yc - yi) * (xj - xi) / (yj - yi));
            }
            j = i;
        }

        crossings.sort_by(|a, b| a.total_cmp(b));

        let row_cells = mask.row_mut(row);
        for pair in crossings.chunks_exact(2) {
            // Pixels whose centre x + 0.5 lies in [start, end)
            let start = (pair[0] - 0.5).ceil().max(0.0);
            let end = (pair[1] - 0.5).ceil().min(width as f64);
            if end <= start {
                continue;
            }
            for cell in &mut row_cells[start as usize..end as usize] {
                *cell = value;
            }
        }
    }
}

/// Number of pixels per classification, ocean first then land masses by id.
pub fn cell_counts(mask: &LandMask) -> (usize, Vec<(LandMassId, usize)>) {
    let mut ocean = 0;
    let mut land: Vec<(LandMassId, usize)> = Vec::new();
    for cell in mask.values() {
        match cell {
            MaskCell::Ocean => ocean += 1,
            MaskCell::Land(id) => match land.iter_mut().find(|(other, _)| other == id) {
                Some((_, count)) => *count += 1,
                None => land.push((*id, 1)),
            },
        }
    }
    land.sort_by_key(|(id, _)| *id);
    (ocean, land)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> GeoBounds {
        GeoBounds::new(0.0, 1.0, 0.0, 1.0).unwrap()
    }

    fn left_half_square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 0.5),
            GeoPoint::new(0.0, 0.5),
        ]
    }

    #[test]
    fn test_left_half_square_fills_exactly_left_half() {
        let square = left_half_square();
        let mask = rasterize(&[(square.as_slice(), LandMassId(1))], &unit_bounds(), 100, 100);
        for (x, _, cell) in mask.iter() {
            if x < 50 {
                assert_eq!(*cell, MaskCell::Land(LandMassId(1)));
            } else {
                assert_eq!(*cell, MaskCell::Ocean);
            }
        }
    }

    #[test]
    fn test_every_cell_in_closed_set() {
        let a = vec![
            GeoPoint::new(0.1, 0.1),
            GeoPoint::new(0.4, 0.2),
            GeoPoint::new(0.3, 0.45),
        ];
        let b = vec![
            GeoPoint::new(0.6, 0.6),
            GeoPoint::new(0.9, 0.7),
            GeoPoint::new(0.8, 0.95),
            GeoPoint::new(0.55, 0.9),
        ];
        let mask = rasterize(&[(a.as_slice(), LandMassId(1)), (b.as_slice(), LandMassId(2))], &unit_bounds(), 64, 48);
        assert_eq!(mask.len(), 64 * 48);
        let allowed = [MaskCell::Ocean, MaskCell::Land(LandMassId(1)), MaskCell::Land(LandMassId(2))];
        assert!(mask.values().iter().all(|c| allowed.contains(c)));

        let (ocean, land) = cell_counts(&mask);
        assert!(ocean > 0);
        assert_eq!(land.len(), 2);
        assert_eq!(ocean + land.iter().map(|(_, c)| c).sum::<usize>(), 64 * 48);
    }

    #[test]
    fn test_outline_outside_bounds_is_clipped() {
        let big = vec![
            GeoPoint::new(-5.0, -5.0),
            GeoPoint::new(5.0, -5.0),
            GeoPoint::new(5.0, 5.0),
            GeoPoint::new(-5.0, 5.0),
        ];
        let mask = rasterize(&[(big.as_slice(), LandMassId(3))], &unit_bounds(), 10, 10);
        assert!(mask.values().iter().all(|c| c.is_land()));
    }

    #[test]
    fn test_degenerate_outline_fills_nothing() {
        let line = vec![GeoPoint::new(0.2, 0.2), GeoPoint::new(0.8, 0.8)];
        let mask = rasterize(&[(line.as_slice(), LandMassId(1))], &unit_bounds(), 20, 20);
        assert!(mask.values().iter().all(|c| *c == MaskCell::Ocean));
    }

    #[test]
    fn test_zero_size_mask() {
        let square = left_half_square();
        let mask = rasterize(&[(square.as_slice(), LandMassId(1))], &unit_bounds(), 0, 10);
        assert!(mask.is_empty());
    }
}
