use crate::{Scalar, Vec3};
use itertools::iproduct;
use na::Vector3;
use smallvec::SmallVec;

/// A single grid cell, holding the indices of the particles whose predicted
/// positions fall inside it.
///
/// A `SmallVec` is used to prevent unnecessary allocation.
type GridCell = SmallVec<[usize; 4]>;

/// A 3d cell coordinate composed of 3 integers.
pub type Coord = Vector3<usize>;

/// Uniform bucket grid used to accelerate neighbor finding. Rebuilt from
/// scratch every step: `clear` + `insert` for each particle, then `neighbors`
/// queries against the positions the grid was built from.
///
/// `neighbors` only scans the 3x3x3 cell block around the query particle, so
/// results match a brute-force all-pairs scan only while the query radius is
/// no larger than one cell width (`1 / size`).
pub struct Grid {
    cells: Vec<GridCell>,
    size: usize,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "grid size must be positive");
        Grid {
            cells: vec![GridCell::new(); size * size * size],
            size,
        }
    }

    /// Empties every bucket, keeping the allocations for the next rebuild.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Maps a position in the unit domain to a cell coordinate. Indices are
    /// clamped to `[0, size - 1]`, so positions on the upper domain boundary
    /// land in the last cell rather than out of bounds.
    pub fn cell_of(&self, p: Vec3) -> Coord {
        let scale = self.size as Scalar;
        let axis = |x: Scalar| -> usize {
            let i = (x * scale).floor() as isize;
            i.max(0).min(self.size as isize - 1) as usize
        };
        Coord::new(axis(p.x), axis(p.y), axis(p.z))
    }

    pub fn insert(&mut self, index: usize, position: Vec3) {
        let coord = self.cell_of(position);
        let cell = self.coord_to_index(coord);
        self.cells[cell].push(index);
    }

    /// Returns every particle other than `i` whose distance to
    /// `positions[i]` is strictly less than `radius`.
    pub fn neighbors(&self, i: usize, positions: &[Vec3], radius: Scalar) -> Vec<usize> {
        let coord = self.cell_of(positions[i]);
        let hi = |x: usize| (x + 1).min(self.size - 1);

        iproduct!(
            coord.x.saturating_sub(1)..=hi(coord.x),
            coord.y.saturating_sub(1)..=hi(coord.y),
            coord.z.saturating_sub(1)..=hi(coord.z)
        )
        .flat_map(|(x, y, z)| {
            self.cells[self.coord_to_index(Coord::new(x, y, z))]
                .iter()
                .copied()
        })
        .filter(|&j| j != i && (positions[i] - positions[j]).magnitude() < radius)
        .collect()
    }

    fn coord_to_index(&self, i: Coord) -> usize {
        i.x + self.size * i.y + self.size * self.size * i.z
    }
}
