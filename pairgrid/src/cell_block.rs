//! Mapping from the simulation domain to a dense 3D grid of cells
//!
//! The grid carries one halo cell layer on each side. Cell side length is
//! `max(cutoff + skin, cell_size_factor * cutoff)`, stretched so that an
//! integer number of cells covers each axis.

use anyhow::{anyhow, Result};

use crate::utils::{one_to_three, three_to_one};

#[derive(Debug, Clone)]
pub struct CellBlock {
    box_min: [f64; 3],
    box_max: [f64; 3],
    /// Cells per dimension including the halo layers
    cells_per_dim: [usize; 3],
    cell_length: [f64; 3],
    interaction_length: f64,
}

impl CellBlock {
    pub fn new(
        box_min: [f64; 3],
        box_max: [f64; 3],
        cutoff: f64,
        skin: f64,
        cell_size_factor: f64,
    ) -> Result<Self> {
        if cutoff <= 0.0 {
            return Err(anyhow!("Cutoff must be positive (is {})", cutoff));
        }
        for d in 0..3 {
            if box_max[d] <= box_min[d] {
                return Err(anyhow!(
                    "Invalid box: max {:?} must exceed min {:?}",
                    box_max,
                    box_min
                ));
            }
        }
        let target_length = (cutoff + skin).max(cell_size_factor * cutoff);
        let mut cells_per_dim = [0usize; 3];
        let mut cell_length = [0.0f64; 3];
        for d in 0..3 {
            let size = box_max[d] - box_min[d];
            let inner = ((size / target_length).floor() as usize).max(1);
            cells_per_dim[d] = inner + 2;
            cell_length[d] = size / inner as f64;
        }
        Ok(Self {
            box_min,
            box_max,
            cells_per_dim,
            cell_length,
            interaction_length: cutoff + skin,
        })
    }

    pub fn box_min(&self) -> [f64; 3] {
        self.box_min
    }

    pub fn box_max(&self) -> [f64; 3] {
        self.box_max
    }

    pub fn cells_per_dim(&self) -> [usize; 3] {
        self.cells_per_dim
    }

    pub fn cell_length(&self) -> [f64; 3] {
        self.cell_length
    }

    pub fn interaction_length(&self) -> f64 {
        self.interaction_length
    }

    pub fn num_cells(&self) -> usize {
        self.cells_per_dim[0] * self.cells_per_dim[1] * self.cells_per_dim[2]
    }

    /// Interaction reach in cells per axis direction
    pub fn overlap(&self) -> [usize; 3] {
        let mut overlap = [0usize; 3];
        for d in 0..3 {
            overlap[d] = (self.interaction_length / self.cell_length[d]).ceil() as usize;
        }
        overlap
    }

    /// True if the position lies strictly inside the domain
    pub fn is_in_box(&self, r: [f64; 3]) -> bool {
        (0..3).all(|d| r[d] >= self.box_min[d] && r[d] < self.box_max[d])
    }

    /// Cell coordinate of a position, clamped into the grid (halo included)
    pub fn cell_of_position(&self, r: [f64; 3]) -> [usize; 3] {
        let mut cell = [0usize; 3];
        for d in 0..3 {
            let c = ((r[d] - self.box_min[d]) / self.cell_length[d]).floor() as isize + 1;
            cell[d] = c.clamp(0, self.cells_per_dim[d] as isize - 1) as usize;
        }
        cell
    }

    pub fn index_of_position(&self, r: [f64; 3]) -> usize {
        three_to_one(self.cell_of_position(r), self.cells_per_dim)
    }

    /// Lower and upper corner of a cell's axis-aligned box
    pub fn cell_bounds(&self, index: usize) -> ([f64; 3], [f64; 3]) {
        let xyz = one_to_three(index, self.cells_per_dim);
        let mut lo = [0.0; 3];
        let mut hi = [0.0; 3];
        for d in 0..3 {
            lo[d] = self.box_min[d] + (xyz[d] as f64 - 1.0) * self.cell_length[d];
            hi[d] = lo[d] + self.cell_length[d];
        }
        (lo, hi)
    }

    pub fn is_halo_cell(&self, index: usize) -> bool {
        let xyz = one_to_three(index, self.cells_per_dim);
        (0..3).any(|d| xyz[d] == 0 || xyz[d] == self.cells_per_dim[d] - 1)
    }

    /// Border-and-flag view: can this cell contain owned particles?
    pub fn cell_can_contain_owned_particles(&self, index: usize) -> bool {
        !self.is_halo_cell(index)
    }

    /// Border-and-flag view: can this cell contain halo particles?
    pub fn cell_can_contain_halo_particles(&self, index: usize) -> bool {
        self.is_halo_cell(index)
    }
}
