//! Traversal schemes over the spatial containers
//!
//! Every traversal visits all in-range cell pairs exactly once and calls the
//! cell functor on them. Parallel schemes partition the grid into colors (or
//! slabs) whose concurrently processed base steps touch disjoint cell sets;
//! an implicit barrier separates consecutive colors.

use std::sync::RwLock;

use rayon::prelude::*;

use crate::cell::FullCell;
use crate::cell_functor::CellFunctor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;
use crate::utils::three_to_one;

pub(crate) mod offsets;

mod c01;
mod c04;
mod c08;
mod c18;
mod clusters;
mod direct_sum;
mod sliced;
mod var_verlet;
mod verlet;
mod verlet_cells;

pub use c01::C01Traversal;
pub use c04::C04Traversal;
pub use c08::C08Traversal;
pub use c18::C18Traversal;
pub use clusters::{ClustersColoringTraversal, ClustersTraversal, Tower};
pub use direct_sum::DirectSumTraversal;
pub use sliced::SlicedTraversal;
pub use var_verlet::VarVerletTraversal;
pub use verlet::VerletFlatTraversal;
pub use verlet_cells::{CellNeighborLists, VerletCellsTraversal};

/// Geometry a traversal is generated for
#[derive(Debug, Clone, Copy)]
pub struct TraversalSelectorInfo {
    /// Cells per dimension including halo layers
    pub cells_per_dim: [usize; 3],
    /// Cutoff plus skin
    pub interaction_length: f64,
    pub cell_length: [f64; 3],
    /// Interaction reach in cells per axis
    pub overlap: [usize; 3],
}

/// Common interface of the cell-pair traversals over a linked-cells grid
pub trait LinkedTraversal<P: Particle>: Send + Sync {
    fn kind(&self) -> TraversalKind;
    fn data_layout(&self) -> DataLayout;
    fn use_newton3(&self) -> bool;

    /// Static feasibility of this traversal for its geometry and options.
    /// Traversals failing this must not be executed.
    fn is_applicable(&self) -> bool;

    fn traverse(&self, cells: &[RwLock<FullCell<P>>]);
}

/// Process the cell pair `(i1, i2)` under write locks taken in ascending
/// index order (the global lock order; keeps mixed-direction acquisitions of
/// the mono-directional traversals deadlock-free).
pub(crate) fn process_pair_locked<P: Particle>(
    cells: &[RwLock<FullCell<P>>],
    i1: usize,
    i2: usize,
    cell_functor: &CellFunctor<'_, P>,
    r_hat: [f64; 3],
) {
    if i1 == i2 {
        let mut cell = cells[i1].write().unwrap();
        cell_functor.process_cell(&mut cell);
    } else {
        let (lo, hi) = (i1.min(i2), i1.max(i2));
        let mut cell_lo = cells[lo].write().unwrap();
        let mut cell_hi = cells[hi].write().unwrap();
        if lo == i1 {
            cell_functor.process_cell_pair(&mut cell_lo, &mut cell_hi, r_hat);
        } else {
            cell_functor.process_cell_pair(&mut cell_hi, &mut cell_lo, r_hat);
        }
    }
}

/// Domain coloring: iterate colors sequentially, base cells of one color in
/// parallel. `on_color` runs on the caller between colors (the implicit
/// barrier point).
pub(crate) fn colored_traversal<F>(
    dims: [usize; 3],
    end: [usize; 3],
    stride: [usize; 3],
    mut on_color: impl FnMut(usize),
    process: F,
) where
    F: Fn([usize; 3]) + Sync,
{
    let mut color = 0;
    for z0 in 0..stride[2] {
        for y0 in 0..stride[1] {
            for x0 in 0..stride[0] {
                on_color(color);
                color += 1;
                let bases: Vec<[usize; 3]> = (z0..end[2])
                    .step_by(stride[2])
                    .flat_map(|z| {
                        (y0..end[1]).step_by(stride[1]).flat_map(move |y| {
                            (x0..end[0]).step_by(stride[0]).map(move |x| [x, y, z])
                        })
                    })
                    .collect();
                bases.par_iter().for_each(|&base| process(base));
            }
        }
    }
}

/// Invoke the AoS functor on one particle pair addressed by (cell, index)
/// locations, under the global cell lock order.
pub(crate) fn process_particle_pair_locked<P: Particle>(
    cells: &[RwLock<FullCell<P>>],
    loc_i: (usize, usize),
    loc_j: (usize, usize),
    functor: &dyn crate::functor::Functor<P>,
    newton3: bool,
) {
    let (cell_i, idx_i) = loc_i;
    let (cell_j, idx_j) = loc_j;
    if cell_i == cell_j {
        let mut cell = cells[cell_i].write().unwrap();
        let (pi, pj) = cell.pair_mut(idx_i, idx_j);
        functor.aos(pi, pj, newton3);
    } else {
        let (lo, hi) = (cell_i.min(cell_j), cell_i.max(cell_j));
        let mut cell_lo = cells[lo].write().unwrap();
        let mut cell_hi = cells[hi].write().unwrap();
        if lo == cell_i {
            functor.aos(cell_lo.get_mut(idx_i), cell_hi.get_mut(idx_j), newton3);
        } else {
            functor.aos(cell_hi.get_mut(idx_i), cell_lo.get_mut(idx_j), newton3);
        }
    }
}

/// Apply a base-step pair schedule at one base cell
pub(crate) fn apply_pair_schedule<P: Particle>(
    cells: &[RwLock<FullCell<P>>],
    dims: [usize; 3],
    base: [usize; 3],
    pairs: &[offsets::CellPairOffset],
    cell_functor: &CellFunctor<'_, P>,
) {
    let base_index = three_to_one(base, dims);
    for pair in pairs {
        process_pair_locked(
            cells,
            base_index + pair.first,
            base_index + pair.second,
            cell_functor,
            pair.r_hat,
        );
    }
}
