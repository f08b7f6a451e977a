//! c01 traversal
//!
//! The base step enumerates the full neighbor sphere and updates only the
//! base cell, so any number of threads is safe without coloring. Requires
//! Newton 3 to be off.

use std::sync::RwLock;

use rayon::prelude::*;

use crate::cell::FullCell;
use crate::cell_functor::CellFunctor;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;
use crate::utils::three_to_one;

use super::offsets::c01_offsets;
use super::{process_pair_locked, LinkedTraversal, TraversalSelectorInfo};

pub struct C01Traversal<'a, P: Particle> {
    cell_functor: CellFunctor<'a, P>,
    offsets: Vec<(isize, [f64; 3])>,
    dims: [usize; 3],
    overlap: [usize; 3],
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> C01Traversal<'a, P> {
    pub fn new(
        functor: &'a dyn Functor<P>,
        info: &TraversalSelectorInfo,
        data_layout: DataLayout,
        newton3: bool,
    ) -> Self {
        Self {
            // Mono-directional: neighbor cells are never written
            cell_functor: CellFunctor::new(functor, data_layout, newton3, false),
            offsets: c01_offsets(
                info.cells_per_dim,
                info.overlap,
                info.interaction_length,
                info.cell_length,
            ),
            dims: info.cells_per_dim,
            overlap: info.overlap,
            data_layout,
            newton3,
        }
    }
}

impl<'a, P: Particle> LinkedTraversal<P> for C01Traversal<'a, P> {
    fn kind(&self) -> TraversalKind {
        TraversalKind::C01
    }

    fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    fn use_newton3(&self) -> bool {
        self.newton3
    }

    fn is_applicable(&self) -> bool {
        !self.newton3 && self.data_layout != DataLayout::Cuda
    }

    fn traverse(&self, cells: &[RwLock<FullCell<P>>]) {
        let bases: Vec<[usize; 3]> = (self.overlap[2]..self.dims[2] - self.overlap[2])
            .flat_map(|z| {
                (self.overlap[1]..self.dims[1] - self.overlap[1]).flat_map(move |y| {
                    (self.overlap[0]..self.dims[0] - self.overlap[0]).map(move |x| [x, y, z])
                })
            })
            .collect();
        bases.par_iter().for_each(|&base| {
            let base_index = three_to_one(base, self.dims);
            {
                let mut cell = cells[base_index].write().unwrap();
                self.cell_functor.process_cell(&mut cell);
            }
            for &(offset, r_hat) in &self.offsets {
                let other = (base_index as isize + offset) as usize;
                process_pair_locked(cells, base_index, other, &self.cell_functor, r_hat);
            }
        });
    }
}
