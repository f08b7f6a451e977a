//! Cell-based traversals over per-cell Verlet lists
//!
//! One struct covers the three schemes (`c01Verlet`, `c18Verlet`,
//! `slicedVerlet`): the base step walks the neighbor lists of one cell's
//! particles, and the schemes differ only in how base cells are scheduled.
//! With Newton 3 the lists store each pair once at the lexicographically
//! smaller location, so all partner writes point forward and the c18 coloring
//! (or slab locking) keeps concurrent base steps disjoint.

use std::sync::{Mutex, RwLock};

use rayon::prelude::*;

use crate::cell::FullCell;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;
use crate::utils::three_to_one;

use super::process_particle_pair_locked;

/// Per cell, per particle: the partner locations of that particle
pub type CellNeighborLists = Vec<Vec<Vec<(usize, usize)>>>;

pub struct VerletCellsTraversal<'a, P: Particle> {
    functor: &'a dyn Functor<P>,
    kind: TraversalKind,
    dims: [usize; 3],
    overlap: [usize; 3],
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> VerletCellsTraversal<'a, P> {
    pub fn new(
        functor: &'a dyn Functor<P>,
        kind: TraversalKind,
        dims: [usize; 3],
        overlap: [usize; 3],
        data_layout: DataLayout,
        newton3: bool,
    ) -> Self {
        debug_assert!(matches!(
            kind,
            TraversalKind::C01Verlet | TraversalKind::C18Verlet | TraversalKind::SlicedVerlet
        ));
        Self {
            functor,
            kind,
            dims,
            overlap,
            data_layout,
            newton3,
        }
    }

    pub fn kind(&self) -> TraversalKind {
        self.kind
    }

    pub fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    pub fn use_newton3(&self) -> bool {
        self.newton3
    }

    pub fn is_applicable(&self) -> bool {
        if self.data_layout != DataLayout::Aos {
            return false;
        }
        match self.kind {
            TraversalKind::C01Verlet => !self.newton3,
            TraversalKind::SlicedVerlet => {
                let d = self.slice_dim();
                self.dims[d] >= 2 * self.overlap[d] + 1
            }
            _ => true,
        }
    }

    fn slice_dim(&self) -> usize {
        let mut dim = 0;
        for d in 1..3 {
            if self.dims[d] > self.dims[dim] {
                dim = d;
            }
        }
        dim
    }

    fn process_base_cell(
        &self,
        cells: &[RwLock<FullCell<P>>],
        lists: &CellNeighborLists,
        base_index: usize,
    ) {
        for (idx, partners) in lists[base_index].iter().enumerate() {
            for &loc_j in partners {
                process_particle_pair_locked(
                    cells,
                    (base_index, idx),
                    loc_j,
                    self.functor,
                    self.newton3,
                );
            }
        }
    }

    pub fn traverse(&self, cells: &[RwLock<FullCell<P>>], lists: &CellNeighborLists) {
        match self.kind {
            TraversalKind::C01Verlet => self.traverse_c01(cells, lists),
            TraversalKind::C18Verlet => self.traverse_c18(cells, lists),
            TraversalKind::SlicedVerlet => self.traverse_sliced(cells, lists),
            _ => unreachable!(),
        }
    }

    fn traverse_c01(&self, cells: &[RwLock<FullCell<P>>], lists: &CellNeighborLists) {
        let indices: Vec<usize> = (0..cells.len()).collect();
        indices
            .par_iter()
            .for_each(|&index| self.process_base_cell(cells, lists, index));
    }

    fn traverse_c18(&self, cells: &[RwLock<FullCell<P>>], lists: &CellNeighborLists) {
        let stride = [
            2 * self.overlap[0] + 1,
            2 * self.overlap[1] + 1,
            self.overlap[2] + 1,
        ];
        super::colored_traversal(self.dims, self.dims, stride, |_| {}, |base| {
            self.process_base_cell(cells, lists, three_to_one(base, self.dims));
        });
    }

    fn traverse_sliced(&self, cells: &[RwLock<FullCell<P>>], lists: &CellNeighborLists) {
        let d = self.slice_dim();
        let ov = self.overlap[d].max(1);
        let layers = self.dims[d];
        let num_slices = rayon::current_num_threads().min(layers / ov).max(1);
        let thickness = layers / num_slices;
        let edge_locks: Vec<Mutex<()>> = (1..num_slices).map(|_| Mutex::new(())).collect();
        let (dim_a, dim_b) = match d {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };

        rayon::scope(|scope| {
            for slice in 0..num_slices {
                let edge_locks = &edge_locks;
                scope.spawn(move |_| {
                    let start = slice * thickness;
                    let stop = if slice + 1 == num_slices {
                        layers
                    } else {
                        start + thickness
                    };
                    let mut own_edge = if slice > 0 {
                        Some(edge_locks[slice - 1].lock().unwrap())
                    } else {
                        None
                    };
                    let mut next_edge = None;
                    for layer in start..stop {
                        if slice + 1 < num_slices && layer + ov >= stop && next_edge.is_none() {
                            next_edge = Some(edge_locks[slice].lock().unwrap());
                        }
                        for a in 0..self.dims[dim_a] {
                            for b in 0..self.dims[dim_b] {
                                let mut base = [0usize; 3];
                                base[d] = layer;
                                base[dim_a] = a;
                                base[dim_b] = b;
                                self.process_base_cell(
                                    cells,
                                    lists,
                                    three_to_one(base, self.dims),
                                );
                            }
                        }
                        if layer + 1 >= start + ov {
                            own_edge = None;
                        }
                    }
                    drop(own_edge);
                    drop(next_edge);
                });
            }
        });
    }
}
