//! Sliced traversal
//!
//! Cuts the longest axis into one slab per thread. A slab's first `overlap`
//! layers are guarded by the lock it shares with its lower neighbor; a thread
//! acquires the next slab's edge lock only for its last `overlap` layers and
//! releases its own edge lock as soon as that boundary layer is done. Edge
//! locks are always taken in ascending order. If fewer slabs than threads
//! fit, the thread count is reduced.

use std::sync::{Mutex, RwLock};

use crate::cell::FullCell;
use crate::cell_functor::CellFunctor;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;

use super::offsets::{c08_pair_offsets, CellPairOffset};
use super::{apply_pair_schedule, LinkedTraversal, TraversalSelectorInfo};

pub struct SlicedTraversal<'a, P: Particle> {
    cell_functor: CellFunctor<'a, P>,
    pairs: Vec<CellPairOffset>,
    dims: [usize; 3],
    overlap: [usize; 3],
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> SlicedTraversal<'a, P> {
    pub fn new(
        functor: &'a dyn Functor<P>,
        info: &TraversalSelectorInfo,
        data_layout: DataLayout,
        newton3: bool,
    ) -> Self {
        Self {
            cell_functor: CellFunctor::new(functor, data_layout, newton3, true),
            pairs: c08_pair_offsets(
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

    /// Axis with the most cells (the one that gets sliced)
    fn slice_dim(&self) -> usize {
        let mut dim = 0;
        for d in 1..3 {
            if self.dims[d] > self.dims[dim] {
                dim = d;
            }
        }
        dim
    }
}

impl<'a, P: Particle> LinkedTraversal<P> for SlicedTraversal<'a, P> {
    fn kind(&self) -> TraversalKind {
        TraversalKind::Sliced
    }

    fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    fn use_newton3(&self) -> bool {
        self.newton3
    }

    fn is_applicable(&self) -> bool {
        if self.data_layout == DataLayout::Cuda {
            return false;
        }
        let d = self.slice_dim();
        self.dims[d] >= 2 * self.overlap[d] + 1
    }

    fn traverse(&self, cells: &[RwLock<FullCell<P>>]) {
        let d = self.slice_dim();
        let ov = self.overlap[d].max(1);
        let layers = self.dims[d] - self.overlap[d];
        let num_slices = rayon::current_num_threads().min(layers / ov).max(1);
        let thickness = layers / num_slices;

        // One lock per slab edge
        let edge_locks: Vec<Mutex<()>> = (1..num_slices).map(|_| Mutex::new(())).collect();

        let end = [
            self.dims[0] - self.overlap[0],
            self.dims[1] - self.overlap[1],
            self.dims[2] - self.overlap[2],
        ];
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
                        for a in 0..end[dim_a] {
                            for b in 0..end[dim_b] {
                                let mut base = [0usize; 3];
                                base[d] = layer;
                                base[dim_a] = a;
                                base[dim_b] = b;
                                apply_pair_schedule(
                                    cells,
                                    self.dims,
                                    base,
                                    &self.pairs,
                                    &self.cell_functor,
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
