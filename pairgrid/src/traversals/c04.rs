//! c04 traversal
//!
//! Four-color variant of the c08 base step: colors span the x/y plane only,
//! each task owns a whole z column and walks it sequentially, keeping the
//! column's buffers warm. `c04SoA` is the same scheme restricted to SoA
//! layout.

use std::sync::RwLock;

use rayon::prelude::*;

use crate::cell::FullCell;
use crate::cell_functor::CellFunctor;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;

use super::offsets::{c08_pair_offsets, CellPairOffset};
use super::{apply_pair_schedule, LinkedTraversal, TraversalSelectorInfo};

pub struct C04Traversal<'a, P: Particle> {
    cell_functor: CellFunctor<'a, P>,
    pairs: Vec<CellPairOffset>,
    dims: [usize; 3],
    overlap: [usize; 3],
    kind: TraversalKind,
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> C04Traversal<'a, P> {
    /// `kind` selects between the plain and the SoA-only flavor
    /// (`TraversalKind::C04` or `TraversalKind::C04SoA`)
    pub fn new(
        functor: &'a dyn Functor<P>,
        info: &TraversalSelectorInfo,
        kind: TraversalKind,
        data_layout: DataLayout,
        newton3: bool,
    ) -> Self {
        debug_assert!(matches!(kind, TraversalKind::C04 | TraversalKind::C04SoA));
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
            kind,
            data_layout,
            newton3,
        }
    }
}

impl<'a, P: Particle> LinkedTraversal<P> for C04Traversal<'a, P> {
    fn kind(&self) -> TraversalKind {
        self.kind
    }

    fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    fn use_newton3(&self) -> bool {
        self.newton3
    }

    fn is_applicable(&self) -> bool {
        match self.kind {
            TraversalKind::C04SoA => self.data_layout == DataLayout::Soa,
            _ => self.data_layout != DataLayout::Cuda,
        }
    }

    fn traverse(&self, cells: &[RwLock<FullCell<P>>]) {
        let end = [
            self.dims[0] - self.overlap[0],
            self.dims[1] - self.overlap[1],
            self.dims[2] - self.overlap[2],
        ];
        let stride = [self.overlap[0] + 1, self.overlap[1] + 1];
        for y0 in 0..stride[1] {
            for x0 in 0..stride[0] {
                let columns: Vec<[usize; 2]> = (y0..end[1])
                    .step_by(stride[1])
                    .flat_map(|y| (x0..end[0]).step_by(stride[0]).map(move |x| [x, y]))
                    .collect();
                // Columns of one color are at least overlap+1 apart in x and
                // y, so their blocks never meet; the z direction is walked
                // sequentially inside each task.
                columns.par_iter().for_each(|&[x, y]| {
                    for z in 0..end[2] {
                        apply_pair_schedule(
                            cells,
                            self.dims,
                            [x, y, z],
                            &self.pairs,
                            &self.cell_functor,
                        );
                    }
                });
            }
        }
    }
}
