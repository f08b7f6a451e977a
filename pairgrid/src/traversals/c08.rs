//! c08 traversal: the Newton-3 friendly canonical base step
//!
//! A `(overlap+1)³` block anchored at the base cell enumerates the unique
//! cell pairs (13 for overlap 1) whose interactions the block is responsible
//! for. Coloring with stride `overlap+1` per axis keeps concurrently
//! processed blocks disjoint.

use std::sync::RwLock;

use crate::cell::FullCell;
use crate::cell_functor::CellFunctor;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;

use super::offsets::{c08_pair_offsets, CellPairOffset};
use super::{apply_pair_schedule, colored_traversal, LinkedTraversal, TraversalSelectorInfo};

pub struct C08Traversal<'a, P: Particle> {
    cell_functor: CellFunctor<'a, P>,
    pairs: Vec<CellPairOffset>,
    dims: [usize; 3],
    overlap: [usize; 3],
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> C08Traversal<'a, P> {
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

    /// Number of colors of this traversal's coloring
    pub fn num_colors(&self) -> usize {
        (self.overlap[0] + 1) * (self.overlap[1] + 1) * (self.overlap[2] + 1)
    }

    /// Run the traversal, invoking `on_color` at every color switch (used by
    /// the as-build pair list generation to segment its buffers)
    pub fn traverse_with_color_hook(
        &self,
        cells: &[RwLock<FullCell<P>>],
        on_color: impl FnMut(usize),
    ) {
        let end = [
            self.dims[0] - self.overlap[0],
            self.dims[1] - self.overlap[1],
            self.dims[2] - self.overlap[2],
        ];
        let stride = [
            self.overlap[0] + 1,
            self.overlap[1] + 1,
            self.overlap[2] + 1,
        ];
        colored_traversal(self.dims, end, stride, on_color, |base| {
            apply_pair_schedule(cells, self.dims, base, &self.pairs, &self.cell_functor);
        });
    }
}

impl<'a, P: Particle> LinkedTraversal<P> for C08Traversal<'a, P> {
    fn kind(&self) -> TraversalKind {
        TraversalKind::C08
    }

    fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    fn use_newton3(&self) -> bool {
        self.newton3
    }

    fn is_applicable(&self) -> bool {
        self.data_layout != DataLayout::Cuda
    }

    fn traverse(&self, cells: &[RwLock<FullCell<P>>]) {
        self.traverse_with_color_hook(cells, |_| {});
    }
}
