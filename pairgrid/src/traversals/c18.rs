//! c18 traversal
//!
//! The base step pairs every cell with its forward neighbors (greater linear
//! index) inside the overlap radius; wall-region offset tables keep the
//! enumeration inside the grid. Eighteen colors for overlap 1.

use std::sync::RwLock;

use crate::cell::FullCell;
use crate::cell_functor::CellFunctor;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;
use crate::utils::three_to_one;

use super::offsets::{c18_offset_tables, c18_table_index};
use super::{colored_traversal, process_pair_locked, LinkedTraversal, TraversalSelectorInfo};

pub struct C18Traversal<'a, P: Particle> {
    cell_functor: CellFunctor<'a, P>,
    /// Offsets per (y, x) wall special case
    tables: Vec<Vec<Vec<(usize, [f64; 3])>>>,
    dims: [usize; 3],
    overlap: [usize; 3],
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> C18Traversal<'a, P> {
    pub fn new(
        functor: &'a dyn Functor<P>,
        info: &TraversalSelectorInfo,
        data_layout: DataLayout,
        newton3: bool,
    ) -> Self {
        Self {
            cell_functor: CellFunctor::new(functor, data_layout, newton3, true),
            tables: c18_offset_tables(
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

    fn process_base_cell(&self, cells: &[RwLock<FullCell<P>>], base: [usize; 3]) {
        let base_index = three_to_one(base, self.dims);
        let x_case = c18_table_index(base[0], 0, self.dims, self.overlap);
        let y_case = c18_table_index(base[1], 1, self.dims, self.overlap);
        for &(offset, r_hat) in &self.tables[y_case][x_case] {
            process_pair_locked(
                cells,
                base_index,
                base_index + offset,
                &self.cell_functor,
                r_hat,
            );
        }
    }
}

impl<'a, P: Particle> LinkedTraversal<P> for C18Traversal<'a, P> {
    fn kind(&self) -> TraversalKind {
        TraversalKind::C18
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
        // Base cells stop `overlap` layers below the far z wall; the skipped
        // pairs lie entirely inside the halo.
        let end = [self.dims[0], self.dims[1], self.dims[2] - self.overlap[2]];
        let stride = [
            2 * self.overlap[0] + 1,
            2 * self.overlap[1] + 1,
            self.overlap[2] + 1,
        ];
        colored_traversal(self.dims, end, stride, |_| {}, |base| {
            self.process_base_cell(cells, base);
        });
    }
}
