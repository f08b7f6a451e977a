//! Direct-sum traversal: one owned cell, one halo cell, no grid

use std::sync::RwLock;

use crate::cell::FullCell;
use crate::cell_functor::CellFunctor;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;

use super::LinkedTraversal;

pub struct DirectSumTraversal<'a, P: Particle> {
    cell_functor: CellFunctor<'a, P>,
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> DirectSumTraversal<'a, P> {
    pub fn new(functor: &'a dyn Functor<P>, data_layout: DataLayout, newton3: bool) -> Self {
        Self {
            cell_functor: CellFunctor::new(functor, data_layout, newton3, true),
            data_layout,
            newton3,
        }
    }
}

impl<'a, P: Particle> LinkedTraversal<P> for DirectSumTraversal<'a, P> {
    fn kind(&self) -> TraversalKind {
        TraversalKind::DirectSumTraversal
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
        debug_assert_eq!(cells.len(), 2);
        let mut owned = cells[0].write().unwrap();
        let mut halo = cells[1].write().unwrap();
        self.cell_functor.process_cell(&mut owned);
        self.cell_functor
            .process_cell_pair(&mut owned, &mut halo, [0.0; 3]);
    }
}
