//! Flat traversal over the global Verlet lists
//!
//! Walks the per-particle candidate lists directly, without any cell
//! structure. Runs single-threaded; parallel Verlet execution is provided by
//! the cell-based variants.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::cell::FullCell;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;
use crate::soa::SoaBuffer;

use super::process_particle_pair_locked;

pub struct VerletFlatTraversal<'a, P: Particle> {
    functor: &'a dyn Functor<P>,
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> VerletFlatTraversal<'a, P> {
    pub fn new(functor: &'a dyn Functor<P>, data_layout: DataLayout, newton3: bool) -> Self {
        Self {
            functor,
            data_layout,
            newton3,
        }
    }

    pub fn kind(&self) -> TraversalKind {
        TraversalKind::VerletTraversal
    }

    pub fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    pub fn use_newton3(&self) -> bool {
        self.newton3
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self.data_layout, DataLayout::Aos | DataLayout::Soa)
    }

    /// AoS: resolve ids to their current (cell, index) locations
    pub fn traverse_aos(
        &self,
        cells: &[RwLock<FullCell<P>>],
        lists: &HashMap<u64, Vec<u64>>,
        location_of: &HashMap<u64, (usize, usize)>,
    ) {
        for (id_i, partners) in lists {
            let loc_i = location_of[id_i];
            for id_j in partners {
                let loc_j = location_of[id_j];
                process_particle_pair_locked(cells, loc_i, loc_j, self.functor, self.newton3);
            }
        }
    }

    /// SoA: one call over the whole row range of the global buffer
    pub fn traverse_soa(&self, soa: &mut SoaBuffer, row_lists: &[Vec<usize>]) {
        self.functor
            .soa_verlet(soa, row_lists, 0, row_lists.len(), self.newton3);
    }
}
