//! Traversal over the as-build pair buffers of a variable Verlet list
//!
//! The buffers are replayed exactly as the builder threads produced them:
//! colors in sequence, the buffers of one color in parallel. Within a color
//! the generating base steps were disjoint, so no further coloring is needed.

use std::collections::HashMap;
use std::sync::RwLock;

use rayon::prelude::*;

use crate::cell::FullCell;
use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;

use super::process_particle_pair_locked;

pub struct VarVerletTraversal<'a, P: Particle> {
    functor: &'a dyn Functor<P>,
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> VarVerletTraversal<'a, P> {
    pub fn new(functor: &'a dyn Functor<P>, data_layout: DataLayout, newton3: bool) -> Self {
        Self {
            functor,
            data_layout,
            newton3,
        }
    }

    pub fn kind(&self) -> TraversalKind {
        TraversalKind::VarVerletAsBuild
    }

    pub fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    pub fn use_newton3(&self) -> bool {
        self.newton3
    }

    pub fn is_applicable(&self) -> bool {
        self.data_layout == DataLayout::Aos
    }

    pub fn traverse(
        &self,
        cells: &[RwLock<FullCell<P>>],
        buffers: &[Vec<Vec<(u64, u64)>>],
        location_of: &HashMap<u64, (usize, usize)>,
    ) {
        for per_thread in buffers {
            per_thread.par_iter().for_each(|buffer| {
                for (id_i, id_j) in buffer {
                    process_particle_pair_locked(
                        cells,
                        location_of[id_i],
                        location_of[id_j],
                        self.functor,
                        self.newton3,
                    );
                }
            });
        }
    }
}
