//! Particle containers: the spatial data structures behind `iterate_pairwise`

use std::sync::RwLock;

use crate::cell::FullCell;
use crate::error::PairGridError;
use crate::functor::Functor;
use crate::options::{ContainerKind, IteratorBehavior, TraversalChoice};
use crate::particle::Particle;

mod direct_sum;
mod linked_cells;
mod verlet_clusters;
mod verlet_lists;
mod verlet_lists_cells;

pub use direct_sum::DirectSum;
pub use linked_cells::LinkedCells;
pub use verlet_clusters::VerletClusterLists;
pub use verlet_lists::VerletLists;
pub use verlet_lists_cells::VerletListsCells;

/// Operations every container exposes upward
pub trait ParticleContainer<P: Particle> {
    fn kind(&self) -> ContainerKind;

    /// Insert an owned particle; its position must lie inside the box
    fn add_particle(&mut self, p: P) -> anyhow::Result<()>;

    /// Insert or overwrite a halo copy (matched by id)
    fn add_or_update_halo_particle(&mut self, p: P) -> anyhow::Result<()>;

    /// Re-bin all particles, drop halo copies, and return the particles that
    /// left the box together with a flag signalling structural changes
    fn update_container(&mut self) -> (Vec<P>, bool);

    /// Run the pair functor over all in-range pairs with the selected
    /// traversal configuration
    fn iterate_pairwise(
        &mut self,
        functor: &dyn Functor<P>,
        choice: &TraversalChoice,
    ) -> Result<(), PairGridError>;

    /// Snapshot of the particles matching the behavior filter
    fn collect_particles(&self, behavior: IteratorBehavior) -> Vec<P>;
}

/// Fill every cell's side-car SoA buffer through the functor's loader
pub(crate) fn load_cell_soa<P: Particle>(
    cells: &mut [RwLock<FullCell<P>>],
    functor: &dyn Functor<P>,
) {
    for lock in cells.iter_mut() {
        let cell = lock.get_mut().unwrap();
        let (particles, soa) = cell.split_for_load();
        functor.soa_loader(particles, soa, 0);
    }
}

/// Write every cell's SoA buffer back through the functor's extractor
pub(crate) fn extract_cell_soa<P: Particle>(
    cells: &mut [RwLock<FullCell<P>>],
    functor: &dyn Functor<P>,
) {
    for lock in cells.iter_mut() {
        let cell = lock.get_mut().unwrap();
        let (particles, soa) = cell.split_for_extract();
        functor.soa_extractor(particles, soa, 0);
    }
}

pub(crate) fn collect_from_cells<P: Particle>(
    cells: &[RwLock<FullCell<P>>],
    behavior: IteratorBehavior,
) -> Vec<P> {
    let mut particles = Vec::new();
    for lock in cells {
        let cell = lock.read().unwrap();
        for p in cell.iter() {
            if crate::iterators::behavior_allows(behavior, p.ownership()) {
                particles.push(p.clone());
            }
        }
    }
    particles
}
