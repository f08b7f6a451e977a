//! Verlet-lists container
//!
//! Wraps a linked-cells container for storage and builds per-particle
//! candidate lists by replaying a c08 traversal with the pair-list functor.
//! The raw per-(color, thread) pair buffers are retained as the "as-build"
//! variable Verlet list, traversed by `varVerletTraversalAsBuild`.

use std::collections::HashMap;

use anyhow::Result;

use crate::error::PairGridError;
use crate::functor::Functor;
use crate::neighbor_list::{NeighborLists, PairListFunctor};
use crate::options::{
    ContainerKind, DataLayout, IteratorBehavior, TraversalChoice, TraversalKind,
};
use crate::particle::Particle;
use crate::selector;
use crate::soa::SoaBuffer;
use crate::traversals::{C08Traversal, VarVerletTraversal, VerletFlatTraversal};
use crate::utils;

use super::{LinkedCells, ParticleContainer};

pub struct VerletLists<P: Particle> {
    linked: LinkedCells<P>,
    rebuild_frequency: usize,
    steps_since_rebuild: usize,
    lists_valid: bool,
    built_newton3: bool,
    lists: NeighborLists,
    /// Raw pair buffers as generated, `[color][thread]`
    as_build_buffers: Vec<Vec<Vec<(u64, u64)>>>,
    /// Particle id -> (cell, in-cell index) at build time
    location_of: HashMap<u64, (usize, usize)>,
    /// Particle id -> position at build time (displacement predicate)
    build_positions: HashMap<u64, [f64; 3]>,
    /// Row order of the global SoA buffer
    id_order: Vec<u64>,
    soa: SoaBuffer,
    num_rebuilds: usize,
}

impl<P: Particle> VerletLists<P> {
    pub fn new(
        box_min: [f64; 3],
        box_max: [f64; 3],
        cutoff: f64,
        skin: f64,
        rebuild_frequency: usize,
        cell_size_factor: f64,
    ) -> Result<Self> {
        Ok(Self {
            linked: LinkedCells::new(box_min, box_max, cutoff, skin, cell_size_factor)?,
            rebuild_frequency: rebuild_frequency.max(1),
            steps_since_rebuild: 0,
            lists_valid: false,
            built_newton3: true,
            lists: NeighborLists::new(),
            as_build_buffers: Vec::new(),
            location_of: HashMap::new(),
            build_positions: HashMap::new(),
            id_order: Vec::new(),
            soa: SoaBuffer::new(),
            num_rebuilds: 0,
        })
    }

    pub fn linked_cells(&self) -> &LinkedCells<P> {
        &self.linked
    }

    /// Iteration does not invalidate the lists; position changes are caught
    /// by the displacement predicate at the next `iterate_pairwise`.
    pub fn iter(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &P> {
        self.linked.iter(behavior)
    }

    pub fn iter_mut(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &mut P> {
        self.linked.iter_mut(behavior)
    }

    pub fn region_iter(
        &mut self,
        min: [f64; 3],
        max: [f64; 3],
        behavior: IteratorBehavior,
    ) -> impl Iterator<Item = &P> {
        self.linked.region_iter(min, max, behavior)
    }

    /// Number of list rebuilds since construction
    pub fn num_rebuilds(&self) -> usize {
        self.num_rebuilds
    }

    pub fn neighbor_lists(&self) -> &NeighborLists {
        &self.lists
    }

    /// True if some particle has moved more than skin/2 since the last build
    pub fn is_container_update_needed(&self) -> bool {
        let limit_sqr = (self.linked.skin() / 2.0) * (self.linked.skin() / 2.0);
        for lock in self.linked.cells() {
            let cell = lock.read().unwrap();
            for p in cell.iter() {
                if let Some(&r_build) = self.build_positions.get(&p.id()) {
                    if utils::dist_sqr(p.r(), r_build) > limit_sqr {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn needs_rebuild(&self, newton3: bool) -> bool {
        !self.lists_valid
            || self.built_newton3 != newton3
            || self.steps_since_rebuild >= self.rebuild_frequency
            || self.is_container_update_needed()
    }

    /// Record the id -> location/position maps in cell iteration order
    fn refresh_index_maps(&mut self) {
        self.id_order.clear();
        self.location_of.clear();
        self.build_positions.clear();
        for (cell_index, lock) in self.linked.cells().iter().enumerate() {
            let cell = lock.read().unwrap();
            for (idx, p) in cell.iter().enumerate() {
                self.id_order.push(p.id());
                self.location_of.insert(p.id(), (cell_index, idx));
                self.build_positions.insert(p.id(), p.r());
            }
        }
    }

    /// Rebuild the lists, mark them valid and reset the counter
    pub fn rebuild_neighbor_lists(&mut self, newton3: bool) {
        self.linked.rebin();
        self.refresh_index_maps();
        let search_radius = self.linked.cutoff() + self.linked.skin();
        let info = self.linked.selector_info();
        let generator = PairListFunctor::generator(search_radius, {
            let overlap = info.overlap;
            (overlap[0] + 1) * (overlap[1] + 1) * (overlap[2] + 1)
        });
        let replay = C08Traversal::new(&generator, &info, DataLayout::Aos, newton3);
        replay.traverse_with_color_hook(self.linked.cells(), |color| generator.set_color(color));

        self.as_build_buffers = generator.into_buffers();
        self.lists.clear();
        self.lists.absorb_pairs(self.as_build_buffers.clone());
        self.lists.derive_rows(&self.id_order);

        self.lists_valid = true;
        self.built_newton3 = newton3;
        self.steps_since_rebuild = 0;
        self.num_rebuilds += 1;
    }

    /// Replay a traversal with the validity-checker functor: every pair
    /// within the cutoff must be represented in the current lists.
    pub fn check_neighbor_lists_are_valid(&self) -> Result<(), PairGridError> {
        if !self.lists_valid {
            return Err(PairGridError::InvariantViolation(
                "validity check on unbuilt neighbor lists".into(),
            ));
        }
        let checker =
            PairListFunctor::checker(self.linked.cutoff(), self.lists.reference_sets());
        let info = self.linked.selector_info();
        let replay = C08Traversal::new(&checker, &info, DataLayout::Aos, true);
        replay.traverse_with_color_hook(self.linked.cells(), |_| {});
        if checker.lists_are_valid() {
            Ok(())
        } else {
            Err(PairGridError::InvariantViolation(
                "neighbor lists are missing an in-range pair".into(),
            ))
        }
    }

    fn traverse_flat(&mut self, functor: &dyn Functor<P>, choice: &TraversalChoice) {
        let traversal =
            VerletFlatTraversal::new(functor, choice.data_layout, choice.use_newton3());
        match choice.data_layout {
            DataLayout::Aos => {
                traversal.traverse_aos(self.linked.cells(), &self.lists.aos, &self.location_of);
            }
            DataLayout::Soa => {
                // Concatenate all cells into the global buffer, rows in id order
                self.soa.clear();
                let mut offset = 0;
                for lock in self.linked.cells_mut().iter_mut() {
                    let cell = lock.get_mut().unwrap();
                    functor.soa_loader(cell.particles(), &mut self.soa, offset);
                    offset += cell.len();
                }
                traversal.traverse_soa(&mut self.soa, &self.lists.soa);
                let mut offset = 0;
                for lock in self.linked.cells_mut().iter_mut() {
                    let cell = lock.get_mut().unwrap();
                    functor.soa_extractor(cell.particles_mut(), &self.soa, offset);
                    offset += cell.len();
                }
            }
            DataLayout::Cuda => unreachable!("rejected by applicability"),
        }
    }
}

impl<P: Particle> ParticleContainer<P> for VerletLists<P> {
    fn kind(&self) -> ContainerKind {
        ContainerKind::VerletLists
    }

    fn add_particle(&mut self, p: P) -> Result<()> {
        self.lists_valid = false;
        self.linked.add_particle(p)
    }

    fn add_or_update_halo_particle(&mut self, p: P) -> Result<()> {
        self.lists_valid = false;
        self.linked.add_or_update_halo_particle(p)
    }

    fn update_container(&mut self) -> (Vec<P>, bool) {
        let (leavers, changed) = self.linked.update_container();
        if changed {
            self.lists_valid = false;
        }
        (leavers, changed)
    }

    fn iterate_pairwise(
        &mut self,
        functor: &dyn Functor<P>,
        choice: &TraversalChoice,
    ) -> Result<(), PairGridError> {
        selector::check_choice(ContainerKind::VerletLists, choice, functor)?;
        let newton3 = choice.use_newton3();
        let applicable = match choice.traversal {
            TraversalKind::VerletTraversal => {
                VerletFlatTraversal::new(functor, choice.data_layout, newton3).is_applicable()
            }
            TraversalKind::VarVerletAsBuild => {
                VarVerletTraversal::new(functor, choice.data_layout, newton3).is_applicable()
            }
            _ => unreachable!("filtered by the compatibility table"),
        };
        if !applicable {
            return Err(PairGridError::TraversalNotApplicable {
                container: ContainerKind::VerletLists,
                traversal: choice.traversal,
                data_layout: choice.data_layout,
                newton3,
            });
        }

        if self.needs_rebuild(newton3) {
            self.rebuild_neighbor_lists(newton3);
        }
        self.steps_since_rebuild += 1;

        functor.init_traversal();
        match choice.traversal {
            TraversalKind::VerletTraversal => self.traverse_flat(functor, choice),
            TraversalKind::VarVerletAsBuild => {
                let traversal = VarVerletTraversal::new(functor, choice.data_layout, newton3);
                traversal.traverse(self.linked.cells(), &self.as_build_buffers, &self.location_of);
            }
            _ => unreachable!(),
        }
        functor.end_traversal(newton3);
        Ok(())
    }

    fn collect_particles(&self, behavior: IteratorBehavior) -> Vec<P> {
        self.linked.collect_particles(behavior)
    }
}
