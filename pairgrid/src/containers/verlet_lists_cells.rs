//! Verlet-lists container with per-cell neighbor lists
//!
//! Lists are kept per cell and per particle, addressed by (cell, index)
//! locations that stay valid for the lifetime of one list generation. With
//! Newton 3 every pair is stored once at the lexicographically smaller
//! location, so all partner accesses point forward and the c18/sliced
//! schedules stay race-free.

use std::collections::HashMap;

use anyhow::Result;

use crate::error::PairGridError;
use crate::functor::Functor;
use crate::neighbor_list::PairListFunctor;
use crate::options::{ContainerKind, DataLayout, IteratorBehavior, TraversalChoice};
use crate::particle::Particle;
use crate::selector;
use crate::traversals::{C08Traversal, CellNeighborLists, VerletCellsTraversal};
use crate::utils;

use super::{LinkedCells, ParticleContainer};

pub struct VerletListsCells<P: Particle> {
    linked: LinkedCells<P>,
    rebuild_frequency: usize,
    steps_since_rebuild: usize,
    lists_valid: bool,
    built_newton3: bool,
    lists: CellNeighborLists,
    build_positions: HashMap<u64, [f64; 3]>,
    num_rebuilds: usize,
}

impl<P: Particle> VerletListsCells<P> {
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
            lists: CellNeighborLists::new(),
            build_positions: HashMap::new(),
            num_rebuilds: 0,
        })
    }

    pub fn linked_cells(&self) -> &LinkedCells<P> {
        &self.linked
    }

    pub fn iter(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &P> {
        self.linked.iter(behavior)
    }

    pub fn iter_mut(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &mut P> {
        self.linked.iter_mut(behavior)
    }

    pub fn num_rebuilds(&self) -> usize {
        self.num_rebuilds
    }

    fn is_container_update_needed(&self) -> bool {
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

    fn rebuild_neighbor_lists(&mut self, newton3: bool) {
        self.linked.rebin();
        let mut location_of: HashMap<u64, (usize, usize)> = HashMap::new();
        self.build_positions.clear();
        self.lists = self
            .linked
            .cells()
            .iter()
            .enumerate()
            .map(|(cell_index, lock)| {
                let cell = lock.read().unwrap();
                for (idx, p) in cell.iter().enumerate() {
                    location_of.insert(p.id(), (cell_index, idx));
                    self.build_positions.insert(p.id(), p.r());
                }
                vec![Vec::new(); cell.len()]
            })
            .collect();

        let search_radius = self.linked.cutoff() + self.linked.skin();
        let info = self.linked.selector_info();
        let generator = PairListFunctor::generator(search_radius, {
            let overlap = info.overlap;
            (overlap[0] + 1) * (overlap[1] + 1) * (overlap[2] + 1)
        });
        let replay = C08Traversal::new(&generator, &info, DataLayout::Aos, newton3);
        replay.traverse_with_color_hook(self.linked.cells(), |color| generator.set_color(color));

        for per_thread in generator.into_buffers() {
            for buffer in per_thread {
                for (id_i, id_j) in buffer {
                    let loc_i = location_of[&id_i];
                    let loc_j = location_of[&id_j];
                    if newton3 {
                        // Store once, at the smaller location
                        let (lo, hi) = if loc_i <= loc_j {
                            (loc_i, loc_j)
                        } else {
                            (loc_j, loc_i)
                        };
                        self.lists[lo.0][lo.1].push(hi);
                    } else {
                        self.lists[loc_i.0][loc_i.1].push(loc_j);
                    }
                }
            }
        }

        self.lists_valid = true;
        self.built_newton3 = newton3;
        self.steps_since_rebuild = 0;
        self.num_rebuilds += 1;
    }
}

impl<P: Particle> ParticleContainer<P> for VerletListsCells<P> {
    fn kind(&self) -> ContainerKind {
        ContainerKind::VerletListsCells
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
        selector::check_choice(ContainerKind::VerletListsCells, choice, functor)?;
        let newton3 = choice.use_newton3();
        let info = self.linked.selector_info();
        let traversal = VerletCellsTraversal::new(
            functor,
            choice.traversal,
            info.cells_per_dim,
            info.overlap,
            choice.data_layout,
            newton3,
        );
        if !traversal.is_applicable() {
            return Err(PairGridError::TraversalNotApplicable {
                container: ContainerKind::VerletListsCells,
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
        traversal.traverse(self.linked.cells(), &self.lists);
        functor.end_traversal(newton3);
        Ok(())
    }

    fn collect_particles(&self, behavior: IteratorBehavior) -> Vec<P> {
        self.linked.collect_particles(behavior)
    }
}
