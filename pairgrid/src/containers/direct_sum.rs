//! Direct-sum container: all owned particles in one cell, all halo copies in
//! a second one. Quadratic, but exact and useful as a reference.

use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::cell::FullCell;
use crate::error::PairGridError;
use crate::functor::Functor;
use crate::options::{ContainerKind, DataLayout, IteratorBehavior, TraversalChoice};
use crate::particle::{Ownership, Particle};
use crate::selector;
use crate::traversals::{DirectSumTraversal, LinkedTraversal};

use super::{collect_from_cells, extract_cell_soa, load_cell_soa, ParticleContainer};

const OWNED_CELL: usize = 0;
const HALO_CELL: usize = 1;

pub struct DirectSum<P: Particle> {
    box_min: [f64; 3],
    box_max: [f64; 3],
    cutoff: f64,
    cells: Vec<RwLock<FullCell<P>>>,
}

impl<P: Particle> DirectSum<P> {
    pub fn new(box_min: [f64; 3], box_max: [f64; 3], cutoff: f64) -> Result<Self> {
        if cutoff <= 0.0 {
            return Err(anyhow!("Cutoff must be positive (is {})", cutoff));
        }
        let mut extent = [0.0; 3];
        for d in 0..3 {
            extent[d] = box_max[d] - box_min[d];
        }
        let cells = vec![
            RwLock::new(FullCell::new(extent)),
            RwLock::new(FullCell::new(extent)),
        ];
        Ok(Self {
            box_min,
            box_max,
            cutoff,
            cells,
        })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn iter(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &P> {
        crate::iterators::iter_particles(&mut self.cells, behavior)
    }

    pub fn iter_mut(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &mut P> {
        crate::iterators::iter_particles_mut(&mut self.cells, behavior)
    }

    fn in_box(&self, r: [f64; 3]) -> bool {
        (0..3).all(|d| r[d] >= self.box_min[d] && r[d] < self.box_max[d])
    }
}

impl<P: Particle> ParticleContainer<P> for DirectSum<P> {
    fn kind(&self) -> ContainerKind {
        ContainerKind::DirectSum
    }

    fn add_particle(&mut self, mut p: P) -> Result<()> {
        if !self.in_box(p.r()) {
            return Err(anyhow!(
                "Particle {} not in domain: position is {:?}",
                p.id(),
                p.r()
            ));
        }
        p.set_ownership(Ownership::Owned);
        self.cells[OWNED_CELL].get_mut().unwrap().add_particle(p);
        Ok(())
    }

    fn add_or_update_halo_particle(&mut self, mut p: P) -> Result<()> {
        p.set_ownership(Ownership::Halo);
        let cell = self.cells[HALO_CELL].get_mut().unwrap();
        match cell.iter_mut().find(|q| q.id() == p.id()) {
            Some(existing) => *existing = p,
            None => cell.add_particle(p),
        }
        Ok(())
    }

    fn update_container(&mut self) -> (Vec<P>, bool) {
        let mut leavers = Vec::new();
        let mut changed = false;
        {
            let halo = self.cells[HALO_CELL].get_mut().unwrap();
            changed |= !halo.is_empty();
            halo.clear();
        }
        let box_min = self.box_min;
        let box_max = self.box_max;
        let owned = self.cells[OWNED_CELL].get_mut().unwrap();
        let mut i = 0;
        while i < owned.len() {
            let r = owned.get(i).r();
            if (0..3).all(|d| r[d] >= box_min[d] && r[d] < box_max[d]) {
                i += 1;
            } else {
                leavers.push(owned.delete_by_index(i));
                changed = true;
            }
        }
        (leavers, changed)
    }

    fn iterate_pairwise(
        &mut self,
        functor: &dyn Functor<P>,
        choice: &TraversalChoice,
    ) -> Result<(), PairGridError> {
        selector::check_choice(ContainerKind::DirectSum, choice, functor)?;
        let traversal =
            DirectSumTraversal::new(functor, choice.data_layout, choice.use_newton3());
        if !traversal.is_applicable() {
            return Err(PairGridError::TraversalNotApplicable {
                container: ContainerKind::DirectSum,
                traversal: choice.traversal,
                data_layout: choice.data_layout,
                newton3: choice.use_newton3(),
            });
        }
        functor.init_traversal();
        if choice.data_layout == DataLayout::Soa {
            load_cell_soa(&mut self.cells, functor);
        }
        traversal.traverse(&self.cells);
        if choice.data_layout == DataLayout::Soa {
            extract_cell_soa(&mut self.cells, functor);
        }
        functor.end_traversal(choice.use_newton3());
        Ok(())
    }

    fn collect_particles(&self, behavior: IteratorBehavior) -> Vec<P> {
        collect_from_cells(&self.cells, behavior)
    }
}
