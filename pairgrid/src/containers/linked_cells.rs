//! Linked-cells container

use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::cell::FullCell;
use crate::cell_block::CellBlock;
use crate::error::PairGridError;
use crate::functor::Functor;
use crate::iterators;
use crate::options::{ContainerKind, DataLayout, IteratorBehavior, TraversalChoice};
use crate::particle::{Ownership, Particle};
use crate::selector;
use crate::traversals::TraversalSelectorInfo;

use super::{collect_from_cells, extract_cell_soa, load_cell_soa, ParticleContainer};

pub struct LinkedCells<P: Particle> {
    block: CellBlock,
    cells: Vec<RwLock<FullCell<P>>>,
    cutoff: f64,
    skin: f64,
}

impl<P: Particle> LinkedCells<P> {
    pub fn new(
        box_min: [f64; 3],
        box_max: [f64; 3],
        cutoff: f64,
        skin: f64,
        cell_size_factor: f64,
    ) -> Result<Self> {
        let block = CellBlock::new(box_min, box_max, cutoff, skin, cell_size_factor)?;
        let cells = (0..block.num_cells())
            .map(|_| RwLock::new(FullCell::new(block.cell_length())))
            .collect();
        Ok(Self {
            block,
            cells,
            cutoff,
            skin,
        })
    }

    pub fn cell_block(&self) -> &CellBlock {
        &self.block
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn skin(&self) -> f64 {
        self.skin
    }

    pub(crate) fn cells(&self) -> &[RwLock<FullCell<P>>] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [RwLock<FullCell<P>>] {
        &mut self.cells
    }

    pub(crate) fn selector_info(&self) -> TraversalSelectorInfo {
        TraversalSelectorInfo {
            cells_per_dim: self.block.cells_per_dim(),
            interaction_length: self.block.interaction_length(),
            cell_length: self.block.cell_length(),
            overlap: self.block.overlap(),
        }
    }

    /// Move every particle into the cell matching its current position.
    /// Unlike `update_container` this keeps halo copies and out-of-box
    /// particles (the latter land in halo cells); list rebuilds call this so
    /// the replayed traversal sees correctly binned cells.
    pub(crate) fn rebin(&mut self) {
        let mut moved = Vec::new();
        for index in 0..self.cells.len() {
            let cell = self.cells[index].get_mut().unwrap();
            let mut i = 0;
            while i < cell.len() {
                let target = self.block.index_of_position(cell.get(i).r());
                if target != index {
                    moved.push((target, cell.delete_by_index(i)));
                } else {
                    i += 1;
                }
            }
        }
        for (target, p) in moved {
            self.cells[target].get_mut().unwrap().add_particle(p);
        }
    }

    pub fn iter(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &P> {
        iterators::iter_particles(&mut self.cells, behavior)
    }

    pub fn iter_mut(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &mut P> {
        iterators::iter_particles_mut(&mut self.cells, behavior)
    }

    pub fn region_iter(
        &mut self,
        min: [f64; 3],
        max: [f64; 3],
        behavior: IteratorBehavior,
    ) -> impl Iterator<Item = &P> {
        iterators::iter_region(&mut self.cells, &self.block, min, max, behavior)
    }

    pub fn region_iter_mut(
        &mut self,
        min: [f64; 3],
        max: [f64; 3],
        behavior: IteratorBehavior,
    ) -> impl Iterator<Item = &mut P> {
        iterators::iter_region_mut(&mut self.cells, &self.block, min, max, behavior)
    }
}

impl<P: Particle> ParticleContainer<P> for LinkedCells<P> {
    fn kind(&self) -> ContainerKind {
        ContainerKind::LinkedCells
    }

    fn add_particle(&mut self, mut p: P) -> Result<()> {
        if !self.block.is_in_box(p.r()) {
            return Err(anyhow!(
                "Particle {} not in domain: position is {:?}",
                p.id(),
                p.r()
            ));
        }
        p.set_ownership(Ownership::Owned);
        let index = self.block.index_of_position(p.r());
        self.cells[index].get_mut().unwrap().add_particle(p);
        Ok(())
    }

    fn add_or_update_halo_particle(&mut self, mut p: P) -> Result<()> {
        p.set_ownership(Ownership::Halo);
        let index = self.block.index_of_position(p.r());
        if !self.block.cell_can_contain_halo_particles(index) {
            return Err(anyhow!(
                "Halo particle {} lies inside the owned region: position is {:?}",
                p.id(),
                p.r()
            ));
        }
        let cell = self.cells[index].get_mut().unwrap();
        match cell.iter_mut().find(|q| q.id() == p.id()) {
            Some(existing) => *existing = p,
            None => cell.add_particle(p),
        }
        Ok(())
    }

    fn update_container(&mut self) -> (Vec<P>, bool) {
        let mut leavers = Vec::new();
        let mut moved = Vec::new();
        let mut changed = false;
        for index in 0..self.cells.len() {
            let cell = self.cells[index].get_mut().unwrap();
            let mut i = 0;
            while i < cell.len() {
                match cell.get(i).ownership() {
                    Ownership::Halo | Ownership::Dummy => {
                        cell.delete_by_index(i);
                        changed = true;
                    }
                    Ownership::Owned => {
                        let r = cell.get(i).r();
                        if !self.block.is_in_box(r) {
                            leavers.push(cell.delete_by_index(i));
                            changed = true;
                        } else {
                            let target = self.block.index_of_position(r);
                            if target != index {
                                moved.push((target, cell.delete_by_index(i)));
                                changed = true;
                            } else {
                                i += 1;
                            }
                        }
                    }
                }
            }
        }
        for (target, p) in moved {
            self.cells[target].get_mut().unwrap().add_particle(p);
        }
        (leavers, changed)
    }

    fn iterate_pairwise(
        &mut self,
        functor: &dyn Functor<P>,
        choice: &TraversalChoice,
    ) -> Result<(), PairGridError> {
        selector::check_choice(ContainerKind::LinkedCells, choice, functor)?;
        let info = self.selector_info();
        let traversal =
            selector::generate_linked(ContainerKind::LinkedCells, functor, &info, choice)?;
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
