//! Lazy forward iteration over container particles
//!
//! All iterators are plain forward sequences borrowing the cells; references
//! stay valid until the next structural mutation of the container.

use std::sync::RwLock;

use crate::cell::FullCell;
use crate::cell_block::CellBlock;
use crate::options::IteratorBehavior;
use crate::particle::{Ownership, Particle};

pub(crate) fn behavior_allows(behavior: IteratorBehavior, ownership: Ownership) -> bool {
    match ownership {
        Ownership::Owned => matches!(
            behavior,
            IteratorBehavior::OwnedOnly | IteratorBehavior::OwnedAndHalo
        ),
        Ownership::Halo => matches!(
            behavior,
            IteratorBehavior::HaloOnly | IteratorBehavior::OwnedAndHalo
        ),
        Ownership::Dummy => false,
    }
}

#[inline]
pub(crate) fn position_in_region(r: [f64; 3], min: [f64; 3], max: [f64; 3]) -> bool {
    (0..3).all(|d| r[d] >= min[d] && r[d] < max[d])
}

/// Does the cell's box intersect the query region?
pub(crate) fn region_overlaps_cell(
    block: &CellBlock,
    index: usize,
    min: [f64; 3],
    max: [f64; 3],
) -> bool {
    let (lo, hi) = block.cell_bounds(index);
    (0..3).all(|d| lo[d] < max[d] && hi[d] > min[d])
}

pub(crate) fn iter_particles<P: Particle>(
    cells: &mut [RwLock<FullCell<P>>],
    behavior: IteratorBehavior,
) -> impl Iterator<Item = &P> {
    cells.iter_mut().flat_map(move |cell| {
        cell.get_mut()
            .unwrap()
            .particles()
            .iter()
            .filter(move |p| behavior_allows(behavior, p.ownership()))
    })
}

pub(crate) fn iter_particles_mut<P: Particle>(
    cells: &mut [RwLock<FullCell<P>>],
    behavior: IteratorBehavior,
) -> impl Iterator<Item = &mut P> {
    cells.iter_mut().flat_map(move |cell| {
        cell.get_mut()
            .unwrap()
            .particles_mut()
            .iter_mut()
            .filter(move |p| behavior_allows(behavior, p.ownership()))
    })
}

pub(crate) fn iter_region<'a, P: Particle>(
    cells: &'a mut [RwLock<FullCell<P>>],
    block: &'a CellBlock,
    min: [f64; 3],
    max: [f64; 3],
    behavior: IteratorBehavior,
) -> impl Iterator<Item = &'a P> + 'a {
    cells
        .iter_mut()
        .enumerate()
        .filter(move |(index, _)| region_overlaps_cell(block, *index, min, max))
        .flat_map(move |(_, cell)| {
            cell.get_mut().unwrap().particles().iter().filter(move |p| {
                behavior_allows(behavior, p.ownership()) && position_in_region(p.r(), min, max)
            })
        })
}

pub(crate) fn iter_region_mut<'a, P: Particle>(
    cells: &'a mut [RwLock<FullCell<P>>],
    block: &'a CellBlock,
    min: [f64; 3],
    max: [f64; 3],
    behavior: IteratorBehavior,
) -> impl Iterator<Item = &'a mut P> + 'a {
    cells
        .iter_mut()
        .enumerate()
        .filter(move |(index, _)| region_overlaps_cell(block, *index, min, max))
        .flat_map(move |(_, cell)| {
            cell.get_mut()
                .unwrap()
                .particles_mut()
                .iter_mut()
                .filter(move |p| {
                    behavior_allows(behavior, p.ownership()) && position_in_region(p.r(), min, max)
                })
        })
}
