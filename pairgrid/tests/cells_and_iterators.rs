//! Cell contracts, the cell block geometry, and particle/region iteration

mod common;

use pairgrid::{
    CellBlock, FullCell, IteratorBehavior, LinkedCells, LjMolecule, Particle, ParticleContainer,
    RmmCell,
};

#[test]
fn full_cell_contract() {
    let mut cell: FullCell<LjMolecule> = FullCell::new([1.0; 3]);
    assert!(cell.is_empty());
    for i in 0..4 {
        cell.add_particle(LjMolecule::new([i as f64, 0.0, 0.0], [0.0; 3], i));
    }
    assert_eq!(cell.len(), 4);

    // Forward iteration yields insertion order
    let ids: Vec<u64> = cell.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);

    // Deletion swaps in the last particle
    cell.delete_by_index(1);
    let ids: Vec<u64> = cell.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec![0, 3, 2]);

    let (a, b) = cell.pair_mut(0, 2);
    assert_eq!(a.id(), 0);
    assert_eq!(b.id(), 2);

    cell.clear();
    assert!(cell.is_empty());
    assert_eq!(cell.cell_length(), [1.0; 3]);
}

#[test]
fn rmm_cell_contract() {
    let mut cell = RmmCell::new([2.0; 3]);
    cell.add_particle([0.5, 0.5, 0.5]);
    cell.add_particle([1.5, 1.5, 1.5]);
    assert_eq!(cell.len(), 2);
    assert_eq!(cell.forces().len(), 2);

    cell.forces_mut()[0] = [1.0, 0.0, 0.0];
    let removed = cell.delete_by_index(0);
    assert_eq!(removed, [0.5, 0.5, 0.5]);
    assert_eq!(cell.len(), 1);
    assert_eq!(cell.positions()[0], [1.5, 1.5, 1.5]);

    cell.clear();
    assert!(cell.is_empty());
}

#[test]
fn cell_block_geometry() {
    let block = CellBlock::new([0.0; 3], [10.0; 3], 1.0, 0.2, 1.0).unwrap();
    // 8 inner cells of length 1.25 per dimension, plus two halo layers
    assert_eq!(block.cells_per_dim(), [10, 10, 10]);
    assert_eq!(block.overlap(), [1, 1, 1]);

    let inner = block.index_of_position([5.0, 5.0, 5.0]);
    assert!(block.cell_can_contain_owned_particles(inner));
    assert!(!block.cell_can_contain_halo_particles(inner));

    let halo = block.index_of_position([-0.5, 5.0, 5.0]);
    assert!(block.is_halo_cell(halo));
    assert!(block.cell_can_contain_halo_particles(halo));

    // Positions outside the halo are clamped onto the outermost layer
    let clamped = block.index_of_position([-100.0, 5.0, 5.0]);
    assert!(block.is_halo_cell(clamped));

    assert!(block.is_in_box([0.0, 0.0, 0.0]));
    assert!(!block.is_in_box([10.0, 5.0, 5.0]));
}

#[test]
fn iteration_respects_behavior() {
    let mut container: LinkedCells<LjMolecule> =
        LinkedCells::new([0.0; 3], [6.0; 3], 1.0, 0.2, 1.0).unwrap();
    for i in 0..10 {
        container
            .add_particle(LjMolecule::new([0.5 + 0.5 * i as f64, 3.0, 3.0], [0.0; 3], i))
            .unwrap();
    }
    container
        .add_or_update_halo_particle(LjMolecule::new([-0.2, 3.0, 3.0], [0.0; 3], 100))
        .unwrap();

    assert_eq!(container.iter(IteratorBehavior::OwnedOnly).count(), 10);
    assert_eq!(container.iter(IteratorBehavior::HaloOnly).count(), 1);
    assert_eq!(container.iter(IteratorBehavior::OwnedAndHalo).count(), 11);
}

#[test]
fn region_iteration_prunes_by_position() {
    let mut container: LinkedCells<LjMolecule> =
        LinkedCells::new([0.0; 3], [8.0; 3], 1.0, 0.2, 1.0).unwrap();
    common::fill_grid(&mut container, [8, 8, 8], 1.0);

    let min = [2.0, 2.0, 2.0];
    let max = [5.0, 5.0, 5.0];
    let in_region: Vec<u64> = container
        .region_iter(min, max, IteratorBehavior::OwnedOnly)
        .map(|p| p.id())
        .collect();
    // Grid positions at half offsets: 2.5, 3.5, 4.5 fall into [2, 5) per axis
    assert_eq!(in_region.len(), 27);

    for id in &in_region {
        assert!(*id < 8 * 8 * 8);
    }

    // Halo filter yields nothing in a pure owned setup
    assert_eq!(
        container
            .region_iter(min, max, IteratorBehavior::HaloOnly)
            .count(),
        0
    );
}

#[test]
fn updated_halo_particle_is_overwritten_not_duplicated() {
    let mut container: LinkedCells<LjMolecule> =
        LinkedCells::new([0.0; 3], [6.0; 3], 1.0, 0.2, 1.0).unwrap();
    container
        .add_or_update_halo_particle(LjMolecule::new([-0.3, 3.0, 3.0], [0.0; 3], 7))
        .unwrap();
    container
        .add_or_update_halo_particle(LjMolecule::new([-0.4, 3.0, 3.0], [0.0; 3], 7))
        .unwrap();
    let halos = container.collect_particles(IteratorBehavior::HaloOnly);
    assert_eq!(halos.len(), 1);
    assert_eq!(halos[0].r()[0], -0.4);
}
