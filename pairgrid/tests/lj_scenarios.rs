//! End-to-end Lennard-Jones scenarios with known closed-form results
//!
//! Two particles at distance 0.5 with eps = sigma = 1 and shift 0.1:
//! |F| = 390144 on each, U = 16128.1, virial = 195072.

use approx::assert_relative_eq;
use pairgrid::{
    DataLayout, IteratorBehavior, LinkedCells, LjFunctor, LjMolecule, Newton3Mode, PairGridError,
    Particle, ParticleContainer, TraversalChoice, TraversalKind, VerletLists,
};

const BOX_SIZE: f64 = 10.0;
const CUTOFF: f64 = 1.0;
const SKIN: f64 = 0.2;
const EPSILON: f64 = 1.0;
const SIGMA: f64 = 1.0;
const SHIFT: f64 = 0.1;

const EXPECTED_FORCE: f64 = 390_144.0;
const EXPECTED_UPOT: f64 = 16_128.1;
const EXPECTED_VIRIAL: f64 = 195_072.0;

fn two_particle_pair() -> (LjMolecule, LjMolecule) {
    (
        LjMolecule::new([9.99, 5.0, 5.0], [0.0; 3], 0),
        LjMolecule::new([9.99, 5.5, 5.0], [0.0; 3], 1),
    )
}

fn assert_scalars(functor: &LjFunctor) {
    assert_relative_eq!(
        functor.potential_energy().unwrap(),
        EXPECTED_UPOT,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        functor.virial().unwrap(),
        EXPECTED_VIRIAL,
        max_relative = 1e-12
    );
}

fn assert_forces(particles: &[LjMolecule]) {
    assert_eq!(particles.len(), 2);
    for p in particles {
        let f = p.f();
        let norm = (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt();
        assert_relative_eq!(norm, EXPECTED_FORCE, max_relative = 1e-12);
    }
}

/// Three consecutive force evaluations on a Verlet container, the particles
/// drifting by skin/3 between evaluations. The drift keeps the separation
/// fixed, stays within the list's soundness window on the second step, and
/// forces a rebuild on the third.
#[test]
fn drifting_pair_on_verlet_lists() {
    let (a, b) = two_particle_pair();
    let mut container =
        VerletLists::new([0.0; 3], [BOX_SIZE; 3], CUTOFF, SKIN, 100, 1.0).unwrap();
    container.add_particle(a).unwrap();
    container.add_particle(b).unwrap();

    let functor = LjFunctor::with_globals(CUTOFF, EPSILON, SIGMA, SHIFT);
    let choice = TraversalChoice::new(
        TraversalKind::VerletTraversal,
        DataLayout::Aos,
        Newton3Mode::Enabled,
    );

    for step in 0..3 {
        if step > 0 {
            // Shift both particles along x; the pair distance is unchanged
            for p in container.iter_mut(IteratorBehavior::OwnedOnly) {
                let mut r = p.r();
                r[0] -= SKIN / 3.0;
                p.set_r(r);
            }
        }
        for p in container.iter_mut(IteratorBehavior::OwnedOnly) {
            p.set_f([0.0; 3]);
        }
        container.iterate_pairwise(&functor, &choice).unwrap();
    }

    // Cumulative drift of 2/3 skin exceeded the half-skin window once
    assert_eq!(container.num_rebuilds(), 2);
    assert_forces(&container.collect_particles(IteratorBehavior::OwnedOnly));
    assert_scalars(&functor);
}

/// The same pair must produce identical scalars for every layout and
/// Newton-3 mode on linked cells.
#[test]
fn scalars_agree_across_layouts_and_newton3() {
    for data_layout in [DataLayout::Aos, DataLayout::Soa] {
        for newton3 in [Newton3Mode::Enabled, Newton3Mode::Disabled] {
            let (a, b) = two_particle_pair();
            let mut container: LinkedCells<LjMolecule> =
                LinkedCells::new([0.0; 3], [BOX_SIZE; 3], CUTOFF, SKIN, 1.0).unwrap();
            container.add_particle(a).unwrap();
            container.add_particle(b).unwrap();

            let functor = LjFunctor::with_globals(CUTOFF, EPSILON, SIGMA, SHIFT);
            let choice = TraversalChoice::new(TraversalKind::C08, data_layout, newton3);
            container.iterate_pairwise(&functor, &choice).unwrap();

            assert_forces(&container.collect_particles(IteratorBehavior::OwnedOnly));
            assert_scalars(&functor);
        }
    }
}

#[test]
fn accessors_require_post_processing() {
    let functor = LjFunctor::with_globals(CUTOFF, EPSILON, SIGMA, SHIFT);
    assert!(matches!(
        functor.potential_energy(),
        Err(PairGridError::PostProcessingOrder(_))
    ));
    assert!(matches!(
        functor.virial(),
        Err(PairGridError::PostProcessingOrder(_))
    ));

    functor.post_process(true).unwrap();
    assert!(functor.potential_energy().is_ok());
    assert!(matches!(
        functor.post_process(true),
        Err(PairGridError::PostProcessingOrder(_))
    ));
}

/// Two subdomains split at x = 5, exchanging leavers and halo copies, must
/// reproduce the single-container scalars.
#[test]
fn split_domains_match_single_container() {
    let positions = [[4.8, 5.0, 5.0], [5.3, 5.0, 5.0]];

    // Reference: one container over the full box
    let reference_functor = LjFunctor::with_globals(CUTOFF, EPSILON, SIGMA, SHIFT);
    {
        let mut reference: LinkedCells<LjMolecule> =
            LinkedCells::new([0.0; 3], [BOX_SIZE; 3], CUTOFF, SKIN, 1.0).unwrap();
        for (id, &r) in positions.iter().enumerate() {
            reference
                .add_particle(LjMolecule::new(r, [0.0; 3], id as u64))
                .unwrap();
        }
        let choice = TraversalChoice::new(
            TraversalKind::C08,
            DataLayout::Aos,
            Newton3Mode::Enabled,
        );
        reference.iterate_pairwise(&reference_functor, &choice).unwrap();
    }
    let expected_upot = reference_functor.potential_energy().unwrap();
    let expected_virial = reference_functor.virial().unwrap();

    // Two subdomains with a halo exchange across the x = 5 plane
    let mut left: LinkedCells<LjMolecule> =
        LinkedCells::new([0.0; 3], [5.0, BOX_SIZE, BOX_SIZE], CUTOFF, SKIN, 1.0).unwrap();
    let mut right: LinkedCells<LjMolecule> =
        LinkedCells::new([5.0, 0.0, 0.0], [BOX_SIZE; 3], CUTOFF, SKIN, 1.0).unwrap();
    left.add_particle(LjMolecule::new(positions[0], [0.0; 3], 0))
        .unwrap();
    right
        .add_particle(LjMolecule::new(positions[1], [0.0; 3], 1))
        .unwrap();

    // Halo exchange: copies of boundary particles cross the plane
    let left_boundary =
        left.collect_particles(IteratorBehavior::OwnedOnly);
    for p in left_boundary
        .iter()
        .filter(|p| p.r()[0] >= 5.0 - CUTOFF - SKIN)
    {
        right.add_or_update_halo_particle(p.clone()).unwrap();
    }
    let right_boundary = right.collect_particles(IteratorBehavior::OwnedOnly);
    for p in right_boundary
        .iter()
        .filter(|p| p.r()[0] < 5.0 + CUTOFF + SKIN)
    {
        left.add_or_update_halo_particle(p.clone()).unwrap();
    }

    let choice = TraversalChoice::new(TraversalKind::C08, DataLayout::Aos, Newton3Mode::Enabled);
    let left_functor = LjFunctor::with_globals(CUTOFF, EPSILON, SIGMA, SHIFT);
    left.iterate_pairwise(&left_functor, &choice).unwrap();
    let right_functor = LjFunctor::with_globals(CUTOFF, EPSILON, SIGMA, SHIFT);
    right.iterate_pairwise(&right_functor, &choice).unwrap();

    let split_upot = left_functor.potential_energy().unwrap()
        + right_functor.potential_energy().unwrap();
    let split_virial = left_functor.virial().unwrap() + right_functor.virial().unwrap();
    assert_relative_eq!(split_upot, expected_upot, max_relative = 1e-12);
    assert_relative_eq!(split_virial, expected_virial, max_relative = 1e-12);

    // Forces on the owned particles match the single-container result
    let left_force = left.collect_particles(IteratorBehavior::OwnedOnly)[0].f();
    let right_force = right.collect_particles(IteratorBehavior::OwnedOnly)[0].f();
    assert_relative_eq!(left_force[0], -right_force[0], max_relative = 1e-12);
    let norm = (left_force[0] * left_force[0]
        + left_force[1] * left_force[1]
        + left_force[2] * left_force[2])
        .sqrt();
    assert_relative_eq!(norm, EXPECTED_FORCE, max_relative = 1e-12);

    // A particle crossing the plane is handed over as a leaver
    for p in left.iter_mut(IteratorBehavior::OwnedOnly) {
        let mut r = p.r();
        r[0] = 5.1;
        p.set_r(r);
    }
    let (leavers, _) = left.update_container();
    assert_eq!(leavers.len(), 1);
    // Stale halo copies are dropped before the handover is applied
    let (right_leavers, _) = right.update_container();
    assert!(right_leavers.is_empty());
    for leaver in leavers {
        right.add_particle(leaver).unwrap();
    }
    assert_eq!(
        right.collect_particles(IteratorBehavior::OwnedOnly).len(),
        2
    );
    assert!(left.collect_particles(IteratorBehavior::OwnedOnly).is_empty());
}
