//! Verlet cluster lists: tower/cluster structure and pair coverage

mod common;

use common::{assert_coverage, brute_force_pairs, PairTrackFunctor};
use pairgrid::{
    DataLayout, IteratorBehavior, LjMolecule, Newton3Mode, PairGridError, Particle,
    ParticleContainer, TraversalChoice, TraversalKind, VerletClusterLists,
};
use rand::SeedableRng;
use rand_distr::Distribution;

const NUM_PARTICLES: usize = 400;
const CUTOFF: f64 = 1.0;
const SKIN: f64 = 0.3;
const DOMAIN_SIZE: f64 = 6.0;
const CLUSTER_SIZE: usize = 4;

fn random_container(seed: u64) -> VerletClusterLists<LjMolecule> {
    let mut container = VerletClusterLists::new(
        [0.0; 3],
        [DOMAIN_SIZE; 3],
        CUTOFF,
        SKIN,
        10,
        CLUSTER_SIZE,
    )
    .unwrap();
    let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(seed);
    let dist = rand_distr::Uniform::new(0.0, DOMAIN_SIZE);
    for id in 0..NUM_PARTICLES {
        let r = [
            dist.sample(&mut rng),
            dist.sample(&mut rng),
            dist.sample(&mut rng),
        ];
        container
            .add_particle(LjMolecule::new(r, [0.0; 3], id as u64))
            .unwrap();
    }
    container
}

#[test]
fn coloring_traversal_covers_all_pairs_with_newton3() {
    let mut container = random_container(42);
    let choice = TraversalChoice::new(
        TraversalKind::VerletClustersColoring,
        DataLayout::Aos,
        Newton3Mode::Enabled,
    );
    let functor = PairTrackFunctor::new(CUTOFF);
    container.iterate_pairwise(&functor, &choice).unwrap();

    let particles = container.collect_particles(IteratorBehavior::OwnedOnly);
    let reference = brute_force_pairs(&particles, CUTOFF);
    assert_coverage(&functor.counts(), &reference, true, "clusters coloring n3");
}

#[test]
fn plain_traversal_covers_all_pairs_without_newton3() {
    let mut container = random_container(43);
    let choice = TraversalChoice::new(
        TraversalKind::VerletClusters,
        DataLayout::Aos,
        Newton3Mode::Disabled,
    );
    let functor = PairTrackFunctor::new(CUTOFF);
    container.iterate_pairwise(&functor, &choice).unwrap();

    let particles = container.collect_particles(IteratorBehavior::OwnedOnly);
    let reference = brute_force_pairs(&particles, CUTOFF);
    assert_coverage(&functor.counts(), &reference, false, "clusters no n3");
}

#[test]
fn plain_traversal_rejects_newton3() {
    let mut container = random_container(44);
    let choice = TraversalChoice::new(
        TraversalKind::VerletClusters,
        DataLayout::Aos,
        Newton3Mode::Enabled,
    );
    let functor = PairTrackFunctor::new(CUTOFF);
    assert!(matches!(
        container.iterate_pairwise(&functor, &choice),
        Err(PairGridError::TraversalNotApplicable { .. })
    ));
}

/// Padding dummies stay invisible: never iterated, never interacted with
#[test]
fn dummies_never_reach_the_functor() {
    let mut container = random_container(45);
    let choice = TraversalChoice::new(
        TraversalKind::VerletClustersColoring,
        DataLayout::Aos,
        Newton3Mode::Enabled,
    );
    let functor = PairTrackFunctor::new(CUTOFF);
    container.iterate_pairwise(&functor, &choice).unwrap();

    // Visits reference only real particle ids
    for ((a, b), _) in functor.counts() {
        assert!(a < NUM_PARTICLES as u64);
        assert!(b < NUM_PARTICLES as u64);
    }
    let all = container.collect_particles(IteratorBehavior::OwnedAndHalo);
    assert_eq!(all.len(), NUM_PARTICLES, "dummies must not be iterated");
}

#[test]
fn motion_beyond_half_skin_rebuilds_clusters() {
    let mut container = random_container(46);
    let choice = TraversalChoice::new(
        TraversalKind::VerletClustersColoring,
        DataLayout::Aos,
        Newton3Mode::Enabled,
    );
    let functor = PairTrackFunctor::new(CUTOFF);
    container.iterate_pairwise(&functor, &choice).unwrap();
    assert_eq!(container.num_rebuilds(), 1);

    if let Some(p) = container.iter_mut(IteratorBehavior::OwnedOnly).next() {
        let mut r = p.r();
        r[2] = (r[2] + SKIN / 2.0 + 1e-3).min(DOMAIN_SIZE - 1e-9);
        p.set_r(r);
    }
    let functor = PairTrackFunctor::new(CUTOFF);
    container.iterate_pairwise(&functor, &choice).unwrap();
    assert_eq!(container.num_rebuilds(), 2);

    // Coverage holds after the rebuild as well
    let particles = container.collect_particles(IteratorBehavior::OwnedOnly);
    let reference = brute_force_pairs(&particles, CUTOFF);
    assert_coverage(&functor.counts(), &reference, true, "after cluster rebuild");
}
