//! Direct-sum container: entry-point invocation counts

mod common;

use std::sync::atomic::Ordering;

use common::CallCountFunctor;
use pairgrid::{
    DataLayout, DirectSum, LjMolecule, Newton3Mode, ParticleContainer, TraversalChoice,
    TraversalKind,
};

const NUM_OWNED: usize = 20;
const NUM_HALO: usize = 10;

fn filled_container() -> DirectSum<LjMolecule> {
    let mut container = DirectSum::new([0.0; 3], [10.0; 3], 3.0).unwrap();
    for i in 0..NUM_OWNED {
        let r = [0.5 + 9.0 * (i as f64 / NUM_OWNED as f64), 5.0, 5.0];
        container
            .add_particle(LjMolecule::new(r, [0.0; 3], i as u64))
            .unwrap();
    }
    for i in 0..NUM_HALO {
        let r = [
            -0.5,
            0.5 + 9.0 * (i as f64 / NUM_HALO as f64),
            5.0,
        ];
        container
            .add_or_update_halo_particle(LjMolecule::new(r, [0.0; 3], (NUM_OWNED + i) as u64))
            .unwrap();
    }
    container
}

#[test]
fn aos_call_count_newton3() {
    let mut container = filled_container();
    let functor = CallCountFunctor::new();
    let choice = TraversalChoice::new(
        TraversalKind::DirectSumTraversal,
        DataLayout::Aos,
        Newton3Mode::Enabled,
    );
    container.iterate_pairwise(&functor, &choice).unwrap();
    // n(n-1)/2 owned pairs plus every owned-halo pair once
    let expected = NUM_OWNED * (NUM_OWNED - 1) / 2 + NUM_OWNED * NUM_HALO;
    assert_eq!(functor.aos_calls.load(Ordering::Relaxed), expected);
}

#[test]
fn aos_call_count_no_newton3() {
    let mut container = filled_container();
    let functor = CallCountFunctor::new();
    let choice = TraversalChoice::new(
        TraversalKind::DirectSumTraversal,
        DataLayout::Aos,
        Newton3Mode::Disabled,
    );
    container.iterate_pairwise(&functor, &choice).unwrap();
    // Every ordering separately
    let expected = NUM_OWNED * (NUM_OWNED - 1) + 2 * NUM_OWNED * NUM_HALO;
    assert_eq!(functor.aos_calls.load(Ordering::Relaxed), expected);
}

#[test]
fn soa_call_counts() {
    let mut container = filled_container();
    let functor = CallCountFunctor::new();
    let choice = TraversalChoice::new(
        TraversalKind::DirectSumTraversal,
        DataLayout::Soa,
        Newton3Mode::Enabled,
    );
    container.iterate_pairwise(&functor, &choice).unwrap();
    // One self call on the owned buffer, one cross call against the halo buffer
    assert_eq!(functor.soa_single_calls.load(Ordering::Relaxed), 1);
    assert_eq!(functor.soa_pair_calls.load(Ordering::Relaxed), 1);
}

#[test]
fn leavers_are_returned_and_halo_dropped() {
    use pairgrid::{IteratorBehavior, Particle};

    let mut container = filled_container();
    container
        .add_particle(LjMolecule::new([5.0, 5.0, 5.0], [0.0; 3], 999))
        .unwrap();

    // Push that particle out of the box
    for p in container.iter_mut(IteratorBehavior::OwnedOnly) {
        if p.id() == 999 {
            p.set_r([11.0, 5.0, 5.0]);
        }
    }
    let (leavers, changed) = container.update_container();
    assert!(changed);
    assert_eq!(leavers.len(), 1);
    assert_eq!(leavers[0].id(), 999);

    let remaining = container.collect_particles(IteratorBehavior::OwnedAndHalo);
    assert_eq!(remaining.len(), NUM_OWNED, "halo copies must be dropped");
    assert!(remaining.iter().all(|p| p.is_owned()));
}
