//! Selector behavior: compatibility tables, applicability errors, option tags

mod common;

use common::{NoNewton3Functor, PairTrackFunctor};
use pairgrid::{
    Configuration, ContainerKind, DataLayout, LinkedCells, LjMolecule, Newton3Mode, PairGridError,
    ParticleContainer, TraversalChoice, TraversalKind,
};

fn small_container() -> LinkedCells<LjMolecule> {
    let mut container = LinkedCells::new([0.0; 3], [6.0; 3], 1.0, 0.2, 1.0).unwrap();
    container
        .add_particle(LjMolecule::new([3.0, 3.0, 3.0], [0.0; 3], 0))
        .unwrap();
    container
        .add_particle(LjMolecule::new([3.5, 3.0, 3.0], [0.0; 3], 1))
        .unwrap();
    container
}

#[test]
fn incompatible_traversal_is_an_unknown_option() {
    let mut container = small_container();
    let functor = PairTrackFunctor::new(1.0);
    let choice = TraversalChoice::new(
        TraversalKind::VerletTraversal,
        DataLayout::Aos,
        Newton3Mode::Enabled,
    );
    assert!(matches!(
        container.iterate_pairwise(&functor, &choice),
        Err(PairGridError::UnknownOption(_))
    ));
}

#[test]
fn c01_rejects_newton3() {
    let mut container = small_container();
    let functor = PairTrackFunctor::new(1.0);
    let choice = TraversalChoice::new(TraversalKind::C01, DataLayout::Aos, Newton3Mode::Enabled);
    assert!(matches!(
        container.iterate_pairwise(&functor, &choice),
        Err(PairGridError::TraversalNotApplicable { .. })
    ));
    let choice = TraversalChoice::new(TraversalKind::C01, DataLayout::Aos, Newton3Mode::Disabled);
    container.iterate_pairwise(&functor, &choice).unwrap();
}

#[test]
fn c04soa_requires_soa_layout() {
    let mut container = small_container();
    let functor = PairTrackFunctor::new(1.0);
    let choice =
        TraversalChoice::new(TraversalKind::C04SoA, DataLayout::Aos, Newton3Mode::Enabled);
    assert!(matches!(
        container.iterate_pairwise(&functor, &choice),
        Err(PairGridError::TraversalNotApplicable { .. })
    ));
    let choice =
        TraversalChoice::new(TraversalKind::C04SoA, DataLayout::Soa, Newton3Mode::Enabled);
    container.iterate_pairwise(&functor, &choice).unwrap();
}

#[test]
fn cuda_paths_are_never_applicable() {
    let mut container = small_container();
    let functor = PairTrackFunctor::new(1.0);
    for choice in [
        TraversalChoice::new(TraversalKind::C01Cuda, DataLayout::Cuda, Newton3Mode::Disabled),
        TraversalChoice::new(TraversalKind::C08, DataLayout::Cuda, Newton3Mode::Enabled),
    ] {
        assert!(matches!(
            container.iterate_pairwise(&functor, &choice),
            Err(PairGridError::TraversalNotApplicable { .. })
        ));
    }
}

#[test]
fn functor_capabilities_are_enforced() {
    let mut container = small_container();
    let functor = NoNewton3Functor;
    let choice = TraversalChoice::new(TraversalKind::C08, DataLayout::Aos, Newton3Mode::Enabled);
    assert!(matches!(
        container.iterate_pairwise(&functor, &choice),
        Err(PairGridError::TraversalNotApplicable { .. })
    ));
    let choice = TraversalChoice::new(TraversalKind::C08, DataLayout::Aos, Newton3Mode::Disabled);
    container.iterate_pairwise(&functor, &choice).unwrap();
}

#[test]
fn option_tags_round_trip() {
    assert_eq!("c08".parse::<TraversalKind>().unwrap(), TraversalKind::C08);
    assert_eq!(
        "verletClustersColoring".parse::<TraversalKind>().unwrap(),
        TraversalKind::VerletClustersColoring
    );
    assert_eq!(TraversalKind::C04SoA.to_string(), "c04SoA");
    assert_eq!(
        "linkedCells".parse::<ContainerKind>().unwrap(),
        ContainerKind::LinkedCells
    );
    assert!("c999".parse::<TraversalKind>().is_err());
}

#[test]
fn configuration_filters_compatible_choices() {
    let config = Configuration {
        allowed_traversals: vec![TraversalKind::C08, TraversalKind::VerletTraversal],
        allowed_data_layouts: vec![DataLayout::Aos],
        allowed_newton3: vec![Newton3Mode::Enabled],
        ..Configuration::default()
    };
    let linked = config.choices_for(ContainerKind::LinkedCells);
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].traversal, TraversalKind::C08);

    let verlet = config.choices_for(ContainerKind::VerletLists);
    assert_eq!(verlet.len(), 1);
    assert_eq!(verlet[0].traversal, TraversalKind::VerletTraversal);

    let none = Configuration {
        allowed_containers: vec![],
        ..Configuration::default()
    };
    assert!(none.choices_for(ContainerKind::LinkedCells).is_empty());
}
