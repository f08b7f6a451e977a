//! Option enums recognized by the selector and the containers

use strum_macros::{Display, EnumIter, EnumString};

/// Available particle container kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString)]
pub enum ContainerKind {
    #[strum(serialize = "directSum")]
    DirectSum,
    #[strum(serialize = "linkedCells")]
    LinkedCells,
    #[strum(serialize = "verletLists")]
    VerletLists,
    #[strum(serialize = "verletListsCells")]
    VerletListsCells,
    #[strum(serialize = "verletClusterLists")]
    VerletClusterLists,
}

/// Available traversal schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString)]
pub enum TraversalKind {
    #[strum(serialize = "directSumTraversal")]
    DirectSumTraversal,
    #[strum(serialize = "c01")]
    C01,
    #[strum(serialize = "c04")]
    C04,
    #[strum(serialize = "c04SoA")]
    C04SoA,
    #[strum(serialize = "c08")]
    C08,
    #[strum(serialize = "c18")]
    C18,
    #[strum(serialize = "sliced")]
    Sliced,
    #[strum(serialize = "verletTraversal")]
    VerletTraversal,
    #[strum(serialize = "c01Verlet")]
    C01Verlet,
    #[strum(serialize = "c18Verlet")]
    C18Verlet,
    #[strum(serialize = "slicedVerlet")]
    SlicedVerlet,
    #[strum(serialize = "varVerletTraversalAsBuild")]
    VarVerletAsBuild,
    #[strum(serialize = "verletClusters")]
    VerletClusters,
    #[strum(serialize = "verletClustersColoring")]
    VerletClustersColoring,
    #[strum(serialize = "c01Cuda")]
    C01Cuda,
}

/// Particle data layout a traversal drives the functor in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString)]
pub enum DataLayout {
    #[strum(serialize = "aos")]
    Aos,
    #[strum(serialize = "soa")]
    Soa,
    #[strum(serialize = "cuda")]
    Cuda,
}

/// Whether the engine exploits force reciprocity (`F_ij = -F_ji`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString)]
pub enum Newton3Mode {
    #[strum(serialize = "enabled")]
    Enabled,
    #[strum(serialize = "disabled")]
    Disabled,
}

impl Newton3Mode {
    pub fn as_bool(self) -> bool {
        matches!(self, Newton3Mode::Enabled)
    }
}

/// Ownership filter for particle iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString)]
pub enum IteratorBehavior {
    #[strum(serialize = "ownedOnly")]
    OwnedOnly,
    #[strum(serialize = "haloOnly")]
    HaloOnly,
    #[strum(serialize = "ownedAndHalo")]
    OwnedAndHalo,
}

/// One traversal configuration as handed to `iterate_pairwise`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalChoice {
    pub traversal: TraversalKind,
    pub data_layout: DataLayout,
    pub newton3: Newton3Mode,
}

impl TraversalChoice {
    pub fn new(traversal: TraversalKind, data_layout: DataLayout, newton3: Newton3Mode) -> Self {
        Self {
            traversal,
            data_layout,
            newton3,
        }
    }

    pub fn use_newton3(&self) -> bool {
        self.newton3.as_bool()
    }
}
