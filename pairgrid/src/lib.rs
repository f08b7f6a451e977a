//! pairgrid: a spatial pair-iteration engine for short-range particle
//! interactions
//!
//! Given point particles in a 3D box and a hard interaction cutoff, the
//! engine evaluates a user-supplied symmetric pair functor on every particle
//! pair within the cutoff, in parallel and without data races. It provides
//! several spatial containers (direct sum, linked cells, Verlet lists,
//! per-cell Verlet lists, Verlet cluster lists), the coloring and slicing
//! traversal schemes that visit all in-range pairs exactly once (or twice,
//! depending on the Newton-3 mode), and the adapter layer that drives a
//! functor in array-of-structures or structure-of-arrays layout.
//!
//! What it deliberately does not do: long-range forces, time integration,
//! thermostatting, I/O, or tuning. The engine guarantees which pairs are
//! visited, not what is computed with them.

pub mod cell;
pub mod cell_block;
pub mod cell_functor;
pub mod config;
pub mod containers;
pub mod error;
pub mod functor;
pub mod lj;
pub mod neighbor_list;
pub mod options;
pub mod particle;
pub mod selector;
pub mod soa;
pub mod traversals;
pub mod utils;

mod iterators;

pub use cell::{FullCell, RmmCell};
pub use cell_block::CellBlock;
pub use config::Configuration;
pub use containers::{
    DirectSum, LinkedCells, ParticleContainer, VerletClusterLists, VerletLists, VerletListsCells,
};
pub use error::PairGridError;
pub use functor::Functor;
pub use lj::LjFunctor;
pub use options::{
    ContainerKind, DataLayout, IteratorBehavior, Newton3Mode, TraversalChoice, TraversalKind,
};
pub use particle::{LjMolecule, Ownership, Particle};
pub use soa::{Attribute, SoaBuffer};
