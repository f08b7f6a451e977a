//! Typed errors surfaced to the driver
//!
//! Recoverable conditions (a non-applicable or unknown combination) are
//! returned from selector and container entry points so the driver can skip
//! or re-tune. Invariant violations are fatal for the engine instance.

use std::fmt;

use crate::options::{ContainerKind, DataLayout, TraversalKind};

/// Errors arising from traversal selection and pairwise iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum PairGridError {
    /// The selected combination fails its static applicability predicate.
    TraversalNotApplicable {
        container: ContainerKind,
        traversal: TraversalKind,
        data_layout: DataLayout,
        newton3: bool,
    },

    /// The selector received a tag it does not recognize for this container.
    UnknownOption(String),

    /// An internal invariant did not hold (e.g. a neighbor list failed its
    /// validity check right after a rebuild). Not recoverable.
    InvariantViolation(String),

    /// Global-value post-processing was invoked twice, or an accessor was
    /// called before post-processing.
    PostProcessingOrder(String),
}

impl fmt::Display for PairGridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TraversalNotApplicable {
                container,
                traversal,
                data_layout,
                newton3,
            } => write!(
                f,
                "Traversal {traversal} is not applicable on container {container} \
                 (layout {data_layout}, newton3 {newton3})"
            ),
            Self::UnknownOption(tag) => write!(f, "Unknown option: {tag}"),
            Self::InvariantViolation(msg) => write!(f, "Invariant violation: {msg}"),
            Self::PostProcessingOrder(msg) => write!(f, "Post-processing order violated: {msg}"),
        }
    }
}

impl std::error::Error for PairGridError {}
