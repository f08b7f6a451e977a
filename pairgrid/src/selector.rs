//! Traversal selection: compatibility and applicability checks plus traversal
//! construction
//!
//! Pure functions of the requested `(container, traversal, layout, newton3)`
//! tuple; no I/O, no state. Compatibility (which traversal belongs to which
//! container) is encoded as data, applicability (does the combination work
//! for this geometry and functor) is answered by the constructed traversal.

use crate::error::PairGridError;
use crate::functor::Functor;
use crate::options::{ContainerKind, DataLayout, TraversalChoice, TraversalKind};
use crate::particle::Particle;
use crate::traversals::{
    C01Traversal, C04Traversal, C08Traversal, C18Traversal, DirectSumTraversal, LinkedTraversal,
    SlicedTraversal, TraversalSelectorInfo,
};

/// Traversals that can run on the given container kind
pub fn compatible_traversals(container: ContainerKind) -> &'static [TraversalKind] {
    match container {
        ContainerKind::DirectSum => &[TraversalKind::DirectSumTraversal],
        ContainerKind::LinkedCells => &[
            TraversalKind::C01,
            TraversalKind::C04,
            TraversalKind::C04SoA,
            TraversalKind::C08,
            TraversalKind::C18,
            TraversalKind::Sliced,
            TraversalKind::C01Cuda,
        ],
        ContainerKind::VerletLists => &[
            TraversalKind::VerletTraversal,
            TraversalKind::VarVerletAsBuild,
        ],
        ContainerKind::VerletListsCells => &[
            TraversalKind::C01Verlet,
            TraversalKind::C18Verlet,
            TraversalKind::SlicedVerlet,
        ],
        ContainerKind::VerletClusterLists => &[
            TraversalKind::VerletClusters,
            TraversalKind::VerletClustersColoring,
        ],
    }
}

/// Reject combinations that are off the compatibility table or violate the
/// functor's Newton-3 capabilities. Geometry-dependent applicability is
/// checked by the constructed traversal afterwards.
pub fn check_choice<P: Particle>(
    container: ContainerKind,
    choice: &TraversalChoice,
    functor: &dyn Functor<P>,
) -> Result<(), PairGridError> {
    if !compatible_traversals(container).contains(&choice.traversal) {
        return Err(PairGridError::UnknownOption(format!(
            "traversal {} cannot run on container {}",
            choice.traversal, container
        )));
    }
    let newton3 = choice.use_newton3();
    let capable = if newton3 {
        functor.allows_newton3()
    } else {
        functor.allows_non_newton3()
    };
    if !capable {
        return Err(PairGridError::TraversalNotApplicable {
            container,
            traversal: choice.traversal,
            data_layout: choice.data_layout,
            newton3,
        });
    }
    Ok(())
}

/// Construct a linked-cells family traversal, verifying its applicability
pub fn generate_linked<'a, P: Particle>(
    container: ContainerKind,
    functor: &'a dyn Functor<P>,
    info: &TraversalSelectorInfo,
    choice: &TraversalChoice,
) -> Result<Box<dyn LinkedTraversal<P> + 'a>, PairGridError> {
    let layout = choice.data_layout;
    let newton3 = choice.use_newton3();
    let traversal: Box<dyn LinkedTraversal<P>> = match choice.traversal {
        TraversalKind::DirectSumTraversal => {
            Box::new(DirectSumTraversal::new(functor, layout, newton3))
        }
        TraversalKind::C01 => Box::new(C01Traversal::new(functor, info, layout, newton3)),
        TraversalKind::C04 | TraversalKind::C04SoA => Box::new(C04Traversal::new(
            functor,
            info,
            choice.traversal,
            layout,
            newton3,
        )),
        TraversalKind::C08 => Box::new(C08Traversal::new(functor, info, layout, newton3)),
        TraversalKind::C18 => Box::new(C18Traversal::new(functor, info, layout, newton3)),
        TraversalKind::Sliced => Box::new(SlicedTraversal::new(functor, info, layout, newton3)),
        TraversalKind::C01Cuda => {
            // No device paths in this build
            return Err(PairGridError::TraversalNotApplicable {
                container,
                traversal: choice.traversal,
                data_layout: layout,
                newton3,
            });
        }
        other => {
            return Err(PairGridError::UnknownOption(format!(
                "traversal {other} is not a linked-cells traversal"
            )))
        }
    };
    if !traversal.is_applicable() {
        return Err(PairGridError::TraversalNotApplicable {
            container,
            traversal: choice.traversal,
            data_layout: layout,
            newton3,
        });
    }
    Ok(traversal)
}
