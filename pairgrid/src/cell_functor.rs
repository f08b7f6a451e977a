//! Pair enumeration within one cell and between two cells
//!
//! Wraps a pair functor and drives it over all particle pairs of a cell or a
//! cell pair, honoring the configured data layout and Newton-3 mode. In
//! mono-directional mode only the first cell's particles are updated; the
//! c01 traversal family relies on this to keep neighbor cells read-only.

use crate::cell::FullCell;
use crate::functor::Functor;
use crate::options::DataLayout;
use crate::particle::Particle;

pub struct CellFunctor<'a, P: Particle> {
    functor: &'a dyn Functor<P>,
    data_layout: DataLayout,
    newton3: bool,
    bidirectional: bool,
}

impl<'a, P: Particle> CellFunctor<'a, P> {
    pub fn new(
        functor: &'a dyn Functor<P>,
        data_layout: DataLayout,
        newton3: bool,
        bidirectional: bool,
    ) -> Self {
        Self {
            functor,
            data_layout,
            newton3,
            bidirectional,
        }
    }

    /// All pairwise interactions of particles inside one cell
    pub fn process_cell(&self, cell: &mut FullCell<P>) {
        match self.data_layout {
            DataLayout::Aos => {
                if self.newton3 {
                    for i in 0..cell.len() {
                        for j in (i + 1)..cell.len() {
                            let (pi, pj) = cell.pair_mut(i, j);
                            self.functor.aos(pi, pj, true);
                        }
                    }
                } else {
                    // Each unordered pair is visited twice, once per ordering
                    for i in 0..cell.len() {
                        for j in 0..cell.len() {
                            if i == j {
                                continue;
                            }
                            let (pi, pj) = cell.pair_mut(i, j);
                            self.functor.aos(pi, pj, false);
                        }
                    }
                }
            }
            DataLayout::Soa => self.functor.soa(cell.soa_mut(), self.newton3),
            DataLayout::Cuda => unreachable!("cuda layout has no host execution path"),
        }
    }

    /// All interactions between particles of `cell1` and particles of `cell2`
    pub fn process_cell_pair(
        &self,
        cell1: &mut FullCell<P>,
        cell2: &mut FullCell<P>,
        _r_hat: [f64; 3],
    ) {
        match self.data_layout {
            DataLayout::Aos => {
                if self.newton3 {
                    for i in 0..cell1.len() {
                        for j in 0..cell2.len() {
                            self.functor.aos(cell1.get_mut(i), cell2.get_mut(j), true);
                        }
                    }
                } else {
                    for i in 0..cell1.len() {
                        for j in 0..cell2.len() {
                            self.functor.aos(cell1.get_mut(i), cell2.get_mut(j), false);
                            if self.bidirectional {
                                self.functor.aos(cell2.get_mut(j), cell1.get_mut(i), false);
                            }
                        }
                    }
                }
            }
            DataLayout::Soa => {
                self.functor
                    .soa_pair(cell1.soa_mut(), cell2.soa_mut(), self.newton3);
                if !self.newton3 && self.bidirectional {
                    self.functor
                        .soa_pair(cell2.soa_mut(), cell1.soa_mut(), false);
                }
            }
            DataLayout::Cuda => unreachable!("cuda layout has no host execution path"),
        }
    }
}
