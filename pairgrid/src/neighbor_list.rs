//! Verlet neighbor list storage and the pair-list building functor
//!
//! Lists are built by replaying a c08 traversal over the underlying linked
//! cells with [`PairListFunctor`] plugged in as the pair functor. The functor
//! collects candidate pairs into per-thread buffers segmented by traversal
//! color, so the same storage doubles as the "as-build" variable Verlet list:
//! within one color the generating base steps were disjoint, which makes the
//! buffers replayable in parallel without any further coloring.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::functor::{Functor, ThreadAccumulators};
use crate::particle::Particle;
use crate::utils;

/// What a pair-list replay does with each candidate pair
pub enum PairListMode {
    /// Append the pair to the buffers
    Generate,
    /// Assert the pair is present in the reference lists
    Check {
        reference: HashMap<u64, HashSet<u64>>,
    },
}

/// Functor that generates or checks neighbor lists through the ordinary
/// pairwise traversal machinery.
pub struct PairListFunctor {
    search_radius: f64,
    radius_sqr: f64,
    mode: PairListMode,
    color: AtomicUsize,
    /// Pair buffers per color, each with one slot per thread
    buffers: Vec<ThreadAccumulators<Vec<(u64, u64)>>>,
    valid: AtomicBool,
}

impl PairListFunctor {
    /// Generator within `search_radius` (cutoff + skin)
    pub fn generator(search_radius: f64, num_colors: usize) -> Self {
        Self {
            search_radius,
            radius_sqr: search_radius * search_radius,
            mode: PairListMode::Generate,
            color: AtomicUsize::new(0),
            buffers: (0..num_colors).map(|_| ThreadAccumulators::new()).collect(),
            valid: AtomicBool::new(true),
        }
    }

    /// Validity checker: every pair within `cutoff` must be listed in
    /// `reference` (in either direction)
    pub fn checker(cutoff: f64, reference: HashMap<u64, HashSet<u64>>) -> Self {
        Self {
            search_radius: cutoff,
            radius_sqr: cutoff * cutoff,
            mode: PairListMode::Check { reference },
            color: AtomicUsize::new(0),
            buffers: Vec::new(),
            valid: AtomicBool::new(true),
        }
    }

    /// Color hook for the replaying traversal
    pub fn set_color(&self, color: usize) {
        self.color.store(color, Ordering::Relaxed);
    }

    pub fn lists_are_valid(&self) -> bool {
        self.valid.load(Ordering::Relaxed)
    }

    /// Consume the functor, yielding the raw pair buffers as `[color][thread]`
    pub fn into_buffers(self) -> Vec<Vec<Vec<(u64, u64)>>> {
        self.buffers
            .into_iter()
            .map(|per_thread| per_thread.into_inner())
            .collect()
    }
}

impl<P: Particle> Functor<P> for PairListFunctor {
    fn cutoff(&self) -> f64 {
        self.search_radius
    }

    fn aos(&self, i: &mut P, j: &mut P, _newton3: bool) {
        if i.is_dummy() || j.is_dummy() {
            return;
        }
        if utils::dist_sqr(i.r(), j.r()) >= self.radius_sqr {
            return;
        }
        match &self.mode {
            PairListMode::Generate => {
                let pair = (i.id(), j.id());
                let color = self.color.load(Ordering::Relaxed);
                self.buffers[color].with_mut(|buffer| buffer.push(pair));
            }
            PairListMode::Check { reference } => {
                let listed = reference
                    .get(&i.id())
                    .map_or(false, |partners| partners.contains(&j.id()))
                    || reference
                        .get(&j.id())
                        .map_or(false, |partners| partners.contains(&i.id()));
                if !listed {
                    self.valid.store(false, Ordering::Relaxed);
                }
            }
        }
    }

    fn allows_newton3(&self) -> bool {
        true
    }

    fn allows_non_newton3(&self) -> bool {
        true
    }

    fn is_relevant_for_tuning(&self) -> bool {
        false
    }
}

/// The two in-sync neighbor list representations of a Verlet container
#[derive(Default)]
pub struct NeighborLists {
    /// Particle id -> partner ids, as generated
    pub aos: HashMap<u64, Vec<u64>>,
    /// Per-row partner rows into the global SoA buffer
    pub soa: Vec<Vec<usize>>,
    /// Particle id -> row in the global SoA buffer
    pub row_of: HashMap<u64, usize>,
}

impl NeighborLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.aos.clear();
        self.soa.clear();
        self.row_of.clear();
    }

    /// Merge raw pair buffers into the AoS lists
    pub fn absorb_pairs(&mut self, buffers: Vec<Vec<Vec<(u64, u64)>>>) {
        for per_thread in buffers {
            for buffer in per_thread {
                for (id_i, id_j) in buffer {
                    self.aos.entry(id_i).or_default().push(id_j);
                }
            }
        }
    }

    /// Derive the SoA row lists from the AoS lists. Two passes: assign each
    /// particle its row by iteration order, then rewrite every entry as a row.
    pub fn derive_rows(&mut self, id_order: &[u64]) {
        self.row_of = id_order
            .iter()
            .enumerate()
            .map(|(row, &id)| (id, row))
            .collect();
        self.soa = id_order
            .iter()
            .map(|id| {
                self.aos
                    .get(id)
                    .map(|partners| partners.iter().map(|p| self.row_of[p]).collect())
                    .unwrap_or_default()
            })
            .collect();
    }

    /// Partner sets for the validity checker
    pub fn reference_sets(&self) -> HashMap<u64, HashSet<u64>> {
        self.aos
            .iter()
            .map(|(&id, partners)| (id, partners.iter().copied().collect()))
            .collect()
    }
}
