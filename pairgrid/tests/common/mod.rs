//! Shared helpers for the integration tests: instrumented functors and
//! particle generators

// Not every test binary uses every helper
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use pairgrid::{Functor, LjMolecule, Particle, ParticleContainer, SoaBuffer};

pub fn dist_sqr(a: [f64; 3], b: [f64; 3]) -> f64 {
    (0..3).map(|d| (a[d] - b[d]) * (a[d] - b[d])).sum()
}

/// Records every ordered pair visit within the cutoff, in all layouts
pub struct PairTrackFunctor {
    cutoff: f64,
    cutoff_sqr: f64,
    pub visits: Mutex<HashMap<(u64, u64), usize>>,
}

impl PairTrackFunctor {
    pub fn new(cutoff: f64) -> Self {
        Self {
            cutoff,
            cutoff_sqr: cutoff * cutoff,
            visits: Mutex::new(HashMap::new()),
        }
    }

    fn record(&self, id_i: u64, id_j: u64) {
        *self.visits.lock().unwrap().entry((id_i, id_j)).or_insert(0) += 1;
    }

    fn record_rows(&self, soa: &SoaBuffer, i: usize, j: usize) {
        if dist_sqr(soa.position(i), soa.position(j)) < self.cutoff_sqr {
            self.record(soa.ids()[i], soa.ids()[j]);
        }
    }

    fn record_rows_pair(&self, soa1: &SoaBuffer, i: usize, soa2: &SoaBuffer, j: usize) {
        if dist_sqr(soa1.position(i), soa2.position(j)) < self.cutoff_sqr {
            self.record(soa1.ids()[i], soa2.ids()[j]);
        }
    }

    /// Every ordered in-range visit, keyed `(id_i, id_j)`
    pub fn counts(&self) -> HashMap<(u64, u64), usize> {
        self.visits.lock().unwrap().clone()
    }
}

impl Functor<LjMolecule> for PairTrackFunctor {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn aos(&self, i: &mut LjMolecule, j: &mut LjMolecule, _newton3: bool) {
        if dist_sqr(i.r(), j.r()) < self.cutoff_sqr {
            self.record(i.id(), j.id());
        }
    }

    fn soa(&self, soa: &mut SoaBuffer, newton3: bool) {
        let n = soa.len();
        if newton3 {
            for i in 0..n {
                for j in (i + 1)..n {
                    self.record_rows(soa, i, j);
                }
            }
        } else {
            for i in 0..n {
                for j in 0..n {
                    if i != j {
                        self.record_rows(soa, i, j);
                    }
                }
            }
        }
    }

    fn soa_pair(&self, soa1: &mut SoaBuffer, soa2: &mut SoaBuffer, _newton3: bool) {
        for i in 0..soa1.len() {
            for j in 0..soa2.len() {
                self.record_rows_pair(soa1, i, soa2, j);
            }
        }
    }

    fn soa_verlet(
        &self,
        soa: &mut SoaBuffer,
        neighbor_lists: &[Vec<usize>],
        i_from: usize,
        i_to: usize,
        _newton3: bool,
    ) {
        for i in i_from..i_to {
            for &j in &neighbor_lists[i] {
                self.record_rows(soa, i, j);
            }
        }
    }

    fn allows_newton3(&self) -> bool {
        true
    }

    fn allows_non_newton3(&self) -> bool {
        true
    }
}

/// Counts raw entry-point invocations without any distance check
#[derive(Default)]
pub struct CallCountFunctor {
    pub aos_calls: AtomicUsize,
    pub soa_single_calls: AtomicUsize,
    pub soa_pair_calls: AtomicUsize,
}

impl CallCountFunctor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Functor<LjMolecule> for CallCountFunctor {
    fn cutoff(&self) -> f64 {
        f64::MAX
    }

    fn aos(&self, _i: &mut LjMolecule, _j: &mut LjMolecule, _newton3: bool) {
        self.aos_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn soa(&self, _soa: &mut SoaBuffer, _newton3: bool) {
        self.soa_single_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn soa_pair(&self, _soa1: &mut SoaBuffer, _soa2: &mut SoaBuffer, _newton3: bool) {
        self.soa_pair_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn allows_newton3(&self) -> bool {
        true
    }

    fn allows_non_newton3(&self) -> bool {
        true
    }
}

/// Adds the raw distance vector as force; forces of interior grid particles
/// cancel exactly
pub struct UnitForceFunctor {
    cutoff: f64,
    cutoff_sqr: f64,
}

impl UnitForceFunctor {
    pub fn new(cutoff: f64) -> Self {
        Self {
            cutoff,
            cutoff_sqr: cutoff * cutoff,
        }
    }
}

impl Functor<LjMolecule> for UnitForceFunctor {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn aos(&self, i: &mut LjMolecule, j: &mut LjMolecule, newton3: bool) {
        let dr = [
            i.r()[0] - j.r()[0],
            i.r()[1] - j.r()[1],
            i.r()[2] - j.r()[2],
        ];
        let dr_sqr = dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2];
        if dr_sqr > self.cutoff_sqr {
            return;
        }
        i.add_f(dr);
        if newton3 {
            j.sub_f(dr);
        }
    }

    fn allows_newton3(&self) -> bool {
        true
    }

    fn allows_non_newton3(&self) -> bool {
        true
    }
}

/// Functor that rejects one of the Newton-3 modes, for capability checks
pub struct NoNewton3Functor;

impl Functor<LjMolecule> for NoNewton3Functor {
    fn cutoff(&self) -> f64 {
        1.0
    }

    fn aos(&self, _i: &mut LjMolecule, _j: &mut LjMolecule, newton3: bool) {
        assert!(!newton3, "functor forbids newton3 but was driven with it");
    }

    fn allows_newton3(&self) -> bool {
        false
    }

    fn allows_non_newton3(&self) -> bool {
        true
    }
}

/// Fill a container with a regular grid of particles at half-spacing offsets
pub fn fill_grid(
    container: &mut dyn ParticleContainer<LjMolecule>,
    particles_per_dim: [usize; 3],
    spacing: f64,
) {
    let mut id = 0;
    for iz in 0..particles_per_dim[2] {
        for iy in 0..particles_per_dim[1] {
            for ix in 0..particles_per_dim[0] {
                let r = [
                    (ix as f64 + 0.5) * spacing,
                    (iy as f64 + 0.5) * spacing,
                    (iz as f64 + 0.5) * spacing,
                ];
                container
                    .add_particle(LjMolecule::new(r, [0.0; 3], id))
                    .unwrap();
                id += 1;
            }
        }
    }
}

/// All ordered pairs of owned particles strictly within the cutoff
pub fn brute_force_pairs(particles: &[LjMolecule], cutoff: f64) -> HashMap<(u64, u64), usize> {
    let cutoff_sqr = cutoff * cutoff;
    let mut pairs = HashMap::new();
    for i in particles {
        for j in particles {
            if i.id() != j.id() && dist_sqr(i.r(), j.r()) < cutoff_sqr {
                pairs.insert((i.id(), j.id()), 1);
            }
        }
    }
    pairs
}

/// Check the tracked visits against the reference pair set for one Newton-3
/// mode: one visit per unordered pair with reciprocity, one per ordering
/// without.
pub fn assert_coverage(
    counts: &HashMap<(u64, u64), usize>,
    reference: &HashMap<(u64, u64), usize>,
    newton3: bool,
    context: &str,
) {
    for (&(a, b), _) in reference {
        if a > b {
            continue;
        }
        let forward = counts.get(&(a, b)).copied().unwrap_or(0);
        let backward = counts.get(&(b, a)).copied().unwrap_or(0);
        if newton3 {
            assert_eq!(
                forward + backward,
                1,
                "{context}: pair ({a}, {b}) should be visited exactly once, \
                 got {forward} + {backward}"
            );
        } else {
            assert_eq!(
                (forward, backward),
                (1, 1),
                "{context}: pair ({a}, {b}) should be visited once per ordering"
            );
        }
    }
    for (&(a, b), &count) in counts {
        assert!(
            reference.contains_key(&(a, b)) || reference.contains_key(&(b, a)),
            "{context}: pair ({a}, {b}) visited {count} times but is out of range"
        );
    }
}
