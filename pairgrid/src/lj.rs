//! Scalar Lennard-Jones pair functor
//!
//! Reference kernel used by the examples and the end-to-end tests. Forces are
//! always computed; potential energy and virial only when requested, weighted
//! by particle ownership so that halo copies never double-count a pair.

use std::sync::Mutex;

use crate::error::PairGridError;
use crate::functor::{Functor, ThreadAccumulators};
use crate::particle::{Ownership, Particle};
use crate::soa::SoaBuffer;
use crate::utils;

#[derive(Default, Clone, Copy)]
struct GlobalsBucket {
    upot_sum: f64,
    virial_sum: [f64; 3],
}

#[derive(Default)]
struct GlobalsState {
    upot: f64,
    virial: [f64; 3],
    post_processed: bool,
}

pub struct LjFunctor {
    cutoff: f64,
    cutoff_sqr: f64,
    epsilon24: f64,
    sigma_sqr: f64,
    shift6: f64,
    calculate_globals: bool,
    buckets: ThreadAccumulators<GlobalsBucket>,
    globals: Mutex<GlobalsState>,
}

#[inline(always)]
fn ownership_weight(ownership: Ownership) -> f64 {
    match ownership {
        Ownership::Owned => 1.0,
        Ownership::Halo | Ownership::Dummy => 0.0,
    }
}

impl LjFunctor {
    /// Functor computing forces only
    pub fn new(cutoff: f64, epsilon: f64, sigma: f64, shift: f64) -> Self {
        Self {
            cutoff,
            cutoff_sqr: cutoff * cutoff,
            epsilon24: epsilon * 24.0,
            sigma_sqr: sigma * sigma,
            shift6: shift * 6.0,
            calculate_globals: false,
            buckets: ThreadAccumulators::new(),
            globals: Mutex::new(GlobalsState::default()),
        }
    }

    /// Functor additionally accumulating potential energy and virial
    pub fn with_globals(cutoff: f64, epsilon: f64, sigma: f64, shift: f64) -> Self {
        Self {
            calculate_globals: true,
            ..Self::new(cutoff, epsilon, sigma, shift)
        }
    }

    /// Force factor and raw potential contribution for one pair, or `None`
    /// beyond the cutoff
    #[inline(always)]
    fn kernel(&self, dr_sqr: f64) -> Option<(f64, f64)> {
        if dr_sqr > self.cutoff_sqr {
            return None;
        }
        let inv_dr_sqr = 1.0 / dr_sqr;
        let lj2 = self.sigma_sqr * inv_dr_sqr;
        let lj6 = lj2 * lj2 * lj2;
        let lj12 = lj6 * lj6;
        let lj12m6 = lj12 - lj6;
        let fac = self.epsilon24 * (lj12 + lj12m6) * inv_dr_sqr;
        let upot = self.epsilon24 * lj12m6 + self.shift6;
        Some((fac, upot))
    }

    #[inline(always)]
    fn accumulate_globals(&self, dr: [f64; 3], f: [f64; 3], upot: f64, weight: f64) {
        if weight == 0.0 {
            return;
        }
        let virial = [dr[0] * f[0], dr[1] * f[1], dr[2] * f[2]];
        self.buckets.with_mut(|bucket| {
            bucket.upot_sum += weight * upot;
            for d in 0..3 {
                bucket.virial_sum[d] += weight * virial[d];
            }
        });
    }

    /// Accumulated potential energy of the last traversal
    pub fn potential_energy(&self) -> Result<f64, PairGridError> {
        let globals = self.globals.lock().unwrap();
        if !globals.post_processed {
            return Err(PairGridError::PostProcessingOrder(
                "potential energy queried before end of traversal".into(),
            ));
        }
        Ok(globals.upot)
    }

    /// Accumulated virial (sum over components) of the last traversal
    pub fn virial(&self) -> Result<f64, PairGridError> {
        let globals = self.globals.lock().unwrap();
        if !globals.post_processed {
            return Err(PairGridError::PostProcessingOrder(
                "virial queried before end of traversal".into(),
            ));
        }
        Ok(globals.virial[0] + globals.virial[1] + globals.virial[2])
    }

    /// Explicit post-processing entry used by drivers that bypass
    /// `iterate_pairwise`; normally invoked through `end_traversal`.
    pub fn post_process(&self, newton3: bool) -> Result<(), PairGridError> {
        let mut globals = self.globals.lock().unwrap();
        if globals.post_processed {
            return Err(PairGridError::PostProcessingOrder(
                "end of traversal processed twice without reset".into(),
            ));
        }
        let (mut upot, mut virial) = self.buckets.reduce(
            (0.0f64, [0.0f64; 3]),
            |(upot, mut virial), bucket| {
                for d in 0..3 {
                    virial[d] += bucket.virial_sum[d];
                }
                (upot + bucket.upot_sum, virial)
            },
        );
        if !newton3 {
            // Every pair was visited twice, once in each ordering
            upot *= 0.5;
            for v in virial.iter_mut() {
                *v *= 0.5;
            }
        }
        globals.upot = upot / 6.0;
        globals.virial = virial;
        globals.post_processed = true;
        Ok(())
    }
}

impl<P: Particle> Functor<P> for LjFunctor {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn aos(&self, i: &mut P, j: &mut P, newton3: bool) {
        if i.is_dummy() || j.is_dummy() {
            return;
        }
        let dr = utils::sub(i.r(), j.r());
        let dr_sqr = utils::dot(dr, dr);
        let Some((fac, upot)) = self.kernel(dr_sqr) else {
            return;
        };
        let f = utils::scale(dr, fac);
        i.add_f(f);
        if newton3 {
            j.sub_f(f);
        }
        if self.calculate_globals {
            let weight = if newton3 {
                0.5 * (ownership_weight(i.ownership()) + ownership_weight(j.ownership()))
            } else {
                ownership_weight(i.ownership())
            };
            self.accumulate_globals(dr, f, upot, weight);
        }
    }

    fn soa(&self, soa: &mut SoaBuffer, newton3: bool) {
        let n = soa.len();
        if n == 0 {
            return;
        }
        let mut view = soa.view_mut();
        if newton3 {
            for i in 0..n {
                for j in (i + 1)..n {
                    self.soa_kernel_rows(&view.pos, i, j, newton3, |f| {
                        for d in 0..3 {
                            view.force[d][i] += f[d];
                            view.force[d][j] -= f[d];
                        }
                    }, view.ownership[i], view.ownership[j]);
                }
            }
        } else {
            // Without reciprocity every ordering is its own visit
            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    self.soa_kernel_rows(&view.pos, i, j, newton3, |f| {
                        for d in 0..3 {
                            view.force[d][i] += f[d];
                        }
                    }, view.ownership[i], view.ownership[j]);
                }
            }
        }
    }

    fn soa_pair(&self, soa1: &mut SoaBuffer, soa2: &mut SoaBuffer, newton3: bool) {
        if soa1.is_empty() || soa2.is_empty() {
            return;
        }
        let mut view1 = soa1.view_mut();
        let mut view2 = soa2.view_mut();
        for i in 0..view1.id.len() {
            let ri = [view1.pos[0][i], view1.pos[1][i], view1.pos[2][i]];
            for j in 0..view2.id.len() {
                let rj = [view2.pos[0][j], view2.pos[1][j], view2.pos[2][j]];
                let dr = utils::sub(ri, rj);
                let dr_sqr = utils::dot(dr, dr);
                let Some((fac, upot)) = self.kernel(dr_sqr) else {
                    continue;
                };
                let f = utils::scale(dr, fac);
                for d in 0..3 {
                    view1.force[d][i] += f[d];
                }
                if newton3 {
                    for d in 0..3 {
                        view2.force[d][j] -= f[d];
                    }
                }
                if self.calculate_globals {
                    let weight = if newton3 {
                        0.5 * (ownership_weight(view1.ownership[i])
                            + ownership_weight(view2.ownership[j]))
                    } else {
                        ownership_weight(view1.ownership[i])
                    };
                    self.accumulate_globals(dr, f, upot, weight);
                }
            }
        }
    }

    fn soa_verlet(
        &self,
        soa: &mut SoaBuffer,
        neighbor_lists: &[Vec<usize>],
        i_from: usize,
        i_to: usize,
        newton3: bool,
    ) {
        let mut view = soa.view_mut();
        for i in i_from..i_to {
            let ri = [view.pos[0][i], view.pos[1][i], view.pos[2][i]];
            for &j in &neighbor_lists[i] {
                let rj = [view.pos[0][j], view.pos[1][j], view.pos[2][j]];
                let dr = utils::sub(ri, rj);
                let dr_sqr = utils::dot(dr, dr);
                let Some((fac, upot)) = self.kernel(dr_sqr) else {
                    continue;
                };
                let f = utils::scale(dr, fac);
                for d in 0..3 {
                    view.force[d][i] += f[d];
                }
                if newton3 {
                    for d in 0..3 {
                        view.force[d][j] -= f[d];
                    }
                }
                if self.calculate_globals {
                    let weight = if newton3 {
                        0.5 * (ownership_weight(view.ownership[i])
                            + ownership_weight(view.ownership[j]))
                    } else {
                        ownership_weight(view.ownership[i])
                    };
                    self.accumulate_globals(dr, f, upot, weight);
                }
            }
        }
    }

    fn init_traversal(&self) {
        self.buckets.reset();
        let mut globals = self.globals.lock().unwrap();
        *globals = GlobalsState::default();
    }

    fn end_traversal(&self, newton3: bool) {
        // Double post-processing is a driver bug; surfaced via the accessors
        // in release use, loud here.
        self.post_process(newton3)
            .expect("end_traversal called twice without init_traversal");
    }

    fn allows_newton3(&self) -> bool {
        true
    }

    fn allows_non_newton3(&self) -> bool {
        true
    }
}

impl LjFunctor {
    #[inline(always)]
    fn soa_kernel_rows(
        &self,
        pos: &[&[f64]; 3],
        i: usize,
        j: usize,
        newton3: bool,
        apply: impl FnOnce([f64; 3]),
        ownership_i: Ownership,
        ownership_j: Ownership,
    ) {
        let ri = [pos[0][i], pos[1][i], pos[2][i]];
        let rj = [pos[0][j], pos[1][j], pos[2][j]];
        let dr = utils::sub(ri, rj);
        let dr_sqr = utils::dot(dr, dr);
        let Some((fac, upot)) = self.kernel(dr_sqr) else {
            return;
        };
        let f = utils::scale(dr, fac);
        apply(f);
        if self.calculate_globals {
            let weight = if newton3 {
                0.5 * (ownership_weight(ownership_i) + ownership_weight(ownership_j))
            } else {
                ownership_weight(ownership_i)
            };
            self.accumulate_globals(dr, f, upot, weight);
        }
    }
}
