//! Verlet-cluster-lists container
//!
//! Particles are projected onto an XY tower grid, z-sorted inside each tower
//! and grouped into fixed-size clusters; unfilled slots are padded with
//! dummies parked far outside the domain. Every cluster keeps the list of
//! neighbor clusters within `cutoff + skin`, including itself.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::error::PairGridError;
use crate::functor::Functor;
use crate::options::{ContainerKind, IteratorBehavior, TraversalChoice, TraversalKind};
use crate::particle::{Ownership, Particle};
use crate::traversals::{ClustersColoringTraversal, ClustersTraversal, Tower};
use crate::utils;
use crate::selector;

use super::ParticleContainer;

/// Default cluster size; small enough for short towers, wide enough for
/// branch-free kernels
pub const DEFAULT_CLUSTER_SIZE: usize = 4;

pub struct VerletClusterLists<P: Particle> {
    box_min: [f64; 3],
    box_max: [f64; 3],
    cutoff: f64,
    skin: f64,
    cluster_size: usize,
    rebuild_frequency: usize,
    steps_since_rebuild: usize,
    lists_valid: bool,
    built_newton3: bool,
    towers: Vec<RwLock<Tower<P>>>,
    towers_per_dim: [usize; 2],
    tower_side: [f64; 2],
    build_positions: HashMap<u64, [f64; 3]>,
    num_rebuilds: usize,
}

impl<P: Particle> VerletClusterLists<P> {
    pub fn new(
        box_min: [f64; 3],
        box_max: [f64; 3],
        cutoff: f64,
        skin: f64,
        rebuild_frequency: usize,
        cluster_size: usize,
    ) -> Result<Self> {
        if cutoff <= 0.0 {
            return Err(anyhow!("Cutoff must be positive (is {})", cutoff));
        }
        if cluster_size == 0 {
            return Err(anyhow!("Cluster size must be positive"));
        }
        let target = cutoff + skin;
        let mut towers_per_dim = [0usize; 2];
        let mut tower_side = [0.0f64; 2];
        for d in 0..2 {
            let size = box_max[d] - box_min[d];
            if size <= 0.0 {
                return Err(anyhow!(
                    "Invalid box: max {:?} must exceed min {:?}",
                    box_max,
                    box_min
                ));
            }
            let n = ((size / target).floor() as usize).max(1);
            towers_per_dim[d] = n;
            tower_side[d] = size / n as f64;
        }
        let towers = (0..towers_per_dim[0] * towers_per_dim[1])
            .map(|_| RwLock::new(Tower::new()))
            .collect();
        Ok(Self {
            box_min,
            box_max,
            cutoff,
            skin,
            cluster_size,
            rebuild_frequency: rebuild_frequency.max(1),
            steps_since_rebuild: 0,
            lists_valid: false,
            built_newton3: true,
            towers,
            towers_per_dim,
            tower_side,
            build_positions: HashMap::new(),
            num_rebuilds: 0,
        })
    }

    pub fn cluster_size(&self) -> usize {
        self.cluster_size
    }

    pub fn num_rebuilds(&self) -> usize {
        self.num_rebuilds
    }

    pub fn iter_mut(&mut self, behavior: IteratorBehavior) -> impl Iterator<Item = &mut P> {
        self.towers.iter_mut().flat_map(move |lock| {
            lock.get_mut()
                .unwrap()
                .particles
                .iter_mut()
                .filter(move |p| crate::iterators::behavior_allows(behavior, p.ownership()))
        })
    }

    fn tower_index_of(&self, r: [f64; 3]) -> usize {
        let mut coord = [0usize; 2];
        for d in 0..2 {
            let c = ((r[d] - self.box_min[d]) / self.tower_side[d]).floor() as isize;
            coord[d] = c.clamp(0, self.towers_per_dim[d] as isize - 1) as usize;
        }
        coord[0] + self.towers_per_dim[0] * coord[1]
    }

    fn tower_overlap(&self) -> [usize; 2] {
        let reach = self.cutoff + self.skin;
        [
            (reach / self.tower_side[0]).ceil() as usize,
            (reach / self.tower_side[1]).ceil() as usize,
        ]
    }

    fn in_box(&self, r: [f64; 3]) -> bool {
        (0..3).all(|d| r[d] >= self.box_min[d] && r[d] < self.box_max[d])
    }

    fn is_container_update_needed(&self) -> bool {
        let limit_sqr = (self.skin / 2.0) * (self.skin / 2.0);
        for lock in &self.towers {
            let tower = lock.read().unwrap();
            for p in tower.particles.iter().filter(|p| !p.is_dummy()) {
                if let Some(&r_build) = self.build_positions.get(&p.id()) {
                    if utils::dist_sqr(p.r(), r_build) > limit_sqr {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn needs_rebuild(&self, newton3: bool) -> bool {
        !self.lists_valid
            || self.built_newton3 != newton3
            || self.steps_since_rebuild >= self.rebuild_frequency
            || self.is_container_update_needed()
    }

    /// Re-sort all particles into towers, cut clusters, pad, and rebuild the
    /// cluster neighbor lists
    fn rebuild_cluster_lists(&mut self, newton3: bool) {
        // Gather real particles and empty the towers
        let mut all = Vec::new();
        for lock in self.towers.iter_mut() {
            let tower = lock.get_mut().unwrap();
            all.extend(tower.particles.drain(..).filter(|p| !p.is_dummy()));
            tower.neighbors.clear();
        }
        self.build_positions.clear();
        for p in &all {
            self.build_positions.insert(p.id(), p.r());
        }
        let far_corner = [
            self.box_max[0] + 3.0 * (self.cutoff + self.skin),
            self.box_max[1] + 3.0 * (self.cutoff + self.skin),
            self.box_max[2] + 3.0 * (self.cutoff + self.skin),
        ];
        for p in all {
            let index = self.tower_index_of(p.r());
            self.towers[index].get_mut().unwrap().particles.push(p);
        }
        for lock in self.towers.iter_mut() {
            let tower = lock.get_mut().unwrap();
            tower
                .particles
                .sort_by(|a, b| a.r()[2].total_cmp(&b.r()[2]));
            while !tower.particles.is_empty() && tower.particles.len() % self.cluster_size != 0 {
                let mut dummy = tower.particles[0].clone();
                dummy.set_ownership(Ownership::Dummy);
                dummy.set_r(far_corner);
                dummy.set_f([0.0; 3]);
                tower.particles.push(dummy);
            }
        }

        // z extent of every cluster, dummies excluded
        let cluster_ranges: Vec<Vec<Option<(f64, f64)>>> = self
            .towers
            .iter()
            .map(|lock| {
                let tower = lock.read().unwrap();
                tower
                    .particles
                    .chunks(self.cluster_size)
                    .map(|cluster| {
                        let mut range: Option<(f64, f64)> = None;
                        for p in cluster.iter().filter(|p| !p.is_dummy()) {
                            let z = p.r()[2];
                            range = Some(match range {
                                None => (z, z),
                                Some((lo, hi)) => (lo.min(z), hi.max(z)),
                            });
                        }
                        range
                    })
                    .collect()
            })
            .collect();

        let reach = self.cutoff + self.skin;
        let reach_sqr = reach * reach;
        let [nx, ny] = self.towers_per_dim;
        let overlap = self.tower_overlap();

        for ty in 0..ny {
            for tx in 0..nx {
                let t1 = tx + nx * ty;
                let mut neighbors: Vec<Vec<(usize, usize)>> =
                    vec![Vec::new(); cluster_ranges[t1].len()];
                let y_lo = ty.saturating_sub(overlap[1]);
                let y_hi = (ty + overlap[1]).min(ny - 1);
                let x_lo = tx.saturating_sub(overlap[0]);
                let x_hi = (tx + overlap[0]).min(nx - 1);
                for oy in y_lo..=y_hi {
                    for ox in x_lo..=x_hi {
                        let t2 = ox + nx * oy;
                        let dx = (tx.abs_diff(ox).saturating_sub(1)) as f64 * self.tower_side[0];
                        let dy = (ty.abs_diff(oy).saturating_sub(1)) as f64 * self.tower_side[1];
                        let xy_sqr = dx * dx + dy * dy;
                        if xy_sqr > reach_sqr {
                            continue;
                        }
                        for (c1, range1) in cluster_ranges[t1].iter().enumerate() {
                            let Some((lo1, hi1)) = *range1 else { continue };
                            for (c2, range2) in cluster_ranges[t2].iter().enumerate() {
                                let Some((lo2, hi2)) = *range2 else { continue };
                                let z_gap = (lo2 - hi1).max(lo1 - hi2).max(0.0);
                                if xy_sqr + z_gap * z_gap > reach_sqr {
                                    continue;
                                }
                                if newton3 {
                                    // Each cluster pair stored once
                                    if (t1, c1) <= (t2, c2) {
                                        neighbors[c1].push((t2, c2));
                                    }
                                } else {
                                    // Both directions arise from the tower
                                    // loop, the self pair exactly once
                                    neighbors[c1].push((t2, c2));
                                }
                            }
                        }
                    }
                }
                self.towers[t1].get_mut().unwrap().neighbors = neighbors;
            }
        }

        self.lists_valid = true;
        self.built_newton3 = newton3;
        self.steps_since_rebuild = 0;
        self.num_rebuilds += 1;
    }
}

impl<P: Particle> ParticleContainer<P> for VerletClusterLists<P> {
    fn kind(&self) -> ContainerKind {
        ContainerKind::VerletClusterLists
    }

    fn add_particle(&mut self, mut p: P) -> Result<()> {
        if !self.in_box(p.r()) {
            return Err(anyhow!(
                "Particle {} not in domain: position is {:?}",
                p.id(),
                p.r()
            ));
        }
        p.set_ownership(Ownership::Owned);
        let index = self.tower_index_of(p.r());
        self.towers[index].get_mut().unwrap().particles.push(p);
        self.lists_valid = false;
        Ok(())
    }

    fn add_or_update_halo_particle(&mut self, mut p: P) -> Result<()> {
        p.set_ownership(Ownership::Halo);
        let index = self.tower_index_of(p.r());
        let tower = self.towers[index].get_mut().unwrap();
        match tower.particles.iter_mut().find(|q| q.id() == p.id()) {
            Some(existing) => *existing = p,
            None => tower.particles.push(p),
        }
        self.lists_valid = false;
        Ok(())
    }

    fn update_container(&mut self) -> (Vec<P>, bool) {
        let mut keep = Vec::new();
        let mut leavers = Vec::new();
        for lock in self.towers.iter_mut() {
            let tower = lock.get_mut().unwrap();
            for p in tower.particles.drain(..) {
                match p.ownership() {
                    Ownership::Dummy | Ownership::Halo => {}
                    Ownership::Owned => {
                        if (0..3).all(|d| {
                            p.r()[d] >= self.box_min[d] && p.r()[d] < self.box_max[d]
                        }) {
                            keep.push(p);
                        } else {
                            leavers.push(p);
                        }
                    }
                }
            }
            tower.neighbors.clear();
        }
        for p in keep {
            let index = self.tower_index_of(p.r());
            self.towers[index].get_mut().unwrap().particles.push(p);
        }
        self.lists_valid = false;
        (leavers, true)
    }

    fn iterate_pairwise(
        &mut self,
        functor: &dyn Functor<P>,
        choice: &TraversalChoice,
    ) -> Result<(), PairGridError> {
        selector::check_choice(ContainerKind::VerletClusterLists, choice, functor)?;
        let newton3 = choice.use_newton3();
        let applicable = match choice.traversal {
            TraversalKind::VerletClusters => {
                ClustersTraversal::new(functor, choice.data_layout, newton3).is_applicable()
            }
            TraversalKind::VerletClustersColoring => {
                ClustersColoringTraversal::new(functor, choice.data_layout, newton3)
                    .is_applicable()
            }
            _ => unreachable!("filtered by the compatibility table"),
        };
        if !applicable {
            return Err(PairGridError::TraversalNotApplicable {
                container: ContainerKind::VerletClusterLists,
                traversal: choice.traversal,
                data_layout: choice.data_layout,
                newton3,
            });
        }

        if self.needs_rebuild(newton3) {
            self.rebuild_cluster_lists(newton3);
        }
        self.steps_since_rebuild += 1;

        functor.init_traversal();
        match choice.traversal {
            TraversalKind::VerletClusters => {
                ClustersTraversal::new(functor, choice.data_layout, newton3)
                    .traverse(&self.towers, self.cluster_size);
            }
            TraversalKind::VerletClustersColoring => {
                ClustersColoringTraversal::new(functor, choice.data_layout, newton3).traverse(
                    &self.towers,
                    self.towers_per_dim,
                    self.tower_overlap(),
                    self.cluster_size,
                );
            }
            _ => unreachable!(),
        }
        functor.end_traversal(newton3);
        Ok(())
    }

    fn collect_particles(&self, behavior: IteratorBehavior) -> Vec<P> {
        let mut particles = Vec::new();
        for lock in &self.towers {
            let tower = lock.read().unwrap();
            for p in tower.particles.iter() {
                if crate::iterators::behavior_allows(behavior, p.ownership()) {
                    particles.push(p.clone());
                }
            }
        }
        particles
    }
}
