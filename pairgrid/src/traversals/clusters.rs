//! Traversals over the Verlet cluster lists (XY tower grid)
//!
//! Clusters are fixed-size particle batches inside a tower; each cluster
//! carries the list of neighbor clusters within the search radius, including
//! itself. Padding dummies are skipped before the functor sees them.

use std::sync::RwLock;

use rayon::prelude::*;

use crate::functor::Functor;
use crate::options::{DataLayout, TraversalKind};
use crate::particle::Particle;

/// One column of the XY tower grid: z-sorted particles, padded with dummies
/// to a multiple of the cluster size, plus per-cluster neighbor lists.
pub struct Tower<P> {
    pub particles: Vec<P>,
    /// Per cluster: neighboring clusters as (tower index, cluster index)
    pub neighbors: Vec<Vec<(usize, usize)>>,
}

impl<P> Tower<P> {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    pub fn num_clusters(&self, cluster_size: usize) -> usize {
        self.particles.len() / cluster_size
    }
}

impl<P> Default for Tower<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn pair_mut<P>(slice: &mut [P], i: usize, j: usize) -> (&mut P, &mut P) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = slice.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = slice.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

/// All pairs inside one cluster
fn interact_within_cluster<P: Particle>(
    functor: &dyn Functor<P>,
    cluster: &mut [P],
    newton3: bool,
) {
    let n = cluster.len();
    if newton3 {
        for i in 0..n {
            for j in (i + 1)..n {
                if cluster[i].is_dummy() || cluster[j].is_dummy() {
                    continue;
                }
                let (pi, pj) = pair_mut(cluster, i, j);
                functor.aos(pi, pj, true);
            }
        }
    } else {
        for i in 0..n {
            for j in 0..n {
                if i == j || cluster[i].is_dummy() || cluster[j].is_dummy() {
                    continue;
                }
                let (pi, pj) = pair_mut(cluster, i, j);
                functor.aos(pi, pj, false);
            }
        }
    }
}

/// All cross pairs between two disjoint clusters
fn interact_clusters<P: Particle>(
    functor: &dyn Functor<P>,
    cluster_a: &mut [P],
    cluster_b: &mut [P],
    newton3: bool,
) {
    for pa in cluster_a.iter_mut() {
        if pa.is_dummy() {
            continue;
        }
        for pb in cluster_b.iter_mut() {
            if pb.is_dummy() {
                continue;
            }
            functor.aos(pa, pb, newton3);
        }
    }
}

/// Process one entry of a cluster neighbor list under tower locks taken in
/// ascending order
fn process_cluster_pair<P: Particle>(
    functor: &dyn Functor<P>,
    towers: &[RwLock<Tower<P>>],
    loc_a: (usize, usize),
    loc_b: (usize, usize),
    cluster_size: usize,
    newton3: bool,
) {
    let (tower_a, cluster_a) = loc_a;
    let (tower_b, cluster_b) = loc_b;
    let range_a = cluster_a * cluster_size..(cluster_a + 1) * cluster_size;
    let range_b = cluster_b * cluster_size..(cluster_b + 1) * cluster_size;

    if tower_a == tower_b {
        let mut tower = towers[tower_a].write().unwrap();
        if cluster_a == cluster_b {
            interact_within_cluster(functor, &mut tower.particles[range_a], newton3);
        } else {
            let split = range_a.start.max(range_b.start);
            let (head, tail) = tower.particles.split_at_mut(split);
            if range_a.start < range_b.start {
                interact_clusters(
                    functor,
                    &mut head[range_a],
                    &mut tail[..cluster_size],
                    newton3,
                );
            } else {
                interact_clusters(
                    functor,
                    &mut tail[..cluster_size],
                    &mut head[range_b],
                    newton3,
                );
            }
        }
    } else {
        let (lo, hi) = (tower_a.min(tower_b), tower_a.max(tower_b));
        let mut tower_lo = towers[lo].write().unwrap();
        let mut tower_hi = towers[hi].write().unwrap();
        let (a, b) = if lo == tower_a {
            (&mut tower_lo, &mut tower_hi)
        } else {
            (&mut tower_hi, &mut tower_lo)
        };
        interact_clusters(
            functor,
            &mut a.particles[range_a],
            &mut b.particles[range_b],
            newton3,
        );
    }
}

/// Cluster traversal without coloring: every tower updates only its own
/// particles (no Newton 3), so all towers run in parallel.
pub struct ClustersTraversal<'a, P: Particle> {
    functor: &'a dyn Functor<P>,
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> ClustersTraversal<'a, P> {
    pub fn new(functor: &'a dyn Functor<P>, data_layout: DataLayout, newton3: bool) -> Self {
        Self {
            functor,
            data_layout,
            newton3,
        }
    }

    pub fn kind(&self) -> TraversalKind {
        TraversalKind::VerletClusters
    }

    pub fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    pub fn use_newton3(&self) -> bool {
        self.newton3
    }

    pub fn is_applicable(&self) -> bool {
        self.data_layout == DataLayout::Aos && !self.newton3
    }

    pub fn traverse(&self, towers: &[RwLock<Tower<P>>], cluster_size: usize) {
        let indices: Vec<usize> = (0..towers.len()).collect();
        indices.par_iter().for_each(|&tower_index| {
            // Copy the list out so the read lock is released before the
            // write locks below are taken
            let neighbor_lists = towers[tower_index].read().unwrap().neighbors.clone();
            for (cluster, partners) in neighbor_lists.iter().enumerate() {
                for &partner in partners {
                    process_cluster_pair(
                        self.functor,
                        towers,
                        (tower_index, cluster),
                        partner,
                        cluster_size,
                        false,
                    );
                }
            }
        });
    }
}

/// Cluster traversal with a 2D coloring over towers; supports Newton 3.
pub struct ClustersColoringTraversal<'a, P: Particle> {
    functor: &'a dyn Functor<P>,
    data_layout: DataLayout,
    newton3: bool,
}

impl<'a, P: Particle> ClustersColoringTraversal<'a, P> {
    pub fn new(functor: &'a dyn Functor<P>, data_layout: DataLayout, newton3: bool) -> Self {
        Self {
            functor,
            data_layout,
            newton3,
        }
    }

    pub fn kind(&self) -> TraversalKind {
        TraversalKind::VerletClustersColoring
    }

    pub fn data_layout(&self) -> DataLayout {
        self.data_layout
    }

    pub fn use_newton3(&self) -> bool {
        self.newton3
    }

    pub fn is_applicable(&self) -> bool {
        self.data_layout == DataLayout::Aos
    }

    pub fn traverse(
        &self,
        towers: &[RwLock<Tower<P>>],
        towers_per_dim: [usize; 2],
        tower_overlap: [usize; 2],
        cluster_size: usize,
    ) {
        // Same-color towers are far enough apart that even Newton-3 writes
        // into neighbor towers stay disjoint.
        let stride = [2 * tower_overlap[0] + 1, 2 * tower_overlap[1] + 1];
        for y0 in 0..stride[1] {
            for x0 in 0..stride[0] {
                let bases: Vec<usize> = (y0..towers_per_dim[1])
                    .step_by(stride[1])
                    .flat_map(|y| {
                        (x0..towers_per_dim[0])
                            .step_by(stride[0])
                            .map(move |x| x + towers_per_dim[0] * y)
                    })
                    .collect();
                bases.par_iter().for_each(|&tower_index| {
                    // Copy the list out so the read lock is released before the
            // write locks below are taken
            let neighbor_lists = towers[tower_index].read().unwrap().neighbors.clone();
                    for (cluster, partners) in neighbor_lists.iter().enumerate() {
                        for &partner in partners {
                            process_cluster_pair(
                                self.functor,
                                towers,
                                (tower_index, cluster),
                                partner,
                                cluster_size,
                                self.newton3,
                            );
                        }
                    }
                });
            }
        }
    }
}
