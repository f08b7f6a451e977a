//! Lennard-Jones box: fill a cubic domain with a particle grid, pick a
//! traversal configuration, and run a few velocity-Verlet steps.

use anyhow::{anyhow, Result};
use ndarray::prelude::*;

use pairgrid::{
    Configuration, ContainerKind, DataLayout, IteratorBehavior, LinkedCells, LjFunctor,
    LjMolecule, Newton3Mode, Particle, ParticleContainer, TraversalChoice, TraversalKind,
};

const BOX_SIZE: f64 = 10.0;
const CUTOFF: f64 = 2.5;
const SKIN: f64 = 0.3;
const EPSILON: f64 = 1.0;
const SIGMA: f64 = 1.0;
const SPACING: f64 = 1.25;
const DT: f64 = 1e-4;
const NUM_STEPS: usize = 100;

fn main() -> Result<()> {
    // Traversal tag from args, c08 by default
    let traversal = match std::env::args().nth(1) {
        Some(tag) => tag
            .parse::<TraversalKind>()
            .map_err(|_| anyhow!("Unknown traversal tag {}", tag))?,
        None => TraversalKind::C08,
    };
    let choice = TraversalChoice::new(traversal, DataLayout::Soa, Newton3Mode::Enabled);
    let config = Configuration::default();
    if !config
        .choices_for(ContainerKind::LinkedCells)
        .iter()
        .any(|c| c.traversal == choice.traversal)
    {
        return Err(anyhow!(
            "Traversal {} cannot run on linked cells",
            choice.traversal
        ));
    }

    let mut container: LinkedCells<LjMolecule> =
        LinkedCells::new([0.0; 3], [BOX_SIZE; 3], CUTOFF, SKIN, 1.0)?;

    // Simple cubic lattice
    let per_dim = (BOX_SIZE / SPACING).floor() as usize;
    let mut id = 0;
    for ix in 0..per_dim {
        for iy in 0..per_dim {
            for iz in 0..per_dim {
                let r = [
                    (ix as f64 + 0.5) * SPACING,
                    (iy as f64 + 0.5) * SPACING,
                    (iz as f64 + 0.5) * SPACING,
                ];
                container.add_particle(LjMolecule::new(r, [0.0; 3], id))?;
                id += 1;
            }
        }
    }
    let num_particles = id as usize;
    println!(
        "Running {} steps of {} particles with traversal {}",
        NUM_STEPS, num_particles, choice.traversal
    );

    let functor = LjFunctor::with_globals(CUTOFF, EPSILON, SIGMA, 0.0);

    // Energy trajectory
    let mut upot: Array1<f64> = Array1::zeros(NUM_STEPS);
    let mut virial: Array1<f64> = Array1::zeros(NUM_STEPS);

    for step in 0..NUM_STEPS {
        // Half kick + drift
        for p in container.iter_mut(IteratorBehavior::OwnedOnly) {
            let f = p.f();
            for d in 0..3 {
                p.v[d] += 0.5 * DT * f[d];
            }
            let mut r = p.r();
            for d in 0..3 {
                r[d] = (r[d] + DT * p.v[d]).clamp(0.0, BOX_SIZE - 1e-12);
            }
            p.set_r(r);
            p.set_f([0.0; 3]);
        }
        let (leavers, _) = container.update_container();
        if !leavers.is_empty() {
            return Err(anyhow!("{} particles left the box", leavers.len()));
        }

        container
            .iterate_pairwise(&functor, &choice)
            .map_err(|e| anyhow!("{}", e))?;

        // Second half kick
        for p in container.iter_mut(IteratorBehavior::OwnedOnly) {
            let f = p.f();
            for d in 0..3 {
                p.v[d] += 0.5 * DT * f[d];
            }
        }

        upot[step] = functor.potential_energy().map_err(|e| anyhow!("{}", e))?;
        virial[step] = functor.virial().map_err(|e| anyhow!("{}", e))?;
        if step % 10 == 0 {
            println!(
                "step {:4}: U = {:12.6}, virial = {:12.6}",
                step, upot[step], virial[step]
            );
        }
    }

    println!(
        "final: U = {:12.6}, virial = {:12.6}",
        upot[NUM_STEPS - 1],
        virial[NUM_STEPS - 1]
    );
    Ok(())
}
