//! Configuration of the allowed option sets
//!
//! The engine itself only executes one combination at a time; an external
//! tuner (out of scope here) samples from the sets below. The enumeration
//! helper is what the example drivers and tests use in its place.

use strum::IntoEnumIterator;

use crate::options::{
    ContainerKind, DataLayout, Newton3Mode, TraversalChoice, TraversalKind,
};
use crate::selector::compatible_traversals;

#[derive(Debug, Clone)]
pub struct Configuration {
    pub allowed_containers: Vec<ContainerKind>,
    pub allowed_traversals: Vec<TraversalKind>,
    pub allowed_data_layouts: Vec<DataLayout>,
    pub allowed_newton3: Vec<Newton3Mode>,
    pub allowed_cell_size_factors: Vec<f64>,
    pub verlet_skin: f64,
    pub verlet_rebuild_frequency: usize,
    pub num_samples: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            allowed_containers: ContainerKind::iter().collect(),
            allowed_traversals: TraversalKind::iter().collect(),
            allowed_data_layouts: vec![DataLayout::Aos, DataLayout::Soa],
            allowed_newton3: Newton3Mode::iter().collect(),
            allowed_cell_size_factors: vec![1.0],
            verlet_skin: 0.2,
            verlet_rebuild_frequency: 20,
            num_samples: 3,
        }
    }
}

impl Configuration {
    /// All allowed traversal choices compatible with the given container
    pub fn choices_for(&self, container: ContainerKind) -> Vec<TraversalChoice> {
        let mut choices = Vec::new();
        if !self.allowed_containers.contains(&container) {
            return choices;
        }
        for &traversal in compatible_traversals(container) {
            if !self.allowed_traversals.contains(&traversal) {
                continue;
            }
            for &data_layout in &self.allowed_data_layouts {
                for &newton3 in &self.allowed_newton3 {
                    choices.push(TraversalChoice::new(traversal, data_layout, newton3));
                }
            }
        }
        choices
    }
}
