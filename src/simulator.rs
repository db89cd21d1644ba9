// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Multi-node simulation harness
//!
//! Owns the model registry and a flat set of nodes, delivers events to them
//! and advances every node in `min_delay` slices. Nodes within a slice are
//! independent, so they are updated in parallel. Spike routing between nodes
//! is left to the caller.

use std::str::FromStr;

use rayon::prelude::*;
use tracing::{debug, error, info};

use tvbnest_config::{validate_config, ConfigError, TvbnestConfig};
use tvbnest_modules::{install_builtin_modules, ModelRegistry, RegistryError};
use tvbnest_neural::{
    CurrentEvent, Dictionary, NeuralError, Node, NodeConfig, NodeId, OutgoingSpike, SolverKind,
    SolverSettings, SpikeEvent, Step,
};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{node}: {source}")]
    Neural {
        node: NodeId,
        #[source]
        source: NeuralError,
    },

    /// A node failed mid-run. `emitted` holds every spike produced before the
    /// failure, including those of the other nodes in the failed slice.
    #[error("simulation aborted in slice starting at step {step}: {node}: {source}")]
    Aborted {
        node: NodeId,
        step: Step,
        #[source]
        source: NeuralError,
        emitted: Vec<OutgoingSpike>,
    },

    #[error("simulation halted by a failure at step {0}; reset before simulating again")]
    Halted(Step),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Translate the file/env configuration into per-node settings
pub fn node_config_from(config: &TvbnestConfig) -> Result<NodeConfig> {
    validate_config(config)?;

    let solver = config
        .integrator
        .solver
        .as_deref()
        .map(SolverKind::from_str)
        .transpose()
        .map_err(ConfigError::InvalidValue)?;

    let node_config = NodeConfig {
        resolution_ms: config.kernel.resolution_ms,
        min_delay_steps: config.buffers.min_delay_steps as usize,
        max_delay_steps: config.buffers.max_delay_steps as usize,
        history_window_ms: config.history.window_ms,
        solver,
        solver_settings: SolverSettings {
            rk4_substeps: config.integrator.rk4_substeps,
            rtol: config.integrator.rtol,
            atol: config.integrator.atol,
            min_step: config.integrator.min_step_ms,
            max_internal_steps: config.integrator.max_internal_steps,
        },
    };
    node_config
        .validate()
        .map_err(|err| ConfigError::InvalidValue(err.to_string()))?;
    Ok(node_config)
}

pub struct Simulator {
    registry: ModelRegistry,
    node_config: NodeConfig,
    /// Node `NodeId(i + 1)` lives at index `i`
    nodes: Vec<Box<dyn Node>>,
    pool: Option<rayon::ThreadPool>,
    current_step: Step,
    /// Origin of the slice that failed; nodes disagree on time until reset
    halted_at: Option<Step>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("models", &self.registry.models())
            .field("nodes", &self.nodes.len())
            .field("current_step", &self.current_step)
            .field("halted_at", &self.halted_at)
            .finish()
    }
}

impl Simulator {
    /// Build a simulator with the built-in modules installed
    pub fn new(config: &TvbnestConfig) -> Result<Self> {
        let node_config = node_config_from(config)?;

        let pool = match config.kernel.threads {
            0 => None,
            threads => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|err| ConfigError::InvalidValue(format!("thread pool: {err}")))?,
            ),
        };

        let mut registry = ModelRegistry::new();
        install_builtin_modules(&mut registry)?;

        info!(
            "Simulator ready: h = {} ms, slice = {} steps, threads = {}",
            node_config.resolution_ms,
            node_config.min_delay_steps,
            pool.as_ref()
                .map_or_else(rayon::current_num_threads, |p| p.current_num_threads())
        );

        Ok(Self {
            registry,
            node_config,
            nodes: Vec::new(),
            pool,
            current_step: 0,
            halted_at: None,
        })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// For registering extra modules or copied models
    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    pub fn node_config(&self) -> &NodeConfig {
        &self.node_config
    }

    /// Create `count` nodes of `model`; ids continue from the last node
    pub fn create(&mut self, model: &str, count: usize) -> Result<Vec<NodeId>> {
        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            let id = NodeId(self.nodes.len() as u64 + 1);
            let node = self.registry.create(model, id, &self.node_config)?;
            self.nodes.push(node);
            created.push(id);
        }
        debug!("Created {} x {} (total nodes: {})", count, model, self.nodes.len());
        Ok(created)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn index_of(&self, id: NodeId) -> Result<usize> {
        let index = (id.0 as usize).wrapping_sub(1);
        if index < self.nodes.len() {
            Ok(index)
        } else {
            Err(SimulationError::UnknownNode(id))
        }
    }

    pub fn node(&self, id: NodeId) -> Result<&dyn Node> {
        let index = self.index_of(id)?;
        Ok(self.nodes[index].as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut dyn Node> {
        let index = self.index_of(id)?;
        Ok(self.nodes[index].as_mut())
    }

    fn with_node<T>(
        &mut self,
        id: NodeId,
        op: impl FnOnce(&mut dyn Node) -> tvbnest_neural::Result<T>,
    ) -> Result<T> {
        let node = self.node_mut(id)?;
        op(node).map_err(|source| SimulationError::Neural { node: id, source })
    }

    /// Queue a spike for `target`; `delay` counts from the current step
    pub fn deliver_spike(&mut self, target: NodeId, event: &SpikeEvent) -> Result<()> {
        self.with_node(target, |node| node.handle_spike(event))
    }

    pub fn deliver_current(&mut self, target: NodeId, event: &CurrentEvent) -> Result<()> {
        self.with_node(target, |node| node.handle_current(event))
    }

    pub fn set_parameters(&mut self, id: NodeId, updates: &Dictionary) -> Result<()> {
        self.with_node(id, |node| node.set_parameters(updates))
    }

    pub fn set_state(&mut self, id: NodeId, updates: &Dictionary) -> Result<()> {
        self.with_node(id, |node| node.set_state(updates))
    }

    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn time_ms(&self) -> f64 {
        self.current_step as f64 * self.node_config.resolution_ms
    }

    /// Advance all nodes by `steps`, returning emitted spikes ordered by
    /// (step, origin).
    ///
    /// On a node failure the lowest failing id is reported together with the
    /// spikes emitted so far. The clock stays at the failed slice's origin and
    /// the simulator refuses to run again until `reset`.
    pub fn simulate(&mut self, steps: u64) -> Result<Vec<OutgoingSpike>> {
        if let Some(step) = self.halted_at {
            return Err(SimulationError::Halted(step));
        }

        let slice = self.node_config.min_delay_steps as u64;
        let mut spikes = Vec::new();
        let mut remaining = steps;

        while remaining > 0 {
            let len = remaining.min(slice) as usize;
            let origin = self.current_step;

            let results = match &self.pool {
                Some(pool) => pool.install(|| update_slice(&mut self.nodes, origin, len)),
                None => update_slice(&mut self.nodes, origin, len),
            };

            let mut failure = None;
            for (index, result) in results.into_iter().enumerate() {
                match result {
                    Ok(emitted) => spikes.extend(emitted),
                    Err(source) if failure.is_none() => {
                        failure = Some((NodeId(index as u64 + 1), source));
                    }
                    Err(source) => {
                        debug!("Node {} also failed at step {}: {}", index + 1, origin, source);
                    }
                }
            }

            if let Some((node, source)) = failure {
                error!("Simulation aborted at step {}: {}: {}", origin, node, source);
                self.halted_at = Some(origin);
                spikes.sort_by_key(|spike| (spike.step, spike.origin));
                return Err(SimulationError::Aborted {
                    node,
                    step: origin,
                    source,
                    emitted: spikes,
                });
            }

            self.current_step += len as u64;
            remaining -= len as u64;
            debug!("Slice [{}, {}) done", origin, self.current_step);
        }

        spikes.sort_by_key(|spike| (spike.step, spike.origin));
        Ok(spikes)
    }

    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    /// Reset every node to its initial state, rewind the clock and clear a halt
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
        self.current_step = 0;
        self.halted_at = None;
    }
}

fn update_slice(
    nodes: &mut [Box<dyn Node>],
    origin: Step,
    len: usize,
) -> Vec<std::result::Result<Vec<OutgoingSpike>, NeuralError>> {
    nodes
        .par_iter_mut()
        .map(|node| {
            let mut emitted = Vec::new();
            node.update(origin, 0, len, &mut emitted).map(|()| emitted)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: &[(&str, f64)]) -> Dictionary {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_node_config_from_defaults() {
        let node_config = node_config_from(&TvbnestConfig::default()).unwrap();
        assert_eq!(node_config, NodeConfig::default());
    }

    #[test]
    fn test_node_config_solver_parsed() {
        let mut config = TvbnestConfig::default();
        config.integrator.solver = Some("RK4".to_string());
        assert_eq!(
            node_config_from(&config).unwrap().solver,
            Some(SolverKind::Rk4)
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = TvbnestConfig::default();
        config.kernel.resolution_ms = -0.1;
        assert!(matches!(
            Simulator::new(&config),
            Err(SimulationError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut sim = Simulator::new(&TvbnestConfig::default()).unwrap();
        let a = sim.create("iaf_cond_nmda_deco2014", 2).unwrap();
        let b = sim.create("tvb_rate_wongwang", 1).unwrap();
        assert_eq!(a, vec![NodeId(1), NodeId(2)]);
        assert_eq!(b, vec![NodeId(3)]);
        assert_eq!(sim.node(NodeId(3)).unwrap().model_name(), "tvb_rate_wongwang");
        assert!(matches!(
            sim.node(NodeId(0)),
            Err(SimulationError::UnknownNode(NodeId(0)))
        ));
        assert!(sim.node(NodeId(4)).is_err());
    }

    #[test]
    fn test_unknown_model() {
        let mut sim = Simulator::new(&TvbnestConfig::default()).unwrap();
        assert!(matches!(
            sim.create("iaf_psc_alpha", 1),
            Err(SimulationError::Registry(RegistryError::UnknownModel(_)))
        ));
    }

    #[test]
    fn test_clock_advances_in_partial_slices() {
        let mut sim = Simulator::new(&TvbnestConfig::default()).unwrap();
        sim.create("tvb_rate_wongwang", 1).unwrap();
        sim.simulate(25).unwrap();
        assert_eq!(sim.current_step(), 25);
        assert!((sim.time_ms() - 2.5).abs() < 1e-12);
        sim.reset();
        assert_eq!(sim.current_step(), 0);
    }

    #[test]
    fn test_neural_errors_name_the_node() {
        let mut sim = Simulator::new(&TvbnestConfig::default()).unwrap();
        sim.create("iaf_cond_nmda_deco2014", 1).unwrap();
        let err = sim
            .set_parameters(NodeId(1), &dict(&[("C_m", 0.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Neural {
                node: NodeId(1),
                source: NeuralError::InvalidParameter { .. }
            }
        ));
    }
}
