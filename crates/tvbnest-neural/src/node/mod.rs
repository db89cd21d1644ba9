// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron Instances
//!
//! [`Neuron<M>`] composes a model's parameter set, state vector, input ring
//! buffers, history log and integrator. Hosts drive it through the
//! object-safe [`Node`] trait.
//!
//! ## Update Cycle (per step)
//!
//! ```text
//! Idle -> Stepping:   drain every ring buffer into the step drive
//! Stepping:           apply spike jumps, integrate over h, refresh derived values
//! Stepping -> Check:  bounds check, commit, threshold test, reset + emit
//! ... until `to`, then Done
//! ```
//!
//! A failed step leaves the state at the last completed step and aborts the
//! whole `update`.

pub mod config;
pub mod sink;

pub use config::NodeConfig;
pub use sink::{SpikeCounter, SpikeSink};

use tracing::{debug, error, trace};

use crate::buffers::InputBuffers;
use crate::history::HistoryLog;
use crate::integration::{Divergence, IntegrationStats, Integrator, SolverKind};
use crate::models::{ModelSystem, NeuronModel, StepInput};
use crate::params::{Dictionary, ParameterSet};
use crate::state::{find_violation, StateVector};
use crate::types::{CurrentEvent, NeuralError, NodeId, OutgoingSpike, Result, SpikeEvent, Step};

/// Where the integrator is within the current (or last) step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegratorPhase {
    Idle,
    Stepping,
    SpikeCheck,
    Done,
}

/// Object-safe capability set every model instance exposes to the host
pub trait Node: Send {
    fn model_name(&self) -> &'static str;

    fn id(&self) -> NodeId;

    /// Advance lags `from..to` of the slice starting at global step `origin`
    fn update(&mut self, origin: Step, from: usize, to: usize, sink: &mut dyn SpikeSink)
        -> Result<()>;

    fn handle_spike(&mut self, event: &SpikeEvent) -> Result<()>;

    fn handle_current(&mut self, event: &CurrentEvent) -> Result<()>;

    fn get_state(&self) -> Dictionary;

    fn set_state(&mut self, updates: &Dictionary) -> Result<()>;

    fn get_parameters(&self) -> Dictionary;

    fn set_parameters(&mut self, updates: &Dictionary) -> Result<()>;

    /// State variable names in vector order
    fn recordables(&self) -> Vec<&'static str>;

    fn receptor_types(&self) -> &'static [&'static str];

    fn history(&self) -> &HistoryLog;

    fn phase(&self) -> IntegratorPhase;

    fn refractory_countdown(&self) -> u32;

    fn solver(&self) -> SolverKind;

    fn integration_stats(&self) -> IntegrationStats;

    /// Back to the initial state with empty buffers and history; parameters are kept
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
pub struct Neuron<M: NeuronModel> {
    id: NodeId,
    model: M,
    params: ParameterSet<M::Parameters>,
    state: StateVector,
    scratch: Vec<f64>,
    buffers: InputBuffers,
    history: HistoryLog,
    integrator: Integrator,
    resolution_ms: f64,
    min_delay_steps: usize,
    /// First step not yet integrated
    next_step: Step,
    refractory_countdown: u32,
    phase: IntegratorPhase,
}

impl<M: NeuronModel> Neuron<M> {
    /// Node with default parameters at the model's initial state
    pub fn new(id: NodeId, config: &NodeConfig) -> Result<Self> {
        Self::with_parameters(id, config, ParameterSet::new())
    }

    pub fn with_parameters(
        id: NodeId,
        config: &NodeConfig,
        params: ParameterSet<M::Parameters>,
    ) -> Result<Self> {
        config.validate()?;
        let solver = config.solver.unwrap_or(M::DEFAULT_SOLVER);
        if !M::supports(solver) {
            return Err(NeuralError::UnsupportedSolver {
                model: M::NAME,
                solver,
            });
        }

        let model = M::default();
        let initial = model.initial_state(params.values());
        let dimension = initial.len();
        let names: Vec<&'static str> = M::STATE.iter().map(|var| var.name).collect();

        debug!(
            "Creating {} {} (solver={}, buffer capacity={})",
            M::NAME,
            id,
            solver,
            config.buffer_capacity()
        );

        Ok(Self {
            id,
            model,
            params,
            state: StateVector::new(M::STATE, initial),
            scratch: vec![0.0; dimension],
            buffers: InputBuffers::new(M::RECEPTORS, config.buffer_capacity()),
            history: HistoryLog::new(names, config.history_window_steps()),
            integrator: Integrator::new(solver, config.solver_settings, dimension),
            resolution_ms: config.resolution_ms,
            min_delay_steps: config.min_delay_steps,
            next_step: 0,
            refractory_countdown: 0,
            phase: IntegratorPhase::Idle,
        })
    }

    pub fn parameters(&self) -> &M::Parameters {
        self.params.values()
    }

    pub fn state(&self) -> &StateVector {
        &self.state
    }

    pub fn buffers(&self) -> &InputBuffers {
        &self.buffers
    }

    fn instability(
        &self,
        step: Step,
        index: Option<usize>,
        value: f64,
        cause: String,
    ) -> NeuralError {
        let variable = index
            .and_then(|i| M::STATE.get(i))
            .map_or("<unknown>", |var| var.name);
        error!(
            "{} {} diverged at step {}: {} = {} ({})",
            M::NAME,
            self.id,
            step,
            variable,
            value,
            cause
        );
        NeuralError::NumericalInstability {
            node: self.id,
            step,
            variable: variable.to_string(),
            value,
            cause,
        }
    }

    /// One resolution step; commits only on success
    fn step(&mut self, step: Step, sink: &mut dyn SpikeSink) -> Result<()> {
        self.phase = IntegratorPhase::Stepping;
        let input = StepInput {
            drive: self.buffers.drain(),
            refractory: self.refractory_countdown > 0,
        };

        self.scratch.copy_from_slice(self.state.as_slice());
        let params = self.params.values();
        self.model
            .apply_spike_input(params, &mut self.scratch, &input.drive);

        let system = ModelSystem {
            model: &self.model,
            params,
            input,
        };
        if let Err(divergence) =
            self.integrator
                .advance(&system, &mut self.scratch, self.resolution_ms)
        {
            let Divergence {
                index,
                value,
                cause,
            } = divergence;
            return Err(self.instability(step, index, value, cause.to_string()));
        }
        self.model.refresh_derived(params, &mut self.scratch, &input);

        if let Some(violation) = find_violation(M::STATE, &self.scratch) {
            return Err(self.instability(
                step,
                Some(violation.index),
                violation.value,
                violation.reason.to_string(),
            ));
        }
        self.phase = IntegratorPhase::SpikeCheck;
        let spiked = !input.refractory && self.model.threshold_crossed(params, &self.scratch);
        if spiked {
            self.model.reset_after_spike(params, &mut self.scratch);
        }

        // last fallible operation; nothing below may fail
        self.history.record(step + 1, &self.scratch)?;
        self.state.commit(&self.scratch);
        self.next_step = step + 1;

        if input.refractory {
            self.refractory_countdown -= 1;
        } else if spiked {
            self.refractory_countdown = self.model.refractory_steps(params, self.resolution_ms);
            let spike = OutgoingSpike {
                origin: self.id,
                step: step + 1,
                time_ms: (step + 1) as f64 * self.resolution_ms,
                weight: 1.0,
            };
            trace!("{} spiked at {:.3} ms", self.id, spike.time_ms);
            sink.emit(spike);
        }

        Ok(())
    }
}

impl<M: NeuronModel> Node for Neuron<M> {
    fn model_name(&self) -> &'static str {
        self.model.model_name()
    }

    fn id(&self) -> NodeId {
        self.id
    }

    fn update(
        &mut self,
        origin: Step,
        from: usize,
        to: usize,
        sink: &mut dyn SpikeSink,
    ) -> Result<()> {
        if from > to || to > self.min_delay_steps {
            return Err(NeuralError::InvalidUpdateInterval {
                from,
                to,
                limit: self.min_delay_steps,
            });
        }
        let first = origin + from as Step;
        if first < self.next_step {
            return Err(NeuralError::StepRewind {
                requested: first,
                next: self.next_step,
            });
        }
        for lag in from..to {
            if let Err(err) = self.step(origin + lag as Step, sink) {
                self.phase = IntegratorPhase::Idle;
                return Err(err);
            }
        }
        self.phase = IntegratorPhase::Done;
        Ok(())
    }

    fn handle_spike(&mut self, event: &SpikeEvent) -> Result<()> {
        if event.receptor >= M::RECEPTORS.len() {
            return Err(NeuralError::UnknownReceptor {
                model: M::NAME,
                receptor: event.receptor,
                available: M::RECEPTORS.len(),
            });
        }
        self.model
            .check_event_weight(event.receptor, event.weight)
            .map_err(|reason| NeuralError::InvalidEventWeight {
                channel: M::RECEPTORS[event.receptor].to_string(),
                weight: event.weight,
                reason: reason.to_string(),
            })?;
        self.buffers
            .add_spike(event.receptor, event.delay, event.weight)
    }

    fn handle_current(&mut self, event: &CurrentEvent) -> Result<()> {
        if !event.value.is_finite() {
            return Err(NeuralError::InvalidEventWeight {
                channel: crate::buffers::CURRENT_CHANNEL.to_string(),
                weight: event.value,
                reason: "must be finite".to_string(),
            });
        }
        self.buffers.add_current(event.delay, event.value)
    }

    fn get_state(&self) -> Dictionary {
        self.state.to_dictionary()
    }

    fn set_state(&mut self, updates: &Dictionary) -> Result<()> {
        self.state.set(updates)?;
        debug!("{} state updated: {:?}", self.id, updates);
        Ok(())
    }

    fn get_parameters(&self) -> Dictionary {
        self.params.to_dictionary()
    }

    fn set_parameters(&mut self, updates: &Dictionary) -> Result<()> {
        self.params.set(updates)?;
        debug!("{} parameters updated: {:?}", self.id, updates);
        Ok(())
    }

    fn recordables(&self) -> Vec<&'static str> {
        self.state.names()
    }

    fn receptor_types(&self) -> &'static [&'static str] {
        M::RECEPTORS
    }

    fn history(&self) -> &HistoryLog {
        &self.history
    }

    fn phase(&self) -> IntegratorPhase {
        self.phase
    }

    fn refractory_countdown(&self) -> u32 {
        self.refractory_countdown
    }

    fn solver(&self) -> SolverKind {
        self.integrator.kind()
    }

    fn integration_stats(&self) -> IntegrationStats {
        self.integrator.stats()
    }

    fn reset(&mut self) {
        let initial = self.model.initial_state(self.params.values());
        self.state.commit(&initial);
        self.buffers.clear();
        self.history.clear();
        self.integrator.reset();
        self.next_step = 0;
        self.refractory_countdown = 0;
        self.phase = IntegratorPhase::Idle;
    }
}
