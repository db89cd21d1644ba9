// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Neuron model trait definitions
//!
//! A model is a stateless description of continuous-time dynamics plus the
//! discrete rules applied around them (input jumps, threshold, reset). The
//! per-node data (parameters, state, buffers) lives in
//! [`Neuron`](crate::node::Neuron).

use core::fmt::Debug;

use crate::buffers::Drive;
use crate::integration::{OdeSystem, SolverKind};
use crate::params::ModelParameters;
use crate::state::StateVariable;

/// Inputs held constant over one integration step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepInput {
    pub drive: Drive,
    pub refractory: bool,
}

/// Core trait that all neuron models must implement
pub trait NeuronModel: Debug + Default + Clone + Send + Sync + 'static {
    /// Model-specific parameters
    type Parameters: ModelParameters;

    /// Name under which the model is registered
    const NAME: &'static str;

    /// State variable layout, in vector order
    const STATE: &'static [StateVariable];

    /// Spike receptor ports, indexed by port number
    const RECEPTORS: &'static [&'static str];

    const DEFAULT_SOLVER: SolverKind;

    const SUPPORTED_SOLVERS: &'static [SolverKind];

    fn model_name(&self) -> &'static str {
        Self::NAME
    }

    /// State a fresh (or reset) node starts from
    fn initial_state(&self, params: &Self::Parameters) -> Vec<f64>;

    /// Reject spike weights the model cannot interpret on `receptor`
    fn check_event_weight(&self, _receptor: usize, weight: f64) -> Result<(), &'static str> {
        if weight.is_finite() {
            Ok(())
        } else {
            Err("must be finite")
        }
    }

    /// Instantaneous effect of the drained spike weights, applied before integrating
    fn apply_spike_input(&self, _params: &Self::Parameters, _state: &mut [f64], _drive: &Drive) {}

    /// Right-hand side dy/dt; must not fail and must stay finite for in-range states
    fn derivatives(
        &self,
        params: &Self::Parameters,
        state: &[f64],
        input: &StepInput,
        dydt: &mut [f64],
    );

    /// `dy/dt = forcing - decay * y` split, for exponential integration
    fn linear_split(
        &self,
        _params: &Self::Parameters,
        _state: &[f64],
        _input: &StepInput,
        _forcing: &mut [f64],
        _decay: &mut [f64],
    ) -> bool {
        false
    }

    /// Recompute cached quantities after the step
    fn refresh_derived(&self, _params: &Self::Parameters, _state: &mut [f64], _input: &StepInput) {}

    fn threshold_crossed(&self, _params: &Self::Parameters, _state: &[f64]) -> bool {
        false
    }

    fn reset_after_spike(&self, _params: &Self::Parameters, _state: &mut [f64]) {}

    fn refractory_steps(&self, _params: &Self::Parameters, _resolution_ms: f64) -> u32 {
        0
    }

    fn supports(solver: SolverKind) -> bool {
        Self::SUPPORTED_SOLVERS.contains(&solver)
    }
}

/// A model bound to its parameters and step input, seen as an ODE system
pub struct ModelSystem<'a, M: NeuronModel> {
    pub model: &'a M,
    pub params: &'a M::Parameters,
    pub input: StepInput,
}

impl<M: NeuronModel> OdeSystem for ModelSystem<'_, M> {
    fn dimension(&self) -> usize {
        M::STATE.len()
    }

    #[inline]
    fn derivatives(&self, y: &[f64], dydt: &mut [f64]) {
        self.model.derivatives(self.params, y, &self.input, dydt);
    }

    fn linear_split(&self, y: &[f64], forcing: &mut [f64], decay: &mut [f64]) -> bool {
        self.model
            .linear_split(self.params, y, &self.input, forcing, decay)
    }
}
