// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Conductance-based AdEx neuron with AMPA/NMDA/GABA_A synapses
//!
//! Registered as `iaf_cond_nmda_deco2014` (excitatory population of
//! Deco et al. 2014, with optional exponential spike initiation and
//! adaptation current).
//!
//! ## Model Dynamics
//!
//! ```text
//! V_eff = V_reset while refractory, min(V, V_peak) if Delta_T > 0, else V
//!
//! I_L     = g_m (V_eff - E_L)
//! I_spk   = g_m Delta_T exp((V_eff - V_th) / Delta_T)        (0 if Delta_T = 0)
//! I_AMPAx = g_AMPA_ext (V_eff - E_ex) s_AMPA_ext
//! I_AMPA  = g_AMPA (V_eff - E_ex) s_AMPA
//! I_NMDA  = g_NMDA (V_eff - E_ex) s_NMDA / (1 + lambda_NMDA exp(-beta V_eff))
//! I_GABA  = g_GABA_A (V_eff - E_in) s_GABA
//!
//! C_m dV/dt = -I_L + I_spk - I_syn - w + I_e + I_stim     (0 while refractory)
//! ds_AMPA_ext/dt = -s_AMPA_ext / tau_decay_AMPA
//! ds_AMPA/dt     = -s_AMPA / tau_decay_AMPA
//! dx_NMDA/dt     = -x_NMDA / tau_rise_NMDA
//! ds_NMDA/dt     = -s_NMDA / tau_decay_NMDA + alpha x_NMDA (1 - s_NMDA)
//! ds_GABA/dt     = -s_GABA / tau_decay_GABA_A
//! dw/dt          = (a (V_eff - E_L) - w) / tau_w
//!
//! Spike on V >= V_peak (Delta_T > 0) or V >= V_th: V <- V_reset, w <- w + b,
//! refractory for round(t_ref / h) steps.
//! ```
//!
//! Incoming spike weights jump the gating variable of their receptor:
//! AMPA_EXT -> s_AMPA_ext, AMPA -> s_AMPA, NMDA -> x_NMDA, GABA_A -> s_GABA.

use super::traits::{NeuronModel, StepInput};
use crate::buffers::Drive;
use crate::integration::SolverKind;
use crate::params::ModelParameters;
use crate::state::StateVariable;
use crate::types::{NeuralError, Result};

pub const V_M: usize = 0;
pub const S_AMPA_EXT: usize = 1;
pub const S_AMPA: usize = 2;
pub const X_NMDA: usize = 3;
pub const S_NMDA: usize = 4;
pub const S_GABA: usize = 5;
pub const W: usize = 6;

pub const AMPA_EXT: usize = 0;
pub const AMPA: usize = 1;
pub const NMDA: usize = 2;
pub const GABA_A: usize = 3;

/// exp() argument bound for the spike-initiation term
const MAX_EXP_ARGUMENT: f64 = 600.0;

crate::model_parameters! {
    /// Parameters of `iaf_cond_nmda_deco2014`
    pub struct Deco2014Parameters {
        /// Spike threshold (mV)
        v_th: "V_th" = -50.0, Any, "mV";
        v_reset: "V_reset" = -55.0, Any, "mV";
        e_l: "E_L" = -70.0, Any, "mV";
        e_ex: "E_ex" = 0.0, Any, "mV";
        e_in: "E_in" = -70.0, Any, "mV";
        t_ref: "t_ref" = 2.0, NonNegative, "ms";
        c_m: "C_m" = 500.0, Positive, "pF";
        g_m: "g_m" = 25.0, NonNegative, "nS";
        g_ampa_ext: "g_AMPA_ext" = 3.37, NonNegative, "nS";
        g_ampa: "g_AMPA" = 0.065, NonNegative, "nS";
        g_nmda: "g_NMDA" = 0.20, NonNegative, "nS";
        g_gaba_a: "g_GABA_A" = 10.94, NonNegative, "nS";
        tau_decay_ampa: "tau_decay_AMPA" = 2.0, Positive, "ms";
        tau_rise_nmda: "tau_rise_NMDA" = 2.0, Positive, "ms";
        tau_decay_nmda: "tau_decay_NMDA" = 100.0, Positive, "ms";
        tau_decay_gaba_a: "tau_decay_GABA_A" = 10.0, Positive, "ms";
        alpha: "alpha" = 0.5, NonNegative, "kHz";
        beta: "beta" = 0.062, NonNegative, "1/mV";
        lambda_nmda: "lambda_NMDA" = 0.28, NonNegative, "";
        i_e: "I_e" = 0.0, Any, "pA";
        /// Slope factor of the exponential term; 0 disables it
        delta_t: "Delta_T" = 0.0, NonNegative, "mV";
        /// Spike detection level when Delta_T > 0
        v_peak: "V_peak" = 0.0, Any, "mV";
        /// Subthreshold adaptation (nS)
        a: "a" = 0.0, Any, "nS";
        /// Spike-triggered adaptation increment (pA)
        b: "b" = 0.0, Any, "pA";
        tau_w: "tau_w" = 144.0, Positive, "ms";
    }
}

impl ModelParameters for Deco2014Parameters {
    fn check_relations(&self) -> Result<()> {
        if self.v_reset >= self.v_th {
            return Err(NeuralError::InvalidParameter {
                name: "V_reset".to_string(),
                value: self.v_reset,
                reason: format!("must be below V_th ({})", self.v_th),
            });
        }
        if self.delta_t > 0.0 {
            if self.v_peak <= self.v_th {
                return Err(NeuralError::InvalidParameter {
                    name: "V_peak".to_string(),
                    value: self.v_peak,
                    reason: format!("must exceed V_th ({}) when Delta_T > 0", self.v_th),
                });
            }
            if (self.v_peak - self.v_th) / self.delta_t >= MAX_EXP_ARGUMENT {
                return Err(NeuralError::InvalidParameter {
                    name: "Delta_T".to_string(),
                    value: self.delta_t,
                    reason: format!(
                        "(V_peak - V_th) / Delta_T must be below {MAX_EXP_ARGUMENT}"
                    ),
                });
            }
        }
        Ok(())
    }
}

const LAYOUT: [StateVariable; 7] = [
    StateVariable::unbounded("V_m", "mV"),
    StateVariable::non_negative("s_AMPA_ext", ""),
    StateVariable::non_negative("s_AMPA", ""),
    StateVariable::non_negative("x_NMDA", ""),
    StateVariable::fraction("s_NMDA"),
    StateVariable::non_negative("s_GABA", ""),
    StateVariable::unbounded("w", "pA"),
];

const RECEPTOR_NAMES: [&str; 4] = ["AMPA_EXT", "AMPA", "NMDA", "GABA_A"];

#[derive(Debug, Clone, Copy, Default)]
pub struct IafCondNmdaDeco2014;

impl IafCondNmdaDeco2014 {
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    fn effective_potential(params: &Deco2014Parameters, v: f64, refractory: bool) -> f64 {
        if refractory {
            params.v_reset
        } else if params.delta_t > 0.0 {
            v.min(params.v_peak)
        } else {
            v
        }
    }
}

impl NeuronModel for IafCondNmdaDeco2014 {
    type Parameters = Deco2014Parameters;

    const NAME: &'static str = "iaf_cond_nmda_deco2014";
    const STATE: &'static [StateVariable] = &LAYOUT;
    const RECEPTORS: &'static [&'static str] = &RECEPTOR_NAMES;
    const DEFAULT_SOLVER: SolverKind = SolverKind::Dopri5;
    const SUPPORTED_SOLVERS: &'static [SolverKind] = &[SolverKind::Dopri5, SolverKind::Rk4];

    fn initial_state(&self, params: &Deco2014Parameters) -> Vec<f64> {
        let mut state = vec![0.0; LAYOUT.len()];
        state[V_M] = params.e_l;
        state
    }

    fn check_event_weight(&self, _receptor: usize, weight: f64) -> core::result::Result<(), &'static str> {
        if !weight.is_finite() {
            Err("must be finite")
        } else if weight < 0.0 {
            Err("must be >= 0; the receptor carries the sign")
        } else {
            Ok(())
        }
    }

    fn apply_spike_input(&self, _params: &Deco2014Parameters, state: &mut [f64], drive: &Drive) {
        state[S_AMPA_EXT] += drive.receptors[AMPA_EXT];
        state[S_AMPA] += drive.receptors[AMPA];
        state[X_NMDA] += drive.receptors[NMDA];
        state[S_GABA] += drive.receptors[GABA_A];
    }

    #[inline]
    fn derivatives(
        &self,
        p: &Deco2014Parameters,
        y: &[f64],
        input: &StepInput,
        dydt: &mut [f64],
    ) {
        let v = Self::effective_potential(p, y[V_M], input.refractory);

        let i_leak = p.g_m * (v - p.e_l);
        let i_spike = if p.delta_t > 0.0 {
            p.g_m * p.delta_t * ((v - p.v_th) / p.delta_t).exp()
        } else {
            0.0
        };
        let i_ampa_ext = p.g_ampa_ext * (v - p.e_ex) * y[S_AMPA_EXT];
        let i_ampa = p.g_ampa * (v - p.e_ex) * y[S_AMPA];
        let i_nmda =
            p.g_nmda * (v - p.e_ex) * y[S_NMDA] / (1.0 + p.lambda_nmda * (-p.beta * v).exp());
        let i_gaba = p.g_gaba_a * (v - p.e_in) * y[S_GABA];
        let i_syn = i_ampa_ext + i_ampa + i_nmda + i_gaba;

        dydt[V_M] = if input.refractory {
            0.0
        } else {
            (-i_leak + i_spike - i_syn - y[W] + p.i_e + input.drive.current) / p.c_m
        };
        dydt[S_AMPA_EXT] = -y[S_AMPA_EXT] / p.tau_decay_ampa;
        dydt[S_AMPA] = -y[S_AMPA] / p.tau_decay_ampa;
        dydt[X_NMDA] = -y[X_NMDA] / p.tau_rise_nmda;
        dydt[S_NMDA] = -y[S_NMDA] / p.tau_decay_nmda + p.alpha * y[X_NMDA] * (1.0 - y[S_NMDA]);
        dydt[S_GABA] = -y[S_GABA] / p.tau_decay_gaba_a;
        dydt[W] = (p.a * (v - p.e_l) - y[W]) / p.tau_w;
    }

    fn threshold_crossed(&self, p: &Deco2014Parameters, state: &[f64]) -> bool {
        let threshold = if p.delta_t > 0.0 { p.v_peak } else { p.v_th };
        state[V_M] >= threshold
    }

    fn reset_after_spike(&self, p: &Deco2014Parameters, state: &mut [f64]) {
        state[V_M] = p.v_reset;
        state[W] += p.b;
    }

    fn refractory_steps(&self, p: &Deco2014Parameters, resolution_ms: f64) -> u32 {
        (p.t_ref / resolution_ms).round() as u32
    }
}
