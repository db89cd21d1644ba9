// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Reduced Wong-Wang rate model
//!
//! Registered as `tvb_rate_wongwang`. Mean-field synaptic gating `S` driven by
//! the population rate `H(x)`:
//!
//! ```text
//! x     = w J_N S + J_N input + I_o + I_e + I_stim
//! H(x)  = (a x - b) / (1 - exp(-d (a x - b)))
//! dS/dt = -S / tau_s + (1 - S) gamma H(x)
//! R     = H(x)          (cached rate, recomputed after each step)
//! ```
//!
//! `input` is the rate-weighted sum drained from the `RATE` port for the step.
//! With `H` frozen over a step, `dS/dt = gamma H - (1/tau_s + gamma H) S` is
//! linear in `S`, so exponential Euler is the default solver. The model never
//! spikes.

use super::traits::{NeuronModel, StepInput};
use crate::integration::SolverKind;
use crate::params::ModelParameters;
use crate::state::StateVariable;

pub const S: usize = 0;
pub const R: usize = 1;

pub const RATE: usize = 0;

/// Below this |a x - b| the rate uses its series expansion
const SMALL_ARGUMENT: f64 = 1e-9;

crate::model_parameters! {
    /// Parameters of `tvb_rate_wongwang`
    pub struct WongWangParameters {
        a: "a" = 0.270, NonNegative, "nC^-1";
        b: "b" = 0.108, Any, "kHz";
        d: "d" = 154.0, Positive, "ms";
        /// Kinetic parameter, per ms
        gamma: "gamma" = 0.641 / 1000.0, NonNegative, "";
        tau_s: "tau_s" = 100.0, Positive, "ms";
        /// Recurrent excitation weight
        w: "w" = 0.6, UnitInterval, "";
        j_n: "J_N" = 0.2609, NonNegative, "nA";
        i_o: "I_o" = 0.33, Any, "nA";
        i_e: "I_e" = 0.0, Any, "nA";
    }
}

impl ModelParameters for WongWangParameters {}

const LAYOUT: [StateVariable; 2] = [
    StateVariable::fraction("S"),
    StateVariable::non_negative("R", "Hz"),
];

const RECEPTOR_NAMES: [&str; 1] = ["RATE"];

#[derive(Debug, Clone, Copy, Default)]
pub struct TvbRateWongWang;

impl TvbRateWongWang {
    pub fn new() -> Self {
        Self
    }

    /// Total synaptic input current x
    #[inline]
    pub fn input_current(p: &WongWangParameters, s: f64, input: &StepInput) -> f64 {
        p.w * p.j_n * s
            + p.j_n * input.drive.receptors[RATE]
            + p.i_o
            + p.i_e
            + input.drive.current
    }

    /// Population transfer function H(x)
    #[inline]
    pub fn rate(p: &WongWangParameters, x: f64) -> f64 {
        let u = p.a * x - p.b;
        if u.abs() < SMALL_ARGUMENT {
            1.0 / p.d + 0.5 * u
        } else {
            u / (1.0 - (-p.d * u).exp())
        }
    }
}

impl NeuronModel for TvbRateWongWang {
    type Parameters = WongWangParameters;

    const NAME: &'static str = "tvb_rate_wongwang";
    const STATE: &'static [StateVariable] = &LAYOUT;
    const RECEPTORS: &'static [&'static str] = &RECEPTOR_NAMES;
    const DEFAULT_SOLVER: SolverKind = SolverKind::ExponentialEuler;
    const SUPPORTED_SOLVERS: &'static [SolverKind] = &[
        SolverKind::ExponentialEuler,
        SolverKind::Rk4,
        SolverKind::Dopri5,
    ];

    fn initial_state(&self, params: &WongWangParameters) -> Vec<f64> {
        let x = Self::input_current(params, 0.0, &StepInput::default());
        vec![0.0, Self::rate(params, x)]
    }

    fn derivatives(
        &self,
        p: &WongWangParameters,
        y: &[f64],
        input: &StepInput,
        dydt: &mut [f64],
    ) {
        let h = Self::rate(p, Self::input_current(p, y[S], input));
        dydt[S] = -y[S] / p.tau_s + (1.0 - y[S]) * p.gamma * h;
        dydt[R] = 0.0;
    }

    fn linear_split(
        &self,
        p: &WongWangParameters,
        y: &[f64],
        input: &StepInput,
        forcing: &mut [f64],
        decay: &mut [f64],
    ) -> bool {
        let h = Self::rate(p, Self::input_current(p, y[S], input));
        forcing[S] = p.gamma * h;
        decay[S] = 1.0 / p.tau_s + p.gamma * h;
        forcing[R] = 0.0;
        decay[R] = 0.0;
        true
    }

    fn refresh_derived(&self, p: &WongWangParameters, state: &mut [f64], input: &StepInput) {
        state[R] = Self::rate(p, Self::input_current(p, state[S], input));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::Drive;

    #[test]
    fn test_rate_is_continuous_at_singularity() {
        let p = WongWangParameters::default();
        let x0 = p.b / p.a;
        let at = TvbRateWongWang::rate(&p, x0);
        let near = TvbRateWongWang::rate(&p, x0 + 1e-6);
        assert!((at - 1.0 / p.d).abs() < 1e-12);
        assert!((at - near).abs() < 1e-6);
    }

    #[test]
    fn test_rate_non_negative() {
        let p = WongWangParameters::default();
        for x in [-100.0, -1.0, 0.0, 0.4, 1.0, 10.0] {
            assert!(TvbRateWongWang::rate(&p, x) >= 0.0, "H({x})");
        }
    }

    #[test]
    fn test_linear_split_matches_derivatives() {
        let model = TvbRateWongWang::new();
        let p = WongWangParameters::default();
        let input = StepInput {
            drive: Drive {
                receptors: [0.3, 0.0, 0.0, 0.0],
                current: 0.0,
            },
            refractory: false,
        };
        let y = [0.25, 0.0];
        let mut dydt = [0.0; 2];
        let mut forcing = [0.0; 2];
        let mut decay = [0.0; 2];
        model.derivatives(&p, &y, &input, &mut dydt);
        assert!(model.linear_split(&p, &y, &input, &mut forcing, &mut decay));
        assert!((forcing[S] - decay[S] * y[S] - dydt[S]).abs() < 1e-15);
    }

    #[test]
    fn test_never_spikes() {
        let model = TvbRateWongWang::new();
        let p = WongWangParameters::default();
        assert!(!model.threshold_crossed(&p, &[1.0, 1000.0]));
        assert_eq!(model.refractory_steps(&p, 0.1), 0);
    }

    #[test]
    fn test_initial_rate_is_cached() {
        let model = TvbRateWongWang::new();
        let p = WongWangParameters::default();
        let state = model.initial_state(&p);
        assert_eq!(state[S], 0.0);
        assert!(state[R] > 0.0);
    }
}
