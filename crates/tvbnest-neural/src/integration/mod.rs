// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Integrators
//!
//! Advance a state vector across one resolution step `h`:
//!
//! - **Rk4**: classic fixed-step Runge-Kutta, optionally split into equal sub-steps
//! - **Dopri5**: embedded Dormand-Prince 5(4) with error control; the internal
//!   step size carries over between calls
//! - **ExponentialEuler**: exact for `dy/dt = forcing - decay * y` with the split
//!   frozen over the step; only for systems that expose that split
//!
//! Integrators own their scratch space, so `advance` never allocates. Any
//! non-finite value aborts with a [`Divergence`]; nothing is retried.

use core::fmt;
use core::str::FromStr;

mod dopri5;
mod exponential;
mod rk4;

pub use dopri5::Dopri5;
pub use exponential::ExponentialEuler;
pub use rk4::Rk4;

/// Right-hand side of an ODE system `dy/dt = f(y)` (autonomous over one step)
pub trait OdeSystem {
    fn dimension(&self) -> usize;

    fn derivatives(&self, y: &[f64], dydt: &mut [f64]);

    /// Split `dy/dt = forcing - decay * y` per component.
    ///
    /// Returns `false` when the system has no such form.
    fn linear_split(&self, _y: &[f64], _forcing: &mut [f64], _decay: &mut [f64]) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolverKind {
    Rk4,
    Dopri5,
    ExponentialEuler,
}

impl SolverKind {
    pub const ALL: [SolverKind; 3] = [
        SolverKind::Rk4,
        SolverKind::Dopri5,
        SolverKind::ExponentialEuler,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SolverKind::Rk4 => "rk4",
            SolverKind::Dopri5 => "dopri5",
            SolverKind::ExponentialEuler => "exponential_euler",
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolverKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown solver '{s}' (expected rk4, dopri5 or exponential_euler)"))
    }
}

/// Tunables shared by all solvers (times in ms)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    pub rk4_substeps: u32,
    pub rtol: f64,
    pub atol: f64,
    pub min_step: f64,
    pub max_internal_steps: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rk4_substeps: 1,
            rtol: 1e-6,
            atol: 1e-6,
            min_step: 1e-8,
            max_internal_steps: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceCause {
    NonFinite,
    StepSizeUnderflow,
    TooManySteps,
    NoLinearSplit,
}

impl fmt::Display for DivergenceCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DivergenceCause::NonFinite => "non-finite value",
            DivergenceCause::StepSizeUnderflow => "step size below minimum",
            DivergenceCause::TooManySteps => "internal step limit exceeded",
            DivergenceCause::NoLinearSplit => "system has no linear split",
        };
        f.write_str(text)
    }
}

/// Failed integration of one step; `index` names the offending component when known
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divergence {
    pub index: Option<usize>,
    pub value: f64,
    pub cause: DivergenceCause,
}

impl Divergence {
    pub(crate) fn non_finite(index: usize, value: f64) -> Self {
        Self {
            index: Some(index),
            value,
            cause: DivergenceCause::NonFinite,
        }
    }
}

/// First non-finite component of `y`
pub(crate) fn first_non_finite(y: &[f64]) -> Option<(usize, f64)> {
    y.iter()
        .copied()
        .enumerate()
        .find(|(_, v)| !v.is_finite())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegrationStats {
    pub rhs_evaluations: u64,
    pub accepted_steps: u64,
    pub rejected_steps: u64,
}

/// Solver selected for one node
#[derive(Debug, Clone)]
pub enum Integrator {
    Rk4(Rk4),
    Dopri5(Dopri5),
    ExponentialEuler(ExponentialEuler),
}

impl Integrator {
    pub fn new(kind: SolverKind, settings: SolverSettings, dimension: usize) -> Self {
        match kind {
            SolverKind::Rk4 => Integrator::Rk4(Rk4::new(dimension, settings.rk4_substeps)),
            SolverKind::Dopri5 => Integrator::Dopri5(Dopri5::new(dimension, settings)),
            SolverKind::ExponentialEuler => {
                Integrator::ExponentialEuler(ExponentialEuler::new(dimension))
            }
        }
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Integrator::Rk4(_) => SolverKind::Rk4,
            Integrator::Dopri5(_) => SolverKind::Dopri5,
            Integrator::ExponentialEuler(_) => SolverKind::ExponentialEuler,
        }
    }

    /// Advance `y` in place by `h`; on error `y` holds a partial result
    pub fn advance<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        y: &mut [f64],
        h: f64,
    ) -> Result<(), Divergence> {
        match self {
            Integrator::Rk4(solver) => solver.advance(system, y, h),
            Integrator::Dopri5(solver) => solver.advance(system, y, h),
            Integrator::ExponentialEuler(solver) => solver.advance(system, y, h),
        }
    }

    pub fn stats(&self) -> IntegrationStats {
        match self {
            Integrator::Rk4(solver) => solver.stats,
            Integrator::Dopri5(solver) => solver.stats,
            Integrator::ExponentialEuler(solver) => solver.stats,
        }
    }

    /// Forget carried step size and counters
    pub fn reset(&mut self) {
        match self {
            Integrator::Rk4(solver) => solver.stats = IntegrationStats::default(),
            Integrator::Dopri5(solver) => solver.reset(),
            Integrator::ExponentialEuler(solver) => solver.stats = IntegrationStats::default(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_systems {
    use super::OdeSystem;

    /// dy/dt = -k y, exact solution y0 e^{-k t}
    pub struct Decay {
        pub k: f64,
    }

    impl OdeSystem for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn derivatives(&self, y: &[f64], dydt: &mut [f64]) {
            dydt[0] = -self.k * y[0];
        }

        fn linear_split(&self, _y: &[f64], forcing: &mut [f64], decay: &mut [f64]) -> bool {
            forcing[0] = 0.0;
            decay[0] = self.k;
            true
        }
    }

    /// Harmonic oscillator: energy is conserved
    pub struct Oscillator;

    impl OdeSystem for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn derivatives(&self, y: &[f64], dydt: &mut [f64]) {
            dydt[0] = y[1];
            dydt[1] = -y[0];
        }
    }

    /// dy/dt = y^2 blows up at t = 1/y0
    pub struct BlowUp;

    impl OdeSystem for BlowUp {
        fn dimension(&self) -> usize {
            1
        }

        fn derivatives(&self, y: &[f64], dydt: &mut [f64]) {
            dydt[0] = y[0] * y[0];
        }
    }
}
