// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Exponential Euler for systems of the form `dy/dt = forcing - decay * y`
//!
//! With the split frozen over the step:
//!
//! ```text
//! decay > 0:  y <- y_inf + (y - y_inf) * exp(-decay * h),  y_inf = forcing / decay
//! decay = 0:  y <- y + forcing * h
//! ```

use super::{first_non_finite, Divergence, DivergenceCause, IntegrationStats, OdeSystem};

#[derive(Debug, Clone)]
pub struct ExponentialEuler {
    forcing: Vec<f64>,
    decay: Vec<f64>,
    pub stats: IntegrationStats,
}

impl ExponentialEuler {
    pub fn new(dimension: usize) -> Self {
        Self {
            forcing: vec![0.0; dimension],
            decay: vec![0.0; dimension],
            stats: IntegrationStats::default(),
        }
    }

    pub fn advance<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        y: &mut [f64],
        h: f64,
    ) -> Result<(), Divergence> {
        if !system.linear_split(y, &mut self.forcing, &mut self.decay) {
            return Err(Divergence {
                index: None,
                value: f64::NAN,
                cause: DivergenceCause::NoLinearSplit,
            });
        }
        self.stats.rhs_evaluations += 1;

        for ((yi, &forcing), &decay) in y.iter_mut().zip(&self.forcing).zip(&self.decay) {
            if decay > 0.0 {
                let y_inf = forcing / decay;
                *yi = y_inf + (*yi - y_inf) * (-decay * h).exp();
            } else {
                *yi += forcing * h;
            }
        }

        if let Some((index, value)) = first_non_finite(y) {
            return Err(Divergence::non_finite(index, value));
        }
        self.stats.accepted_steps += 1;
        Ok(())
    }
}
