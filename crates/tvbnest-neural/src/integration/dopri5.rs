// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dormand-Prince 5(4) embedded Runge-Kutta with adaptive step size
//!
//! ```text
//! err_norm = sqrt(mean_i((dt * sum_j e_j k_j[i] / (atol + rtol * max(|y_i|, |y5_i|)))^2))
//! accept if err_norm <= 1, then dt_next = dt * clamp(0.9 * err_norm^(-1/5), 0.2, 10)
//! ```
//!
//! The last proposed step size survives between calls, so a quiescent node
//! takes one internal step per resolution step.

use super::{
    first_non_finite, Divergence, DivergenceCause, IntegrationStats, OdeSystem, SolverSettings,
};

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

// Butcher tableau rows (a_ij), stage j < i
const A2: [f64; 1] = [1.0 / 5.0];
const A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
const A4: [f64; 3] = [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
const A5: [f64; 4] = [
    19372.0 / 6561.0,
    -25360.0 / 2187.0,
    64448.0 / 6561.0,
    -212.0 / 729.0,
];
const A6: [f64; 5] = [
    9017.0 / 3168.0,
    -355.0 / 33.0,
    46732.0 / 5247.0,
    49.0 / 176.0,
    -5103.0 / 18656.0,
];
// fifth-order weights, also stage 7 (FSAL)
const B5: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];
// b5 - b4
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

#[derive(Debug, Clone)]
pub struct Dopri5 {
    settings: SolverSettings,
    carried_step: Option<f64>,
    k: [Vec<f64>; 7],
    ytmp: Vec<f64>,
    y5: Vec<f64>,
    pub stats: IntegrationStats,
}

/// out = y + dt * sum_j coeffs[j] * k[j]
#[inline]
fn combine(y: &[f64], dt: f64, coeffs: &[f64], k: &[Vec<f64>], out: &mut [f64]) {
    for (i, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (c, kj) in coeffs.iter().zip(k) {
            acc += c * kj[i];
        }
        *slot = y[i] + dt * acc;
    }
}

impl Dopri5 {
    pub fn new(dimension: usize, settings: SolverSettings) -> Self {
        Self {
            settings,
            carried_step: None,
            k: core::array::from_fn(|_| vec![0.0; dimension]),
            ytmp: vec![0.0; dimension],
            y5: vec![0.0; dimension],
            stats: IntegrationStats::default(),
        }
    }

    /// Step size the next call will try first
    pub fn carried_step(&self) -> Option<f64> {
        self.carried_step
    }

    pub fn reset(&mut self) {
        self.carried_step = None;
        self.stats = IntegrationStats::default();
    }

    pub fn advance<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        y: &mut [f64],
        h: f64,
    ) -> Result<(), Divergence> {
        let mut t = 0.0;
        let mut proposed = match self.carried_step {
            Some(step) if step > 0.0 => step.min(h),
            _ => h,
        };
        let mut attempts = 0u32;
        let mut k1_current = false;

        while h - t > h * 1e-12 {
            if attempts >= self.settings.max_internal_steps {
                return Err(Divergence {
                    index: None,
                    value: proposed,
                    cause: DivergenceCause::TooManySteps,
                });
            }
            attempts += 1;
            let dt = proposed.min(h - t);

            if !k1_current {
                system.derivatives(y, &mut self.k[0]);
                self.stats.rhs_evaluations += 1;
                k1_current = true;
            }
            self.stages(system, y, dt);

            if let Some((index, value)) =
                first_non_finite(&self.y5).or_else(|| first_non_finite(&self.k[6]))
            {
                self.stats.rejected_steps += 1;
                proposed = dt * MIN_FACTOR;
                if proposed < self.settings.min_step {
                    return Err(Divergence::non_finite(index, value));
                }
                continue;
            }

            let (err_norm, worst) = self.error_norm(y, dt);
            if err_norm <= 1.0 {
                y.copy_from_slice(&self.y5);
                t += dt;
                self.stats.accepted_steps += 1;
                // FSAL: the last stage is the first stage of the next step
                self.k.swap(0, 6);

                let factor = if err_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err_norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                // a step truncated to land on h says little about the next one
                if dt >= proposed {
                    proposed = dt * factor;
                }
            } else {
                self.stats.rejected_steps += 1;
                let factor = (SAFETY * err_norm.powf(-0.2)).clamp(MIN_FACTOR, 1.0);
                proposed = dt * factor;
                if proposed < self.settings.min_step {
                    return Err(Divergence {
                        index: Some(worst),
                        value: y[worst],
                        cause: DivergenceCause::StepSizeUnderflow,
                    });
                }
            }
        }

        self.carried_step = Some(proposed);
        Ok(())
    }

    /// Stages 2..7 from k[0]; fills y5 and k[6] = f(y5)
    fn stages<S: OdeSystem + ?Sized>(&mut self, system: &S, y: &[f64], dt: f64) {
        let rows: [&[f64]; 5] = [&A2, &A3, &A4, &A5, &A6];
        for (stage, row) in rows.iter().enumerate() {
            combine(y, dt, row, &self.k, &mut self.ytmp);
            system.derivatives(&self.ytmp, &mut self.k[stage + 1]);
        }
        combine(y, dt, &B5, &self.k, &mut self.y5);
        system.derivatives(&self.y5, &mut self.k[6]);
        self.stats.rhs_evaluations += 6;
    }

    /// RMS scaled error and the index of its largest component
    fn error_norm(&self, y: &[f64], dt: f64) -> (f64, usize) {
        let n = y.len().max(1);
        let mut sum = 0.0;
        let mut worst = (0usize, 0.0f64);
        for i in 0..y.len() {
            let mut err = 0.0;
            for (e, kj) in E.iter().zip(&self.k) {
                err += e * kj[i];
            }
            let scale = self.settings.atol + self.settings.rtol * y[i].abs().max(self.y5[i].abs());
            let ratio = (dt * err / scale).abs();
            if ratio > worst.1 {
                worst = (i, ratio);
            }
            sum += ratio * ratio;
        }
        ((sum / n as f64).sqrt(), worst.0)
    }
}
