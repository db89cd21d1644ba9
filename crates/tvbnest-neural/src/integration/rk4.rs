// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Classic fourth-order Runge-Kutta with fixed sub-steps

use super::{first_non_finite, Divergence, IntegrationStats, OdeSystem};

#[derive(Debug, Clone)]
pub struct Rk4 {
    substeps: u32,
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
    pub stats: IntegrationStats,
}

impl Rk4 {
    pub fn new(dimension: usize, substeps: u32) -> Self {
        Self {
            substeps: substeps.max(1),
            k1: vec![0.0; dimension],
            k2: vec![0.0; dimension],
            k3: vec![0.0; dimension],
            k4: vec![0.0; dimension],
            tmp: vec![0.0; dimension],
            stats: IntegrationStats::default(),
        }
    }

    pub fn substeps(&self) -> u32 {
        self.substeps
    }

    pub fn advance<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        y: &mut [f64],
        h: f64,
    ) -> Result<(), Divergence> {
        let dt = h / f64::from(self.substeps);
        for _ in 0..self.substeps {
            self.single_step(system, y, dt);
            self.stats.rhs_evaluations += 4;
            if let Some((index, value)) = first_non_finite(y) {
                return Err(Divergence::non_finite(index, value));
            }
            self.stats.accepted_steps += 1;
        }
        Ok(())
    }

    #[inline]
    fn single_step<S: OdeSystem + ?Sized>(&mut self, system: &S, y: &mut [f64], dt: f64) {
        let n = y.len();

        system.derivatives(y, &mut self.k1);
        for i in 0..n {
            self.tmp[i] = y[i] + 0.5 * dt * self.k1[i];
        }
        system.derivatives(&self.tmp, &mut self.k2);
        for i in 0..n {
            self.tmp[i] = y[i] + 0.5 * dt * self.k2[i];
        }
        system.derivatives(&self.tmp, &mut self.k3);
        for i in 0..n {
            self.tmp[i] = y[i] + dt * self.k3[i];
        }
        system.derivatives(&self.tmp, &mut self.k4);

        for i in 0..n {
            y[i] += dt / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::test_systems::{BlowUp, Oscillator};

    #[test]
    fn test_oscillator_conserves_energy() {
        let mut solver = Rk4::new(2, 4);
        let mut y = [1.0, 0.0];
        for _ in 0..1000 {
            solver.advance(&Oscillator, &mut y, 0.01).unwrap();
        }
        let energy = y[0] * y[0] + y[1] * y[1];
        assert!((energy - 1.0).abs() < 1e-9);
        assert_eq!(solver.stats.accepted_steps, 4000);
        assert_eq!(solver.stats.rhs_evaluations, 16000);
    }

    #[test]
    fn test_blow_up_reports_divergence() {
        let mut solver = Rk4::new(1, 1);
        let mut y = [1e200];
        let err = solver.advance(&BlowUp, &mut y, 1.0).unwrap_err();
        assert_eq!(err.index, Some(0));
    }

    #[test]
    fn test_zero_substeps_clamped() {
        assert_eq!(Rk4::new(1, 0).substeps(), 1);
    }
}
