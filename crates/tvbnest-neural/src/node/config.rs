// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-node construction settings supplied by the host

use crate::integration::{SolverKind, SolverSettings};
use crate::types::{NeuralError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Simulation resolution h (ms)
    pub resolution_ms: f64,
    /// Longest `update` interval the host will request (steps)
    pub min_delay_steps: usize,
    /// Longest event delay the host will deliver (steps)
    pub max_delay_steps: usize,
    /// Trailing history window (ms); 0 disables recording
    pub history_window_ms: f64,
    /// Solver override; `None` selects the model's default
    pub solver: Option<SolverKind>,
    pub solver_settings: SolverSettings,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            resolution_ms: 0.1,
            min_delay_steps: 10,
            max_delay_steps: 200,
            history_window_ms: 100.0,
            solver: None,
            solver_settings: SolverSettings::default(),
        }
    }
}

impl NodeConfig {
    /// Ring buffer capacity: every delay up to `max_delay_steps` plus one update interval
    pub fn buffer_capacity(&self) -> usize {
        self.min_delay_steps + self.max_delay_steps
    }

    pub fn history_window_steps(&self) -> u64 {
        (self.history_window_ms / self.resolution_ms).round() as u64
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.resolution_ms.is_finite() && self.resolution_ms > 0.0) {
            return Err(NeuralError::InvalidConfiguration(format!(
                "resolution_ms must be > 0, got {}",
                self.resolution_ms
            )));
        }
        if self.min_delay_steps == 0 {
            return Err(NeuralError::InvalidConfiguration(
                "min_delay_steps must be >= 1".to_string(),
            ));
        }
        if self.max_delay_steps < self.min_delay_steps {
            return Err(NeuralError::InvalidConfiguration(format!(
                "max_delay_steps ({}) must be >= min_delay_steps ({})",
                self.max_delay_steps, self.min_delay_steps
            )));
        }
        if !(self.history_window_ms.is_finite() && self.history_window_ms >= 0.0) {
            return Err(NeuralError::InvalidConfiguration(format!(
                "history_window_ms must be >= 0, got {}",
                self.history_window_ms
            )));
        }
        let s = &self.solver_settings;
        if !(s.rtol > 0.0 && s.atol > 0.0 && s.min_step > 0.0) || s.max_internal_steps == 0 {
            return Err(NeuralError::InvalidConfiguration(
                "solver tolerances, min_step and max_internal_steps must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = NodeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.buffer_capacity(), 210);
        assert_eq!(config.history_window_steps(), 1000);
    }

    #[test]
    fn test_rejects_bad_resolution_and_delays() {
        let mut config = NodeConfig {
            resolution_ms: 0.0,
            ..NodeConfig::default()
        };
        assert!(config.validate().is_err());
        config.resolution_ms = 0.1;
        config.max_delay_steps = 5;
        assert!(config.validate().is_err());
    }
}
