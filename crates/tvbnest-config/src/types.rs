// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one section of `tvbnest.toml`. Every section and every
//! field is optional in the file; missing values take the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TvbnestConfig {
    pub kernel: KernelConfig,
    pub buffers: BufferConfig,
    pub integrator: IntegratorConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

/// Simulation kernel settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Grid resolution h in ms
    pub resolution_ms: f64,
    /// Worker threads for node updates (0 = rayon default)
    pub threads: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            resolution_ms: 0.1,
            threads: 0,
        }
    }
}

/// Delay bounds that size each node's ring buffers
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BufferConfig {
    pub min_delay_steps: u64,
    pub max_delay_steps: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            min_delay_steps: 10,
            max_delay_steps: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Solver name (`rk4`, `dopri5`, `exponential_euler`); unset uses each
    /// model's default
    pub solver: Option<String>,
    pub rk4_substeps: u32,
    pub rtol: f64,
    pub atol: f64,
    pub min_step_ms: f64,
    pub max_internal_steps: u32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            solver: None,
            rk4_substeps: 1,
            rtol: 1e-6,
            atol: 1e-6,
            min_step_ms: 1e-8,
            max_internal_steps: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Trailing window of recorded state, 0 disables recording
    pub window_ms: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { window_ms: 100.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    pub level: String,
    /// `text` or `json`
    pub format: String,
    /// Base directory for per-run log folders (file logging only)
    pub directory: Option<PathBuf>,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            directory: None,
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config: TvbnestConfig = toml::from_str("").unwrap();
        assert_eq!(config, TvbnestConfig::default());
        assert_eq!(config.kernel.resolution_ms, 0.1);
        assert_eq!(config.buffers.min_delay_steps, 10);
        assert_eq!(config.buffers.max_delay_steps, 200);
        assert!(config.integrator.solver.is_none());
    }

    #[test]
    fn test_partial_section() {
        let config: TvbnestConfig = toml::from_str(
            "[integrator]\nsolver = \"rk4\"\nrk4_substeps = 4\n[history]\nwindow_ms = 0.0\n",
        )
        .unwrap();
        assert_eq!(config.integrator.solver.as_deref(), Some("rk4"));
        assert_eq!(config.integrator.rk4_substeps, 4);
        assert_eq!(config.integrator.rtol, 1e-6);
        assert_eq!(config.history.window_ms, 0.0);
    }

    #[test]
    fn test_json_roundtrip_keeps_sections() {
        let config = TvbnestConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["kernel"]["threads"], 0);
        assert_eq!(json["logging"]["format"], "text");
    }
}
