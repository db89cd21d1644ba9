// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem before failing so a broken file is fixed in one pass.

use crate::{ConfigError, ConfigResult, TvbnestConfig};

const SOLVER_NAMES: [&str; 3] = ["rk4", "dopri5", "exponential_euler"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    InvalidValue { field: String, reason: String },
    DelayOrder { min: u64, max: u64 },
    UnknownChoice { field: String, value: String, allowed: &'static [&'static str] },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::DelayOrder { min, max } => write!(
                f,
                "buffers.max_delay_steps ({}) must be >= buffers.min_delay_steps ({})",
                max, min
            ),
            Self::UnknownChoice {
                field,
                value,
                allowed,
            } => write!(
                f,
                "{} = '{}' is not one of: {}",
                field,
                value,
                allowed.join(", ")
            ),
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &TvbnestConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_kernel(config, &mut errors);
    validate_buffers(config, &mut errors);
    validate_integrator(config, &mut errors);
    validate_history_and_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn validate_kernel(config: &TvbnestConfig, errors: &mut Vec<ConfigValidationError>) {
    if !positive_finite(config.kernel.resolution_ms) {
        errors.push(invalid("kernel.resolution_ms", "must be positive and finite"));
    }
}

fn validate_buffers(config: &TvbnestConfig, errors: &mut Vec<ConfigValidationError>) {
    let buffers = &config.buffers;
    if buffers.min_delay_steps == 0 {
        errors.push(invalid("buffers.min_delay_steps", "must be at least 1"));
    }
    if buffers.max_delay_steps < buffers.min_delay_steps {
        errors.push(ConfigValidationError::DelayOrder {
            min: buffers.min_delay_steps,
            max: buffers.max_delay_steps,
        });
    }
}

fn validate_integrator(config: &TvbnestConfig, errors: &mut Vec<ConfigValidationError>) {
    let integrator = &config.integrator;
    if let Some(solver) = &integrator.solver {
        let known = SOLVER_NAMES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(solver.trim()));
        if !known {
            errors.push(ConfigValidationError::UnknownChoice {
                field: "integrator.solver".to_string(),
                value: solver.clone(),
                allowed: &SOLVER_NAMES,
            });
        }
    }
    if integrator.rk4_substeps == 0 {
        errors.push(invalid("integrator.rk4_substeps", "must be at least 1"));
    }
    if !positive_finite(integrator.rtol) {
        errors.push(invalid("integrator.rtol", "must be positive"));
    }
    if !positive_finite(integrator.atol) {
        errors.push(invalid("integrator.atol", "must be positive"));
    }
    if !positive_finite(integrator.min_step_ms) {
        errors.push(invalid("integrator.min_step_ms", "must be positive"));
    }
    if integrator.max_internal_steps == 0 {
        errors.push(invalid("integrator.max_internal_steps", "must be at least 1"));
    }
}

fn validate_history_and_logging(config: &TvbnestConfig, errors: &mut Vec<ConfigValidationError>) {
    let window = config.history.window_ms;
    if !(window.is_finite() && window >= 0.0) {
        errors.push(invalid("history.window_ms", "must be >= 0 and finite"));
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::UnknownChoice {
            field: "logging.level".to_string(),
            value: config.logging.level.clone(),
            allowed: &LOG_LEVELS,
        });
    }
    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        errors.push(ConfigValidationError::UnknownChoice {
            field: "logging.format".to_string(),
            value: config.logging.format.clone(),
            allowed: &LOG_FORMATS,
        });
    }
}
