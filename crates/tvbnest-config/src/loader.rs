// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, TvbnestConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAME: &str = "tvbnest.toml";

/// Find `tvbnest.toml`
///
/// Search order:
/// 1. `TVBNEST_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("TVBNEST_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by TVBNEST_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet TVBNEST_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// `config_path` of `None` searches with [`find_config_file`]. Validation is
/// left to [`crate::validate_config`].
///
/// # Errors
///
/// Returns error if the file is missing, unreadable, or not valid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<TvbnestConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: TvbnestConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_into<T: FromStr>(value: &str, target: &mut T) {
    if let Ok(parsed) = value.trim().parse::<T>() {
        *target = parsed;
    }
}

/// Apply environment variable overrides
///
/// Values that fail to parse are ignored.
/// - `TVBNEST_RESOLUTION_MS` -> `kernel.resolution_ms`
/// - `TVBNEST_THREADS` -> `kernel.threads`
/// - `TVBNEST_MIN_DELAY_STEPS` -> `buffers.min_delay_steps`
/// - `TVBNEST_MAX_DELAY_STEPS` -> `buffers.max_delay_steps`
/// - `TVBNEST_SOLVER` -> `integrator.solver`
/// - `TVBNEST_HISTORY_WINDOW_MS` -> `history.window_ms`
/// - `TVBNEST_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut TvbnestConfig) {
    if let Ok(value) = env::var("TVBNEST_RESOLUTION_MS") {
        parse_into(&value, &mut config.kernel.resolution_ms);
    }
    if let Ok(value) = env::var("TVBNEST_THREADS") {
        parse_into(&value, &mut config.kernel.threads);
    }
    if let Ok(value) = env::var("TVBNEST_MIN_DELAY_STEPS") {
        parse_into(&value, &mut config.buffers.min_delay_steps);
    }
    if let Ok(value) = env::var("TVBNEST_MAX_DELAY_STEPS") {
        parse_into(&value, &mut config.buffers.max_delay_steps);
    }
    if let Ok(value) = env::var("TVBNEST_SOLVER") {
        config.integrator.solver = Some(value);
    }
    if let Ok(value) = env::var("TVBNEST_HISTORY_WINDOW_MS") {
        parse_into(&value, &mut config.history.window_ms);
    }
    if let Ok(value) = env::var("TVBNEST_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides
///
/// Keys: `resolution_ms`, `threads`, `min_delay_steps`, `max_delay_steps`,
/// `solver`, `rk4_substeps`, `history_window_ms`, `log_level`, `log_format`.
pub fn apply_cli_overrides(config: &mut TvbnestConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("resolution_ms") {
        parse_into(value, &mut config.kernel.resolution_ms);
    }
    if let Some(value) = cli_args.get("threads") {
        parse_into(value, &mut config.kernel.threads);
    }
    if let Some(value) = cli_args.get("min_delay_steps") {
        parse_into(value, &mut config.buffers.min_delay_steps);
    }
    if let Some(value) = cli_args.get("max_delay_steps") {
        parse_into(value, &mut config.buffers.max_delay_steps);
    }
    if let Some(value) = cli_args.get("solver") {
        config.integrator.solver = Some(value.clone());
    }
    if let Some(value) = cli_args.get("rk4_substeps") {
        parse_into(value, &mut config.integrator.rk4_substeps);
    }
    if let Some(value) = cli_args.get("history_window_ms") {
        parse_into(value, &mut config.history.window_ms);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.logging.format = value.clone();
    }
}
