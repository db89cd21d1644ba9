// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bridge from the `[logging]` config section to the subscriber setup

use anyhow::{Context, Result};
use tvbnest_config::TvbnestConfig;
use tvbnest_observability::{init_logging, CrateDebugFlags, LogFormat, LoggingConfig, LoggingGuard};

pub fn logging_config_from(config: &TvbnestConfig) -> Result<LoggingConfig> {
    let logging = &config.logging;
    let format: LogFormat = logging
        .format
        .parse()
        .context("Invalid [logging] format")?;
    Ok(LoggingConfig {
        level: logging.level.clone(),
        format,
        directory: logging.directory.clone(),
        retention_days: logging.retention_days,
        retention_runs: logging.retention_runs,
    })
}

/// Install the global subscriber described by `config`
pub fn init_from_config(config: &TvbnestConfig, flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(flags, &logging_config_from(config)?)
}
