// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Extension modules: named units that register models at load time

use tracing::{error, info};
use tvbnest_neural::{IafCondNmdaDeco2014, TvbRateWongWang};

use crate::{ModelRegistry, Result};

pub trait ExtensionModule {
    /// Module name reported to load-time diagnostics
    fn name(&self) -> &'static str;

    /// Register every model the module provides
    fn init(&self, registry: &mut ModelRegistry) -> Result<()>;
}

/// Provides `iaf_cond_nmda_deco2014`
#[derive(Debug, Default, Clone, Copy)]
pub struct IafCondNmdaDeco2014Module;

impl ExtensionModule for IafCondNmdaDeco2014Module {
    fn name(&self) -> &'static str {
        "iaf_cond_nmda_deco2014module"
    }

    fn init(&self, registry: &mut ModelRegistry) -> Result<()> {
        registry.register_model::<IafCondNmdaDeco2014>()
    }
}

/// Provides `tvb_rate_wongwang`
#[derive(Debug, Default, Clone, Copy)]
pub struct TvbRateWongWangModule;

impl ExtensionModule for TvbRateWongWangModule {
    fn name(&self) -> &'static str {
        "tvb_rate_wongwangmodule"
    }

    fn init(&self, registry: &mut ModelRegistry) -> Result<()> {
        registry.register_model::<TvbRateWongWang>()
    }
}

/// Install one module, reporting the outcome to the log
pub fn install(registry: &mut ModelRegistry, module: &dyn ExtensionModule) -> Result<()> {
    match module.init(registry) {
        Ok(()) => {
            info!("✓ Module installed: {}", module.name());
            Ok(())
        }
        Err(err) => {
            error!("Failed to install module {}: {}", module.name(), err);
            Err(err)
        }
    }
}

/// Install every module shipped with this crate
pub fn install_builtin_modules(registry: &mut ModelRegistry) -> Result<()> {
    install(registry, &IafCondNmdaDeco2014Module)?;
    install(registry, &TvbRateWongWangModule)
}
