// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tvbnest Extension Modules
//!
//! Name-keyed registry of node factories and the extension modules that
//! populate it at load time. There is no global registry: the composition
//! root owns a [`ModelRegistry`] and installs modules into it.
//!
//! ```rust
//! use tvbnest_modules::{install_builtin_modules, ModelRegistry};
//! use tvbnest_neural::{NodeConfig, NodeId};
//!
//! let mut registry = ModelRegistry::new();
//! install_builtin_modules(&mut registry).unwrap();
//! let node = registry
//!     .create("iaf_cond_nmda_deco2014", NodeId(1), &NodeConfig::default())
//!     .unwrap();
//! assert_eq!(node.model_name(), "iaf_cond_nmda_deco2014");
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod module;
pub mod registry;

pub use module::{
    install, install_builtin_modules, ExtensionModule, IafCondNmdaDeco2014Module,
    TvbRateWongWangModule,
};
pub use registry::{ModelRegistry, NodeFactory};

/// Registry error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("model name '{0}' is already registered")]
    DuplicateModelName(String),

    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error(transparent)]
    Neural(#[from] tvbnest_neural::NeuralError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
