// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tvbnest
//!
//! Custom neuron models for an event-driven spiking simulator: a
//! conductance-based AdEx neuron with AMPA/NMDA/GABA synapses and a reduced
//! Wong-Wang rate model, integrated between events with RK4, Dormand-Prince
//! 5(4) or exponential Euler.
//!
//! ## Crates
//! - [`neural`]: models, ring buffers, integrators, the `Node` interface
//! - [`modules`]: model registry and extension modules
//! - [`config`]: `tvbnest.toml` loading with environment and CLI overrides
//! - [`observability`]: logging setup
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tvbnest::prelude::*;
//!
//! let mut sim = Simulator::new(&TvbnestConfig::default())?;
//! let ids = sim.create("iaf_cond_nmda_deco2014", 10)?;
//! sim.deliver_current(ids[0], &CurrentEvent::new(2.0e5, 1))?;
//! let spikes = sim.simulate(1000)?;
//! println!("{} spikes", spikes.len());
//! # Ok::<(), tvbnest::SimulationError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod logging;
pub mod simulator;

pub use tvbnest_config as config;
pub use tvbnest_modules as modules;
pub use tvbnest_neural as neural;
pub use tvbnest_observability as observability;

pub use simulator::{node_config_from, SimulationError, Simulator};

pub mod prelude {
    pub use crate::simulator::{SimulationError, Simulator};
    pub use tvbnest_config::TvbnestConfig;
    pub use tvbnest_modules::{ExtensionModule, ModelRegistry};
    pub use tvbnest_neural::{
        CurrentEvent, Dictionary, IafCondNmdaDeco2014, NeuralError, Node, NodeConfig, NodeId,
        OutgoingSpike, SolverKind, SpikeEvent, Step, TvbRateWongWang,
    };
}
