// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # tvbnest Neural Computation
//!
//! Per-node continuous-time dynamics for custom neuron models:
//! - **Types**: node ids, events, error taxonomy
//! - **Params / State**: validated parameter sets and bounded state vectors
//! - **Buffers**: fixed-capacity ring buffers accumulating delayed input
//! - **Integration**: RK4, Dormand-Prince 5(4) and exponential Euler solvers
//! - **Models**: `iaf_cond_nmda_deco2014`, `tvb_rate_wongwang`
//! - **Node**: the `Node` capability set and its generic `Neuron<M>` implementation
//!
//! Instances share no mutable data. The host guarantees that `update` and the
//! event handlers are never called concurrently on the same instance.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod buffers;
pub mod history;
pub mod integration;
pub mod models;
pub mod node;
pub mod params;
pub mod state;
pub mod types;

pub use buffers::{Drive, InputBuffers, RingBuffer, MAX_RECEPTORS};
pub use history::{HistoryError, HistoryLog, HistorySample};
pub use integration::{IntegrationStats, Integrator, OdeSystem, SolverKind, SolverSettings};
pub use models::{
    Deco2014Parameters, IafCondNmdaDeco2014, NeuronModel, TvbRateWongWang, WongWangParameters,
};
pub use node::{IntegratorPhase, Neuron, Node, NodeConfig, SpikeCounter, SpikeSink};
pub use params::{Dictionary, Domain, ModelParameters, ParameterSet, ParameterSpec};
pub use state::{StateVariable, StateVector};
pub use types::{CurrentEvent, NeuralError, NodeId, OutgoingSpike, Result, SpikeEvent, Step};
