// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron Model Architecture
//!
//! Trait-based models, each a pure description of its dynamics:
//!
//! - `iaf_cond_nmda_deco2014`: conductance-based AdEx with AMPA/NMDA/GABA_A
//! - `tvb_rate_wongwang`: reduced Wong-Wang rate model
//!
//! ## Adding a New Neuron Model
//!
//! 1. Create `src/models/your_model.rs`
//! 2. Declare parameters with `model_parameters!` and implement `ModelParameters`
//! 3. Implement `NeuronModel`
//! 4. Register it from an extension module

pub mod deco2014;
pub mod traits;
pub mod wong_wang;

pub use deco2014::{Deco2014Parameters, IafCondNmdaDeco2014};
pub use traits::{ModelSystem, NeuronModel, StepInput};
pub use wong_wang::{TvbRateWongWang, WongWangParameters};
