// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Core Types
//!
//! Identities, events and the error taxonomy shared by every model.

pub mod error;
pub mod events;
pub mod ids;

pub use error::{NeuralError, Result};
pub use events::{CurrentEvent, OutgoingSpike, SpikeEvent};
pub use ids::{NodeId, Step};
