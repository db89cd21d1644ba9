// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Events exchanged between the host kernel and node instances

use super::ids::{NodeId, Step};

/// Weighted spike addressed to one receptor port of a node.
///
/// `delay` counts steps ahead of the node's current read position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeEvent {
    pub sender: NodeId,
    pub receptor: usize,
    pub weight: f64,
    pub delay: usize,
}

impl SpikeEvent {
    /// Spike on receptor port 0
    pub fn new(sender: NodeId, weight: f64, delay: usize) -> Self {
        Self {
            sender,
            receptor: 0,
            weight,
            delay,
        }
    }

    pub fn on_receptor(mut self, receptor: usize) -> Self {
        self.receptor = receptor;
        self
    }
}

/// Injected current (pA), applied for the single step it is delivered to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentEvent {
    pub value: f64,
    pub delay: usize,
}

impl CurrentEvent {
    pub fn new(value: f64, delay: usize) -> Self {
        Self { value, delay }
    }
}

/// Spike emitted by a node during `update`, handed straight to the host sink
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutgoingSpike {
    pub origin: NodeId,
    pub step: Step,
    pub time_ms: f64,
    pub weight: f64,
}
