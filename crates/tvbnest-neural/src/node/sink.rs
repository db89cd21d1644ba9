// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host-side receiver for spikes emitted during `update`

use crate::types::OutgoingSpike;

pub trait SpikeSink {
    fn emit(&mut self, spike: OutgoingSpike);
}

impl SpikeSink for Vec<OutgoingSpike> {
    fn emit(&mut self, spike: OutgoingSpike) {
        self.push(spike);
    }
}

/// Sink that only counts, for hosts that route spikes elsewhere
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpikeCounter(pub u64);

impl SpikeSink for SpikeCounter {
    fn emit(&mut self, _spike: OutgoingSpike) {
        self.0 += 1;
    }
}
