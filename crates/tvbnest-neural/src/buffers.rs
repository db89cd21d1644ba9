// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ring Buffers
//!
//! Each input channel of a node owns one fixed-capacity circular buffer. Slot
//! `(head + delay) mod capacity` sums every event addressed `delay` steps ahead
//! of the read position. The integrator drains exactly one slot per channel per
//! step, in increasing time order.
//!
//! ```text
//!   head
//!    v
//!  [ w0 | w1 | w2 | ... | w(cap-1) ]
//!    ^ drained this step, then zeroed
//! ```

use crate::types::{NeuralError, Result};

/// Upper bound on spike receptor ports per model
pub const MAX_RECEPTORS: usize = 4;

/// Label of the current-injection channel every node carries
pub const CURRENT_CHANNEL: &str = "CURRENT";

#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer {
    label: &'static str,
    slots: Vec<f64>,
    head: usize,
}

impl RingBuffer {
    /// Allocate once; capacity never changes afterwards
    pub fn new(label: &'static str, capacity: usize) -> Self {
        Self {
            label,
            slots: vec![0.0; capacity.max(1)],
            head: 0,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn slot(&self, delay: usize) -> usize {
        (self.head + delay) % self.slots.len()
    }

    /// Accumulate `weight` into the slot `delay` steps ahead of the read head
    pub fn add(&mut self, delay: usize, weight: f64) -> Result<()> {
        if delay >= self.slots.len() {
            return Err(NeuralError::DelayOutOfRange {
                buffer: self.label.to_string(),
                delay,
                capacity: self.slots.len(),
            });
        }
        let index = self.slot(delay);
        self.slots[index] += weight;
        Ok(())
    }

    /// Value currently accumulated `delay` steps ahead (0.0 when out of range)
    pub fn peek(&self, delay: usize) -> f64 {
        if delay >= self.slots.len() {
            return 0.0;
        }
        self.slots[self.slot(delay)]
    }

    /// Read and zero the head slot, then advance the head by one
    #[inline]
    pub fn drain(&mut self) -> f64 {
        let value = core::mem::take(&mut self.slots[self.head]);
        self.head = (self.head + 1) % self.slots.len();
        value
    }

    pub fn clear(&mut self) {
        self.slots.fill(0.0);
        self.head = 0;
    }
}

/// Per-step input drained from all channels of a node
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Drive {
    /// Summed spike weight per receptor port (unused ports stay 0)
    pub receptors: [f64; MAX_RECEPTORS],
    /// Injected current for this step (pA)
    pub current: f64,
}

/// All input channels of one node: one buffer per receptor plus the current channel
#[derive(Debug, Clone, PartialEq)]
pub struct InputBuffers {
    receptors: Vec<RingBuffer>,
    current: RingBuffer,
}

impl InputBuffers {
    pub fn new(receptor_labels: &'static [&'static str], capacity: usize) -> Self {
        debug_assert!(receptor_labels.len() <= MAX_RECEPTORS);
        Self {
            receptors: receptor_labels
                .iter()
                .take(MAX_RECEPTORS)
                .map(|&label| RingBuffer::new(label, capacity))
                .collect(),
            current: RingBuffer::new(CURRENT_CHANNEL, capacity),
        }
    }

    pub fn receptor_count(&self) -> usize {
        self.receptors.len()
    }

    pub fn capacity(&self) -> usize {
        self.current.capacity()
    }

    pub fn receptor(&self, port: usize) -> Option<&RingBuffer> {
        self.receptors.get(port)
    }

    /// Caller validates `port` against the model's receptor table
    pub fn add_spike(&mut self, port: usize, delay: usize, weight: f64) -> Result<()> {
        match self.receptors.get_mut(port) {
            Some(buffer) => buffer.add(delay, weight),
            None => Err(NeuralError::InvalidConfiguration(format!(
                "receptor buffer {port} not allocated"
            ))),
        }
    }

    pub fn add_current(&mut self, delay: usize, value: f64) -> Result<()> {
        self.current.add(delay, value)
    }

    /// Drain one slot of every channel
    pub fn drain(&mut self) -> Drive {
        let mut drive = Drive {
            current: self.current.drain(),
            ..Drive::default()
        };
        for (slot, buffer) in drive.receptors.iter_mut().zip(self.receptors.iter_mut()) {
            *slot = buffer.drain();
        }
        drive
    }

    pub fn clear(&mut self) {
        self.receptors.iter_mut().for_each(RingBuffer::clear);
        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_accumulates_into_same_slot() {
        let mut buffer = RingBuffer::new("AMPA", 8);
        buffer.add(3, 1.5).unwrap();
        buffer.add(3, 2.0).unwrap();
        for _ in 0..3 {
            assert_eq!(buffer.drain(), 0.0);
        }
        assert_eq!(buffer.drain(), 3.5);
        assert_eq!(buffer.drain(), 0.0);
    }

    #[test]
    fn test_drain_zeroes_and_wraps() {
        let mut buffer = RingBuffer::new("NMDA", 3);
        buffer.add(0, 1.0).unwrap();
        assert_eq!(buffer.drain(), 1.0);
        // head is now at 1; delay 2 wraps to slot 0
        buffer.add(2, 4.0).unwrap();
        assert_eq!(buffer.drain(), 0.0);
        assert_eq!(buffer.drain(), 0.0);
        assert_eq!(buffer.drain(), 4.0);
        assert_eq!(buffer.drain(), 0.0);
    }

    #[test]
    fn test_delay_out_of_range() {
        let mut buffer = RingBuffer::new("GABA_A", 4);
        let err = buffer.add(4, 1.0).unwrap_err();
        assert_eq!(
            err,
            NeuralError::DelayOutOfRange {
                buffer: "GABA_A".to_string(),
                delay: 4,
                capacity: 4,
            }
        );
        assert_eq!(buffer.peek(0), 0.0);
    }

    #[test]
    fn test_input_buffers_drain_all_channels() {
        static LABELS: [&str; 2] = ["A", "B"];
        let mut inputs = InputBuffers::new(&LABELS, 5);
        inputs.add_spike(1, 1, 0.25).unwrap();
        inputs.add_current(1, 100.0).unwrap();
        assert_eq!(inputs.drain(), Drive::default());
        let drive = inputs.drain();
        assert_eq!(drive.receptors, [0.0, 0.25, 0.0, 0.0]);
        assert_eq!(drive.current, 100.0);
        assert!(inputs.add_spike(2, 0, 1.0).is_err());
    }
}
