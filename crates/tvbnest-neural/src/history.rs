// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! HistoryLog - step-aligned state snapshots for readout.
//!
//! Key semantics:
//! - Append-only: samples arrive in strictly increasing step order.
//! - Windowed: samples older than `window_steps` behind the newest are evicted.
//! - Read-only to consumers: only the owning node records.
//! - A window of 0 steps disables recording.

use std::collections::VecDeque;

use crate::types::Step;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
    #[error("non-monotonic step: latest={latest}, requested={requested}")]
    NonMonotonicStep { latest: Step, requested: Step },

    #[error("sample has {actual} values, layout has {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("insufficient history: need [{start}..{end}], but have [{have_start}..{have_end}]")]
    InsufficientHistory {
        start: Step,
        end: Step,
        have_start: Step,
        have_end: Step,
    },
}

/// One recorded state snapshot
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistorySample {
    pub step: Step,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    names: Vec<&'static str>,
    window_steps: u64,
    samples: VecDeque<HistorySample>, // oldest -> newest
}

impl HistoryLog {
    pub fn new(names: Vec<&'static str>, window_steps: u64) -> Self {
        Self {
            names,
            window_steps,
            samples: VecDeque::with_capacity(window_steps.min(4096) as usize),
        }
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn window_steps(&self) -> u64 {
        self.window_steps
    }

    pub fn is_enabled(&self) -> bool {
        self.window_steps > 0
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    pub fn samples(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    pub fn record(&mut self, step: Step, values: &[f64]) -> Result<(), HistoryError> {
        if !self.is_enabled() {
            return Ok(());
        }
        if values.len() != self.names.len() {
            return Err(HistoryError::WidthMismatch {
                expected: self.names.len(),
                actual: values.len(),
            });
        }
        if let Some(last) = self.samples.back() {
            if step <= last.step {
                return Err(HistoryError::NonMonotonicStep {
                    latest: last.step,
                    requested: step,
                });
            }
        }

        self.samples.push_back(HistorySample {
            step,
            values: values.to_vec(),
        });

        let oldest_kept = step.saturating_sub(self.window_steps - 1);
        while self.samples.front().is_some_and(|s| s.step < oldest_kept) {
            self.samples.pop_front();
        }
        Ok(())
    }

    /// Samples with `start <= step <= end`; the log must cover the whole range.
    pub fn range(&self, start: Step, end: Step) -> Result<Vec<&HistorySample>, HistoryError> {
        let (have_start, have_end) = match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => (first.step, last.step),
            _ => (0, 0),
        };
        if self.samples.is_empty() || start < have_start || end > have_end || start > end {
            return Err(HistoryError::InsufficientHistory {
                start,
                end,
                have_start,
                have_end,
            });
        }
        Ok(self
            .samples
            .iter()
            .filter(|s| s.step >= start && s.step <= end)
            .collect())
    }

    /// Trace of one variable over the retained window
    pub fn trace(&self, name: &str) -> Option<Vec<(Step, f64)>> {
        let index = self.names.iter().position(|n| *n == name)?;
        Some(self.samples.iter().map(|s| (s.step, s.values[index])).collect())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
