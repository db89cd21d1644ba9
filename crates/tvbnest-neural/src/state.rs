// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! State vectors: ordered dynamical variables with per-variable bounds.

use crate::params::Dictionary;
use crate::types::{NeuralError, Result};

/// Layout entry for one state variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVariable {
    pub name: &'static str,
    pub unit: &'static str,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl StateVariable {
    pub const fn unbounded(name: &'static str, unit: &'static str) -> Self {
        Self {
            name,
            unit,
            lower: None,
            upper: None,
        }
    }

    pub const fn non_negative(name: &'static str, unit: &'static str) -> Self {
        Self {
            name,
            unit,
            lower: Some(0.0),
            upper: None,
        }
    }

    /// Open fraction in [0, 1]
    pub const fn fraction(name: &'static str) -> Self {
        Self {
            name,
            unit: "",
            lower: Some(0.0),
            upper: Some(1.0),
        }
    }

    pub fn check(&self, value: f64) -> core::result::Result<(), &'static str> {
        if !value.is_finite() {
            return Err("non-finite value");
        }
        if self.lower.is_some_and(|lo| value < lo) {
            return Err("below lower bound");
        }
        if self.upper.is_some_and(|hi| value > hi) {
            return Err("above upper bound");
        }
        Ok(())
    }
}

/// A state entry that failed its bounds check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    pub index: usize,
    pub value: f64,
    pub reason: &'static str,
}

/// First variable of `values` violating `layout`, if any
pub fn find_violation(layout: &[StateVariable], values: &[f64]) -> Option<Violation> {
    layout
        .iter()
        .zip(values)
        .enumerate()
        .find_map(|(index, (var, &value))| {
            var.check(value).err().map(|reason| Violation {
                index,
                value,
                reason,
            })
        })
}

/// Dynamical state of one node
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    layout: &'static [StateVariable],
    values: Vec<f64>,
}

impl StateVector {
    pub fn new(layout: &'static [StateVariable], values: Vec<f64>) -> Self {
        debug_assert_eq!(layout.len(), values.len());
        Self { layout, values }
    }

    pub fn layout(&self) -> &'static [StateVariable] {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.layout.iter().position(|var| var.name == name)
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        self.index_of(name)
            .map(|i| self.values[i])
            .ok_or_else(|| NeuralError::UnknownStateVariable {
                name: name.to_string(),
            })
    }

    /// Replace every value; callers check bounds beforehand
    pub fn commit(&mut self, values: &[f64]) {
        self.values.copy_from_slice(values);
    }

    /// Apply `updates` atomically, rejecting unknown names and out-of-range values
    pub fn set(&mut self, updates: &Dictionary) -> Result<()> {
        let mut candidate = self.values.clone();
        for (name, value) in updates {
            let index = self
                .index_of(name)
                .ok_or_else(|| NeuralError::UnknownStateVariable { name: name.clone() })?;
            self.layout[index]
                .check(*value)
                .map_err(|reason| NeuralError::InvalidStateValue {
                    name: name.clone(),
                    value: *value,
                    reason: reason.to_string(),
                })?;
            candidate[index] = *value;
        }
        self.values = candidate;
        Ok(())
    }

    pub fn to_dictionary(&self) -> Dictionary {
        self.layout
            .iter()
            .zip(&self.values)
            .map(|(var, &value)| (var.name.to_string(), value))
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layout.iter().map(|var| var.name).collect()
    }
}
