// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neuron model operations
//!
//! Configuration-time errors leave the node untouched. Run-time numerical
//! errors abort the `update` in progress and are never retried.

use super::ids::{NodeId, Step};
use crate::history::HistoryError;
use crate::integration::SolverKind;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: String,
    },

    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },

    #[error("unknown state variable '{name}'")]
    UnknownStateVariable { name: String },

    #[error("invalid value {value} for state variable '{name}': {reason}")]
    InvalidStateValue {
        name: String,
        value: f64,
        reason: String,
    },

    #[error("delay of {delay} steps out of range for buffer '{buffer}' (capacity {capacity})")]
    DelayOutOfRange {
        buffer: String,
        delay: usize,
        capacity: usize,
    },

    #[error("model '{model}' has no receptor port {receptor} (ports: {available})")]
    UnknownReceptor {
        model: &'static str,
        receptor: usize,
        available: usize,
    },

    #[error("invalid weight {weight} on '{channel}': {reason}")]
    InvalidEventWeight {
        channel: String,
        weight: f64,
        reason: String,
    },

    #[error("invalid update interval [{from}, {to}) (limit {limit})")]
    InvalidUpdateInterval { from: usize, to: usize, limit: usize },

    #[error("update from step {requested} rewinds a node already at step {next}; reset it first")]
    StepRewind { requested: Step, next: Step },

    #[error("numerical instability in {node} at step {step}: '{variable}' = {value} ({cause})")]
    NumericalInstability {
        node: NodeId,
        step: Step,
        variable: String,
        value: f64,
        cause: String,
    },

    #[error("model '{model}' does not support the {solver} solver")]
    UnsupportedSolver {
        model: &'static str,
        solver: SolverKind,
    },

    #[error("invalid node configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    History(#[from] HistoryError),
}

pub type Result<T> = core::result::Result<T, NeuralError>;

impl NeuralError {
    /// Run-time errors that abort an update (as opposed to configuration errors)
    pub fn is_fatal(&self) -> bool {
        matches!(self, NeuralError::NumericalInstability { .. })
    }
}
