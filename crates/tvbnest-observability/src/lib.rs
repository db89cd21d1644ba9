// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tvbnest-observability
//!
//! Logging setup shared by the tvbnest crates and tools, with per-crate debug
//! flags.
//!
//! ## Features
//! - `file-logging`: JSON log files in timestamped run folders

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Crates that accept `--debug-<crate>` flags
pub const KNOWN_CRATES: &[&str] = &[
    "tvbnest",
    "tvbnest-neural",
    "tvbnest-modules",
    "tvbnest-config",
    "tvbnest-observability",
];
