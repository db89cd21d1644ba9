// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! `tvbnest.toml` through to a running simulator.

use std::collections::HashMap;
use std::fs;

use tempfile::tempdir;
use tvbnest::config::{load_config, ConfigError};
use tvbnest::prelude::*;

#[test]
fn file_settings_reach_the_nodes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tvbnest.toml");
    fs::write(
        &path,
        "[kernel]\nresolution_ms = 0.05\nthreads = 2\n\
         [buffers]\nmin_delay_steps = 5\nmax_delay_steps = 20\n\
         [history]\nwindow_ms = 1.0\n",
    )
    .unwrap();

    let mut cli = HashMap::new();
    cli.insert("solver".to_string(), "rk4".to_string());
    let config = load_config(Some(&path), Some(&cli)).unwrap();

    let mut sim = Simulator::new(&config).unwrap();
    assert_eq!(sim.node_config().min_delay_steps, 5);
    assert_eq!(sim.node_config().solver, Some(SolverKind::Rk4));

    let id = sim.create("iaf_cond_nmda_deco2014", 1).unwrap()[0];
    assert!(matches!(
        sim.deliver_current(id, &CurrentEvent::new(1.0, 25)),
        Err(SimulationError::Neural {
            source: NeuralError::DelayOutOfRange { .. },
            ..
        })
    ));

    sim.simulate(100).unwrap();
    assert!((sim.time_ms() - 5.0).abs() < 1e-12);
    // 1 ms window at 0.05 ms resolution
    assert_eq!(sim.node(id).unwrap().history().len(), 20);
}

#[test]
fn invalid_file_is_reported_before_any_node_exists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tvbnest.toml");
    fs::write(
        &path,
        "[buffers]\nmin_delay_steps = 50\nmax_delay_steps = 10\n[integrator]\nsolver = \"euler\"\n",
    )
    .unwrap();

    let config = load_config(Some(&path), None).unwrap();
    match Simulator::new(&config) {
        Err(SimulationError::Config(ConfigError::ValidationError(msg))) => {
            assert!(msg.contains("max_delay_steps"));
            assert!(msg.contains("integrator.solver"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
