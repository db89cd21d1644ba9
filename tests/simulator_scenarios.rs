// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end runs through the `Simulator` harness.

use tvbnest::config::TvbnestConfig;
use tvbnest::neural::models::deco2014;
use tvbnest::prelude::*;

fn dict(entries: &[(&str, f64)]) -> Dictionary {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn simulator() -> Simulator {
    Simulator::new(&TvbnestConfig::default()).unwrap()
}

#[test]
fn pulse_fires_only_driven_nodes() {
    let mut sim = simulator();
    let ids = sim.create("iaf_cond_nmda_deco2014", 3).unwrap();
    sim.deliver_current(ids[0], &CurrentEvent::new(2.0e5, 3)).unwrap();
    sim.deliver_current(ids[2], &CurrentEvent::new(2.0e5, 3)).unwrap();

    let spikes = sim.simulate(100).unwrap();
    let origins: Vec<NodeId> = spikes.iter().map(|s| s.origin).collect();
    assert_eq!(origins, vec![NodeId(1), NodeId(3)]);
    assert!(spikes.iter().all(|s| s.step == 4 && s.weight == 1.0));
    assert_eq!(sim.node(ids[1]).unwrap().get_state()["V_m"], -70.0);
}

#[test]
fn spikes_are_ordered_by_step_then_node() {
    let mut sim = simulator();
    let ids = sim.create("iaf_cond_nmda_deco2014", 4).unwrap();
    // node 4 earliest, nodes 1 and 2 tie later, node 3 crosses a slice boundary
    sim.deliver_current(ids[3], &CurrentEvent::new(2.0e5, 2)).unwrap();
    sim.deliver_current(ids[1], &CurrentEvent::new(2.0e5, 6)).unwrap();
    sim.deliver_current(ids[0], &CurrentEvent::new(2.0e5, 6)).unwrap();
    sim.deliver_current(ids[2], &CurrentEvent::new(2.0e5, 14)).unwrap();

    let spikes = sim.simulate(30).unwrap();
    let order: Vec<(u64, u64)> = spikes.iter().map(|s| (s.step, s.origin.0)).collect();
    assert_eq!(order, vec![(3, 4), (7, 1), (7, 2), (15, 3)]);
}

#[test]
fn events_queued_between_runs_land_relative_to_clock() {
    let mut sim = simulator();
    let id = sim.create("iaf_cond_nmda_deco2014", 1).unwrap()[0];
    assert!(sim.simulate(40).unwrap().is_empty());

    sim.deliver_current(id, &CurrentEvent::new(2.0e5, 5)).unwrap();
    let spikes = sim.simulate(20).unwrap();
    assert_eq!(spikes.len(), 1);
    assert_eq!(spikes[0].step, 46);
    assert!((spikes[0].time_ms - 4.6).abs() < 1e-9);
}

#[test]
fn copied_model_runs_with_its_own_defaults() {
    let mut sim = simulator();
    sim.registry_mut()
        .copy_model(
            "iaf_cond_nmda_deco2014",
            "deco2014_fast",
            &dict(&[("t_ref", 1.0), ("I_e", 1500.0)]),
        )
        .unwrap();
    let base = sim.create("iaf_cond_nmda_deco2014", 1).unwrap()[0];
    let fast = sim.create("deco2014_fast", 1).unwrap()[0];
    assert_eq!(sim.node(fast).unwrap().model_name(), "iaf_cond_nmda_deco2014");

    let spikes = sim.simulate(1000).unwrap();
    assert!(spikes.iter().all(|s| s.origin == fast));
    assert!(spikes.len() > 3);
    assert_eq!(sim.node(base).unwrap().get_parameters()["t_ref"], 2.0);
}

#[test]
fn rate_population_stays_bounded() {
    let mut sim = simulator();
    let ids = sim.create("tvb_rate_wongwang", 5).unwrap();
    for (i, &id) in ids.iter().enumerate() {
        sim.set_parameters(id, &dict(&[("I_e", 0.1 * i as f64)])).unwrap();
        sim.deliver_spike(id, &SpikeEvent::new(NodeId(99), 2.0, 1)).unwrap();
    }

    let spikes = sim.simulate(2000).unwrap();
    assert!(spikes.is_empty());
    let mut previous = 0.0;
    for &id in &ids {
        let state = sim.node(id).unwrap().get_state();
        assert!(state["S"] > 0.0 && state["S"] < 1.0);
        // stronger background drive gives a higher steady gating
        assert!(state["S"] > previous);
        previous = state["S"];
    }
}

#[test]
fn instability_names_failing_node() {
    let mut sim = simulator();
    let ids = sim.create("iaf_cond_nmda_deco2014", 3).unwrap();
    sim.set_parameters(ids[1], &dict(&[("g_AMPA_ext", 1e300)])).unwrap();
    sim.deliver_spike(ids[1], &SpikeEvent::new(NodeId(9), 1e300, 1).on_receptor(deco2014::AMPA_EXT))
        .unwrap();

    match sim.simulate(20) {
        Err(SimulationError::Aborted {
            node,
            step: 0,
            source: NeuralError::NumericalInstability { step, .. },
            emitted,
        }) => {
            assert_eq!(node, ids[1]);
            assert_eq!(step, 1);
            assert!(emitted.is_empty());
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(sim.current_step(), 0);
}

#[test]
fn failed_run_keeps_earlier_spikes_and_halts_until_reset() {
    let mut sim = simulator();
    let ids = sim.create("iaf_cond_nmda_deco2014", 3).unwrap();
    sim.deliver_current(ids[0], &CurrentEvent::new(2.0e5, 3)).unwrap();
    // node 3 fires inside the slice where node 2 diverges
    sim.deliver_current(ids[2], &CurrentEvent::new(2.0e5, 32)).unwrap();
    sim.set_parameters(ids[1], &dict(&[("g_AMPA_ext", 1e300)])).unwrap();
    sim.deliver_spike(ids[1], &SpikeEvent::new(NodeId(9), 1e300, 35).on_receptor(deco2014::AMPA_EXT))
        .unwrap();

    match sim.simulate(100) {
        Err(SimulationError::Aborted {
            node,
            step,
            emitted,
            ..
        }) => {
            assert_eq!(node, ids[1]);
            assert_eq!(step, 30);
            let fired: Vec<(Step, NodeId)> = emitted.iter().map(|s| (s.step, s.origin)).collect();
            assert_eq!(fired, vec![(4, ids[0]), (33, ids[2])]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(sim.current_step(), 30);
    assert!(sim.is_halted());
    assert!(matches!(sim.simulate(10), Err(SimulationError::Halted(30))));

    sim.reset();
    sim.set_parameters(ids[1], &dict(&[("g_AMPA_ext", 0.0)])).unwrap();
    assert!(sim.simulate(50).unwrap().is_empty());
    assert_eq!(sim.current_step(), 50);
}

#[test]
fn invalid_events_are_rejected_per_node() {
    let mut sim = simulator();
    let deco = sim.create("iaf_cond_nmda_deco2014", 1).unwrap()[0];
    let rate = sim.create("tvb_rate_wongwang", 1).unwrap()[0];

    assert!(matches!(
        sim.deliver_spike(deco, &SpikeEvent::new(NodeId(1), -1.0, 1)),
        Err(SimulationError::Neural {
            source: NeuralError::InvalidEventWeight { .. },
            ..
        })
    ));
    assert!(matches!(
        sim.deliver_spike(rate, &SpikeEvent::new(NodeId(1), 1.0, 1).on_receptor(2)),
        Err(SimulationError::Neural {
            source: NeuralError::UnknownReceptor { .. },
            ..
        })
    ));
    assert!(matches!(
        sim.deliver_current(deco, &CurrentEvent::new(1.0, 210)),
        Err(SimulationError::Neural {
            source: NeuralError::DelayOutOfRange { .. },
            ..
        })
    ));
    assert!(matches!(
        sim.deliver_current(NodeId(3), &CurrentEvent::new(1.0, 1)),
        Err(SimulationError::UnknownNode(NodeId(3)))
    ));
}
