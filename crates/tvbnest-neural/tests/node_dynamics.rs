// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Multi-slice node behaviour driven only through the `Node` trait object.

use tvbnest_neural::models::deco2014;
use tvbnest_neural::{
    CurrentEvent, Dictionary, IafCondNmdaDeco2014, Neuron, Node, NodeConfig, NodeId,
    OutgoingSpike, SolverKind, SpikeCounter, SpikeEvent,
};

fn boxed(config: &NodeConfig) -> Box<dyn Node> {
    Box::new(Neuron::<IafCondNmdaDeco2014>::new(NodeId(7), config).unwrap())
}

fn run(node: &mut dyn Node, slices: u64, min_delay: usize) -> Vec<OutgoingSpike> {
    let mut spikes = Vec::new();
    for slice in 0..slices {
        node.update(slice * min_delay as u64, 0, min_delay, &mut spikes)
            .unwrap();
    }
    spikes
}

#[test]
fn sustained_current_fires_regularly() {
    let config = NodeConfig::default();
    let mut node = boxed(&config);
    let mut params = Dictionary::new();
    // rheobase is g_m * (V_th - E_L) = 500 pA
    params.insert("I_e".to_string(), 1500.0);
    node.set_parameters(&params).unwrap();

    let spikes = run(node.as_mut(), 100, config.min_delay_steps);
    assert!(spikes.len() > 3, "only {} spikes", spikes.len());

    let intervals: Vec<u64> = spikes.windows(2).map(|w| w[1].step - w[0].step).collect();
    // refractory period is 20 steps
    assert!(intervals.iter().all(|&isi| isi > 20));
    let first = intervals[1];
    assert!(intervals[1..].iter().all(|&isi| isi.abs_diff(first) <= 1));
}

#[test]
fn delayed_spike_arrives_in_later_slice() {
    let config = NodeConfig::default();
    let mut node = boxed(&config);
    node.handle_spike(&SpikeEvent::new(NodeId(1), 1.0, 25).on_receptor(deco2014::AMPA))
        .unwrap();

    let mut sink = SpikeCounter::default();
    node.update(0, 0, 10, &mut sink).unwrap();
    node.update(10, 0, 10, &mut sink).unwrap();
    assert_eq!(node.get_state()["s_AMPA"], 0.0);
    node.update(20, 0, 10, &mut sink).unwrap();
    assert!(node.get_state()["s_AMPA"] > 0.0);
    assert_eq!(sink.0, 0);
}

#[test]
fn inhibition_hyperpolarises() {
    let mut node = boxed(&NodeConfig::default());
    node.handle_spike(&SpikeEvent::new(NodeId(1), 1.0, 0).on_receptor(deco2014::GABA_A))
        .unwrap();
    node.handle_current(&CurrentEvent::new(0.0, 0)).unwrap();
    run(node.as_mut(), 1, 10);
    // E_in == E_L, so GABA_A shunts at rest without moving V
    assert_eq!(node.get_state()["V_m"], -70.0);

    let mut depolarised = Dictionary::new();
    depolarised.insert("V_m".to_string(), -60.0);
    node.set_state(&depolarised).unwrap();
    node.handle_spike(&SpikeEvent::new(NodeId(1), 1.0, 0).on_receptor(deco2014::GABA_A))
        .unwrap();
    let mut leak_only = boxed(&NodeConfig::default());
    leak_only.set_state(&depolarised).unwrap();

    let mut spikes = Vec::new();
    node.update(10, 0, 10, &mut spikes).unwrap();
    leak_only.update(10, 0, 10, &mut spikes).unwrap();
    assert!(node.get_state()["V_m"] < leak_only.get_state()["V_m"]);
}

#[test]
fn adaptation_lengthens_intervals() {
    let config = NodeConfig::default().with_solver(SolverKind::Rk4);
    let mut node = boxed(&config);
    let mut params = Dictionary::new();
    params.insert("I_e".to_string(), 2000.0);
    params.insert("b".to_string(), 100.0);
    node.set_parameters(&params).unwrap();

    let spikes = run(node.as_mut(), 200, config.min_delay_steps);
    assert!(spikes.len() >= 3);
    let first_isi = spikes[1].step - spikes[0].step;
    let last_isi = spikes[spikes.len() - 1].step - spikes[spikes.len() - 2].step;
    assert!(last_isi > first_isi, "{first_isi} -> {last_isi}");
    assert!(node.get_state()["w"] > 0.0);
}
