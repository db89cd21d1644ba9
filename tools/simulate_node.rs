// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulate a population of one model and print a JSON summary.
//!
//! Configuration comes from `tvbnest.toml` (if found), `TVBNEST_*`
//! environment variables and the flags below, in increasing precedence.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tvbnest::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    TvbnestConfig,
};
use tvbnest::logging::init_from_config;
use tvbnest::neural::{CurrentEvent, Dictionary};
use tvbnest::observability::{debug_flags_help, parse_debug_flags};
use tvbnest::Simulator;

struct Args {
    model: String,
    count: usize,
    steps: u64,
    config_path: Option<PathBuf>,
    parameters: Dictionary,
    /// (delay in steps, amplitude) pulses delivered to every node
    pulses: Vec<(usize, f64)>,
    overrides: HashMap<String, String>,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: simulate_node [--model <name>] [--count <n>] [--steps <n>] [--config <path>]\n\
         \x20                    [--set <param>=<value>]... [--pulse <delay>:<amplitude>]...\n\
         \x20                    [--solver <name>] [--resolution-ms <h>] [--threads <n>]\n\
         \x20                    [--log-level <level>] [--log-format text|json]\n\n\
         Defaults:\n\
         - model: iaf_cond_nmda_deco2014\n\
         - count: 1\n\
         - steps: 1000\n\n\
         {}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        model: "iaf_cond_nmda_deco2014".to_string(),
        count: 1,
        steps: 1000,
        config_path: None,
        parameters: Dictionary::new(),
        pulses: Vec::new(),
        overrides: HashMap::new(),
    };

    let mut argv = env::args().skip(1);
    while let Some(arg) = argv.next() {
        if arg.starts_with("--debug-") {
            continue;
        }
        let mut value = || argv.next().unwrap_or_else(|| usage_and_exit());
        match arg.as_str() {
            "--model" => args.model = value(),
            "--count" => args.count = value().parse().context("--count")?,
            "--steps" => args.steps = value().parse().context("--steps")?,
            "--config" => args.config_path = Some(PathBuf::from(value())),
            "--set" => {
                let pair = value();
                let (name, raw) = pair
                    .split_once('=')
                    .with_context(|| format!("--set expects <param>=<value>, got '{pair}'"))?;
                let parsed: f64 = raw.parse().with_context(|| format!("--set {name}"))?;
                args.parameters.insert(name.to_string(), parsed);
            }
            "--pulse" => {
                let pulse = value();
                let (delay, amplitude) = pulse
                    .split_once(':')
                    .with_context(|| format!("--pulse expects <delay>:<amplitude>, got '{pulse}'"))?;
                args.pulses.push((
                    delay.parse().context("--pulse delay")?,
                    amplitude.parse().context("--pulse amplitude")?,
                ));
            }
            "--solver" => {
                args.overrides.insert("solver".to_string(), value());
            }
            "--resolution-ms" => {
                args.overrides.insert("resolution_ms".to_string(), value());
            }
            "--threads" => {
                args.overrides.insert("threads".to_string(), value());
            }
            "--log-level" => {
                args.overrides.insert("log_level".to_string(), value());
            }
            "--log-format" => {
                args.overrides.insert("log_format".to_string(), value());
            }
            "-h" | "--help" => usage_and_exit(),
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    if args.count == 0 {
        bail!("--count must be at least 1");
    }
    Ok(args)
}

fn resolve_config(args: &Args) -> Result<TvbnestConfig> {
    let path = match &args.config_path {
        Some(path) => Some(path.clone()),
        None => find_config_file().ok(),
    };
    match path {
        Some(path) => load_config(Some(&path), Some(&args.overrides))
            .with_context(|| format!("Failed to load {}", path.display())),
        None => {
            let mut config = TvbnestConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &args.overrides);
            Ok(config)
        }
    }
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let config = resolve_config(&args)?;
    let _guard = init_from_config(&config, &parse_debug_flags())?;

    let mut sim = Simulator::new(&config)?;
    let ids = sim.create(&args.model, args.count)?;
    for &id in &ids {
        if !args.parameters.is_empty() {
            sim.set_parameters(id, &args.parameters)?;
        }
        for &(delay, amplitude) in &args.pulses {
            sim.deliver_current(id, &CurrentEvent::new(amplitude, delay))?;
        }
    }

    let spikes = sim.simulate(args.steps)?;

    let mut nodes = Vec::with_capacity(ids.len());
    for &id in &ids {
        let node = sim.node(id)?;
        let count = spikes.iter().filter(|s| s.origin == id).count();
        nodes.push(json!({
            "id": id.0,
            "spikes": count,
            "solver": node.solver().as_str(),
            "state": node.get_state(),
            "integration": node.integration_stats(),
        }));
    }

    let summary = json!({
        "model": args.model,
        "steps": sim.current_step(),
        "time_ms": sim.time_ms(),
        "resolution_ms": sim.node_config().resolution_ms,
        "spike_count": spikes.len(),
        "spikes": spikes,
        "nodes": nodes,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("simulate_node: {err:#}");
        process::exit(1);
    }
}
