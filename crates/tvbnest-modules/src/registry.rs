// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Model registry implementation
//!
//! Maps model names to node factories. Factories are shared (`Arc`) so that
//! copied models can wrap the factory they derive from.

use std::sync::Arc;

use ahash::AHashMap;
use tracing::{debug, info, warn};
use tvbnest_neural::{Dictionary, Neuron, NeuronModel, Node, NodeConfig, NodeId};

use crate::{RegistryError, Result};

/// Builds one node of a registered model
pub type NodeFactory =
    Arc<dyn Fn(NodeId, &NodeConfig) -> tvbnest_neural::Result<Box<dyn Node>> + Send + Sync>;

struct ModelEntry {
    factory: NodeFactory,
    /// Model this entry was copied from, if any
    base: Option<String>,
}

/// Registry of node factories keyed by unique model name
#[derive(Default)]
pub struct ModelRegistry {
    models: AHashMap<String, ModelEntry>,
}

impl core::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.models())
            .finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`
    ///
    /// # Errors
    /// `DuplicateModelName` if `name` is taken; the existing entry is kept.
    pub fn register(&mut self, name: &str, factory: NodeFactory) -> Result<()> {
        self.insert(name, factory, None)
    }

    /// Register `Neuron<M>` under the model's own name
    pub fn register_model<M: NeuronModel>(&mut self) -> Result<()> {
        let factory: NodeFactory = Arc::new(|id: NodeId, config: &NodeConfig| {
            Neuron::<M>::new(id, config).map(|node| Box::new(node) as Box<dyn Node>)
        });
        self.insert(M::NAME, factory, None)
    }

    /// Register `new_name` as `existing` with different default parameters.
    ///
    /// The overrides are validated now; nothing is registered if they fail.
    pub fn copy_model(
        &mut self,
        existing: &str,
        new_name: &str,
        overrides: &Dictionary,
    ) -> Result<()> {
        if self.models.contains_key(new_name) {
            warn!("Model already registered: {}", new_name);
            return Err(RegistryError::DuplicateModelName(new_name.to_string()));
        }
        let base = self
            .models
            .get(existing)
            .map(|entry| entry.factory.clone())
            .ok_or_else(|| RegistryError::UnknownModel(existing.to_string()))?;

        let mut probe = base(NodeId(0), &NodeConfig::default())?;
        probe.set_parameters(overrides)?;

        let overrides = overrides.clone();
        let factory: NodeFactory = Arc::new(move |id: NodeId, config: &NodeConfig| {
            let mut node = base(id, config)?;
            node.set_parameters(&overrides)?;
            node.reset();
            Ok(node)
        });
        self.insert(new_name, factory, Some(existing.to_string()))?;
        debug!("Copied model {} -> {}", existing, new_name);
        Ok(())
    }

    fn insert(&mut self, name: &str, factory: NodeFactory, base: Option<String>) -> Result<()> {
        if self.models.contains_key(name) {
            warn!("Model already registered: {}", name);
            return Err(RegistryError::DuplicateModelName(name.to_string()));
        }
        self.models
            .insert(name.to_string(), ModelEntry { factory, base });
        info!("✓ Model registered: {} (total models: {})", name, self.models.len());
        Ok(())
    }

    /// Instantiate one node of model `name`
    pub fn create(&self, name: &str, id: NodeId, config: &NodeConfig) -> Result<Box<dyn Node>> {
        let entry = self
            .models
            .get(name)
            .ok_or_else(|| RegistryError::UnknownModel(name.to_string()))?;
        Ok((entry.factory)(id, config)?)
    }

    /// Default parameters of model `name` (after any copy overrides)
    pub fn defaults(&self, name: &str) -> Result<Dictionary> {
        Ok(self
            .create(name, NodeId(0), &NodeConfig::default())?
            .get_parameters())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Model `name` was copied from, if it is a copy
    pub fn base_of(&self, name: &str) -> Option<&str> {
        self.models.get(name).and_then(|entry| entry.base.as_deref())
    }

    /// Registered names, sorted
    pub fn models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tvbnest_neural::{IafCondNmdaDeco2014, NeuralError, TvbRateWongWang};

    fn dict(entries: &[(&str, f64)]) -> Dictionary {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = ModelRegistry::new();
        registry.register_model::<IafCondNmdaDeco2014>().unwrap();
        registry.register_model::<TvbRateWongWang>().unwrap();
        assert_eq!(
            registry.models(),
            vec!["iaf_cond_nmda_deco2014", "tvb_rate_wongwang"]
        );
        let node = registry
            .create("tvb_rate_wongwang", NodeId(4), &NodeConfig::default())
            .unwrap();
        assert_eq!(node.id(), NodeId(4));
        assert_eq!(node.model_name(), "tvb_rate_wongwang");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ModelRegistry::new();
        registry.register_model::<IafCondNmdaDeco2014>().unwrap();
        assert_eq!(
            registry.register_model::<IafCondNmdaDeco2014>(),
            Err(RegistryError::DuplicateModelName(
                "iaf_cond_nmda_deco2014".to_string()
            ))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_model() {
        let registry = ModelRegistry::new();
        assert!(matches!(
            registry.create("nope", NodeId(1), &NodeConfig::default()),
            Err(RegistryError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_copy_model_changes_defaults() {
        let mut registry = ModelRegistry::new();
        registry.register_model::<IafCondNmdaDeco2014>().unwrap();
        registry
            .copy_model(
                "iaf_cond_nmda_deco2014",
                "deco2014_inhibitory",
                &dict(&[("C_m", 200.0), ("g_m", 20.0), ("E_L", -65.0)]),
            )
            .unwrap();

        let defaults = registry.defaults("deco2014_inhibitory").unwrap();
        assert_eq!(defaults["C_m"], 200.0);
        assert_eq!(defaults["g_m"], 20.0);
        assert_eq!(
            registry.base_of("deco2014_inhibitory"),
            Some("iaf_cond_nmda_deco2014")
        );

        let node = registry
            .create("deco2014_inhibitory", NodeId(2), &NodeConfig::default())
            .unwrap();
        assert_eq!(node.get_state()["V_m"], -65.0);
        assert_eq!(registry.defaults("iaf_cond_nmda_deco2014").unwrap()["C_m"], 500.0);
    }

    #[test]
    fn test_copy_model_rejects_invalid_overrides() {
        let mut registry = ModelRegistry::new();
        registry.register_model::<IafCondNmdaDeco2014>().unwrap();
        let err = registry
            .copy_model("iaf_cond_nmda_deco2014", "broken", &dict(&[("C_m", -1.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Neural(NeuralError::InvalidParameter { .. })
        ));
        assert!(!registry.contains("broken"));
        assert!(registry
            .copy_model("missing", "copy", &Dictionary::new())
            .is_err());
    }
}
