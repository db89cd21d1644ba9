// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Parameter Sets
//!
//! Named, validated model parameters. Every model declares its parameters once
//! with [`model_parameters!`], which generates the struct, its defaults and the
//! name-based accessors. Cross-parameter relations live in
//! [`ModelParameters::check_relations`].
//!
//! Updates through [`ParameterSet::set`] are atomic: every entry is checked
//! against its domain and the model's relations on a candidate copy, and the
//! set only changes if all of them pass.

use std::collections::BTreeMap;

use crate::types::{NeuralError, Result};

/// Name -> value mapping used for parameter and state introspection
pub type Dictionary = BTreeMap<String, f64>;

/// Legal domain of a scalar parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Any finite value
    Any,
    /// Strictly positive (time constants, capacitances)
    Positive,
    /// Zero or positive (conductances, rates)
    NonNegative,
    /// Closed interval [0, 1]
    UnitInterval,
}

impl Domain {
    pub fn check(self, value: f64) -> core::result::Result<(), &'static str> {
        if !value.is_finite() {
            return Err("must be finite");
        }
        match self {
            Domain::Any => Ok(()),
            Domain::Positive if value > 0.0 => Ok(()),
            Domain::Positive => Err("must be > 0"),
            Domain::NonNegative if value >= 0.0 => Ok(()),
            Domain::NonNegative => Err("must be >= 0"),
            Domain::UnitInterval if (0.0..=1.0).contains(&value) => Ok(()),
            Domain::UnitInterval => Err("must be in [0, 1]"),
        }
    }
}

/// Metadata for one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub unit: &'static str,
    pub domain: Domain,
}

/// Name-based access to a parameter struct (generated by [`model_parameters!`])
pub trait ParameterFields: Clone + Default + core::fmt::Debug + Send + Sync + 'static {
    fn specs() -> &'static [ParameterSpec];
    fn get(&self, name: &str) -> Option<f64>;
    fn field_mut(&mut self, name: &str) -> Option<&mut f64>;
}

/// Model-specific validation on top of the per-parameter domains
pub trait ModelParameters: ParameterFields {
    /// Relations between parameters (e.g. reset below threshold)
    fn check_relations(&self) -> Result<()> {
        Ok(())
    }

    /// Full validation: every domain, then the relations
    fn validate(&self) -> Result<()> {
        for spec in Self::specs() {
            let value = self.get(spec.name).unwrap_or(f64::NAN);
            spec.domain
                .check(value)
                .map_err(|reason| NeuralError::InvalidParameter {
                    name: spec.name.to_string(),
                    value,
                    reason: reason.to_string(),
                })?;
        }
        self.check_relations()
    }

    fn parameter_count() -> usize {
        Self::specs().len()
    }
}

/// Declare a parameter struct with per-field key, default, domain and unit.
///
/// ```ignore
/// model_parameters! {
///     pub struct MyParameters {
///         tau: "tau_m" = 10.0, Positive, "ms";
///     }
/// }
/// ```
#[macro_export]
macro_rules! model_parameters {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $field:ident : $key:literal = $default:expr, $domain:ident, $unit:literal;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            $(
                $(#[doc = $doc])*
                pub $field: f64,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        impl $crate::params::ParameterFields for $name {
            fn specs() -> &'static [$crate::params::ParameterSpec] {
                &[
                    $(
                        $crate::params::ParameterSpec {
                            name: $key,
                            unit: $unit,
                            domain: $crate::params::Domain::$domain,
                        },
                    )*
                ]
            }

            fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $( $key => Some(self.$field), )*
                    _ => None,
                }
            }

            fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
                match name {
                    $( $key => Some(&mut self.$field), )*
                    _ => None,
                }
            }
        }
    };
}

/// Validated parameters of one node
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet<P: ModelParameters> {
    values: P,
}

impl<P: ModelParameters> ParameterSet<P> {
    /// All parameters at their documented defaults
    pub fn new() -> Self {
        Self {
            values: P::default(),
        }
    }

    /// Wrap an explicit parameter struct, validating it first
    pub fn from_values(values: P) -> Result<Self> {
        values.validate()?;
        Ok(Self { values })
    }

    pub fn values(&self) -> &P {
        &self.values
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        self.values
            .get(name)
            .ok_or_else(|| NeuralError::UnknownParameter {
                name: name.to_string(),
            })
    }

    /// Apply `updates` atomically; on error the set is unchanged.
    pub fn set(&mut self, updates: &Dictionary) -> Result<()> {
        let mut candidate = self.values.clone();
        for (name, value) in updates {
            let slot = candidate
                .field_mut(name)
                .ok_or_else(|| NeuralError::UnknownParameter { name: name.clone() })?;
            *slot = *value;
        }
        candidate.validate()?;
        self.values = candidate;
        Ok(())
    }

    pub fn to_dictionary(&self) -> Dictionary {
        P::specs()
            .iter()
            .filter_map(|spec| self.values.get(spec.name).map(|v| (spec.name.to_string(), v)))
            .collect()
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        P::specs().iter().map(|spec| spec.name)
    }
}

impl<P: ModelParameters> Default for ParameterSet<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::model_parameters! {
        /// Two-parameter fixture
        pub struct FixtureParameters {
            tau: "tau" = 10.0, Positive, "ms";
            gain: "gain" = 0.5, UnitInterval, "";
            offset: "offset" = -1.0, Any, "mV";
        }
    }

    impl ModelParameters for FixtureParameters {
        fn check_relations(&self) -> Result<()> {
            if self.offset > self.tau {
                return Err(NeuralError::InvalidParameter {
                    name: "offset".to_string(),
                    value: self.offset,
                    reason: "must not exceed tau".to_string(),
                });
            }
            Ok(())
        }
    }

    fn dict(entries: &[(&str, f64)]) -> Dictionary {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_defaults_and_get() {
        let set = ParameterSet::<FixtureParameters>::new();
        assert_eq!(set.get("tau").unwrap(), 10.0);
        assert_eq!(set.get("gain").unwrap(), 0.5);
        assert_eq!(FixtureParameters::parameter_count(), 3);
    }

    #[test]
    fn test_get_unknown_parameter() {
        let set = ParameterSet::<FixtureParameters>::new();
        assert!(matches!(
            set.get("nope"),
            Err(NeuralError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_set_then_get_returns_same_values() {
        let mut set = ParameterSet::<FixtureParameters>::new();
        let update = dict(&[("tau", 20.0), ("gain", 1.0), ("offset", 3.0)]);
        set.set(&update).unwrap();
        assert_eq!(set.to_dictionary(), update);
    }

    #[test]
    fn test_one_invalid_entry_leaves_set_unchanged() {
        let mut set = ParameterSet::<FixtureParameters>::new();
        let before = set.clone();
        let err = set
            .set(&dict(&[("tau", 20.0), ("offset", 2.0), ("gain", 1.5)]))
            .unwrap_err();
        match err {
            NeuralError::InvalidParameter { name, value, .. } => {
                assert_eq!(name, "gain");
                assert_eq!(value, 1.5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(set, before);
    }

    #[test]
    fn test_unknown_entry_leaves_set_unchanged() {
        let mut set = ParameterSet::<FixtureParameters>::new();
        let before = set.clone();
        assert!(set.set(&dict(&[("tau", 5.0), ("bogus", 1.0)])).is_err());
        assert_eq!(set, before);
    }

    #[test]
    fn test_relation_violation_is_rejected() {
        let mut set = ParameterSet::<FixtureParameters>::new();
        assert!(set.set(&dict(&[("offset", 50.0)])).is_err());
        assert_eq!(set.get("offset").unwrap(), -1.0);
    }

    #[test]
    fn test_non_finite_is_rejected_everywhere() {
        assert!(Domain::Any.check(f64::NAN).is_err());
        assert!(Domain::NonNegative.check(f64::INFINITY).is_err());
        assert!(Domain::Positive.check(0.0).is_err());
        assert!(Domain::NonNegative.check(0.0).is_ok());
    }
}
