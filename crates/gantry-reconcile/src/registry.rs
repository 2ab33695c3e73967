//! Kind to mutator bindings
//!
//! The registry is filled once at startup and then shared read-only behind an
//! `Arc`. Keys are plain kind strings so a lookup for a kind nobody handles
//! is an ordinary error, not a compile-time impossibility.

use std::collections::BTreeMap;

use gantry_common::KubeObject;
use tracing::debug;

use crate::error::ReconcileError;
use crate::mutator::{
    ConfigMapMutator, DeploymentMutator, Mutator, PersistentVolumeClaimMutator,
    PrometheusRuleMutator, ServiceMutator,
};

/// At most one mutator per kind
#[derive(Default)]
pub struct MutatorRegistry {
    mutators: BTreeMap<String, Box<dyn Mutator>>,
}

impl std::fmt::Debug for MutatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutatorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl MutatorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in mutator for every supported kind
    pub fn with_defaults() -> Result<Self, ReconcileError> {
        let builtins: Vec<Box<dyn Mutator>> = vec![
            Box::new(DeploymentMutator),
            Box::new(ServiceMutator),
            Box::new(ConfigMapMutator),
            Box::new(PersistentVolumeClaimMutator),
            Box::new(PrometheusRuleMutator::default()),
        ];
        Self::from_mutators(builtins)
    }

    /// Registry binding each mutator to the kind it reports
    pub fn from_mutators(
        mutators: impl IntoIterator<Item = Box<dyn Mutator>>,
    ) -> Result<Self, ReconcileError> {
        let mut registry = Self::new();
        for mutator in mutators {
            let kind = mutator.kind().to_string();
            registry.register(kind, mutator)?;
        }
        Ok(registry)
    }

    /// Bind `mutator` to `kind`
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        mutator: Box<dyn Mutator>,
    ) -> Result<(), ReconcileError> {
        let kind = kind.into();
        if self.mutators.contains_key(&kind) {
            return Err(ReconcileError::DuplicateMutator { kind });
        }
        debug!(kind = %kind, "registered mutator");
        self.mutators.insert(kind, mutator);
        Ok(())
    }

    /// Mutator bound to `kind`, if any
    pub fn get(&self, kind: &str) -> Option<&dyn Mutator> {
        self.mutators.get(kind).map(|m| m.as_ref())
    }

    /// Registered kinds in sorted order
    pub fn kinds(&self) -> Vec<&str> {
        self.mutators.keys().map(String::as_str).collect()
    }

    /// Run the mutator bound to `kind`.
    ///
    /// An unknown kind fails with `NoMutatorForKind` and leaves `existing`
    /// untouched.
    pub fn dispatch(
        &self,
        kind: &str,
        existing: &mut KubeObject,
        desired: &KubeObject,
    ) -> Result<bool, ReconcileError> {
        let mutator = self
            .get(kind)
            .ok_or_else(|| ReconcileError::NoMutatorForKind {
                kind: kind.to_string(),
            })?;
        mutator.mutate(existing, desired)
    }
}
