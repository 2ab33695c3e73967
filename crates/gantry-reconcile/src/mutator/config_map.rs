//! ConfigMap mutator

use gantry_common::object::KIND_CONFIG_MAP;
use gantry_common::KubeObject;

use super::{merge_labels, merge_map_keys, mismatch, Mutator};
use crate::error::ReconcileError;

/// Reconciles ConfigMap data key by key
#[derive(Clone, Debug, Default)]
pub struct ConfigMapMutator;

impl ConfigMapMutator {
    /// Fields owned on a ConfigMap
    pub const MANAGED_FIELDS: &'static [&'static str] =
        &["metadata.labels[desired keys]", "data[desired keys]"];
}

impl Mutator for ConfigMapMutator {
    fn kind(&self) -> &str {
        KIND_CONFIG_MAP
    }

    fn managed_fields(&self) -> &'static [&'static str] {
        Self::MANAGED_FIELDS
    }

    fn mutate(
        &self,
        existing: &mut KubeObject,
        desired: &KubeObject,
    ) -> Result<bool, ReconcileError> {
        match (existing, desired) {
            (KubeObject::ConfigMap(current), KubeObject::ConfigMap(want)) => {
                let mut changed = merge_labels(&mut current.metadata, &want.metadata);
                changed |= merge_map_keys(&mut current.data, want.data.as_ref());
                Ok(changed)
            }
            (existing, desired) => Err(mismatch(KIND_CONFIG_MAP, existing, desired)),
        }
    }
}
