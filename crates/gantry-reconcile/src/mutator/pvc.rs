//! PersistentVolumeClaim mutator
//!
//! A bound claim's spec is immutable, so only creation sets it. Later passes
//! reconcile labels and nothing else.

use gantry_common::object::KIND_PERSISTENT_VOLUME_CLAIM;
use gantry_common::KubeObject;

use super::{merge_labels, mismatch, Mutator};
use crate::error::ReconcileError;

/// Reconciles PersistentVolumeClaims
#[derive(Clone, Debug, Default)]
pub struct PersistentVolumeClaimMutator;

impl PersistentVolumeClaimMutator {
    /// Fields owned on a PersistentVolumeClaim
    pub const MANAGED_FIELDS: &'static [&'static str] =
        &["metadata.labels[desired keys]", "spec (when absent)"];
}

impl Mutator for PersistentVolumeClaimMutator {
    fn kind(&self) -> &str {
        KIND_PERSISTENT_VOLUME_CLAIM
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
            (KubeObject::PersistentVolumeClaim(current), KubeObject::PersistentVolumeClaim(want)) => {
                let mut changed = merge_labels(&mut current.metadata, &want.metadata);
                if current.spec.is_none() && want.spec.is_some() {
                    current.spec = want.spec.clone();
                    changed = true;
                }
                Ok(changed)
            }
            (existing, desired) => Err(mismatch(KIND_PERSISTENT_VOLUME_CLAIM, existing, desired)),
        }
    }
}
