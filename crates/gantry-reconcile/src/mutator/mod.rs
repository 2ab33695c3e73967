//! Per-kind mutators
//!
//! A mutator merges the managed subset of a desired object into an exclusively
//! owned copy of the live object and reports whether anything changed. Fields
//! outside the managed set are never read for comparison and never written.
//!
//! Each mutator lists what it owns in a `MANAGED_FIELDS` constant so the
//! ownership boundary can be reviewed without reading the merge code.

mod config_map;
mod deployment;
mod prometheus_rule;
mod pvc;
mod service;

use std::collections::BTreeMap;

use gantry_common::KubeObject;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use serde_json::Value;

use crate::error::ReconcileError;

pub use config_map::ConfigMapMutator;
pub use deployment::DeploymentMutator;
pub use prometheus_rule::{PrometheusRuleMutator, DEFAULT_RETIRED_ALERTS};
pub use pvc::PersistentVolumeClaimMutator;
pub use service::ServiceMutator;

/// Reconciles one object kind
pub trait Mutator: Send + Sync {
    /// Kind string this mutator is registered under
    fn kind(&self) -> &str;

    /// Field paths this mutator owns
    fn managed_fields(&self) -> &'static [&'static str];

    /// Merge `desired` into `existing`, returning whether `existing` changed.
    ///
    /// Returns `Ok(false)` only when every managed field already matches.
    fn mutate(&self, existing: &mut KubeObject, desired: &KubeObject)
        -> Result<bool, ReconcileError>;
}

/// Copy `desired` into `current` when they differ
pub(crate) fn set_if_differs<T: PartialEq + Clone>(current: &mut T, desired: &T) -> bool {
    if current == desired {
        return false;
    }
    *current = desired.clone();
    true
}

/// Upsert every desired key, leaving foreign keys in place
pub(crate) fn merge_map_keys(
    current: &mut Option<BTreeMap<String, String>>,
    desired: Option<&BTreeMap<String, String>>,
) -> bool {
    let Some(desired) = desired.filter(|d| !d.is_empty()) else {
        return false;
    };
    let current = current.get_or_insert_with(BTreeMap::new);
    let mut changed = false;
    for (key, value) in desired {
        if current.get(key) != Some(value) {
            current.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

/// Reconcile `metadata.labels`, the field every mutator owns
pub(crate) fn merge_labels(current: &mut ObjectMeta, desired: &ObjectMeta) -> bool {
    merge_map_keys(&mut current.labels, desired.labels.as_ref())
}

/// Whether every field set in `desired` holds the same value in `current`.
///
/// Objects compare key by key so fields the API server defaults on the live
/// object (probe thresholds, for instance) do not count as drift. Arrays and
/// scalars compare exactly.
pub(crate) fn is_subset(desired: &Value, current: &Value) -> bool {
    match (desired, current) {
        (Value::Null, _) => true,
        (Value::Object(want), Value::Object(have)) => want
            .iter()
            .all(|(key, value)| is_subset(value, have.get(key).unwrap_or(&Value::Null))),
        (want, have) => want == have,
    }
}

/// Replace `current` with `desired` unless `current` already covers it
pub(crate) fn set_if_not_subset<T: Serialize + Clone>(
    current: &mut Option<T>,
    desired: &Option<T>,
) -> Result<bool, ReconcileError> {
    if desired.is_none() {
        return Ok(false);
    }
    let want = serde_json::to_value(desired).map_err(gantry_common::Error::from)?;
    let have = serde_json::to_value(&*current).map_err(gantry_common::Error::from)?;
    if is_subset(&want, &have) {
        return Ok(false);
    }
    *current = desired.clone();
    Ok(true)
}

/// Error for a mutator handed objects of the wrong kind
pub(crate) fn mismatch(
    expected: &str,
    existing: &KubeObject,
    desired: &KubeObject,
) -> ReconcileError {
    let found = if existing.kind() != expected {
        existing.kind()
    } else {
        desired.kind()
    };
    ReconcileError::type_mismatch(expected, found)
}
