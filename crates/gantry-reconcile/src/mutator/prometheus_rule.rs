//! PrometheusRule mutator
//!
//! Rule groups are lists of alerts shared with other authors, so alerts are
//! reconciled one at a time by name. Alerts nobody asked for are left where
//! they are, except the retired ones this system used to ship and must now
//! take back out.

use std::collections::BTreeSet;

use tracing::{debug, info};

use gantry_common::monitoring::{PrometheusRule, Rule};
use gantry_common::object::KIND_PROMETHEUS_RULE;
use gantry_common::KubeObject;

use super::{merge_labels, mismatch, Mutator};
use crate::error::ReconcileError;

/// Alerts removed from live PrometheusRules unless still desired
pub const DEFAULT_RETIRED_ALERTS: &[&str] = &["ThreescaleApicastRequestTime"];

/// Reconciles PrometheusRules alert by alert
#[derive(Clone, Debug)]
pub struct PrometheusRuleMutator {
    retired_alerts: Vec<String>,
}

impl Default for PrometheusRuleMutator {
    fn default() -> Self {
        Self::with_retired_alerts(DEFAULT_RETIRED_ALERTS.iter().copied())
    }
}

impl PrometheusRuleMutator {
    /// Fields owned on a PrometheusRule. Alerts are matched by name.
    pub const MANAGED_FIELDS: &'static [&'static str] = &[
        "metadata.labels[desired keys]",
        "spec.groups[*].rules[alert in desired]",
        "spec.groups[*].rules[alert in retired list]",
    ];

    /// Mutator removing the given alerts when they are not desired
    pub fn with_retired_alerts<I, S>(alerts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            retired_alerts: alerts.into_iter().map(Into::into).collect(),
        }
    }

    /// Alerts this mutator removes
    pub fn retired_alerts(&self) -> &[String] {
        &self.retired_alerts
    }

    fn reconcile(
        &self,
        current: &mut PrometheusRule,
        desired: &PrometheusRule,
    ) -> Result<bool, ReconcileError> {
        let name = current.metadata.name.clone().unwrap_or_default();
        if current.spec.groups.is_empty() {
            return Err(ReconcileError::malformed(
                KIND_PROMETHEUS_RULE,
                name,
                "spec has no rule groups",
            ));
        }

        let mut changed = merge_labels(&mut current.metadata, &desired.metadata);
        let mut desired_alerts = BTreeSet::new();

        for group in &desired.spec.groups {
            let target = current
                .spec
                .groups
                .iter()
                .position(|g| g.name == group.name)
                .unwrap_or(0);
            for rule in &group.rules {
                let Some(alert) = rule.alert_name() else {
                    continue;
                };
                desired_alerts.insert(alert);
                changed |= upsert_alert(current, target, alert, rule);
            }
        }

        for retired in &self.retired_alerts {
            if desired_alerts.contains(retired.as_str()) {
                continue;
            }
            if remove_alert(current, retired) {
                info!(
                    rule = %name,
                    "Alert '{}' removed from PrometheusRules",
                    retired
                );
                changed = true;
            } else {
                info!(
                    rule = %name,
                    "Alert '{}' not found, no update required",
                    retired
                );
            }
        }

        Ok(changed)
    }
}

/// Replace the alert wherever it lives, or append it to the target group
fn upsert_alert(
    current: &mut PrometheusRule,
    target: usize,
    alert: &str,
    desired: &Rule,
) -> bool {
    let found = current
        .spec
        .groups
        .iter_mut()
        .find_map(|g| g.rules.iter_mut().find(|r| r.alert_name() == Some(alert)));

    match found {
        Some(have) if *have == *desired => false,
        Some(have) => {
            debug!(alert, "updating drifted alert");
            *have = desired.clone();
            true
        }
        None => {
            debug!(alert, "appending missing alert");
            current.spec.groups[target].rules.push(desired.clone());
            true
        }
    }
}

/// Drop every occurrence of the alert, keeping the remaining order
fn remove_alert(current: &mut PrometheusRule, alert: &str) -> bool {
    let mut removed = false;
    for group in &mut current.spec.groups {
        let before = group.rules.len();
        group.rules.retain(|r| r.alert_name() != Some(alert));
        removed |= group.rules.len() != before;
    }
    removed
}

impl Mutator for PrometheusRuleMutator {
    fn kind(&self) -> &str {
        KIND_PROMETHEUS_RULE
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
            (KubeObject::PrometheusRule(current), KubeObject::PrometheusRule(want)) => {
                self.reconcile(current, want)
            }
            (existing, desired) => Err(mismatch(KIND_PROMETHEUS_RULE, existing, desired)),
        }
    }
}
