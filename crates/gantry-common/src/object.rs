//! Typed Kubernetes objects handled by Gantry
//!
//! `KubeObject` is the closed set of kinds Gantry assembles and reconciles.
//! Desired objects, live objects, and scaffolds for not-yet-created objects
//! all travel as `KubeObject` so the mutator registry can route on kind.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::monitoring::{PrometheusRule, PrometheusRuleSpec, RuleGroup};
use crate::Error;

/// Kind string for apps/v1 Deployment
pub const KIND_DEPLOYMENT: &str = "Deployment";
/// Kind string for v1 Service
pub const KIND_SERVICE: &str = "Service";
/// Kind string for v1 ConfigMap
pub const KIND_CONFIG_MAP: &str = "ConfigMap";
/// Kind string for v1 PersistentVolumeClaim
pub const KIND_PERSISTENT_VOLUME_CLAIM: &str = "PersistentVolumeClaim";
/// Kind string for monitoring.coreos.com/v1 PrometheusRule
pub const KIND_PROMETHEUS_RULE: &str = "PrometheusRule";

/// Every kind Gantry knows how to assemble and reconcile.
pub const ALL_KINDS: &[&str] = &[
    KIND_DEPLOYMENT,
    KIND_SERVICE,
    KIND_CONFIG_MAP,
    KIND_PERSISTENT_VOLUME_CLAIM,
    KIND_PROMETHEUS_RULE,
];

/// A typed Kubernetes object of one of the supported kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum KubeObject {
    /// apps/v1 Deployment
    Deployment(Deployment),
    /// v1 Service
    Service(Service),
    /// v1 ConfigMap
    ConfigMap(ConfigMap),
    /// v1 PersistentVolumeClaim
    PersistentVolumeClaim(PersistentVolumeClaim),
    /// monitoring.coreos.com/v1 PrometheusRule
    PrometheusRule(PrometheusRule),
}

impl KubeObject {
    /// Kind string used for registry dispatch and logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deployment(_) => KIND_DEPLOYMENT,
            Self::Service(_) => KIND_SERVICE,
            Self::ConfigMap(_) => KIND_CONFIG_MAP,
            Self::PersistentVolumeClaim(_) => KIND_PERSISTENT_VOLUME_CLAIM,
            Self::PrometheusRule(_) => KIND_PROMETHEUS_RULE,
        }
    }

    /// API version string written into serialized manifests
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::Deployment(_) => "apps/v1",
            Self::Service(_) | Self::ConfigMap(_) | Self::PersistentVolumeClaim(_) => "v1",
            Self::PrometheusRule(_) => "monitoring.coreos.com/v1",
        }
    }

    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(o) => &o.metadata,
            Self::Service(o) => &o.metadata,
            Self::ConfigMap(o) => &o.metadata,
            Self::PersistentVolumeClaim(o) => &o.metadata,
            Self::PrometheusRule(o) => &o.metadata,
        }
    }

    /// Mutable object metadata
    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::Deployment(o) => &mut o.metadata,
            Self::Service(o) => &mut o.metadata,
            Self::ConfigMap(o) => &mut o.metadata,
            Self::PersistentVolumeClaim(o) => &mut o.metadata,
            Self::PrometheusRule(o) => &mut o.metadata,
        }
    }

    /// Object name (empty when unset)
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Object namespace, if set
    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    /// `Kind/name` identifier for logs and reports
    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            kind: self.kind().to_string(),
            name: self.name().to_string(),
        }
    }

    /// Build the stand-in used as `existing` when the live object is absent.
    ///
    /// Carries identity metadata only, plus the structural prerequisites a
    /// mutator refuses to work without: PrometheusRule keeps the desired
    /// group names with no rules.
    pub fn scaffold(&self) -> KubeObject {
        let metadata = identity_metadata(self.metadata());
        match self {
            Self::Deployment(_) => Self::Deployment(Deployment {
                metadata,
                ..Default::default()
            }),
            Self::Service(_) => Self::Service(Service {
                metadata,
                ..Default::default()
            }),
            Self::ConfigMap(_) => Self::ConfigMap(ConfigMap {
                metadata,
                ..Default::default()
            }),
            Self::PersistentVolumeClaim(_) => Self::PersistentVolumeClaim(PersistentVolumeClaim {
                metadata,
                ..Default::default()
            }),
            Self::PrometheusRule(desired) => {
                let groups = desired
                    .spec
                    .groups
                    .iter()
                    .map(|g| RuleGroup {
                        name: g.name.clone(),
                        interval: g.interval.clone(),
                        ..Default::default()
                    })
                    .collect();
                let mut rule = PrometheusRule::new(self.name(), PrometheusRuleSpec { groups });
                rule.metadata = metadata;
                Self::PrometheusRule(rule)
            }
        }
    }

    /// Set the namespace on this object
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.metadata_mut().namespace = Some(namespace.into());
    }

    /// Serialize to a manifest with `apiVersion` and `kind` populated.
    pub fn to_json(&self) -> Result<serde_json::Value, Error> {
        let mut value = match self {
            Self::Deployment(o) => serde_json::to_value(o)?,
            Self::Service(o) => serde_json::to_value(o)?,
            Self::ConfigMap(o) => serde_json::to_value(o)?,
            Self::PersistentVolumeClaim(o) => serde_json::to_value(o)?,
            Self::PrometheusRule(o) => serde_json::to_value(o)?,
        };
        let obj = value.as_object_mut().ok_or_else(|| {
            Error::serialization_for_kind(self.kind(), "object did not serialize to a map")
        })?;
        obj.insert("apiVersion".to_string(), self.api_version().into());
        obj.insert("kind".to_string(), self.kind().into());
        Ok(value)
    }

    /// Parse a manifest, dispatching on its `kind` field.
    pub fn from_json(value: serde_json::Value) -> Result<Self, Error> {
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or_else(|| Error::serialization("manifest has no kind"))?
            .to_string();
        let parsed = match kind.as_str() {
            KIND_DEPLOYMENT => serde_json::from_value(value).map(Self::Deployment),
            KIND_SERVICE => serde_json::from_value(value).map(Self::Service),
            KIND_CONFIG_MAP => serde_json::from_value(value).map(Self::ConfigMap),
            KIND_PERSISTENT_VOLUME_CLAIM => {
                serde_json::from_value(value).map(Self::PersistentVolumeClaim)
            }
            KIND_PROMETHEUS_RULE => serde_json::from_value(value).map(Self::PrometheusRule),
            other => return Err(Error::unsupported_kind(other, "not a Gantry-managed kind")),
        };
        parsed.map_err(|e| Error::serialization_for_kind(kind, e.to_string()))
    }
}

/// `Kind/name` identity of an object
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    /// Object kind
    pub kind: String,
    /// Object name
    pub name: String,
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

fn identity_metadata(meta: &ObjectMeta) -> ObjectMeta {
    ObjectMeta {
        name: meta.name.clone(),
        namespace: meta.namespace.clone(),
        ..Default::default()
    }
}

/// Build metadata with a name and labels, the shape every assembled object uses.
pub fn object_meta(name: impl Into<String>, labels: BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        labels: Some(labels),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::Rule;
    use k8s_openapi::api::apps::v1::DeploymentSpec;

    fn rule_object() -> KubeObject {
        let spec = PrometheusRuleSpec {
            groups: vec![RuleGroup::new("redis.rules").with_rule(Rule::alert("Down", "up == 0"))],
        };
        let mut rule = PrometheusRule::new("redis", spec);
        rule.metadata.labels = Some(BTreeMap::from([("app".to_string(), "x".to_string())]));
        KubeObject::PrometheusRule(rule)
    }

    #[test]
    fn kind_and_name() {
        let obj = KubeObject::ConfigMap(ConfigMap {
            metadata: object_meta("redis-config", BTreeMap::new()),
            ..Default::default()
        });
        assert_eq!(obj.kind(), "ConfigMap");
        assert_eq!(obj.name(), "redis-config");
        assert_eq!(obj.key().to_string(), "ConfigMap/redis-config");
    }

    #[test]
    fn scaffold_keeps_identity_only() {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "x".to_string());
        let mut meta = object_meta("backend-redis", labels);
        meta.namespace = Some("3scale".to_string());
        let obj = KubeObject::Deployment(Deployment {
            metadata: meta,
            spec: Some(DeploymentSpec::default()),
            ..Default::default()
        });

        let scaffold = obj.scaffold();
        assert_eq!(scaffold.name(), "backend-redis");
        assert_eq!(scaffold.namespace(), Some("3scale"));
        assert!(scaffold.metadata().labels.is_none());
        match scaffold {
            KubeObject::Deployment(d) => assert!(d.spec.is_none()),
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn prometheus_rule_scaffold_keeps_empty_groups() {
        match rule_object().scaffold() {
            KubeObject::PrometheusRule(r) => {
                assert_eq!(r.spec.groups.len(), 1);
                assert_eq!(r.spec.groups[0].name, "redis.rules");
                assert!(r.spec.groups[0].rules.is_empty());
                assert!(r.metadata.labels.is_none());
            }
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn json_carries_type_meta_and_parses_back() {
        let obj = rule_object();
        let json = obj.to_json().unwrap();
        assert_eq!(json["apiVersion"], "monitoring.coreos.com/v1");
        assert_eq!(json["kind"], "PrometheusRule");
        assert_eq!(KubeObject::from_json(json).unwrap(), obj);
    }

    #[test]
    fn from_json_rejects_unknown_kinds() {
        let err = KubeObject::from_json(serde_json::json!({"kind": "CronJob"})).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKind { .. }));
        let err = KubeObject::from_json(serde_json::json!({"metadata": {}})).unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }
}
