//! Deployment mutator

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, PodSpec};
use tracing::debug;

use gantry_common::object::KIND_DEPLOYMENT;
use gantry_common::KubeObject;

use super::{merge_labels, merge_map_keys, mismatch, set_if_differs, set_if_not_subset, Mutator};
use crate::error::ReconcileError;

/// Reconciles Deployments, leaving scaling and resource tuning to other actors
#[derive(Clone, Debug, Default)]
pub struct DeploymentMutator;

impl DeploymentMutator {
    /// Fields owned on a Deployment. Containers are matched by name.
    pub const MANAGED_FIELDS: &'static [&'static str] = &[
        "metadata.labels[desired keys]",
        "spec (when absent)",
        "spec.template.metadata.labels[desired keys]",
        "spec.template.spec.serviceAccountName",
        "spec.template.spec.containers[name].image",
        "spec.template.spec.containers[name].imagePullPolicy",
        "spec.template.spec.containers[name].command",
        "spec.template.spec.containers[name].args",
        "spec.template.spec.containers[name].livenessProbe",
        "spec.template.spec.containers[name].readinessProbe",
        "spec.template.spec.containers[+missing]",
    ];
}

impl Mutator for DeploymentMutator {
    fn kind(&self) -> &str {
        KIND_DEPLOYMENT
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
            (KubeObject::Deployment(current), KubeObject::Deployment(want)) => {
                reconcile(current, want)
            }
            (existing, desired) => Err(mismatch(KIND_DEPLOYMENT, existing, desired)),
        }
    }
}

fn reconcile(current: &mut Deployment, desired: &Deployment) -> Result<bool, ReconcileError> {
    let mut changed = merge_labels(&mut current.metadata, &desired.metadata);

    let Some(want) = desired.spec.as_ref() else {
        return Ok(changed);
    };
    let Some(have) = current.spec.as_mut() else {
        current.spec = Some(want.clone());
        return Ok(true);
    };

    let desired_pod_labels = want.template.metadata.as_ref().and_then(|m| m.labels.as_ref());
    if desired_pod_labels.is_some_and(|l| !l.is_empty()) {
        let pod_meta = have.template.metadata.get_or_insert_with(Default::default);
        changed |= merge_map_keys(&mut pod_meta.labels, desired_pod_labels);
    }

    if let Some(want_pod) = want.template.spec.as_ref() {
        match have.template.spec.as_mut() {
            Some(have_pod) => changed |= reconcile_pod(have_pod, want_pod)?,
            None => {
                have.template.spec = Some(want_pod.clone());
                changed = true;
            }
        }
    }

    Ok(changed)
}

fn reconcile_pod(current: &mut PodSpec, desired: &PodSpec) -> Result<bool, ReconcileError> {
    let mut changed = false;
    if desired.service_account_name.is_some() {
        changed |= set_if_differs(
            &mut current.service_account_name,
            &desired.service_account_name,
        );
    }
    changed |= reconcile_containers(current, desired)?;
    Ok(changed)
}

fn reconcile_containers(
    current: &mut PodSpec,
    desired: &PodSpec,
) -> Result<bool, ReconcileError> {
    let mut changed = false;
    for want in &desired.containers {
        match current.containers.iter_mut().find(|c| c.name == want.name) {
            Some(have) => changed |= reconcile_container(have, want)?,
            None => {
                debug!(container = %want.name, "appending missing container");
                current.containers.push(want.clone());
                changed = true;
            }
        }
    }
    Ok(changed)
}

fn reconcile_container(
    current: &mut Container,
    desired: &Container,
) -> Result<bool, ReconcileError> {
    let mut changed = false;
    changed |= set_if_differs(&mut current.image, &desired.image);
    changed |= set_if_differs(&mut current.image_pull_policy, &desired.image_pull_policy);
    changed |= set_if_differs(&mut current.command, &desired.command);
    changed |= set_if_differs(&mut current.args, &desired.args);
    changed |= set_if_not_subset(&mut current.liveness_probe, &desired.liveness_probe)?;
    changed |= set_if_not_subset(&mut current.readiness_probe, &desired.readiness_probe)?;
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use gantry_common::object::object_meta;
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::api::core::v1::{
        ConfigMap, PodTemplateSpec, Probe, ResourceRequirements, TCPSocketAction,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn container(name: &str, image: &str) -> Container {
        Container {
            name: name.to_string(),
            image: Some(image.to_string()),
            image_pull_policy: Some("IfNotPresent".to_string()),
            liveness_probe: Some(Probe {
                tcp_socket: Some(TCPSocketAction {
                    port: IntOrString::Int(6379),
                    host: None,
                }),
                period_seconds: Some(10),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn deployment(containers: Vec<Container>) -> KubeObject {
        KubeObject::Deployment(Deployment {
            metadata: object_meta("backend-redis", labels(&[("app", "api")])),
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels(&[("deploymentConfig", "backend-redis")])),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers,
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn spec_of(object: &KubeObject) -> &DeploymentSpec {
        match object {
            KubeObject::Deployment(d) => d.spec.as_ref().unwrap(),
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    fn spec_of_mut(object: &mut KubeObject) -> &mut DeploymentSpec {
        match object {
            KubeObject::Deployment(d) => d.spec.as_mut().unwrap(),
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn scaffold_adopts_desired_spec() {
        let desired = deployment(vec![container("backend-redis", "redis:7")]);
        let mut existing = desired.scaffold();

        assert!(DeploymentMutator.mutate(&mut existing, &desired).unwrap());
        assert_eq!(existing, desired);
        assert!(!DeploymentMutator.mutate(&mut existing, &desired).unwrap());
    }

    #[test]
    fn image_drift_is_corrected() {
        let desired = deployment(vec![container("backend-redis", "redis:7")]);
        let mut existing = deployment(vec![container("backend-redis", "redis:6")]);

        assert!(DeploymentMutator.mutate(&mut existing, &desired).unwrap());
        let pod = spec_of(&existing).template.spec.as_ref().unwrap();
        assert_eq!(pod.containers[0].image.as_deref(), Some("redis:7"));
    }

    #[test]
    fn replicas_resources_and_sidecars_survive() {
        let desired = deployment(vec![container("backend-redis", "redis:7")]);
        let mut existing = desired.clone();
        {
            let spec = spec_of_mut(&mut existing);
            spec.replicas = Some(3);
            let pod = spec.template.spec.as_mut().unwrap();
            pod.containers[0].resources = Some(ResourceRequirements {
                limits: Some(BTreeMap::from([(
                    "cpu".to_string(),
                    Quantity("4".to_string()),
                )])),
                ..Default::default()
            });
            pod.containers.insert(0, container("istio-proxy", "envoy:1"));
        }
        let before = existing.clone();

        assert!(!DeploymentMutator.mutate(&mut existing, &desired).unwrap());
        assert_eq!(existing, before);
    }

    #[test]
    fn missing_container_is_appended_after_foreign_ones() {
        let desired = deployment(vec![container("backend-redis", "redis:7")]);
        let mut existing = deployment(vec![container("istio-proxy", "envoy:1")]);

        assert!(DeploymentMutator.mutate(&mut existing, &desired).unwrap());
        let names: Vec<_> = spec_of(&existing)
            .template
            .spec
            .as_ref()
            .unwrap()
            .containers
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["istio-proxy", "backend-redis"]);
    }

    #[test]
    fn server_defaulted_probe_fields_are_not_drift() {
        let desired = deployment(vec![container("backend-redis", "redis:7")]);
        let mut existing = desired.clone();
        {
            let pod = spec_of_mut(&mut existing).template.spec.as_mut().unwrap();
            let probe = pod.containers[0].liveness_probe.as_mut().unwrap();
            probe.failure_threshold = Some(3);
            probe.success_threshold = Some(1);
        }

        assert!(!DeploymentMutator.mutate(&mut existing, &desired).unwrap());
    }

    #[test]
    fn pod_labels_merge_by_key() {
        let desired = deployment(vec![container("backend-redis", "redis:7")]);
        let mut existing = desired.clone();
        spec_of_mut(&mut existing).template.metadata = Some(ObjectMeta {
            labels: Some(labels(&[("sidecar.istio.io/inject", "true")])),
            ..Default::default()
        });

        assert!(DeploymentMutator.mutate(&mut existing, &desired).unwrap());
        let pod_labels = spec_of(&existing)
            .template
            .metadata
            .as_ref()
            .unwrap()
            .labels
            .clone()
            .unwrap();
        assert_eq!(pod_labels["deploymentConfig"], "backend-redis");
        assert_eq!(pod_labels["sidecar.istio.io/inject"], "true");
    }

    #[test]
    fn service_account_change_reaches_existing_pods() {
        let mut desired = deployment(vec![container("backend-redis", "redis:7")]);
        spec_of_mut(&mut desired).template.spec.as_mut().unwrap().service_account_name =
            Some("redis-sa".to_string());
        let mut existing = deployment(vec![container("backend-redis", "redis:7")]);
        spec_of_mut(&mut existing).template.spec.as_mut().unwrap().service_account_name =
            Some("amp".to_string());

        assert!(DeploymentMutator.mutate(&mut existing, &desired).unwrap());
        let pod = spec_of(&existing).template.spec.as_ref().unwrap();
        assert_eq!(pod.service_account_name.as_deref(), Some("redis-sa"));
        assert!(!DeploymentMutator.mutate(&mut existing, &desired).unwrap());
    }

    #[test]
    fn unset_service_account_leaves_live_value() {
        let desired = deployment(vec![container("backend-redis", "redis:7")]);
        let mut existing = desired.clone();
        spec_of_mut(&mut existing).template.spec.as_mut().unwrap().service_account_name =
            Some("custom".to_string());

        assert!(!DeploymentMutator.mutate(&mut existing, &desired).unwrap());
    }

    #[test]
    fn rejects_other_kinds() {
        let desired = deployment(vec![]);
        let mut existing = KubeObject::ConfigMap(ConfigMap::default());
        let before = existing.clone();

        let err = DeploymentMutator.mutate(&mut existing, &desired).unwrap_err();
        assert!(matches!(err, ReconcileError::TypeMismatch { .. }));
        assert_eq!(existing, before);
    }
}
