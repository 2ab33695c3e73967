//! Redis Deployment assembly

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ExecAction, KeyToPath, PersistentVolumeClaimVolumeSource,
    PodSpec, PodTemplateSpec, Probe, ResourceRequirements, TCPSocketAction, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use gantry_common::object::object_meta;
use gantry_common::LABEL_DEPLOYMENT_SELECTOR;

use super::settings::{ProbeTiming, RedisSettings, RedisVariantSettings, REDIS_PORT};
use super::{component_labels, RedisOptions};

/// Selector labels matching one variant's pods
pub(crate) fn selector_labels(variant: &RedisVariantSettings) -> BTreeMap<String, String> {
    BTreeMap::from([(LABEL_DEPLOYMENT_SELECTOR.to_string(), variant.name.clone())])
}

/// Build the single-replica, recreate-strategy Deployment for a variant
pub(crate) fn deployment(
    options: &RedisOptions,
    settings: &RedisSettings,
    variant: &RedisVariantSettings,
) -> Deployment {
    let mut pod_labels = component_labels(options, &variant.component);
    pod_labels.extend(selector_labels(variant));

    Deployment {
        metadata: object_meta(
            variant.name.clone(),
            component_labels(options, &variant.component),
        ),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector_labels(variant)),
                ..Default::default()
            },
            strategy: Some(DeploymentStrategy {
                type_: Some("Recreate".to_string()),
                ..Default::default()
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(options.service_account_name().to_string()),
                    volumes: Some(volumes(settings, variant)),
                    containers: vec![container(options, settings, variant)],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn volumes(settings: &RedisSettings, variant: &RedisVariantSettings) -> Vec<Volume> {
    vec![
        Volume {
            name: variant.storage_volume_name.clone(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: variant.storage_volume_name.clone(),
                read_only: None,
            }),
            ..Default::default()
        },
        Volume {
            name: settings.config_volume_name.clone(),
            config_map: Some(ConfigMapVolumeSource {
                name: settings.config_volume_name.clone(),
                items: Some(vec![KeyToPath {
                    key: settings.config_key.clone(),
                    path: settings.config_key.clone(),
                    mode: None,
                }]),
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

fn container(
    options: &RedisOptions,
    settings: &RedisSettings,
    variant: &RedisVariantSettings,
) -> Container {
    Container {
        name: variant.name.clone(),
        image: Some(options.image().to_string()),
        image_pull_policy: Some(options.image_pull_policy().to_string()),
        command: Some(vec![settings.command.clone()]),
        args: Some(settings.args.clone()),
        resources: Some(resources(variant)),
        readiness_probe: Some(readiness_probe(settings, variant.readiness)),
        liveness_probe: Some(liveness_probe(variant.liveness)),
        volume_mounts: Some(vec![
            VolumeMount {
                name: variant.storage_volume_name.clone(),
                mount_path: settings.data_mount_path.clone(),
                ..Default::default()
            },
            VolumeMount {
                name: settings.config_volume_name.clone(),
                mount_path: settings.config_mount_path.clone(),
                ..Default::default()
            },
        ]),
        termination_message_path: variant.termination_message_path.clone(),
        ..Default::default()
    }
}

fn resources(variant: &RedisVariantSettings) -> ResourceRequirements {
    let r = &variant.resources;
    ResourceRequirements {
        limits: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity(r.limits_cpu.clone())),
            ("memory".to_string(), Quantity(r.limits_memory.clone())),
        ])),
        requests: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity(r.requests_cpu.clone())),
            ("memory".to_string(), Quantity(r.requests_memory.clone())),
        ])),
        ..Default::default()
    }
}

fn readiness_probe(settings: &RedisSettings, timing: ProbeTiming) -> Probe {
    Probe {
        exec: Some(ExecAction {
            command: Some(settings.readiness_command.clone()),
        }),
        initial_delay_seconds: Some(timing.initial_delay_seconds),
        period_seconds: Some(timing.period_seconds),
        timeout_seconds: timing.timeout_seconds,
        ..Default::default()
    }
}

fn liveness_probe(timing: ProbeTiming) -> Probe {
    Probe {
        tcp_socket: Some(TCPSocketAction {
            port: IntOrString::Int(REDIS_PORT),
            host: None,
        }),
        initial_delay_seconds: Some(timing.initial_delay_seconds),
        period_seconds: Some(timing.period_seconds),
        timeout_seconds: timing.timeout_seconds,
        ..Default::default()
    }
}
