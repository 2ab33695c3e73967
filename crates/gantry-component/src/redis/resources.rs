//! Redis network exposure, configuration data, and storage

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ConfigMap, PersistentVolumeClaim, PersistentVolumeClaimSpec, Service, ServicePort,
    ServiceSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use gantry_common::object::object_meta;

use super::settings::{RedisSettings, RedisVariantSettings, REDIS_PORT};
use super::workload::selector_labels;
use super::{component_labels, RedisOptions};

/// ClusterIP Service in front of a variant's pods
pub(crate) fn service(options: &RedisOptions, variant: &RedisVariantSettings) -> Service {
    Service {
        metadata: object_meta(
            variant.name.clone(),
            component_labels(options, &variant.component),
        ),
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                port: REDIS_PORT,
                target_port: Some(IntOrString::Int(REDIS_PORT)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            selector: Some(selector_labels(variant)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// ConfigMap holding `redis.conf`, shared by both variants
pub(crate) fn config_map(options: &RedisOptions, settings: &RedisSettings) -> ConfigMap {
    ConfigMap {
        metadata: object_meta(
            settings.config_volume_name.clone(),
            component_labels(options, &settings.config_component),
        ),
        data: Some(BTreeMap::from([(
            settings.config_key.clone(),
            settings.redis_conf.clone(),
        )])),
        ..Default::default()
    }
}

/// Data volume claim for a variant
pub(crate) fn persistent_volume_claim(
    options: &RedisOptions,
    settings: &RedisSettings,
    variant: &RedisVariantSettings,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: object_meta(
            variant.storage_volume_name.clone(),
            component_labels(options, &variant.component),
        ),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![settings.storage_access_mode.clone()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(settings.storage_request.clone()),
                )])),
                ..Default::default()
            }),
            storage_class_name: options.storage_class().map(str::to_string),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::RedisOptionsBuilder;

    fn options(storage_class: Option<&str>) -> RedisOptions {
        let mut builder = RedisOptionsBuilder::new();
        builder.app_label("api").image("redis:7");
        if let Some(class) = storage_class {
            builder.storage_class(class);
        }
        builder.build().unwrap()
    }

    #[test]
    fn service_targets_backend_pods() {
        let settings = RedisSettings::default();
        let svc = service(&options(None), &settings.backend);
        assert_eq!(svc.metadata.name.as_deref(), Some("backend-redis"));
        let spec = svc.spec.unwrap();
        let port = &spec.ports.unwrap()[0];
        assert_eq!(port.port, 6379);
        assert_eq!(port.target_port, Some(IntOrString::Int(6379)));
        assert_eq!(port.protocol.as_deref(), Some("TCP"));
        assert_eq!(spec.selector.unwrap()["deploymentConfig"], "backend-redis");
    }

    #[test]
    fn config_map_is_labelled_system() {
        let settings = RedisSettings::default();
        let cm = config_map(&options(None), &settings);
        assert_eq!(cm.metadata.name.as_deref(), Some("redis-config"));
        assert_eq!(cm.metadata.labels.unwrap()["3scale.component"], "system");
        assert!(cm.data.unwrap()["redis.conf"].contains("appendonly yes"));
    }

    #[test]
    fn pvc_requests_one_gigabyte_rwo() {
        let settings = RedisSettings::default();
        let pvc = persistent_volume_claim(&options(None), &settings, &settings.backend);
        assert_eq!(pvc.metadata.name.as_deref(), Some("backend-redis-storage"));
        let spec = pvc.spec.unwrap();
        assert_eq!(spec.access_modes.unwrap(), vec!["ReadWriteOnce".to_string()]);
        assert_eq!(
            spec.resources.unwrap().requests.unwrap()["storage"],
            Quantity("1Gi".to_string())
        );
        assert_eq!(spec.storage_class_name, None);
    }

    #[test]
    fn pvc_honours_storage_class() {
        let settings = RedisSettings::default();
        let pvc = persistent_volume_claim(&options(Some("fast")), &settings, &settings.system);
        assert_eq!(pvc.spec.unwrap().storage_class_name.as_deref(), Some("fast"));
    }
}
