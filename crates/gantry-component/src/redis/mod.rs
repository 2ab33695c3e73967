//! Redis component
//!
//! Assembles two independently-scaled Redis deployments sharing one naming
//! scheme:
//! - `backend-redis`: Deployment, Service, data PVC, plus the shared
//!   `redis-config` ConfigMap
//! - `system-redis`: Deployment and data PVC
//!
//! Each variant is built from its own `RedisVariantSettings`; no state is
//! shared between variant builders. With monitoring enabled a PrometheusRule
//! with availability alerts is appended.

mod monitoring;
mod options;
mod resources;
mod settings;
mod workload;

use std::collections::BTreeMap;

use gantry_common::{KubeObject, LABEL_APP, LABEL_COMPONENT, LABEL_COMPONENT_ELEMENT};

use crate::component::Component;
use crate::parameters::ParameterDeclaration;

pub use monitoring::{ALERT_BACKEND_REDIS_DOWN, ALERT_SYSTEM_REDIS_DOWN};
pub use options::{
    RedisOptions, RedisOptionsBuilder, ResolvedOptionsProvider, TemplateOptionsProvider,
    DEFAULT_IMAGE_PULL_POLICY, DEFAULT_SERVICE_ACCOUNT, PARAM_APP_LABEL, PARAM_REDIS_IMAGE,
};
pub use settings::{
    ProbeTiming, RedisSettings, RedisVariantSettings, ResourceSettings, DEFAULT_APP_LABEL,
    DEFAULT_REDIS_IMAGE, REDIS_CONF, REDIS_PORT,
};

/// Labels shared by every Redis object of one component
pub(crate) fn component_labels(options: &RedisOptions, component: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_APP.to_string(), options.app_label().to_string()),
        (LABEL_COMPONENT.to_string(), component.to_string()),
        (LABEL_COMPONENT_ELEMENT.to_string(), "redis".to_string()),
    ])
}

/// Assemble the desired Redis objects.
///
/// Order: backend Deployment, Service, ConfigMap, PVC; system Deployment,
/// PVC; PrometheusRule when monitoring is enabled.
pub fn assemble(options: &RedisOptions, settings: &RedisSettings) -> Vec<KubeObject> {
    let mut objects = vec![
        KubeObject::Deployment(workload::deployment(options, settings, &settings.backend)),
        KubeObject::Service(resources::service(options, &settings.backend)),
        KubeObject::ConfigMap(resources::config_map(options, settings)),
        KubeObject::PersistentVolumeClaim(resources::persistent_volume_claim(
            options,
            settings,
            &settings.backend,
        )),
        KubeObject::Deployment(workload::deployment(options, settings, &settings.system)),
        KubeObject::PersistentVolumeClaim(resources::persistent_volume_claim(
            options,
            settings,
            &settings.system,
        )),
    ];
    if options.monitoring() {
        objects.push(KubeObject::PrometheusRule(monitoring::prometheus_rule(
            options, settings,
        )));
    }
    objects
}

/// The Redis component: validated options plus injected constants
#[derive(Clone, Debug)]
pub struct Redis {
    options: RedisOptions,
    settings: RedisSettings,
}

impl Redis {
    /// Create the component with default settings
    pub fn new(options: RedisOptions) -> Self {
        Self::with_settings(options, RedisSettings::default())
    }

    /// Create the component with explicit settings
    pub fn with_settings(options: RedisOptions, settings: RedisSettings) -> Self {
        Self { options, settings }
    }

    /// Options the component was built from
    pub fn options(&self) -> &RedisOptions {
        &self.options
    }

    /// Constants the component assembles with
    pub fn settings(&self) -> &RedisSettings {
        &self.settings
    }
}

impl Component for Redis {
    fn name(&self) -> &str {
        "redis"
    }

    fn declare_parameters(&self) -> Vec<ParameterDeclaration> {
        vec![
            ParameterDeclaration::required(
                PARAM_APP_LABEL,
                "Used for object app labels",
                DEFAULT_APP_LABEL,
            ),
            ParameterDeclaration::required(
                PARAM_REDIS_IMAGE,
                "Redis image to use",
                DEFAULT_REDIS_IMAGE,
            ),
        ]
    }

    fn assemble(&self) -> Vec<KubeObject> {
        assemble(&self.options, &self.settings)
    }
}
