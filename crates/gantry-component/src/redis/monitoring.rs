//! Redis availability alerts

use std::collections::BTreeMap;

use gantry_common::monitoring::{PrometheusRule, PrometheusRuleSpec, Rule, RuleGroup};
use gantry_common::{LABEL_APP, LABEL_COMPONENT_ELEMENT};

use super::settings::{RedisSettings, RedisVariantSettings};
use super::RedisOptions;

/// Alert fired when the backend Redis has no available replica
pub const ALERT_BACKEND_REDIS_DOWN: &str = "ThreescaleBackendRedisDown";
/// Alert fired when the system Redis has no available replica
pub const ALERT_SYSTEM_REDIS_DOWN: &str = "ThreescaleSystemRedisDown";

fn down_alert(name: &str, variant: &RedisVariantSettings) -> Rule {
    Rule::alert(
        name,
        format!(
            "kube_deployment_status_replicas_available{{deployment=\"{}\"}} == 0",
            variant.name
        ),
    )
    .with_for("5m")
    .with_label("severity", "critical")
    .with_annotation(
        "summary",
        format!("{} has no available replicas", variant.name),
    )
    .with_annotation(
        "description",
        format!(
            "The {} Redis deployment {} has had no available replica for 5 minutes",
            variant.component, variant.name
        ),
    )
}

/// PrometheusRule with one availability alert per variant
pub(crate) fn prometheus_rule(options: &RedisOptions, settings: &RedisSettings) -> PrometheusRule {
    let group = RuleGroup::new(settings.rules_group.clone())
        .with_rule(down_alert(ALERT_BACKEND_REDIS_DOWN, &settings.backend))
        .with_rule(down_alert(ALERT_SYSTEM_REDIS_DOWN, &settings.system));

    let mut rule = PrometheusRule::new(
        &settings.rules_name,
        PrometheusRuleSpec {
            groups: vec![group],
        },
    );
    rule.metadata.labels = Some(BTreeMap::from([
        (LABEL_APP.to_string(), options.app_label().to_string()),
        (LABEL_COMPONENT_ELEMENT.to_string(), "redis".to_string()),
    ]));
    rule
}
