//! Prometheus Operator alerting rule types
//!
//! Typed `monitoring.coreos.com/v1` PrometheusRule. Only the fields Gantry
//! reads or writes are modelled; anything else on a live object round-trips
//! through `extra` maps so mutators never drop it.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// PrometheusRule spec: an ordered list of rule groups
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1",
    kind = "PrometheusRule",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusRuleSpec {
    /// Rule groups, evaluated independently by Prometheus
    #[serde(default)]
    pub groups: Vec<RuleGroup>,
}

/// A named group of alerting/recording rules
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    /// Group name, unique within the PrometheusRule
    pub name: String,

    /// Evaluation interval override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Rules in evaluation order
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Group fields not modelled here (limit, partial_response_strategy, ...)
    #[serde(flatten, default)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A single alerting or recording rule
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Alert name (alerting rules)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,

    /// Series name (recording rules)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,

    /// PromQL expression
    pub expr: RuleExpr,

    /// Pending duration before firing
    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub for_: Option<String>,

    /// Labels attached to the alert
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Annotations attached to the alert
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Rule fields not modelled here (keep_firing_for, ...)
    #[serde(flatten, default)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Rule expression. The operator accepts a bare integer as well as PromQL
/// text, so live objects may carry either.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum RuleExpr {
    /// Integer expression, e.g. `expr: 1` for an always-firing alert
    Int(i64),
    /// PromQL text
    String(String),
}

impl RuleExpr {
    /// The PromQL text, if this is not an integer expression
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RuleExpr::Int(_) => None,
            RuleExpr::String(s) => Some(s),
        }
    }
}

impl Default for RuleExpr {
    fn default() -> Self {
        RuleExpr::String(String::new())
    }
}

impl From<&str> for RuleExpr {
    fn from(expr: &str) -> Self {
        RuleExpr::String(expr.to_string())
    }
}

impl From<String> for RuleExpr {
    fn from(expr: String) -> Self {
        RuleExpr::String(expr)
    }
}

impl From<i64> for RuleExpr {
    fn from(expr: i64) -> Self {
        RuleExpr::Int(expr)
    }
}

impl std::fmt::Display for RuleExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleExpr::Int(n) => write!(f, "{n}"),
            RuleExpr::String(s) => f.write_str(s),
        }
    }
}

impl Rule {
    /// Build an alerting rule
    pub fn alert(name: impl Into<String>, expr: impl Into<RuleExpr>) -> Self {
        Self {
            alert: Some(name.into()),
            expr: expr.into(),
            ..Default::default()
        }
    }

    /// Set the pending duration
    pub fn with_for(mut self, duration: impl Into<String>) -> Self {
        self.for_ = Some(duration.into());
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Alert name, if this is an alerting rule
    pub fn alert_name(&self) -> Option<&str> {
        self.alert.as_deref()
    }
}

impl RuleGroup {
    /// Create an empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Position of the alerting rule with the given name
    pub fn position_of_alert(&self, alert: &str) -> Option<usize> {
        self.rules
            .iter()
            .position(|r| r.alert_name() == Some(alert))
    }
}
