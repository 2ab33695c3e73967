//! Redis component options
//!
//! `RedisOptionsBuilder` collects values through setters and validates them
//! in `build()`. The returned `RedisOptions` is an owned copy, so reusing or
//! mutating the builder afterwards never affects options already handed out.

use crate::component::OptionsProvider;
use crate::error::OptionsError;
use crate::parameters::placeholder;

const COMPONENT: &str = "redis";

/// Template parameter for the application label
pub const PARAM_APP_LABEL: &str = "APP_LABEL";
/// Template parameter for the Redis image
pub const PARAM_REDIS_IMAGE: &str = "REDIS_IMAGE";

/// Default service account for Redis pods
pub const DEFAULT_SERVICE_ACCOUNT: &str = "amp";
/// Default image pull policy
pub const DEFAULT_IMAGE_PULL_POLICY: &str = "IfNotPresent";

const PULL_POLICIES: &[&str] = &["Always", "IfNotPresent", "Never"];

/// Validated, immutable Redis options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisOptions {
    app_label: String,
    image: String,
    service_account_name: String,
    image_pull_policy: String,
    storage_class: Option<String>,
    monitoring: bool,
}

impl RedisOptions {
    /// Value of the `app` label on every object
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// Redis container image
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Service account the Redis pods run as
    pub fn service_account_name(&self) -> &str {
        &self.service_account_name
    }

    /// Container image pull policy
    pub fn image_pull_policy(&self) -> &str {
        &self.image_pull_policy
    }

    /// Storage class for the data PVCs; cluster default when `None`
    pub fn storage_class(&self) -> Option<&str> {
        self.storage_class.as_deref()
    }

    /// Whether alerting rules are assembled
    pub fn monitoring(&self) -> bool {
        self.monitoring
    }
}

/// Staged construction of `RedisOptions`
#[derive(Clone, Debug, Default)]
pub struct RedisOptionsBuilder {
    app_label: Option<String>,
    image: Option<String>,
    service_account_name: Option<String>,
    image_pull_policy: Option<String>,
    storage_class: Option<String>,
    monitoring: Option<bool>,
}

impl RedisOptionsBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application label (required)
    pub fn app_label(&mut self, app_label: impl Into<String>) -> &mut Self {
        self.app_label = Some(app_label.into());
        self
    }

    /// Set the Redis image (required)
    pub fn image(&mut self, image: impl Into<String>) -> &mut Self {
        self.image = Some(image.into());
        self
    }

    /// Set the pod service account (default `amp`)
    pub fn service_account_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.service_account_name = Some(name.into());
        self
    }

    /// Set the image pull policy (default `IfNotPresent`)
    pub fn image_pull_policy(&mut self, policy: impl Into<String>) -> &mut Self {
        self.image_pull_policy = Some(policy.into());
        self
    }

    /// Set the storage class of the data PVCs (default: cluster default)
    pub fn storage_class(&mut self, class: impl Into<String>) -> &mut Self {
        self.storage_class = Some(class.into());
        self
    }

    /// Enable or disable alerting rules (default disabled)
    pub fn monitoring(&mut self, enabled: bool) -> &mut Self {
        self.monitoring = Some(enabled);
        self
    }

    /// Validate required options, fill defaults, and return an owned copy.
    ///
    /// Stops at the first missing required option.
    pub fn build(&self) -> Result<RedisOptions, OptionsError> {
        let app_label = required(&self.app_label, "app_label")?;
        let image = required(&self.image, "image")?;

        let image_pull_policy = self
            .image_pull_policy
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE_PULL_POLICY.to_string());
        if !PULL_POLICIES.contains(&image_pull_policy.as_str()) {
            return Err(OptionsError::InvalidOption {
                component: COMPONENT,
                option: "image_pull_policy",
                message: format!(
                    "'{}' is not one of {}",
                    image_pull_policy,
                    PULL_POLICIES.join(", ")
                ),
            });
        }

        Ok(RedisOptions {
            app_label,
            image,
            service_account_name: self
                .service_account_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SERVICE_ACCOUNT.to_string()),
            image_pull_policy,
            storage_class: self.storage_class.clone().filter(|s| !s.is_empty()),
            monitoring: self.monitoring.unwrap_or(false),
        })
    }
}

fn required(value: &Option<String>, option: &'static str) -> Result<String, OptionsError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(OptionsError::MissingRequiredOption {
            component: COMPONENT,
            option,
        }),
    }
}

/// Options whose required values are template placeholders.
///
/// Used when generating a packaging template; the template processor
/// substitutes `${APP_LABEL}` and `${REDIS_IMAGE}` later.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateOptionsProvider;

impl OptionsProvider for TemplateOptionsProvider {
    type Options = RedisOptions;

    fn provide(&self) -> Result<RedisOptions, OptionsError> {
        RedisOptionsBuilder::new()
            .app_label(placeholder(PARAM_APP_LABEL))
            .image(placeholder(PARAM_REDIS_IMAGE))
            .build()
    }
}

/// Options from concrete, already-resolved values.
#[derive(Clone, Debug, Default)]
pub struct ResolvedOptionsProvider {
    /// Application label
    pub app_label: String,
    /// Redis image
    pub image: String,
    /// Service account override
    pub service_account_name: Option<String>,
    /// Image pull policy override
    pub image_pull_policy: Option<String>,
    /// Storage class override
    pub storage_class: Option<String>,
    /// Emit alerting rules
    pub monitoring: bool,
}

impl OptionsProvider for ResolvedOptionsProvider {
    type Options = RedisOptions;

    fn provide(&self) -> Result<RedisOptions, OptionsError> {
        let mut builder = RedisOptionsBuilder::new();
        builder
            .app_label(self.app_label.as_str())
            .image(self.image.as_str())
            .monitoring(self.monitoring);
        if let Some(sa) = &self.service_account_name {
            builder.service_account_name(sa.as_str());
        }
        if let Some(policy) = &self.image_pull_policy {
            builder.image_pull_policy(policy.as_str());
        }
        if let Some(class) = &self.storage_class {
            builder.storage_class(class.as_str());
        }
        builder.build()
    }
}
