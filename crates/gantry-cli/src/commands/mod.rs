//! CLI commands

use std::fmt::Display;

use clap::Args;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use gantry_component::redis::ResolvedOptionsProvider;

use crate::{Error, Result};

pub mod reconcile;
pub mod render;
pub mod template;

/// Convert any displayable error into `Error::CommandFailed`
pub trait CommandErrorExt<T> {
    /// Map the error through its Display implementation
    fn cmd_err(self) -> Result<T>;
}

impl<T, E: Display> CommandErrorExt<T> for std::result::Result<T, E> {
    fn cmd_err(self) -> Result<T> {
        self.map_err(|e| Error::command_failed(e.to_string()))
    }
}

/// Concrete Redis option values shared by `render` and `reconcile`
#[derive(Args, Debug, Clone)]
pub struct RedisArgs {
    /// Value of the `app` label on every object
    #[arg(long, env = "GANTRY_APP_LABEL")]
    pub app_label: Option<String>,

    /// Redis container image
    #[arg(long, env = "GANTRY_REDIS_IMAGE")]
    pub image: Option<String>,

    /// Service account the Redis pods run as (default "amp")
    #[arg(long)]
    pub service_account: Option<String>,

    /// Image pull policy: Always, IfNotPresent or Never
    #[arg(long)]
    pub image_pull_policy: Option<String>,

    /// Storage class for the data volume claims
    #[arg(long)]
    pub storage_class: Option<String>,

    /// Also emit the Redis PrometheusRule
    #[arg(long)]
    pub monitoring: bool,
}

impl RedisArgs {
    /// Options provider seeded from the flags.
    ///
    /// Missing required values are passed through empty so the options
    /// builder reports exactly which one is absent.
    pub fn provider(&self) -> ResolvedOptionsProvider {
        ResolvedOptionsProvider {
            app_label: self.app_label.clone().unwrap_or_default(),
            image: self.image.clone().unwrap_or_default(),
            service_account_name: self.service_account.clone(),
            image_pull_policy: self.image_pull_policy.clone(),
            storage_class: self.storage_class.clone(),
            monitoring: self.monitoring,
        }
    }
}

/// Build a kube [`Client`] from an explicit kubeconfig path, or the default
/// resolution chain (in-cluster, `KUBECONFIG`, `~/.kube/config`).
pub async fn kube_client(kubeconfig: Option<&str>) -> Result<Client> {
    match kubeconfig {
        Some(path) => {
            debug!(path, "loading kubeconfig");
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::command_failed(format!("failed to read kubeconfig {}: {}", path, e))
            })?;
            let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .cmd_err()?;
            Client::try_from(config).cmd_err()
        }
        None => Client::try_default().await.cmd_err(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_component::{OptionsError, OptionsProvider};

    fn args() -> RedisArgs {
        RedisArgs {
            app_label: Some("api".to_string()),
            image: Some("redis:7".to_string()),
            service_account: None,
            image_pull_policy: Some("Always".to_string()),
            storage_class: None,
            monitoring: true,
        }
    }

    #[test]
    fn provider_carries_flags() {
        let options = args().provider().provide().unwrap();
        assert_eq!(options.app_label(), "api");
        assert_eq!(options.image_pull_policy(), "Always");
        assert_eq!(options.service_account_name(), "amp");
        assert!(options.monitoring());
    }

    #[test]
    fn missing_image_is_reported_by_name() {
        let args = RedisArgs {
            image: None,
            ..args()
        };
        let err = args.provider().provide().unwrap_err();
        assert!(matches!(
            err,
            OptionsError::MissingRequiredOption { option: "image", .. }
        ));
    }
}
