//! Reconcile command - drive the Redis component into a namespace

use std::sync::Arc;

use clap::Args;
use tracing::info;

use gantry_common::retry::RetryConfig;
use gantry_component::{Component, OptionsProvider, Redis};
use gantry_reconcile::{
    KubeObjectStore, MutatorRegistry, ReconcileReport, Reconciler, ReconcilerConfig,
};

use super::{kube_client, RedisArgs};
use crate::{Error, Result};

/// Reconcile command arguments
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub redis: RedisArgs,

    /// Namespace to reconcile into
    #[arg(long, short = 'n', env = "GANTRY_NAMESPACE")]
    pub namespace: String,

    /// Path to kubeconfig (defaults to in-cluster or ~/.kube/config)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<String>,

    /// Compute changes without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Attempts per cluster read or write before giving up
    #[arg(long, default_value_t = 5)]
    pub max_attempts: u32,
}

impl ReconcileArgs {
    fn config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            retry: RetryConfig::with_max_attempts(self.max_attempts),
            dry_run: self.dry_run,
            ..ReconcilerConfig::new(self.namespace.as_str())
        }
    }
}

pub async fn run(args: ReconcileArgs) -> Result<()> {
    // Options are validated before any cluster access.
    let options = args.redis.provider().provide()?;
    let desired = Redis::new(options).assemble();

    let registry = MutatorRegistry::with_defaults()?;
    let client = kube_client(args.kubeconfig.as_deref()).await?;
    let reconciler = Reconciler::new(
        Arc::new(KubeObjectStore::new(client)),
        Arc::new(registry),
        args.config(),
    );

    info!(
        namespace = %args.namespace,
        objects = desired.len(),
        dry_run = args.dry_run,
        "reconciling redis"
    );
    let report = reconciler.reconcile_all(&desired).await;
    print_report(&report);
    check(&report)
}

fn print_report(report: &ReconcileReport) {
    for object in &report.objects {
        println!("{:<45} {}", object.key.to_string(), object.outcome);
    }
}

fn check(report: &ReconcileReport) -> Result<()> {
    if report.is_success() {
        return Ok(());
    }
    Err(Error::ReconcileFailed {
        failed: report.failed(),
        total: report.objects.len(),
    })
}
