//! Reconciliation driver
//!
//! For each desired object: fetch the live counterpart (or scaffold one),
//! dispatch to the kind's mutator, and write back only when the mutator
//! reports a change. Objects are reconciled concurrently and independently;
//! one object's failure is recorded in the report and does not stop others.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, instrument};

use gantry_common::retry::{retry_with_backoff, RetryConfig};
use gantry_common::{Error, KubeObject, ObjectKey};

use crate::error::ReconcileError;
use crate::registry::MutatorRegistry;
use crate::store::ObjectStore;

/// Driver settings
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Namespace every object is reconciled in
    pub namespace: String,
    /// Backoff for store reads and writes
    pub retry: RetryConfig,
    /// Compute outcomes without writing
    pub dry_run: bool,
}

impl ReconcilerConfig {
    /// Config for `namespace` with default retries, writes enabled
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            retry: RetryConfig::default(),
            dry_run: false,
        }
    }
}

/// What happened to one object
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The object did not exist and was created
    Created,
    /// The live object drifted and was written back
    Updated,
    /// The live object already matched
    Unchanged,
    /// Dispatch, mutation or the store failed; nothing was written
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Updated => write!(f, "updated"),
            Outcome::Unchanged => write!(f, "unchanged"),
            Outcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome for a single object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectReport {
    /// `Kind/name` of the object
    pub key: ObjectKey,
    /// What happened
    pub outcome: Outcome,
}

/// Outcomes of one reconciliation pass, in input order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Per-object outcomes
    pub objects: Vec<ObjectReport>,
}

impl ReconcileReport {
    /// Number of objects with the given outcome kind
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.objects.iter().filter(|o| pred(&o.outcome)).count()
    }

    /// Objects created in this pass
    pub fn created(&self) -> usize {
        self.count(|o| *o == Outcome::Created)
    }

    /// Objects updated in this pass
    pub fn updated(&self) -> usize {
        self.count(|o| *o == Outcome::Updated)
    }

    /// Objects that already matched
    pub fn unchanged(&self) -> usize {
        self.count(|o| *o == Outcome::Unchanged)
    }

    /// Objects that failed
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// True when no object failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Outcome for `key`, if it was part of the pass
    pub fn outcome(&self, key: &ObjectKey) -> Option<&Outcome> {
        self.objects
            .iter()
            .find(|o| &o.key == key)
            .map(|o| &o.outcome)
    }
}

/// Drives desired objects into a store through the mutator registry
pub struct Reconciler {
    store: Arc<dyn ObjectStore>,
    registry: Arc<MutatorRegistry>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a driver over `store`
    pub fn new(
        store: Arc<dyn ObjectStore>,
        registry: Arc<MutatorRegistry>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Driver settings
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Reconcile every object concurrently and collect the outcomes
    pub async fn reconcile_all(&self, objects: &[KubeObject]) -> ReconcileReport {
        let passes = objects.iter().map(|desired| async move {
            let key = desired.key();
            let outcome = match self.reconcile_object(desired).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        kind = %key.kind,
                        name = %key.name,
                        error = %e,
                        "reconciliation failed"
                    );
                    Outcome::Failed(e.to_string())
                }
            };
            ObjectReport { key, outcome }
        });

        let report = ReconcileReport {
            objects: join_all(passes).await,
        };
        info!(
            created = report.created(),
            updated = report.updated(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            "reconciliation pass complete"
        );
        report
    }

    /// Reconcile a single object
    #[instrument(skip(self, desired), fields(kind = desired.kind(), name = desired.name()))]
    pub async fn reconcile_object(
        &self,
        desired: &KubeObject,
    ) -> Result<Outcome, ReconcileError> {
        let mut desired = desired.clone();
        desired.set_namespace(self.config.namespace.as_str());

        let store = &self.store;
        let namespace = self.config.namespace.as_str();
        let (kind, name) = (desired.kind(), desired.name());

        let live = retry_with_backoff(
            &self.config.retry,
            "get object",
            Error::is_retryable,
            move || store.get(kind, namespace, name),
        )
        .await?;

        let exists = live.is_some();
        let mut existing = live.unwrap_or_else(|| desired.scaffold());
        let changed = self.registry.dispatch(kind, &mut existing, &desired)?;

        if !changed {
            info!(changed, "object already matches");
            return Ok(Outcome::Unchanged);
        }

        let outcome = if exists {
            Outcome::Updated
        } else {
            Outcome::Created
        };

        if self.config.dry_run {
            info!(changed, outcome = %outcome, "dry run, skipping write");
            return Ok(outcome);
        }

        let merged = &existing;
        retry_with_backoff(
            &self.config.retry,
            "apply object",
            Error::is_retryable,
            move || store.apply(merged, exists),
        )
        .await?;

        info!(changed, outcome = %outcome, "object reconciled");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use gantry_component::{Component, Redis, RedisOptionsBuilder};

    use crate::store::MockObjectStore;

    fn desired_objects() -> Vec<KubeObject> {
        let options = RedisOptionsBuilder::new()
            .app_label("api")
            .image("redis:7")
            .build()
            .unwrap();
        Redis::new(options).assemble()
    }

    fn config() -> ReconcilerConfig {
        ReconcilerConfig {
            retry: RetryConfig::no_retry(),
            ..ReconcilerConfig::new("3scale")
        }
    }

    fn reconciler(store: MockObjectStore, config: ReconcilerConfig) -> Reconciler {
        Reconciler::new(
            Arc::new(store),
            Arc::new(MutatorRegistry::with_defaults().unwrap()),
            config,
        )
    }

    #[tokio::test]
    async fn absent_objects_are_created_from_scaffold() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let sink = applied.clone();

        let mut store = MockObjectStore::new();
        store.expect_get().returning(|_, _, _| Ok(None));
        store.expect_apply().returning(move |object, exists| {
            assert!(!exists);
            sink.lock().unwrap().push(object.clone());
            Ok(())
        });

        let desired = desired_objects();
        let report = reconciler(store, config()).reconcile_all(&desired).await;

        assert_eq!(report.created(), desired.len());
        let applied = applied.lock().unwrap();
        assert_eq!(applied.len(), desired.len());
        for object in applied.iter() {
            assert_eq!(object.namespace(), Some("3scale"));
        }
    }

    #[tokio::test]
    async fn matching_objects_are_not_written() {
        let mut store = MockObjectStore::new();
        // backend-redis names both a Deployment and a Service
        store.expect_get().returning(|kind, namespace, name| {
            let mut live = desired_objects()
                .into_iter()
                .find(|o| o.kind() == kind && o.name() == name)
                .unwrap();
            live.set_namespace(namespace);
            Ok(Some(live))
        });
        store.expect_apply().never();

        let report = reconciler(store, config())
            .reconcile_all(&desired_objects())
            .await;
        assert_eq!(report.unchanged(), report.objects.len());
    }

    #[tokio::test]
    async fn failures_are_isolated_per_object() {
        let mut store = MockObjectStore::new();
        store.expect_get().returning(|kind, _, _| {
            if kind == "Service" {
                Err(Error::internal_with_context("store", "connection reset"))
            } else {
                Ok(None)
            }
        });
        store.expect_apply().returning(|object, _| {
            assert_ne!(object.kind(), "Service");
            Ok(())
        });

        let report = reconciler(store, config())
            .reconcile_all(&desired_objects())
            .await;
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        let key = ObjectKey {
            kind: "Service".to_string(),
            name: "backend-redis".to_string(),
        };
        assert!(matches!(report.outcome(&key), Some(Outcome::Failed(_))));
        assert_eq!(report.created(), report.objects.len() - 1);
    }

    #[tokio::test]
    async fn dry_run_reports_without_writing() {
        let mut store = MockObjectStore::new();
        store.expect_get().returning(|_, _, _| Ok(None));
        store.expect_apply().never();

        let config = ReconcilerConfig {
            dry_run: true,
            ..config()
        };
        let report = reconciler(store, config)
            .reconcile_all(&desired_objects())
            .await;
        assert_eq!(report.created(), report.objects.len());
    }

    #[tokio::test]
    async fn transient_store_errors_are_retried() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();

        let mut store = MockObjectStore::new();
        store.expect_get().returning(|_, _, _| Ok(None));
        store.expect_apply().returning(move |_, _| {
            let mut n = counter.lock().unwrap();
            *n += 1;
            if *n == 1 {
                Err(Error::internal("etcd leader changed"))
            } else {
                Ok(())
            }
        });

        let config = ReconcilerConfig {
            retry: RetryConfig {
                initial_delay: std::time::Duration::from_millis(1),
                ..RetryConfig::with_max_attempts(3)
            },
            ..ReconcilerConfig::new("3scale")
        };
        let desired = desired_objects();
        let outcome = reconciler(store, config)
            .reconcile_object(&desired[0])
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Created);
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_kind_fails_without_write() {
        let mut store = MockObjectStore::new();
        store.expect_get().returning(|_, _, _| Ok(None));
        store.expect_apply().never();

        let reconciler = Reconciler::new(
            Arc::new(store),
            Arc::new(MutatorRegistry::new()),
            config(),
        );
        let err = reconciler
            .reconcile_object(&desired_objects()[0])
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NoMutatorForKind { .. }));
    }
}
