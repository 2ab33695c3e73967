//! Cluster boundary for reading and writing objects
//!
//! The driver only sees `ObjectStore`, which lets tests swap the API server
//! for a mock. `KubeObjectStore` maps each supported kind onto a typed
//! `kube::Api`.

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use gantry_common::monitoring::PrometheusRule;
use gantry_common::object::{
    KIND_CONFIG_MAP, KIND_DEPLOYMENT, KIND_PERSISTENT_VOLUME_CLAIM, KIND_PROMETHEUS_RULE,
    KIND_SERVICE,
};
use gantry_common::{Error, KubeObject};

/// Read and write access to live objects in one cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the live object, or `None` if it does not exist
    async fn get(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KubeObject>, Error>;

    /// Write the object back.
    ///
    /// `exists` selects replace (the object carries the live resourceVersion)
    /// over create.
    async fn apply(&self, object: &KubeObject, exists: bool) -> Result<(), Error>;
}

/// `ObjectStore` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
}

impl KubeObjectStore {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KubeObject>, Error> {
        let client = &self.client;
        let object = match kind {
            KIND_DEPLOYMENT => fetch::<Deployment>(client, namespace, name)
                .await?
                .map(KubeObject::Deployment),
            KIND_SERVICE => fetch::<Service>(client, namespace, name)
                .await?
                .map(KubeObject::Service),
            KIND_CONFIG_MAP => fetch::<ConfigMap>(client, namespace, name)
                .await?
                .map(KubeObject::ConfigMap),
            KIND_PERSISTENT_VOLUME_CLAIM => fetch::<PersistentVolumeClaim>(client, namespace, name)
                .await?
                .map(KubeObject::PersistentVolumeClaim),
            KIND_PROMETHEUS_RULE => fetch::<PrometheusRule>(client, namespace, name)
                .await?
                .map(KubeObject::PrometheusRule),
            other => return Err(Error::unsupported_kind(other, "no typed API for kind")),
        };
        Ok(object)
    }

    async fn apply(&self, object: &KubeObject, exists: bool) -> Result<(), Error> {
        let client = &self.client;
        match object {
            KubeObject::Deployment(o) => write(client, o, exists).await,
            KubeObject::Service(o) => write(client, o, exists).await,
            KubeObject::ConfigMap(o) => write(client, o, exists).await,
            KubeObject::PersistentVolumeClaim(o) => write(client, o, exists).await,
            KubeObject::PrometheusRule(o) => write(client, o, exists).await,
        }
    }
}

async fn fetch<K>(client: &Client, namespace: &str, name: &str) -> Result<Option<K>, Error>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    Ok(api.get_opt(name).await?)
}

async fn write<K>(client: &Client, object: &K, exists: bool) -> Result<(), Error>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
    K::DynamicType: Default,
{
    let meta = object.meta();
    let name = meta
        .name
        .as_deref()
        .ok_or_else(|| Error::internal_with_context("store", "object has no name"))?;
    let namespace = meta
        .namespace
        .as_deref()
        .ok_or_else(|| Error::internal_with_context("store", format!("{name} has no namespace")))?;

    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let params = PostParams::default();
    if exists {
        debug!(name, namespace, "replacing object");
        api.replace(name, &params, object).await?;
    } else {
        debug!(name, namespace, "creating object");
        api.create(&params, object).await?;
    }
    Ok(())
}
