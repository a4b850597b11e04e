use std::collections::BTreeMap;

use async_trait::async_trait;
use kube::{
    Client, Config,
    config::{KubeConfigOptions, Kubeconfig, KubeconfigError},
};
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::instrument;

use crate::{
    BoxError,
    config::{ClusterConfig, DebuggerConfig},
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("cluster {cluster_id:?} is not configured"))]
    UnknownCluster { cluster_id: String },

    #[snafu(display("failed to read kubeconfig"))]
    ReadKubeconfig { source: KubeconfigError },

    #[snafu(display("failed to load kubeconfig context {context:?}"))]
    LoadContext {
        source: KubeconfigError,
        context: String,
    },

    #[snafu(display("failed to create Kubernetes client for cluster {cluster_id:?}"))]
    CreateClient {
        source: kube::Error,
        cluster_id: String,
    },
}

/// Hands out authenticated clients for clusters.
///
/// A single [`Client`] covers everything needed to inject a debug container:
/// typed pod access through [`kube::Api`], raw subresource requests and server
/// version discovery.
#[async_trait]
pub trait ClusterClientProvider: Send + Sync {
    async fn client(&self, cluster_id: &str) -> Result<Client, BoxError>;
}

/// A [`ClusterClientProvider`] which connects to clusters using contexts of a
/// kubeconfig file.
#[derive(Clone)]
pub struct KubeconfigClientProvider {
    kubeconfig: Kubeconfig,
    clusters: BTreeMap<String, ClusterConfig>,
}

impl std::fmt::Debug for KubeconfigClientProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The kubeconfig contains credentials
        f.debug_struct("KubeconfigClientProvider")
            .field("clusters", &self.clusters)
            .finish_non_exhaustive()
    }
}

impl KubeconfigClientProvider {
    pub fn new(kubeconfig: Kubeconfig, clusters: BTreeMap<String, ClusterConfig>) -> Self {
        Self {
            kubeconfig,
            clusters,
        }
    }

    /// Reads the kubeconfig named in `config`, falling back to the default
    /// kubeconfig locations.
    pub fn from_config(config: &DebuggerConfig) -> Result<Self, Error> {
        let kubeconfig = match &config.kubeconfig {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        }
        .context(ReadKubeconfigSnafu)?;

        Ok(Self::new(kubeconfig, config.clusters.clone()))
    }

    #[instrument(skip(self))]
    async fn create_client(&self, cluster_id: &str) -> Result<Client, Error> {
        let cluster = self
            .clusters
            .get(cluster_id)
            .context(UnknownClusterSnafu { cluster_id })?;

        let mut config = Config::from_custom_kubeconfig(
            self.kubeconfig.clone(),
            &KubeConfigOptions {
                context: Some(cluster.context.clone()),
                ..KubeConfigOptions::default()
            },
        )
        .await
        .with_context(|_| LoadContextSnafu {
            context: cluster.context.clone(),
        })?;

        if let Some(read_timeout) = cluster.read_timeout() {
            config.read_timeout = Some(read_timeout);
        }

        tracing::debug!(context = %cluster.context, "Creating Kubernetes client");
        Client::try_from(config).context(CreateClientSnafu { cluster_id })
    }
}

#[async_trait]
impl ClusterClientProvider for KubeconfigClientProvider {
    async fn client(&self, cluster_id: &str) -> Result<Client, BoxError> {
        Ok(self.create_client(cluster_id).await?)
    }
}
