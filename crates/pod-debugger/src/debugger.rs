use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use snafu::{ResultExt, Snafu};
use tracing::{info, instrument};

use crate::{
    BoxError,
    client::{self, ClusterClientProvider, KubeconfigClientProvider},
    config::DebuggerConfig,
    container::DebugContainerSpec,
    environment::{EnvironmentRegistry, StaticEnvironmentRegistry},
    patch::{self, PatchResult, PatchStrategy},
    version::{self, probe_cluster_version},
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "failed to locate environment {environment:?} of project {project:?}"
    ))]
    LocateEnvironment {
        source: BoxError,
        project: String,
        environment: String,
    },

    #[snafu(display("failed to create client for cluster {cluster_id:?}"))]
    ProvisionClient {
        source: BoxError,
        cluster_id: String,
    },

    #[snafu(display("failed to get pod {pod_name:?} in namespace {namespace:?}"))]
    FetchPod {
        source: kube::Error,
        namespace: String,
        pod_name: String,
    },

    #[snafu(display("failed to determine the Kubernetes version of the cluster"))]
    ProbeVersion { source: version::Error },

    #[snafu(display("failed to add debug container to pod {pod_name:?} in namespace {namespace:?}"))]
    PatchContainer {
        source: patch::Error,
        namespace: String,
        pod_name: String,
    },
}

/// Identifies the pod to debug and the image of the debug container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugRequest {
    pub project: String,
    pub environment: String,
    pub pod: String,
    pub image: String,
}

/// Adds the debug container to the pod `pod_name` in `namespace`.
///
/// The pod is read first. Its snapshot is the base of the strategic merge
/// patch and a missing pod fails the call before anything is written. The
/// cluster version is probed on every call and decides which
/// [`PatchStrategy`] is used. Exactly one patch request is sent.
#[instrument(skip(client))]
pub async fn debug_pod(
    client: &Client,
    namespace: &str,
    pod_name: &str,
    image: &str,
) -> Result<PatchResult, Error> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod_snapshot = pods.get(pod_name).await.context(FetchPodSnafu {
        namespace,
        pod_name,
    })?;

    let cluster_version = probe_cluster_version(client)
        .await
        .context(ProbeVersionSnafu)?;
    let strategy = PatchStrategy::for_cluster(cluster_version);
    info!(%cluster_version, %strategy, "Adding debug container");

    let container = DebugContainerSpec::new(image);
    let result = strategy
        .apply(client, namespace, &pod_snapshot, &container)
        .await
        .context(PatchContainerSnafu {
            namespace,
            pod_name,
        })?;

    info!(container = %result.container_name, "Added debug container");
    Ok(result)
}

/// Resolves projects and environments to clusters and injects debug containers
/// into their pods.
///
/// The debugger keeps no state between calls, every
/// [`PodDebugger::patch_debug_container`] call locates the environment, creates
/// a client and probes the cluster version again.
pub struct PodDebugger<R, P> {
    registry: R,
    clients: P,
}

impl<R, P> PodDebugger<R, P>
where
    R: EnvironmentRegistry,
    P: ClusterClientProvider,
{
    pub fn new(registry: R, clients: P) -> Self {
        Self { registry, clients }
    }

    #[instrument(skip(self), fields(project = %request.project, environment = %request.environment, pod = %request.pod))]
    pub async fn patch_debug_container(
        &self,
        request: &DebugRequest,
    ) -> Result<PatchResult, Error> {
        let location = self
            .registry
            .locate(&request.project, &request.environment)
            .await
            .context(LocateEnvironmentSnafu {
                project: &request.project,
                environment: &request.environment,
            })?;

        let client = self
            .clients
            .client(&location.cluster_id)
            .await
            .context(ProvisionClientSnafu {
                cluster_id: &location.cluster_id,
            })?;

        debug_pod(&client, &location.namespace, &request.pod, &request.image).await
    }
}

impl PodDebugger<StaticEnvironmentRegistry, KubeconfigClientProvider> {
    /// Creates a debugger for the environments and clusters listed in `config`.
    pub fn from_config(config: &DebuggerConfig) -> Result<Self, client::Error> {
        let registry = StaticEnvironmentRegistry::new(config.environments.iter().cloned());
        let clients = KubeconfigClientProvider::from_config(config)?;

        Ok(Self::new(registry, clients))
    }
}
