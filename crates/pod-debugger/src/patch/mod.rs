//! Adding the debug container to a pod.
//!
//! Kubernetes changed how the `ephemeralcontainers` subresource of pods is
//! patched in 1.23. Older API servers only accept a JSON patch (RFC 6902)
//! which appends to the `ephemeralContainers` list, newer ones expect a
//! strategic merge patch of the whole pod. [`PatchStrategy`] picks the right
//! protocol once per call, based on the probed [`ClusterVersion`].

use k8s_openapi::api::core::v1::Pod;
use k8s_version::ClusterVersion;
use kube::Client;
use snafu::Snafu;
use tracing::instrument;

use crate::container::DebugContainerSpec;

mod legacy;
mod modern;

pub use legacy::legacy_patch;
pub use modern::strategic_patch;

/// The first Kubernetes version which expects strategic merge patches on the
/// `ephemeralcontainers` subresource.
pub const STRATEGIC_MERGE_THRESHOLD: ClusterVersion = ClusterVersion::new(1, 23);

/// Name of the pod subresource used to add ephemeral containers.
pub const EPHEMERAL_CONTAINERS_SUBRESOURCE: &str = "ephemeralcontainers";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "failed to create JSON 6902 patch for the legacy ephemeralcontainers API"
    ))]
    SerializeContainer { source: serde_json::Error },

    #[snafu(display("failed to build the ephemeralcontainers patch request"))]
    BuildPatchRequest { source: kube::core::request::Error },

    #[snafu(display("failed to create JSON for the pod"))]
    SerializePod { source: serde_json::Error },

    #[snafu(display("failed to create JSON for the pod with the debug container"))]
    SerializeDebugPod { source: serde_json::Error },

    #[snafu(display("failed to create patch to add the debug container"))]
    ComputeMergePatch {
        source: strategic_merge::diff::Error,
    },

    #[snafu(display("failed to patch the ephemeralcontainers subresource using the {strategy} protocol"))]
    PatchSubresource {
        source: kube::Error,
        strategy: PatchStrategy,
    },

    #[snafu(display(
        "failed to read pod {pod_name:?} in namespace {namespace:?} after adding the debug container"
    ))]
    ReadPatchedPod {
        source: kube::Error,
        namespace: String,
        pod_name: String,
    },
}

impl Error {
    /// Returns `true` if the error happened before anything was sent to the
    /// API server, which means the input could not be turned into a patch.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::SerializeContainer { .. }
                | Self::BuildPatchRequest { .. }
                | Self::SerializePod { .. }
                | Self::SerializeDebugPod { .. }
                | Self::ComputeMergePatch { .. }
        )
    }
}

/// The pod as returned by the API server after the debug container was added.
#[derive(Clone, Debug)]
pub struct PatchResult {
    pub pod: Pod,

    /// Name of the injected container, which is always
    /// [`DEBUG_CONTAINER_NAME`](crate::container::DEBUG_CONTAINER_NAME).
    pub container_name: String,
}

/// The protocol used to add an ephemeral container to a pod.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PatchStrategy {
    /// JSON patch appending to `/ephemeralContainers`, for clusters older than
    /// [`STRATEGIC_MERGE_THRESHOLD`]. The pod is read again afterwards.
    Legacy,

    /// Strategic merge patch computed from the pod snapshot, for clusters at
    /// or above [`STRATEGIC_MERGE_THRESHOLD`].
    Modern,
}

impl PatchStrategy {
    /// Selects [`PatchStrategy::Legacy`] for versions strictly below
    /// `threshold` and [`PatchStrategy::Modern`] otherwise.
    pub fn select(cluster_version: ClusterVersion, threshold: ClusterVersion) -> Self {
        if cluster_version < threshold {
            Self::Legacy
        } else {
            Self::Modern
        }
    }

    /// Selects the strategy for a cluster, using [`STRATEGIC_MERGE_THRESHOLD`].
    pub fn for_cluster(cluster_version: ClusterVersion) -> Self {
        Self::select(cluster_version, STRATEGIC_MERGE_THRESHOLD)
    }

    /// Adds `container` to the pod `pod_snapshot` in `namespace`.
    ///
    /// `pod_snapshot` must have been read right before, the modern protocol
    /// uses it as the base of the merge patch. The legacy protocol only uses
    /// its name.
    #[instrument(skip(client, pod_snapshot, container), fields(container = container.name()))]
    pub async fn apply(
        self,
        client: &Client,
        namespace: &str,
        pod_snapshot: &Pod,
        container: &DebugContainerSpec,
    ) -> Result<PatchResult, Error> {
        match self {
            Self::Legacy => legacy::apply(client, namespace, pod_snapshot, container).await,
            Self::Modern => modern::apply(client, namespace, pod_snapshot, container).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ClusterVersion::new(1, 9), PatchStrategy::Legacy)]
    #[case(ClusterVersion::new(1, 10), PatchStrategy::Legacy)]
    #[case(ClusterVersion::new(1, 20), PatchStrategy::Legacy)]
    #[case(ClusterVersion::new(1, 22), PatchStrategy::Legacy)]
    #[case(ClusterVersion::new(1, 23), PatchStrategy::Modern)]
    #[case(ClusterVersion::new(1, 25), PatchStrategy::Modern)]
    #[case(ClusterVersion::new(2, 0), PatchStrategy::Modern)]
    fn for_cluster(#[case] version: ClusterVersion, #[case] expected: PatchStrategy) {
        assert_eq!(PatchStrategy::for_cluster(version), expected);
    }

    #[test]
    fn numeric_not_lexical_ordering() {
        // "1.10" < "1.9" as strings, but not as versions.
        let threshold = ClusterVersion::new(1, 10);

        assert_eq!(
            PatchStrategy::select(ClusterVersion::new(1, 9), threshold),
            PatchStrategy::Legacy
        );
        assert_eq!(
            PatchStrategy::select(ClusterVersion::new(1, 10), threshold),
            PatchStrategy::Modern
        );
    }

    #[test]
    fn display() {
        assert_eq!(PatchStrategy::Legacy.to_string(), "legacy");
        assert_eq!(PatchStrategy::Modern.to_string(), "modern");
    }

    #[test]
    fn errors_before_sending_are_local() {
        let serialize = serde_json::from_str::<serde_json::Value>("{")
            .expect_err("input is not JSON");
        let merge = strategic_merge::diff::Error::NotAnObject {
            document: "original",
        };

        assert!(Error::SerializePod { source: serialize }.is_local());
        assert!(Error::ComputeMergePatch { source: merge }.is_local());
    }
}
