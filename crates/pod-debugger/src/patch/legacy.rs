use k8s_openapi::api::core::v1::Pod;
use kube::{
    Api, Client, Resource, ResourceExt,
    api::{Patch, PatchParams},
};
use serde_json::json;
use snafu::ResultExt;
use tracing::instrument;

use super::{
    BuildPatchRequestSnafu, EPHEMERAL_CONTAINERS_SUBRESOURCE, Error, PatchResult, PatchStrategy,
    PatchSubresourceSnafu, ReadPatchedPodSnafu, SerializeContainerSnafu,
};
use crate::container::DebugContainerSpec;

/// Builds the JSON patch (RFC 6902) which appends `container` to the
/// `ephemeralContainers` list of the subresource.
///
/// The patch always consists of a single `add` operation, regardless of how
/// many ephemeral containers the pod already has.
pub fn legacy_patch(container: &DebugContainerSpec) -> Result<json_patch::Patch, Error> {
    let container =
        serde_json::to_value(container.as_ephemeral_container()).context(SerializeContainerSnafu)?;

    serde_json::from_value(json!([{
        "op": "add",
        "path": "/ephemeralContainers/-",
        "value": container,
    }]))
    .context(SerializeContainerSnafu)
}

#[instrument(skip_all, fields(pod = %pod_snapshot.name_any()))]
pub(super) async fn apply(
    client: &Client,
    namespace: &str,
    pod_snapshot: &Pod,
    container: &DebugContainerSpec,
) -> Result<PatchResult, Error> {
    let pod_name = pod_snapshot.name_any();
    let patch = legacy_patch(container)?;
    tracing::debug!(?patch, "Appending debug container using JSON patch");

    // Only the subresource is patched, the pod spec itself is never sent.
    // The response is an EphemeralContainers object on these API servers,
    // not a pod, so it is discarded.
    let request = kube::core::Request::new(Pod::url_path(&(), Some(namespace)))
        .patch_subresource(
            EPHEMERAL_CONTAINERS_SUBRESOURCE,
            &pod_name,
            &PatchParams::default(),
            &Patch::Json::<()>(patch),
        )
        .context(BuildPatchRequestSnafu)?;
    client
        .request_text(request)
        .await
        .context(PatchSubresourceSnafu {
            strategy: PatchStrategy::Legacy,
        })?;

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod = pods.get(&pod_name).await.context(ReadPatchedPodSnafu {
        namespace,
        pod_name: &pod_name,
    })?;

    Ok(PatchResult {
        pod,
        container_name: container.name().to_owned(),
    })
}
