use k8s_openapi::api::core::v1::{Pod, PodSpec};
use kube::{
    Api, Client, ResourceExt,
    api::{Patch, PatchParams},
};
use serde_json::Value;
use snafu::ResultExt;
use strategic_merge::{MergeSchema, create_two_way_merge_patch};
use tracing::instrument;

use super::{
    ComputeMergePatchSnafu, EPHEMERAL_CONTAINERS_SUBRESOURCE, Error, PatchResult, PatchStrategy,
    PatchSubresourceSnafu, SerializeDebugPodSnafu, SerializePodSnafu,
};
use crate::container::DebugContainerSpec;

/// Computes the strategic merge patch which appends `container` to the
/// ephemeral containers of `pod_snapshot`.
///
/// The snapshot is cloned and the container is appended to the clone. The
/// patch is the two-way diff between both, with list elements matched through
/// `schema` instead of their position.
pub fn strategic_patch(
    pod_snapshot: &Pod,
    container: &DebugContainerSpec,
    schema: &MergeSchema,
) -> Result<Value, Error> {
    let original = serde_json::to_value(pod_snapshot).context(SerializePodSnafu)?;

    let mut debug_pod = pod_snapshot.clone();
    debug_pod
        .spec
        .get_or_insert_with(PodSpec::default)
        .ephemeral_containers
        .get_or_insert_with(Vec::new)
        .push(container.as_ephemeral_container().clone());
    let modified = serde_json::to_value(&debug_pod).context(SerializeDebugPodSnafu)?;

    create_two_way_merge_patch(&original, &modified, schema).context(ComputeMergePatchSnafu)
}

#[instrument(skip_all, fields(pod = %pod_snapshot.name_any()))]
pub(super) async fn apply(
    client: &Client,
    namespace: &str,
    pod_snapshot: &Pod,
    container: &DebugContainerSpec,
) -> Result<PatchResult, Error> {
    let patch = strategic_patch(pod_snapshot, container, &MergeSchema::pod())?;
    tracing::debug!(%patch, "Adding debug container using strategic merge patch");

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod = pods
        .patch_subresource(
            EPHEMERAL_CONTAINERS_SUBRESOURCE,
            &pod_snapshot.name_any(),
            &PatchParams::default(),
            &Patch::Strategic(patch),
        )
        .await
        .context(PatchSubresourceSnafu {
            strategy: PatchStrategy::Modern,
        })?;

    Ok(PatchResult {
        pod,
        container_name: container.name().to_owned(),
    })
}
