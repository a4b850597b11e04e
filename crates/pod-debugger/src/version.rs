use k8s_version::{ClusterVersion, ParseClusterVersionError};
use kube::Client;
use snafu::{ResultExt, Snafu};
use tracing::instrument;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to query the Kubernetes server version"))]
    QueryServerVersion { source: kube::Error },

    #[snafu(display("failed to parse the Kubernetes server version"))]
    ParseServerVersion { source: ParseClusterVersionError },
}

/// Queries the `/version` discovery endpoint of the cluster and normalizes the
/// reported `gitVersion` to `<MAJOR>.<MINOR>`.
///
/// Failures are never retried, as continuing with an unknown version could
/// select the wrong patch protocol.
#[instrument(skip(client))]
pub async fn probe_cluster_version(client: &Client) -> Result<ClusterVersion, Error> {
    let server_info = client
        .apiserver_version()
        .await
        .context(QueryServerVersionSnafu)?;

    let version =
        ClusterVersion::from_git_version(&server_info.git_version).context(ParseServerVersionSnafu)?;

    tracing::debug!(
        git_version = %server_info.git_version,
        %version,
        "Probed Kubernetes server version"
    );

    Ok(version)
}
