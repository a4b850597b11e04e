use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read config file {path:?}"))]
    ReadConfigFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse debugger config"))]
    ParseConfig { source: serde_yaml::Error },
}

/// Describes where environments live and how to reach their clusters.
///
/// ```yaml
/// kubeconfig: /etc/pod-debugger/kubeconfig
/// environments:
///   - project: shop
///     environment: dev
///     clusterId: local
///     namespace: shop-env-dev
/// clusters:
///   local:
///     context: kind-local
///     readTimeoutSeconds: 30
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DebuggerConfig {
    /// Path of the kubeconfig file. Defaults to `$KUBECONFIG` or
    /// `~/.kube/config` when not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,

    /// Clusters keyed by their cluster id.
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub project: String,
    pub environment: String,
    pub cluster_id: String,
    pub namespace: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Name of the kubeconfig context used to connect to the cluster.
    pub context: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_seconds: Option<u64>,
}

impl ClusterConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_seconds.map(Duration::from_secs)
    }
}

impl DebuggerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).context(ReadConfigFileSnafu { path })?;

        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, Error> {
        serde_yaml::from_str(contents).context(ParseConfigSnafu)
    }
}

#[cfg_attr(
    feature = "clap",
    derive(clap::Parser),
    command(next_help_heading = "Debugger Options")
)]
#[derive(Debug, PartialEq, Eq)]
pub struct DebuggerOptions {
    /// Path of the YAML file describing environments and clusters.
    #[cfg_attr(feature = "clap", arg(long, env = "POD_DEBUGGER_CONFIG_FILE"))]
    pub config_file: PathBuf,
}

impl DebuggerOptions {
    pub fn load_config(&self) -> Result<DebuggerConfig, Error> {
        DebuggerConfig::from_file(&self.config_file)
    }
}
