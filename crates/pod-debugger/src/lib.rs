//! Injects ephemeral debug containers into running pods.
//!
//! The debug container runs next to the application containers of a pod,
//! sharing its network and (depending on the runtime) process namespace. It is
//! added through the `ephemeralcontainers` subresource, whose patch protocol
//! depends on the Kubernetes version of the cluster. This crate probes the
//! version on every call and picks the matching [`PatchStrategy`].
//!
//! ```no_run
//! use pod_debugger::{DebugRequest, PodDebugger, config::DebuggerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DebuggerConfig::from_file("/etc/pod-debugger/config.yaml")?;
//! let debugger = PodDebugger::from_config(&config)?;
//!
//! let result = debugger
//!     .patch_debug_container(&DebugRequest {
//!         project: "shop".to_owned(),
//!         environment: "dev".to_owned(),
//!         pod: "web-0".to_owned(),
//!         image: "busybox:latest".to_owned(),
//!     })
//!     .await?;
//! println!("added {}", result.container_name);
//! # Ok(())
//! # }
//! ```
//!
//! Callers which already hold a [`kube::Client`] can use [`debug_pod`]
//! directly.

pub mod client;
pub mod config;
pub mod container;
pub mod debugger;
pub mod environment;
pub mod logging;
pub mod patch;
pub mod version;

pub use client::{ClusterClientProvider, KubeconfigClientProvider};
pub use container::{DEBUG_CONTAINER_NAME, DebugContainerSpec};
pub use debugger::{DebugRequest, Error, PodDebugger, debug_pod};
pub use environment::{EnvironmentLocation, EnvironmentRegistry, StaticEnvironmentRegistry};
pub use patch::{PatchResult, PatchStrategy, STRATEGIC_MERGE_THRESHOLD};

// External re-exports
pub use k8s_openapi;
pub use k8s_version;
pub use kube;
pub use strategic_merge;

/// Error type of the collaborators plugged into a [`PodDebugger`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
