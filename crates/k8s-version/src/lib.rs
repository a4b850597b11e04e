//! This library provides a strongly-typed and validated Kubernetes server
//! version. Only the major and minor components of the version reported by the
//! API server are retained, because patch levels and vendor suffixes (like
//! `-tke.16` or `-gke.1200`) never change which API features are available.
//!
//! ## Usage
//!
//! Versions reported by the discovery endpoint (`GitVersion`) are normalized
//! using [`ClusterVersion::from_git_version`].
//!
//! ```
//! use k8s_version::ClusterVersion;
//!
//! let version = ClusterVersion::from_git_version("v1.20.6-tke.16")
//!     .expect("valid Kubernetes server version");
//!
//! assert_eq!(version.to_string(), "1.20");
//! ```
//!
//! Already normalized versions can be parsed using Rust's standard
//! [`FromStr`](std::str::FromStr) trait. Versions are ordered numerically,
//! component by component.
//!
//! ```
//! use k8s_version::ClusterVersion;
//!
//! let old: ClusterVersion = "1.9".parse().expect("valid Kubernetes server version");
//! let new: ClusterVersion = "v1.10".parse().expect("valid Kubernetes server version");
//!
//! assert!(old < new);
//! ```

mod version;

pub use version::*;
