use std::{cmp::Ordering, fmt::Display, num::ParseIntError, str::FromStr, sync::LazyLock};

use regex::Regex;
use snafu::{OptionExt, ResultExt, Snafu};

static CLUSTER_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(?P<major>\d+)\.(?P<minor>\d+)$")
        .expect("failed to compile cluster version regex")
});

/// Error variants which can be encountered when creating a new
/// [`ClusterVersion`] from unparsed input.
#[derive(Debug, PartialEq, Snafu)]
pub enum ParseClusterVersionError {
    #[snafu(display(
        "invalid server version format {input:?}, expected at least two dot-separated components"
    ))]
    TooFewSegments { input: String },

    #[snafu(display("invalid server version format {input:?}, expected <MAJOR>.<MINOR>"))]
    InvalidFormat { input: String },

    #[snafu(display("failed to parse major version"))]
    ParseMajor { source: ParseIntError },

    #[snafu(display("failed to parse minor version"))]
    ParseMinor { source: ParseIntError },
}

/// The version of a Kubernetes API server, reduced to `<MAJOR>.<MINOR>`.
///
/// The API server reports its version via the `/version` discovery endpoint,
/// for example `v1.23.3` or `v1.20.6-tke.16`. Patch levels and vendor
/// suffixes are thrown away, as only the minor release decides which API
/// shapes a server offers.
///
/// Versions are compared numerically per component, so `1.9` sorts before
/// `1.10`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ClusterVersion {
    pub major: u64,
    pub minor: u64,
}

impl FromStr for ClusterVersion {
    type Err = ParseClusterVersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let captures = CLUSTER_VERSION_REGEX
            .captures(input)
            .context(InvalidFormatSnafu { input })?;

        let major = captures
            .name("major")
            .expect("internal error: check that the correct match label is specified")
            .as_str()
            .parse::<u64>()
            .context(ParseMajorSnafu)?;

        let minor = captures
            .name("minor")
            .expect("internal error: check that the correct match label is specified")
            .as_str()
            .parse::<u64>()
            .context(ParseMinorSnafu)?;

        Ok(Self { major, minor })
    }
}

impl PartialOrd for ClusterVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClusterVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }

        self.minor.cmp(&other.minor)
    }
}

impl Display for ClusterVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{major}.{minor}", major = self.major, minor = self.minor)
    }
}

impl ClusterVersion {
    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    /// Normalizes a raw server version as reported in the `gitVersion` field
    /// of the `/version` endpoint.
    ///
    /// The input is split on `.` and only the first two components are kept.
    /// Inputs with less than two components are rejected, empty components fail
    /// the format check.
    pub fn from_git_version(git_version: &str) -> Result<Self, ParseClusterVersionError> {
        let mut segments = git_version.split('.');

        let (Some(major), Some(minor)) = (segments.next(), segments.next()) else {
            return TooFewSegmentsSnafu { input: git_version }.fail();
        };

        format!("{major}.{minor}").parse()
    }
}
