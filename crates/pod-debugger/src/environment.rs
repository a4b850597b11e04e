use std::collections::BTreeMap;

use async_trait::async_trait;
use snafu::{OptionExt, Snafu};

use crate::{BoxError, config::EnvironmentConfig};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("environment {environment:?} of project {project:?} is not registered"))]
    UnknownEnvironment {
        project: String,
        environment: String,
    },
}

/// The cluster and namespace an environment is deployed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentLocation {
    pub cluster_id: String,
    pub namespace: String,
}

/// Resolves a logical environment of a project to where it runs.
#[async_trait]
pub trait EnvironmentRegistry: Send + Sync {
    async fn locate(
        &self,
        project: &str,
        environment: &str,
    ) -> Result<EnvironmentLocation, BoxError>;
}

/// An [`EnvironmentRegistry`] backed by a fixed list of environments, usually
/// taken from the [`DebuggerConfig`](crate::config::DebuggerConfig).
#[derive(Clone, Debug, Default)]
pub struct StaticEnvironmentRegistry {
    environments: BTreeMap<(String, String), EnvironmentLocation>,
}

impl StaticEnvironmentRegistry {
    pub fn new(environments: impl IntoIterator<Item = EnvironmentConfig>) -> Self {
        let environments = environments
            .into_iter()
            .map(|environment| {
                (
                    (environment.project, environment.environment),
                    EnvironmentLocation {
                        cluster_id: environment.cluster_id,
                        namespace: environment.namespace,
                    },
                )
            })
            .collect();

        Self { environments }
    }

    fn get(&self, project: &str, environment: &str) -> Result<&EnvironmentLocation, Error> {
        self.environments
            .get(&(project.to_owned(), environment.to_owned()))
            .context(UnknownEnvironmentSnafu {
                project,
                environment,
            })
    }
}

#[async_trait]
impl EnvironmentRegistry for StaticEnvironmentRegistry {
    async fn locate(
        &self,
        project: &str,
        environment: &str,
    ) -> Result<EnvironmentLocation, BoxError> {
        Ok(self.get(project, environment)?.clone())
    }
}
