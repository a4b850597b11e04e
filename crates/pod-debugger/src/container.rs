use k8s_openapi::api::core::v1::EphemeralContainer;

/// Name of the injected debug container.
///
/// Tooling which attaches to the container afterwards (for example a terminal
/// session) relies on this name to find it.
pub const DEBUG_CONTAINER_NAME: &str = "zadig-debug";

/// Command of the debug container, which keeps it running without doing any
/// work.
pub const DEBUG_CONTAINER_COMMAND: [&str; 3] = ["tail", "-f", "/dev/null"];

const IMAGE_PULL_POLICY_ALWAYS: &str = "Always";
const TERMINATION_MESSAGE_FALLBACK_TO_LOGS_ON_ERROR: &str = "FallbackToLogsOnError";

/// The ephemeral container which gets injected into a pod.
///
/// Only the image is chosen by the caller. The name, command, image pull
/// policy and termination message policy are always the same. The image
/// reference is not validated, the cluster reports pull failures on the
/// container status instead.
#[derive(Clone, Debug)]
pub struct DebugContainerSpec {
    container: EphemeralContainer,
}

impl DebugContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            container: EphemeralContainer {
                name: DEBUG_CONTAINER_NAME.to_owned(),
                image: Some(image.into()),
                command: Some(DEBUG_CONTAINER_COMMAND.map(String::from).to_vec()),
                image_pull_policy: Some(IMAGE_PULL_POLICY_ALWAYS.to_owned()),
                termination_message_policy: Some(
                    TERMINATION_MESSAGE_FALLBACK_TO_LOGS_ON_ERROR.to_owned(),
                ),
                ..EphemeralContainer::default()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.container.name
    }

    pub fn as_ephemeral_container(&self) -> &EphemeralContainer {
        &self.container
    }
}

impl From<DebugContainerSpec> for EphemeralContainer {
    fn from(spec: DebugContainerSpec) -> Self {
        spec.container
    }
}
