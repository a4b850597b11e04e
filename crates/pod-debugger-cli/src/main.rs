use clap::Parser;
use pod_debugger::{
    DebugRequest, PodDebugger, client, config::DebuggerOptions, debugger, logging,
};
use snafu::{ResultExt, Snafu};

const APP_NAME: &str = "pod-debugger";
const LOG_ENV: &str = "POD_DEBUGGER_LOG";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize logging"))]
    InitializeLogging { source: logging::Error },

    #[snafu(display("failed to load debugger config"))]
    LoadConfig { source: pod_debugger::config::Error },

    #[snafu(display("failed to create pod debugger"))]
    CreateDebugger { source: client::Error },

    #[snafu(display("failed to add debug container"))]
    AddDebugContainer { source: debugger::Error },
}

/// Adds a debug container to a pod of a project environment.
#[derive(Debug, Parser)]
#[command(name = APP_NAME, version)]
struct Cli {
    #[command(flatten)]
    options: DebuggerOptions,

    #[arg(long)]
    project: String,

    #[arg(long)]
    environment: String,

    #[arg(long)]
    pod: String,

    /// Image of the debug container.
    #[arg(long, default_value = "busybox:latest")]
    image: String,
}

impl Cli {
    fn debug_request(&self) -> DebugRequest {
        DebugRequest {
            project: self.project.clone(),
            environment: self.environment.clone(),
            pod: self.pod.clone(),
            image: self.image.clone(),
        }
    }
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    logging::initialize_logging(LOG_ENV, APP_NAME).context(InitializeLoggingSnafu)?;

    let config = cli.options.load_config().context(LoadConfigSnafu)?;
    let debugger = PodDebugger::from_config(&config).context(CreateDebuggerSnafu)?;

    let result = debugger
        .patch_debug_container(&cli.debug_request())
        .await
        .context(AddDebugContainerSnafu)?;

    tracing::info!(
        pod = %cli.pod,
        container = %result.container_name,
        "Debug container is ready to attach"
    );
    Ok(())
}
