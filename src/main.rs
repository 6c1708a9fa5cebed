use clap::{Parser, ValueEnum};
use direct_debit_workflow::application::driver::WorkflowApplication;
use direct_debit_workflow::config::ConfigSource;
use direct_debit_workflow::domain::ports::ProcessEngineBuilderBox;
use direct_debit_workflow::infrastructure::in_memory::InMemoryEngineBuilder;
#[cfg(feature = "engine-rest")]
use direct_debit_workflow::infrastructure::rest::RestEngineBuilder;
use miette::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// Standalone engine kept in memory for the duration of the run
    InMemory,
    /// Remote engine reached through its REST API
    Rest,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the properties file and the BPMN resources.
    /// A relative path, including the default, is resolved against the
    /// current working directory.
    #[arg(long, env = "WORKFLOW_RESOURCES", default_value = ConfigSource::DEFAULT_ROOT)]
    resources: PathBuf,

    /// Properties file name, relative to the resource directory
    #[arg(long, default_value = ConfigSource::DEFAULT_FILE)]
    config_file: String,

    /// Process engine backend
    #[arg(long, value_enum, default_value_t = EngineKind::InMemory)]
    engine: EngineKind,

    /// Print the loaded configuration with passwords masked
    #[arg(long)]
    print_config: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn engine_builder(kind: EngineKind, resources: &Path) -> ProcessEngineBuilderBox {
    match kind {
        EngineKind::InMemory => Box::new(InMemoryEngineBuilder::new(resources)),
        #[cfg(feature = "engine-rest")]
        EngineKind::Rest => Box::new(RestEngineBuilder::new(resources)),
        #[cfg(not(feature = "engine-rest"))]
        EngineKind::Rest => {
            eprintln!(
                "WARNING: REST engine requested via --engine rest, but 'engine-rest' feature is not enabled. Falling back to the in-memory engine."
            );
            Box::new(InMemoryEngineBuilder::new(resources))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let source = ConfigSource::new(&cli.resources, cli.config_file);
    let builder = engine_builder(cli.engine, &cli.resources);
    let mut app = WorkflowApplication::new(source, builder).with_config_dump(cli.print_config);

    println!("Starting workflow application...");
    match app.run().await {
        Ok(_) => {
            println!("Application completed successfully!");
            Ok(())
        }
        Err(e) => {
            eprintln!("Application failed: {e}");
            Err(e.into())
        }
    }
}
