use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while reading or interpreting the properties resource.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {name} (looked in {})", path.display())]
    NotFound { name: String, path: PathBuf },
    #[error("Error loading properties file {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Required property '{0}' is missing or blank")]
    MissingProperty(String),
    #[error("Invalid integer value '{value}' for property '{key}'")]
    InvalidNumber { key: String, value: String },
}

/// Failures reported by a process engine adapter.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid engine configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Process engine unavailable: {0}")]
    Unavailable(String),
    #[error("Deployment resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Invalid process definition in {resource}: {reason}")]
    InvalidDefinition { resource: String, reason: String },
    #[error("No process definition deployed with key '{0}'")]
    ProcessDefinitionNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "engine-rest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(feature = "engine-rest")]
    #[error("Engine responded with status {status}: {message}")]
    Remote { status: u16, message: String },
}

/// Fatal and non-fatal outcomes of one workflow run.
///
/// Every variant except `EngineClose` aborts the run and is reported by
/// `main` with a non-zero exit code.
#[derive(Error, Diagnostic, Debug)]
pub enum WorkflowError {
    #[error("Configuration load failed: {0}")]
    #[diagnostic(
        code(workflow::configuration_load),
        help("check --resources and --config-file point at a readable properties file")
    )]
    ConfigurationLoad(#[source] ConfigError),
    #[error("Configuration invalid: {0}")]
    #[diagnostic(code(workflow::configuration))]
    Configuration(#[source] ConfigError),
    #[error("Process Engine initialization failed: {0}")]
    #[diagnostic(code(workflow::engine_construction))]
    EngineConstruction(#[source] EngineError),
    #[error("Process deployment failed: {0}")]
    #[diagnostic(code(workflow::deployment))]
    Deployment(#[source] EngineError),
    #[error("Process instance start failed: {0}")]
    #[diagnostic(code(workflow::instance_start))]
    InstanceStart(#[source] EngineError),
    #[error("Error while closing Process Engine: {0}")]
    #[diagnostic(code(workflow::engine_close), severity(Warning))]
    EngineClose(#[source] EngineError),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
pub type Result<T> = std::result::Result<T, WorkflowError>;
