use super::process::{Deployment, DeploymentRequest, ProcessInstance};
use crate::config::EngineSettings;
use crate::error::EngineResult;
use async_trait::async_trait;

/// A running workflow engine.
///
/// The handle is owned by a single caller. `close` is called once, after
/// which the handle is dropped.
#[async_trait]
pub trait ProcessEngine: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;
    async fn deploy(&self, request: DeploymentRequest) -> EngineResult<Deployment>;
    async fn start_process_instance_by_key(&self, key: &str) -> EngineResult<ProcessInstance>;
    async fn close(&self) -> EngineResult<()>;
}

/// Constructs an engine from typed settings.
#[async_trait]
pub trait ProcessEngineBuilder: Send + Sync {
    async fn build(&self, settings: &EngineSettings) -> EngineResult<ProcessEngineBox>;
}

pub type ProcessEngineBox = Box<dyn ProcessEngine>;
pub type ProcessEngineBuilderBox = Box<dyn ProcessEngineBuilder>;
