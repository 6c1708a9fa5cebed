use crate::config::{DataSourceSettings, EngineSettings};
use crate::domain::ports::{ProcessEngine, ProcessEngineBox, ProcessEngineBuilder};
use crate::domain::process::{Deployment, DeploymentRequest, ProcessDefinition, ProcessInstance};
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

const POSTGRES_URL_PREFIX: &str = "jdbc:postgresql:";

/// Builds [`InMemoryProcessEngine`] handles that resolve deployment
/// resources under a fixed resource root.
#[derive(Debug, Clone)]
pub struct InMemoryEngineBuilder {
    resource_root: PathBuf,
}

impl InMemoryEngineBuilder {
    pub fn new(resource_root: impl Into<PathBuf>) -> Self {
        Self {
            resource_root: resource_root.into(),
        }
    }
}

#[async_trait]
impl ProcessEngineBuilder for InMemoryEngineBuilder {
    async fn build(&self, settings: &EngineSettings) -> EngineResult<ProcessEngineBox> {
        validate_datasource(&settings.datasource)?;
        info!(
            url = %settings.datasource.url,
            driver = %settings.datasource.driver,
            schema_update = %settings.schema_update,
            max_connections = settings.datasource.max_connections,
            min_idle = settings.datasource.min_idle,
            job_executor = settings.job_executor_activate,
            "Building in-memory process engine"
        );
        Ok(Box::new(InMemoryProcessEngine::new(&self.resource_root)))
    }
}

fn validate_datasource(datasource: &DataSourceSettings) -> EngineResult<()> {
    if !datasource.url.starts_with(POSTGRES_URL_PREFIX) {
        return Err(EngineError::InvalidConfiguration(format!(
            "expected a {POSTGRES_URL_PREFIX} URL, got '{}'",
            datasource.url
        )));
    }
    if datasource.min_idle > datasource.max_connections {
        return Err(EngineError::InvalidConfiguration(format!(
            "pool minimum {} exceeds maximum {}",
            datasource.min_idle, datasource.max_connections
        )));
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Registry {
    deployments: Vec<Deployment>,
    /// Definition versions per key, oldest first.
    definitions: HashMap<String, Vec<ProcessDefinition>>,
    instances: HashMap<String, ProcessInstance>,
}

/// A standalone engine that keeps deployments and instances in memory.
///
/// Deployment registers every executable `process` element of the BPMN
/// resource as a new definition version. Started instances stay active;
/// nothing is executed. Ideal for dry runs and tests where no engine server
/// is available.
#[derive(Debug, Clone)]
pub struct InMemoryProcessEngine {
    resource_root: PathBuf,
    registry: Arc<RwLock<Registry>>,
}

impl InMemoryProcessEngine {
    pub fn new(resource_root: impl Into<PathBuf>) -> Self {
        Self {
            resource_root: resource_root.into(),
            registry: Arc::default(),
        }
    }

    /// Latest deployed version of every definition key.
    pub async fn latest_definitions(&self) -> Vec<ProcessDefinition> {
        let registry = self.registry.read().await;
        let mut latest: Vec<_> = registry
            .definitions
            .values()
            .filter_map(|versions| versions.last().cloned())
            .collect();
        latest.sort_by(|a, b| a.key.cmp(&b.key));
        latest
    }

    pub async fn instance(&self, id: &str) -> Option<ProcessInstance> {
        self.registry.read().await.instances.get(id).cloned()
    }

    pub async fn deployment_count(&self) -> usize {
        self.registry.read().await.deployments.len()
    }

    fn resolve(&self, resource: &str) -> PathBuf {
        self.resource_root.join(resource.trim_start_matches('/'))
    }
}

#[async_trait]
impl ProcessEngine for InMemoryProcessEngine {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn deploy(&self, request: DeploymentRequest) -> EngineResult<Deployment> {
        let xml = read_resource(&self.resolve(&request.resource), &request.resource).await?;
        let keys = executable_process_ids(&xml).map_err(|e| EngineError::InvalidDefinition {
            resource: request.resource.clone(),
            reason: e.to_string(),
        })?;
        if keys.is_empty() {
            return Err(EngineError::InvalidDefinition {
                resource: request.resource,
                reason: "no executable process found".to_string(),
            });
        }

        let mut registry = self.registry.write().await;
        let mut process_definitions = Vec::with_capacity(keys.len());
        for key in keys {
            let versions = registry.definitions.entry(key.clone()).or_default();
            let version = versions.len() as u32 + 1;
            let definition = ProcessDefinition {
                id: format!("{key}:{version}:{}", Uuid::new_v4()),
                key,
                version,
                resource: request.resource.clone(),
            };
            versions.push(definition.clone());
            process_definitions.push(definition);
        }

        let deployment = Deployment {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            process_definitions,
        };
        registry.deployments.push(deployment.clone());
        debug!(deployment = %deployment.id, "Deployment registered");
        Ok(deployment)
    }

    async fn start_process_instance_by_key(&self, key: &str) -> EngineResult<ProcessInstance> {
        let mut registry = self.registry.write().await;
        let definition = registry
            .definitions
            .get(key)
            .and_then(|versions| versions.last())
            .ok_or_else(|| EngineError::ProcessDefinitionNotFound(key.to_string()))?;

        let instance = ProcessInstance {
            id: Uuid::new_v4().to_string(),
            process_definition_key: definition.key.clone(),
            process_definition_id: definition.id.clone(),
            business_key: None,
            ended: false,
            suspended: false,
        };
        registry.instances.insert(instance.id.clone(), instance.clone());
        Ok(instance)
    }

    async fn close(&self) -> EngineResult<()> {
        let mut registry = self.registry.write().await;
        info!(
            deployments = registry.deployments.len(),
            instances = registry.instances.len(),
            "Closing in-memory process engine"
        );
        *registry = Registry::default();
        Ok(())
    }
}

async fn read_resource(path: &Path, resource: &str) -> EngineResult<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(EngineError::ResourceNotFound(resource.to_string()))
        }
        Err(e) => Err(EngineError::Io(e)),
    }
}

/// Ids of the `process` elements not marked `isExecutable="false"`.
fn executable_process_ids(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"process" =>
            {
                let executable = match element.try_get_attribute("isExecutable")? {
                    Some(attr) => !attr.unescape_value()?.eq_ignore_ascii_case("false"),
                    None => true,
                };
                if executable && let Some(id) = element.try_get_attribute("id")? {
                    ids.push(id.unescape_value()?.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}
