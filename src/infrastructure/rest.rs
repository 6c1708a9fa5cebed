use crate::config::EngineSettings;
use crate::domain::ports::{ProcessEngine, ProcessEngineBox, ProcessEngineBuilder};
use crate::domain::process::{Deployment, DeploymentRequest, ProcessDefinition, ProcessInstance};
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DEPLOYMENT_SOURCE: &str = "direct-debit-workflow";

/// Builds [`RestProcessEngine`] handles for a remote engine.
///
/// The remote engine owns its datasource; the local datasource settings are
/// only reported. The BPMN resource is still read from the local resource
/// root and uploaded.
#[derive(Debug, Clone)]
pub struct RestEngineBuilder {
    resource_root: PathBuf,
}

impl RestEngineBuilder {
    pub fn new(resource_root: impl Into<PathBuf>) -> Self {
        Self {
            resource_root: resource_root.into(),
        }
    }
}

#[async_trait]
impl ProcessEngineBuilder for RestEngineBuilder {
    async fn build(&self, settings: &EngineSettings) -> EngineResult<ProcessEngineBox> {
        let base_url = settings.rest_url.clone().ok_or_else(|| {
            EngineError::InvalidConfiguration(
                "camunda.engine.rest.url is required for the REST engine".to_string(),
            )
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.rest_timeout_secs))
            .build()?;

        let response = client.get(format!("{base_url}/engine")).send().await?;
        if !response.status().is_success() {
            return Err(EngineError::Unavailable(format!(
                "{base_url}/engine answered {}",
                response.status()
            )));
        }

        info!(
            endpoint = %base_url,
            datasource = %settings.datasource.url,
            "Connected to remote process engine"
        );
        Ok(Box::new(RestProcessEngine {
            client,
            base_url,
            resource_root: self.resource_root.clone(),
        }))
    }
}

/// A process engine reached through its REST API.
#[derive(Debug, Clone)]
pub struct RestProcessEngine {
    client: Client,
    base_url: String,
    resource_root: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentDto {
    id: String,
    name: Option<String>,
    #[serde(default)]
    deployed_process_definitions: Option<HashMap<String, ProcessDefinitionDto>>,
}

#[derive(Debug, Deserialize)]
struct ProcessDefinitionDto {
    id: String,
    key: String,
    version: u32,
    resource: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessInstanceDto {
    id: String,
    definition_id: String,
    business_key: Option<String>,
    #[serde(default)]
    ended: bool,
    #[serde(default)]
    suspended: bool,
}

impl DeploymentDto {
    fn into_deployment(self, request: &DeploymentRequest) -> Deployment {
        let mut process_definitions: Vec<_> = self
            .deployed_process_definitions
            .unwrap_or_default()
            .into_values()
            .map(|definition| ProcessDefinition {
                id: definition.id,
                key: definition.key,
                version: definition.version,
                resource: definition.resource.unwrap_or_else(|| request.resource.clone()),
            })
            .collect();
        process_definitions.sort_by(|a, b| a.key.cmp(&b.key));

        Deployment {
            id: self.id,
            name: self.name.unwrap_or_else(|| request.name.clone()),
            process_definitions,
        }
    }
}

impl ProcessInstanceDto {
    fn into_instance(self, key: &str) -> ProcessInstance {
        ProcessInstance {
            id: self.id,
            process_definition_key: key.to_string(),
            process_definition_id: self.definition_id,
            business_key: self.business_key,
            ended: self.ended,
            suspended: self.suspended,
        }
    }
}

#[async_trait]
impl ProcessEngine for RestProcessEngine {
    fn name(&self) -> &str {
        "rest"
    }

    async fn deploy(&self, request: DeploymentRequest) -> EngineResult<Deployment> {
        let path = self.resource_root.join(request.resource.trim_start_matches('/'));
        let bytes = read_resource(&path, &request.resource).await?;
        let file_name = Path::new(&request.resource)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&request.resource)
            .to_string();

        let form = Form::new()
            .text("deployment-name", request.name.clone())
            .text("deployment-source", DEPLOYMENT_SOURCE)
            .part(file_name.clone(), Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(format!("{}/deployment/create", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let dto: DeploymentDto = check(response).await?.json().await?;
        debug!(deployment = %dto.id, "Deployment created");
        Ok(dto.into_deployment(&request))
    }

    async fn start_process_instance_by_key(&self, key: &str) -> EngineResult<ProcessInstance> {
        let response = self
            .client
            .post(format!("{}/process-definition/key/{key}/start", self.base_url))
            .json(&json!({}))
            .send()
            .await?;
        let dto: ProcessInstanceDto = check(response).await?.json().await?;
        Ok(dto.into_instance(key))
    }

    async fn close(&self) -> EngineResult<()> {
        debug!(endpoint = %self.base_url, "Releasing REST engine client");
        Ok(())
    }
}

async fn read_resource(path: &Path, resource: &str) -> EngineResult<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(EngineError::ResourceNotFound(resource.to_string()))
        }
        Err(e) => Err(EngineError::Io(e)),
    }
}

async fn check(response: Response) -> EngineResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(EngineError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_response_mapping() {
        let body = r#"{
            "id": "dep-1",
            "name": "simple-process",
            "source": "direct-debit-workflow",
            "deploymentTime": "2024-01-01T00:00:00.000+0000",
            "deployedProcessDefinitions": {
                "simple-process:1:abc": {
                    "id": "simple-process:1:abc",
                    "key": "simple-process",
                    "version": 1,
                    "resource": "simple-process.bpmn"
                }
            }
        }"#;
        let dto: DeploymentDto = serde_json::from_str(body).unwrap();
        let request = DeploymentRequest::for_resource("simple-process.bpmn");
        let deployment = dto.into_deployment(&request);

        assert_eq!(deployment.id, "dep-1");
        assert_eq!(deployment.process_definitions.len(), 1);
        assert_eq!(deployment.process_definitions[0].key, "simple-process");
    }

    #[test]
    fn test_deployment_response_without_definitions() {
        let dto: DeploymentDto =
            serde_json::from_str(r#"{"id":"dep-2","name":null,"deployedProcessDefinitions":null}"#)
                .unwrap();
        let request = DeploymentRequest::for_resource("p.bpmn");
        let deployment = dto.into_deployment(&request);
        assert_eq!(deployment.name, "p");
        assert!(deployment.process_definitions.is_empty());
    }

    #[test]
    fn test_instance_response_mapping() {
        let body = r#"{
            "id": "inst-1",
            "definitionId": "simple-process:1:abc",
            "businessKey": null,
            "caseInstanceId": null,
            "ended": false,
            "suspended": false,
            "tenantId": null,
            "links": []
        }"#;
        let dto: ProcessInstanceDto = serde_json::from_str(body).unwrap();
        let instance = dto.into_instance("simple-process");

        assert_eq!(instance.id, "inst-1");
        assert_eq!(instance.process_definition_key, "simple-process");
        assert_eq!(instance.process_definition_id, "simple-process:1:abc");
        assert_eq!(instance.business_key, None);
        assert!(!instance.ended);
    }

    #[tokio::test]
    async fn test_builder_requires_endpoint() {
        let text = "database.jdbc.url=jdbc:postgresql://localhost/camunda\n\
                    database.jdbc.username=u\ndatabase.jdbc.password=p\n\
                    database.jdbc.driver=org.postgresql.Driver\n\
                    camunda.process.definition.key=k\ncamunda.process.resource=r.bpmn\n";
        let settings =
            EngineSettings::from_config(&crate::config::Config::parse("test", text)).unwrap();
        let result = RestEngineBuilder::new(".").build(&settings).await;
        assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
    }
}
