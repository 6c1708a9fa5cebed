use std::path::Path;

/// A single deployment unit: one classpath-style resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub name: String,
    pub resource: String,
}

impl DeploymentRequest {
    /// Names the deployment after the resource's file stem.
    pub fn for_resource(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        let name = Path::new(&resource)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("deployment")
            .to_string();
        Self { name, resource }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDefinition {
    pub id: String,
    pub key: String,
    pub version: u32,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub id: String,
    pub name: String,
    pub process_definitions: Vec<ProcessDefinition>,
}

/// Descriptor of a started process instance as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInstance {
    pub id: String,
    pub process_definition_key: String,
    pub process_definition_id: String,
    pub business_key: Option<String>,
    pub ended: bool,
    pub suspended: bool,
}
