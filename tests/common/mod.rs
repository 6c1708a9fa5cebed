#![allow(dead_code)]

use async_trait::async_trait;
use direct_debit_workflow::config::EngineSettings;
use direct_debit_workflow::domain::ports::{ProcessEngine, ProcessEngineBox, ProcessEngineBuilder};
use direct_debit_workflow::domain::process::{Deployment, DeploymentRequest, ProcessInstance};
use direct_debit_workflow::error::{EngineError, EngineResult};
use direct_debit_workflow::infrastructure::in_memory::InMemoryEngineBuilder;
use std::fs;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const BPMN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="defs">
  <bpmn:process id="simple-process" isExecutable="true">
    <bpmn:startEvent id="start" />
  </bpmn:process>
</bpmn:definitions>
"#;

/// Writes `application.properties` and `p.bpmn` into `dir`.
pub fn write_resources(dir: &Path, process_resource: &str) -> Result<(), Error> {
    fs::write(
        dir.join("application.properties"),
        format!(
            "database.jdbc.url=jdbc:postgresql://localhost:5432/camunda\n\
             database.jdbc.username=camunda\n\
             database.jdbc.password=top-secret\n\
             database.jdbc.driver=org.postgresql.Driver\n\
             camunda.process.definition.key=simple-process\n\
             camunda.process.resource={process_resource}\n"
        ),
    )?;
    fs::write(dir.join("p.bpmn"), BPMN)?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct Calls {
    pub build: AtomicUsize,
    pub deploy: AtomicUsize,
    pub start: AtomicUsize,
    pub close: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Wraps the in-memory engine and counts every port call.
pub struct RecordingEngineBuilder {
    inner: InMemoryEngineBuilder,
    pub calls: Arc<Calls>,
    pub fail_start: bool,
    pub fail_close: bool,
}

impl RecordingEngineBuilder {
    pub fn new(resource_root: &Path) -> Self {
        Self {
            inner: InMemoryEngineBuilder::new(resource_root),
            calls: Arc::default(),
            fail_start: false,
            fail_close: false,
        }
    }
}

#[async_trait]
impl ProcessEngineBuilder for RecordingEngineBuilder {
    async fn build(&self, settings: &EngineSettings) -> EngineResult<ProcessEngineBox> {
        self.calls.build.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.build(settings).await?;
        Ok(Box::new(RecordingEngine {
            inner,
            calls: Arc::clone(&self.calls),
            fail_start: self.fail_start,
            fail_close: self.fail_close,
        }))
    }
}

struct RecordingEngine {
    inner: ProcessEngineBox,
    calls: Arc<Calls>,
    fail_start: bool,
    fail_close: bool,
}

#[async_trait]
impl ProcessEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deploy(&self, request: DeploymentRequest) -> EngineResult<Deployment> {
        self.calls.deploy.fetch_add(1, Ordering::SeqCst);
        self.inner.deploy(request).await
    }

    async fn start_process_instance_by_key(&self, key: &str) -> EngineResult<ProcessInstance> {
        self.calls.start.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(EngineError::Unavailable("start refused".to_string()));
        }
        self.inner.start_process_instance_by_key(key).await
    }

    async fn close(&self) -> EngineResult<()> {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(EngineError::Unavailable("close refused".to_string()));
        }
        self.inner.close().await
    }
}
