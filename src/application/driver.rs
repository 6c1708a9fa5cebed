use crate::config::{Config, ConfigSource, EngineSettings};
use crate::domain::ports::{ProcessEngine, ProcessEngineBox, ProcessEngineBuilderBox};
use crate::domain::process::{Deployment, DeploymentRequest, ProcessInstance};
use crate::error::{Result, WorkflowError};
use std::fmt;
use tracing::{debug, error};

/// Lifecycle of a single run. `Closed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unstarted,
    Configured,
    Deployed,
    Started,
    Closed,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unstarted => "unstarted",
            Self::Configured => "configured",
            Self::Deployed => "deployed",
            Self::Started => "started",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub deployment: Deployment,
    pub instance: ProcessInstance,
}

/// One-shot driver: configure, deploy, start one instance, close.
///
/// Each step is attempted once and a failure aborts the remaining steps.
/// Once an engine has been built it is closed exactly once, whatever the
/// outcome of the later steps.
pub struct WorkflowApplication {
    source: ConfigSource,
    builder: ProcessEngineBuilderBox,
    print_config: bool,
    state: LifecycleState,
    history: Vec<LifecycleState>,
}

impl WorkflowApplication {
    /// Creates a driver that reads `source` and builds engines with `builder`.
    pub fn new(source: ConfigSource, builder: ProcessEngineBuilderBox) -> Self {
        Self {
            source,
            builder,
            print_config: false,
            state: LifecycleState::Unstarted,
            history: vec![LifecycleState::Unstarted],
        }
    }

    /// Prints the redacted configuration right after it is loaded.
    pub fn with_config_dump(mut self, enabled: bool) -> Self {
        self.print_config = enabled;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Every state visited so far, starting with `Unstarted`.
    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    /// Runs the whole sequence. Meant to be called once per driver.
    pub async fn run(&mut self) -> Result<RunReport> {
        let (settings, engine) = match self.configure().await {
            Ok(configured) => configured,
            Err(e) => return Err(self.fail(e)),
        };
        self.transition(LifecycleState::Configured);

        let outcome = self.deploy_and_start(&*engine, &settings).await;
        close_engine(engine).await;

        match outcome {
            Ok(report) => {
                self.transition(LifecycleState::Closed);
                Ok(report)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn configure(&self) -> Result<(EngineSettings, ProcessEngineBox)> {
        let config = Config::load(&self.source).map_err(WorkflowError::ConfigurationLoad)?;
        if self.print_config {
            config.print_configuration();
        }

        let settings = EngineSettings::from_config(&config).map_err(WorkflowError::Configuration)?;
        let engine = self
            .builder
            .build(&settings)
            .await
            .map_err(WorkflowError::EngineConstruction)?;

        println!("{}", "=".repeat(80));
        println!("Process Engine ({}) created successfully", engine.name());
        println!("{}", "=".repeat(80));
        println!("Process Engine initialized with:");
        println!("  - Database URL: {}", settings.datasource.url);
        println!("  - Schema Update: {}", settings.schema_update);
        println!("  - Max Connections: {}", settings.datasource.max_connections);
        println!("  - Min Idle Connections: {}", settings.datasource.min_idle);
        println!("  - Job Executor Active: {}", settings.job_executor_activate);

        Ok((settings, engine))
    }

    async fn deploy_and_start(
        &mut self,
        engine: &dyn ProcessEngine,
        settings: &EngineSettings,
    ) -> Result<RunReport> {
        println!("Deploying process from: {}", settings.process_resource);
        let deployment = engine
            .deploy(DeploymentRequest::for_resource(&settings.process_resource))
            .await
            .map_err(WorkflowError::Deployment)?;
        self.transition(LifecycleState::Deployed);
        println!("Process deployed successfully!");

        println!(
            "Starting process instance for key: {}",
            settings.process_definition_key
        );
        let instance = engine
            .start_process_instance_by_key(&settings.process_definition_key)
            .await
            .map_err(WorkflowError::InstanceStart)?;
        self.transition(LifecycleState::Started);
        print_instance(&instance);

        Ok(RunReport {
            deployment,
            instance,
        })
    }

    fn transition(&mut self, next: LifecycleState) {
        debug!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, err: WorkflowError) -> WorkflowError {
        error!(state = %self.state, error = %err, "Workflow run failed");
        self.transition(LifecycleState::Failed);
        err
    }
}

/// Releases the engine. Failures are logged and never replace the outcome
/// of the run.
async fn close_engine(engine: ProcessEngineBox) {
    match engine.close().await {
        Ok(()) => println!("Process Engine closed successfully!"),
        Err(e) => {
            let err = WorkflowError::EngineClose(e);
            error!(error = %err, "Error while closing Process Engine");
        }
    }
}

fn print_instance(instance: &ProcessInstance) {
    println!("{}", "-".repeat(80));
    println!("Process Instance Started:");
    println!("  Instance ID: {}", instance.id);
    println!("  Process Definition Key: {}", instance.process_definition_key);
    println!("  Process Definition ID: {}", instance.process_definition_id);
    println!(
        "  Business Key: {}",
        instance.business_key.as_deref().unwrap_or("null")
    );
    println!("  Is Ended: {}", instance.ended);
    println!("  Is Suspended: {}", instance.suspended);
    println!("{}", "-".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryEngineBuilder;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const BPMN: &str = r#"<definitions><process id="simple-process" isExecutable="true"/></definitions>"#;

    fn resources(resource: &str) -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("application.properties"),
            format!(
                "database.jdbc.url=jdbc:postgresql://localhost:5432/camunda\n\
                 database.jdbc.username=camunda\ndatabase.jdbc.password=camunda\n\
                 database.jdbc.driver=org.postgresql.Driver\n\
                 camunda.process.definition.key=simple-process\n\
                 camunda.process.resource={resource}\n"
            ),
        )
        .unwrap();
        fs::write(dir.path().join("p.bpmn"), BPMN).unwrap();
        dir
    }

    fn application(dir: &TempDir) -> WorkflowApplication {
        WorkflowApplication::new(
            ConfigSource::new(dir.path(), ConfigSource::DEFAULT_FILE),
            Box::new(InMemoryEngineBuilder::new(dir.path())),
        )
    }

    #[tokio::test]
    async fn test_successful_run_visits_every_state() {
        let dir = resources("p.bpmn");
        let mut app = application(&dir);

        let report = app.run().await.unwrap();
        assert_eq!(report.instance.process_definition_key, "simple-process");
        assert_eq!(
            app.history(),
            &[
                LifecycleState::Unstarted,
                LifecycleState::Configured,
                LifecycleState::Deployed,
                LifecycleState::Started,
                LifecycleState::Closed,
            ]
        );
        assert!(app.state().is_terminal());
    }

    #[tokio::test]
    async fn test_missing_properties_fails_before_configured() {
        let dir = tempdir().unwrap();
        let mut app = application(&dir);

        let err = app.run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::ConfigurationLoad(_)));
        assert_eq!(
            app.history(),
            &[LifecycleState::Unstarted, LifecycleState::Failed]
        );
    }

    #[tokio::test]
    async fn test_missing_bpmn_fails_after_configured() {
        let dir = resources("missing.bpmn");
        let mut app = application(&dir);

        let err = app.run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Deployment(_)));
        assert_eq!(
            app.history(),
            &[
                LifecycleState::Unstarted,
                LifecycleState::Configured,
                LifecycleState::Failed,
            ]
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LifecycleState::Configured.to_string(), "configured");
        assert!(!LifecycleState::Started.is_terminal());
        assert!(LifecycleState::Failed.is_terminal());
    }
}
