use super::{Config, REDACTED};
use crate::error::ConfigError;
use std::fmt;
use tracing::warn;

/// Property keys recognised by the engine bootstrap.
pub mod keys {
    pub const JDBC_URL: &str = "database.jdbc.url";
    pub const JDBC_USERNAME: &str = "database.jdbc.username";
    pub const JDBC_PASSWORD: &str = "database.jdbc.password";
    pub const JDBC_DRIVER: &str = "database.jdbc.driver";
    pub const SCHEMA_UPDATE: &str = "camunda.schema.update";
    pub const JOB_EXECUTOR_ACTIVATE: &str = "camunda.job.executor.activate";
    pub const PROCESS_DEFINITION_KEY: &str = "camunda.process.definition.key";
    pub const PROCESS_RESOURCE: &str = "camunda.process.resource";
    pub const POOL_MAX: &str = "database.connection.pool.max";
    pub const POOL_MIN: &str = "database.connection.pool.min";
    pub const REST_URL: &str = "camunda.engine.rest.url";
    pub const REST_TIMEOUT_SECONDS: &str = "camunda.engine.rest.timeout.seconds";
}

pub const DEFAULT_POOL_MAX: u32 = 10;
pub const DEFAULT_POOL_MIN: u32 = 2;
pub const DEFAULT_REST_TIMEOUT_SECONDS: u64 = 30;

/// Whether the engine may create or migrate its schema on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaUpdate {
    True,
    False,
}

impl SchemaUpdate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
        }
    }
}

impl From<bool> for SchemaUpdate {
    fn from(enabled: bool) -> Self {
        if enabled { Self::True } else { Self::False }
    }
}

impl fmt::Display for SchemaUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection parameters handed to the engine's persistence layer.
#[derive(Clone, PartialEq, Eq)]
pub struct DataSourceSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub driver: String,
    /// Upper bound of active connections.
    pub max_connections: u32,
    /// Connections kept idle in the pool.
    pub min_idle: u32,
}

impl fmt::Debug for DataSourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("driver", &self.driver)
            .field("max_connections", &self.max_connections)
            .field("min_idle", &self.min_idle)
            .finish()
    }
}

/// Everything needed to build an engine, deploy and start one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub datasource: DataSourceSettings,
    pub schema_update: SchemaUpdate,
    pub job_executor_activate: bool,
    pub process_definition_key: String,
    pub process_resource: String,
    pub rest_url: Option<String>,
    pub rest_timeout_secs: u64,
}

impl EngineSettings {
    /// Reads the typed settings, failing on the first missing required key.
    ///
    /// Datasource coordinates, credentials, the definition key and the
    /// process resource are required. Flags and pool bounds fall back to
    /// their documented defaults.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let datasource = DataSourceSettings {
            url: config.require(keys::JDBC_URL)?.to_string(),
            username: config.require(keys::JDBC_USERNAME)?.to_string(),
            password: config.require(keys::JDBC_PASSWORD)?.to_string(),
            driver: config.require(keys::JDBC_DRIVER)?.to_string(),
            max_connections: pool_bound(config, keys::POOL_MAX, DEFAULT_POOL_MAX),
            min_idle: pool_bound(config, keys::POOL_MIN, DEFAULT_POOL_MIN),
        };

        let rest_timeout_secs = match config.get_int(keys::REST_TIMEOUT_SECONDS, -1) {
            secs if secs > 0 => secs as u64,
            _ => DEFAULT_REST_TIMEOUT_SECONDS,
        };

        Ok(Self {
            datasource,
            schema_update: config.get_bool(keys::SCHEMA_UPDATE, true).into(),
            job_executor_activate: config.get_bool(keys::JOB_EXECUTOR_ACTIVATE, true),
            process_definition_key: config.require(keys::PROCESS_DEFINITION_KEY)?.trim().to_string(),
            process_resource: config.require(keys::PROCESS_RESOURCE)?.trim().to_string(),
            rest_url: config
                .get_string(keys::REST_URL)
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            rest_timeout_secs,
        })
    }
}

fn pool_bound(config: &Config, key: &str, default: u32) -> u32 {
    let value = config.get_int(key, default as i32);
    u32::try_from(value).unwrap_or_else(|_| {
        warn!(key, value, default, "Negative pool size, using default");
        default
    })
}
