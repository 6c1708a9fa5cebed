//! Configuration loading.
//!
//! `Config` is read once from a properties resource at startup and then
//! passed by reference to whoever needs it. It is never mutated after load.
//! `EngineSettings` is the typed view of the keys the engine bootstrap uses.

pub mod properties;
pub mod settings;

pub use settings::{DataSourceSettings, EngineSettings, SchemaUpdate};

use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Placeholder printed instead of sensitive values.
pub const REDACTED: &str = "********";

/// Location of the properties resource: a resource root plus a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    root: PathBuf,
    name: String,
}

impl ConfigSource {
    pub const DEFAULT_ROOT: &'static str = "resources";
    pub const DEFAULT_FILE: &'static str = "application.properties";

    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(&self.name)
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROOT, Self::DEFAULT_FILE)
    }
}

/// Immutable key/value settings with typed accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    name: String,
    entries: BTreeMap<String, String>,
}

impl Config {
    /// Reads and parses the resource described by `source`.
    ///
    /// A missing or unreadable resource is fatal for the caller; there is no
    /// fallback to built-in defaults.
    pub fn load(source: &ConfigSource) -> Result<Self, ConfigError> {
        let path = source.path();
        let text = match fs::read(&path) {
            Ok(bytes) => decode_latin1(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!(resource = %path.display(), "Unable to find {}", source.name());
                return Err(ConfigError::NotFound {
                    name: source.name().to_string(),
                    path,
                });
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    name: source.name().to_string(),
                    source: e,
                });
            }
        };

        let config = Self::parse(source.name(), &text);
        println!("Configuration loaded successfully from {}", source.name());
        Ok(config)
    }

    /// Builds a configuration from properties text held in memory.
    pub fn parse(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            entries: properties::parse(text),
        }
    }

    /// Name of the resource this configuration was read from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_string_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_string(key).unwrap_or(default)
    }

    /// Parses `key` as an integer.
    ///
    /// Absent keys yield `default`. Malformed values are logged and also
    /// yield `default`; they never abort startup.
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.try_int(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!(error = %e, default, "Invalid integer property, using default");
                default
            }
        }
    }

    fn try_int(&self, key: &str) -> Result<Option<i32>, ConfigError> {
        let Some(raw) = self.get_string(key) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                key: key.to_string(),
                value: raw.to_string(),
            })
    }

    /// Parses `key` as a boolean: only `true` (any case) is true.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_string(key)
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the value of a mandatory key, failing when absent or blank.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        match self.get_string(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingProperty(key.to_string())),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders every entry for diagnostics, masking password values.
    pub fn dump(&self) -> String {
        let ruler = "=".repeat(80);
        let mut lines = Vec::with_capacity(self.entries.len() + 4);
        lines.push(ruler.clone());
        lines.push("Loaded Configuration:".to_string());
        lines.push(ruler.clone());
        for (key, value) in &self.entries {
            let shown = if is_sensitive(key) { REDACTED } else { value };
            lines.push(format!("  {key} = {shown}"));
        }
        lines.push(ruler);
        lines.join("\n")
    }

    pub fn print_configuration(&self) {
        println!("{}", self.dump());
    }
}

/// Properties files are ISO-8859-1; every byte maps to the same code point.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn is_sensitive(key: &str) -> bool {
    key.to_lowercase().contains("password")
}
