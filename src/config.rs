//! Instance configuration loaded from `~/.dbtop`.
//!
//! ```yaml
//! instances:
//!   prod-pg:
//!     type: postgres
//!     host: db.example.com
//!     port: 5432
//!     username: monitor
//!     password: secret
//!     database: app
//!     ssl_mode: require
//!     refresh_interval: 2s
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::util::parse_duration;

/// Default file name inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".dbtop";

/// Refresh interval used when an instance does not set one.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

/// Lowest refresh interval accepted anywhere in the program.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file does not exist.
    NotFound(PathBuf),
    /// File exists but could not be read.
    Read { path: PathBuf, message: String },
    /// YAML syntax or schema error.
    Parse { line: usize, message: String },
    /// Semantically invalid instance entry.
    Invalid { instance: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "configuration file not found: {}", path.display())
            }
            ConfigError::Read { path, message } => {
                write!(f, "failed to read {}: {}", path.display(), message)
            }
            ConfigError::Parse { line, message } => {
                write!(f, "configuration error at line {}: {}", line, message)
            }
            ConfigError::Invalid { instance, message } => {
                write!(f, "instance '{}': {}", instance, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Why no instance could be picked from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// The configuration has no instances.
    Empty,
    /// No name given and several instances are configured.
    Ambiguous(Vec<String>),
    /// The named instance is not configured.
    Unknown { name: String, available: Vec<String> },
}

impl SelectError {
    /// Configured instance names, sorted.
    pub fn available(&self) -> &[String] {
        match self {
            SelectError::Empty => &[],
            SelectError::Ambiguous(available) => available,
            SelectError::Unknown { available, .. } => available,
        }
    }
}

impl std::fmt::Display for SelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectError::Empty => write!(f, "no instances configured"),
            SelectError::Ambiguous(_) => {
                write!(f, "multiple instances configured, please specify one")
            }
            SelectError::Unknown { name, .. } => write!(f, "instance '{}' not found", name),
        }
    }
}

impl std::error::Error for SelectError {}

/// One monitored database instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstanceConfig {
    /// Engine type key (`postgres`, `postgresql`, `mysql`, `mariadb`, `oracle`).
    #[serde(rename = "type")]
    pub engine: String,

    #[serde(default = "default_host")]
    pub host: String,

    /// Port; `None` means the engine's default port.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Database (schema for Oracle) filter. Empty monitors everything.
    #[serde(default)]
    pub database: String,

    /// Postgres `sslmode`.
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,

    #[serde(
        default = "default_refresh_interval",
        deserialize_with = "deserialize_interval"
    )]
    pub refresh_interval: Duration,

    /// Engine-specific extras, passed through untouched.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

/// Accepts `2s`/`500ms` strings or a bare integer of milliseconds.
fn deserialize_interval<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Millis(ms) => Ok(Duration::from_millis(ms)),
        Raw::Text(s) => parse_duration(&s).map_err(serde::de::Error::custom),
    }
}

impl InstanceConfig {
    /// Creates an instance entry with defaults for everything but the engine.
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            host: default_host(),
            port: None,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            ssl_mode: default_ssl_mode(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            options: BTreeMap::new(),
        }
    }

    /// Returns the configured port or the engine's well-known default.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.engine.as_str() {
            "mysql" | "mariadb" => 3306,
            "oracle" => 1521,
            _ => 5432,
        })
    }

    /// True when the host names the local machine.
    pub fn is_local_host(&self) -> bool {
        matches!(
            self.host.as_str(),
            "" | "localhost" | "127.0.0.1" | "::1"
        )
    }

    /// True when a password is set, so an explicit DSN can be built.
    pub fn has_credentials(&self) -> bool {
        !self.password.is_empty()
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Instances by name, sorted for stable listing.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub instances: BTreeMap<String, InstanceConfig>,
}

/// `instances:` with no entries parses as YAML null.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, InstanceConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, InstanceConfig>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Config {
    /// Default configuration path: `$HOME/.dbtop`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Loads and validates configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// An empty document yields an empty instance map. Refresh intervals
    /// below [`MIN_REFRESH_INTERVAL`] are raised to it.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: Config = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            line: e.location().map(|l| l.line()).unwrap_or(0),
            message: e.to_string(),
        })?;

        for (name, instance) in config.instances.iter_mut() {
            if instance.engine.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    instance: name.clone(),
                    message: "missing engine type".to_string(),
                });
            }
            if instance.refresh_interval < MIN_REFRESH_INTERVAL {
                instance.refresh_interval = MIN_REFRESH_INTERVAL;
            }
        }

        Ok(config)
    }

    /// Instance names in sorted order.
    pub fn instance_names(&self) -> Vec<&str> {
        self.instances.keys().map(|s| s.as_str()).collect()
    }

    /// Picks the instance to monitor.
    ///
    /// With no name, a single configured instance is selected implicitly.
    pub fn select(&self, name: Option<&str>) -> Result<(&str, &InstanceConfig), SelectError> {
        let available = || self.instances.keys().cloned().collect::<Vec<_>>();
        match name {
            Some(name) => self
                .instances
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| SelectError::Unknown {
                    name: name.to_string(),
                    available: available(),
                }),
            None => {
                let mut iter = self.instances.iter();
                match (iter.next(), iter.next()) {
                    (None, _) => Err(SelectError::Empty),
                    (Some((k, v)), None) => Ok((k.as_str(), v)),
                    (Some(_), Some(_)) => Err(SelectError::Ambiguous(available())),
                }
            }
        }
    }
}
