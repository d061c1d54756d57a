//! Client configuration.
//!
//! Settings are layered file → environment → CLI. The file lives at
//! `.taskboard/taskboard.toml` under the working directory:
//!
//! ```toml
//! [api]
//! base_url = "https://board.example.com"
//! timeout_secs = 30
//!
//! [session]
//! token_file = "/home/me/.local/share/taskboard/session.json"
//!
//! [logging]
//! dir = ".taskboard/logs"
//! json = false
//! filter = "warn,taskboard=info"
//! ```
//!
//! | Variable                  | Overrides             |
//! |---------------------------|-----------------------|
//! | `TASKBOARD_API_URL`       | `api.base_url`        |
//! | `TASKBOARD_SESSION_FILE`  | `session.token_file`  |
//! | `TASKBOARD_TIMEOUT_SECS`  | `api.timeout_secs`    |
//! | `TASKBOARD_LOG_DIR`       | `logging.dir`         |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const CONFIG_DIR: &str = ".taskboard";
pub const CONFIG_FILE: &str = "taskboard.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_LOG_FILTER: &str = "warn,taskboard=info";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: None,
            json: false,
            filter: default_log_filter(),
        }
    }
}

/// Contents of `taskboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskboardToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl TaskboardToml {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `<project_dir>/.taskboard/taskboard.toml`, or defaults when the
    /// file does not exist.
    pub fn load_or_default(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_path(project_dir);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Environment overrides, read once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvLayer {
    pub api_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub timeout_secs: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl EnvLayer {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_url: get("TASKBOARD_API_URL"),
            session_file: get("TASKBOARD_SESSION_FILE").map(PathBuf::from),
            timeout_secs: get("TASKBOARD_TIMEOUT_SECS"),
            log_dir: get("TASKBOARD_LOG_DIR").map(PathBuf::from),
        }
    }
}

/// Overrides given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub verbose: bool,
    pub json_logs: bool,
}

/// Effective client settings after layering.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub session_file: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub log_json: bool,
    pub log_filter: String,
    pub verbose: bool,
}

impl ClientConfig {
    pub fn load(project_dir: &Path, cli: CliOverrides) -> Result<Self, ConfigError> {
        let file = TaskboardToml::load_or_default(project_dir)?;
        Self::from_layers(file, EnvLayer::from_env(), cli)
    }

    pub fn from_layers(
        file: TaskboardToml,
        env: EnvLayer,
        cli: CliOverrides,
    ) -> Result<Self, ConfigError> {
        let api_url = cli
            .api_url
            .or(env.api_url)
            .unwrap_or(file.api.base_url);
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "api.base_url",
                message: format!("'{}' is not an http(s) URL", api_url),
            });
        }

        let timeout_secs = match env.timeout_secs {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "TASKBOARD_TIMEOUT_SECS",
                message: format!("'{}' is not a whole number of seconds", raw),
            })?,
            None => file.api.timeout_secs,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.timeout_secs",
                message: "must be greater than zero".into(),
            });
        }

        let session_file = cli
            .session_file
            .or(env.session_file)
            .or(file.session.token_file)
            .unwrap_or_else(default_session_file);

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            session_file,
            log_dir: env.log_dir.or(file.logging.dir),
            log_json: cli.json_logs || file.logging.json,
            log_filter: file.logging.filter,
            verbose: cli.verbose,
        })
    }

    /// Render the effective settings in the config file format.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let effective = TaskboardToml {
            api: ApiSection {
                base_url: self.api_url.clone(),
                timeout_secs: self.timeout.as_secs(),
            },
            session: SessionSection {
                token_file: Some(self.session_file.clone()),
            },
            logging: LoggingSection {
                dir: self.log_dir.clone(),
                json: self.log_json,
                filter: self.log_filter.clone(),
            },
        };
        toml::to_string_pretty(&effective)
    }
}

pub fn config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// `<data dir>/taskboard/session.json`, falling back to the config dir in
/// the working directory when the platform has no data dir.
pub fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("taskboard"))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR))
        .join("session.json")
}
