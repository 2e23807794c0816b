//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// HTTP request settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Connection retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Login gate settings
    #[serde(default)]
    pub login: LoginConfig,

    /// Workbook layout
    #[serde(default)]
    pub workbook: WorkbookConfig,

    /// Export file settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Notification delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// HTTP request settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    7
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_5) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/50.0.2661.94 Safari/537.36"
        .to_string()
}

/// Retry settings for connection failures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,

    /// Wait between attempts
    #[serde(default = "default_retry_backoff")]
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            backoff_secs: default_retry_backoff(),
        }
    }
}

fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_backoff() -> u64 {
    10
}

/// How a login response is judged successful
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoginSuccess {
    /// The serialized outcome contains this substring
    Marker { marker: String },
    /// The JSON value at `pointer` in the response equals `equals`
    Field { pointer: String, equals: serde_json::Value },
}

impl Default for LoginSuccess {
    fn default() -> Self {
        Self::Marker {
            marker: r#""msg":"success""#.to_string(),
        }
    }
}

/// Login gate settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginConfig {
    /// URL suffix identifying the login case
    #[serde(default = "default_login_path")]
    pub path_suffix: String,

    /// Total login attempts before the run is abandoned
    #[serde(default = "default_login_attempts")]
    pub attempts: u32,

    /// Wait between login attempts
    #[serde(default = "default_login_backoff")]
    pub backoff_secs: u64,

    /// Success criterion
    #[serde(default)]
    pub success: LoginSuccess,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            path_suffix: default_login_path(),
            attempts: default_login_attempts(),
            backoff_secs: default_login_backoff(),
            success: LoginSuccess::default(),
        }
    }
}

fn default_login_path() -> String {
    "/user/login".to_string()
}
fn default_login_attempts() -> u32 {
    3
}
fn default_login_backoff() -> u64 {
    30
}

/// Workbook sheet names
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkbookConfig {
    /// Sheet holding key/value settings
    #[serde(default = "default_basic_sheet")]
    pub basic_sheet: String,

    /// Sheet holding the test cases
    #[serde(default = "default_case_sheet")]
    pub case_sheet: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            basic_sheet: default_basic_sheet(),
            case_sheet: default_case_sheet(),
        }
    }
}

fn default_basic_sheet() -> String {
    "Basic Data".to_string()
}
fn default_case_sheet() -> String {
    "Test Case".to_string()
}

/// Where exported response files are written
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Notification delivery settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NotifyConfig {
    /// Write messages into this directory instead of only logging them
    #[serde(default)]
    pub outbox: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, &e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| super::Error::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry.backoff_secs)
    }

    pub fn login_backoff(&self) -> Duration {
        Duration::from_secs(self.login.backoff_secs)
    }
}
