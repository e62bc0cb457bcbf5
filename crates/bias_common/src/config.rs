//! Detector configuration
//!
//! Configuration lives in `./files/detector.toml`. Every field has a default,
//! so a missing default file simply means built-in settings.

use crate::error::{DetectorError, Result};
use crate::text_wrap::DEFAULT_WRAP_WIDTH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file
pub const DEFAULT_CONFIG_PATH: &str = "./files/detector.toml";

/// When to produce a PDF report after a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Ask the operator after every successful classification
    #[default]
    OnRequest,
    /// Always write a report
    Automatic,
}

impl ReportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportMode::OnRequest => "on_request",
            ReportMode::Automatic => "automatic",
        }
    }
}

/// What to do with an empty manual entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptyEventPolicy {
    /// Report invalid input locally
    #[default]
    Reject,
    /// Send it to the oracle as-is
    Forward,
}

/// Oracle connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Model for the welcome banner (defaults to `model`)
    #[serde(default)]
    pub banner_model: Option<String>,

    /// Upper bound on one oracle round-trip (valid: 5-600)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    crate::analyst::DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    120
}

impl OracleConfig {
    pub fn effective_timeout(&self) -> u64 {
        self.timeout_secs.clamp(5, 600)
    }

    pub fn effective_banner_model(&self) -> &str {
        self.banner_model.as_deref().unwrap_or(&self.model)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            banner_model: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Session files and interaction policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    #[serde(default = "default_credential_path")]
    pub credential_path: PathBuf,

    #[serde(default)]
    pub report_mode: ReportMode,

    #[serde(default)]
    pub empty_event: EmptyEventPolicy,

    /// Location shown in the banner (free text)
    #[serde(default)]
    pub location: Option<String>,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("./files/openai-log.txt")
}

fn default_credential_path() -> PathBuf {
    PathBuf::from("./files/api-key.txt")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            credential_path: default_credential_path(),
            report_mode: ReportMode::default(),
            empty_event: EmptyEventPolicy::default(),
            location: None,
        }
    }
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_title")]
    pub title: String,

    /// Column width for wrapped text (valid: 40-200)
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("./files")
}

fn default_title() -> String {
    crate::report::DEFAULT_TITLE.to_string()
}

fn default_wrap_width() -> usize {
    DEFAULT_WRAP_WIDTH
}

impl ReportConfig {
    pub fn effective_wrap_width(&self) -> usize {
        self.wrap_width.clamp(40, 200)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
            title: default_title(),
            wrap_width: default_wrap_width(),
        }
    }
}

/// Console presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub color: bool,

    #[serde(default = "default_true")]
    pub spinner: bool,

    /// Mirror raw oracle text into the debug log
    #[serde(default)]
    pub echo_verdicts: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            spinner: true,
            echo_verdicts: false,
        }
    }
}

/// Diagnostics logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

impl Config {
    /// Load from an explicit path (must exist) or the default path (optional)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| DetectorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content).map_err(|e| match e {
            DetectorError::Config(msg) => {
                DetectorError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DetectorError::Config(e.to_string()))
    }
}
