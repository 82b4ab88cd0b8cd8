use crate::error::Result;
use crate::paths;
use crate::plan::{Layer, Service};
use crate::template::TemplateParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PortConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortConfig {
    #[serde(default = "default_port_name")]
    pub name: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port_name() -> String {
    "http".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            name: default_port_name(),
            port: default_port(),
        }
    }
}

pub const SERVICE_TYPES: &[&str] = &["ClusterIP", "NodePort", "LoadBalancer"];

// ---------------------------------------------------------------------------
// OperatorConfig
// ---------------------------------------------------------------------------

/// Everything the reconciler and host need to know about the workload.
/// Every field has a default, so an empty file describes the stock WebUI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_base_config_path")]
    pub base_config_path: String,
    #[serde(default = "default_config_file_name")]
    pub config_file_name: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub template_params: TemplateParams,
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_environment")]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub port: PortConfig,
    #[serde(default = "default_service_type")]
    pub service_type: String,
    #[serde(default = "default_ready_marker")]
    pub ready_marker: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Grace period between SIGTERM and SIGKILL when a service is stopped.
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

fn default_service_name() -> String {
    paths::SERVICE_NAME.to_string()
}

fn default_base_config_path() -> String {
    paths::BASE_CONFIG_PATH.to_string()
}

fn default_config_file_name() -> String {
    paths::CONFIG_FILE_NAME.to_string()
}

fn default_template() -> String {
    paths::CONFIG_TEMPLATE.to_string()
}

fn default_command() -> String {
    format!(
        "{} -c {}",
        paths::WEBCONSOLE_BIN,
        paths::config_file_path(paths::BASE_CONFIG_PATH, paths::CONFIG_FILE_NAME)
    )
}

fn default_environment() -> BTreeMap<String, String> {
    BTreeMap::from([("GIN_MODE".to_string(), "release".to_string())])
}

fn default_service_type() -> String {
    "LoadBalancer".to_string()
}

fn default_ready_marker() -> String {
    paths::READY_MARKER.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_stop_timeout_ms() -> u64 {
    5000
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            base_config_path: default_base_config_path(),
            config_file_name: default_config_file_name(),
            template: default_template(),
            template_params: TemplateParams::new(),
            command: default_command(),
            environment: default_environment(),
            port: PortConfig::default(),
            service_type: default_service_type(),
            ready_marker: default_ready_marker(),
            poll_interval_ms: default_poll_interval_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl OperatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: OperatorConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `path` if it exists, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }

    /// Absolute in-container path of the config artifact.
    pub fn config_file_path(&self) -> String {
        paths::config_file_path(&self.base_config_path, &self.config_file_name)
    }

    /// The layer the reconciler submits once the config artifact exists.
    pub fn layer(&self) -> Layer {
        let mut service = Service::replace(self.command.clone());
        service.environment = self.environment.clone();
        Layer::new(
            format!("{} layer", self.service_name),
            format!("pebble config layer for {}", self.service_name),
        )
        .with_service(self.service_name.clone(), service)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stop_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.stop_timeout_ms)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        if self.service_name.trim().is_empty() {
            push(WarnLevel::Error, "service_name is empty".into());
        }
        if self.command.trim().is_empty() {
            push(WarnLevel::Error, "command is empty".into());
        }
        if !self.base_config_path.starts_with('/') {
            push(
                WarnLevel::Error,
                format!(
                    "base_config_path '{}' must be absolute",
                    self.base_config_path
                ),
            );
        }
        if self.config_file_name.is_empty() || self.config_file_name.contains('/') {
            push(
                WarnLevel::Error,
                format!(
                    "config_file_name '{}' must be a bare file name",
                    self.config_file_name
                ),
            );
        }
        if self.port.port == 0 {
            push(WarnLevel::Error, "port.port must be non-zero".into());
        }
        if !SERVICE_TYPES.contains(&self.service_type.as_str()) {
            push(
                WarnLevel::Warning,
                format!(
                    "unknown service_type '{}' (expected one of {})",
                    self.service_type,
                    SERVICE_TYPES.join(", ")
                ),
            );
        }
        if self.poll_interval_ms == 0 {
            push(
                WarnLevel::Warning,
                "poll_interval_ms is 0; deferred events will be retried in a busy loop".into(),
            );
        }
        if !self.command.contains(&self.config_file_path()) {
            push(
                WarnLevel::Warning,
                format!(
                    "command does not reference the config file {}",
                    self.config_file_path()
                ),
            );
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
