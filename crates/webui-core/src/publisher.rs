//! Declarative description of how the workload is exposed on the network.
//!
//! Registered once at startup; the reconciler never touches it.

use crate::config::OperatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const APP_NAME_LABEL: &str = "app.kubernetes.io/name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceExposure {
    /// Service object name; also the selector value.
    pub app: String,
    pub service_type: String,
    pub ports: Vec<PortSpec>,
}

impl ServiceExposure {
    pub fn from_config(app: impl Into<String>, config: &OperatorConfig) -> Self {
        Self {
            app: app.into(),
            service_type: config.service_type.clone(),
            ports: vec![PortSpec {
                name: config.port.name.clone(),
                port: config.port.port,
            }],
        }
    }

    pub fn selector(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(APP_NAME_LABEL.to_string(), self.app.clone())])
    }
}
