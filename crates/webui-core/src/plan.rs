//! Declarative process plan handed to the workload's supervisor.
//!
//! A [`Layer`] is one contribution (what the reconciler submits); the
//! [`Plan`] is the merged view the supervisor enforces. Both serialize to the
//! same `services:` mapping, with unset fields omitted.

use crate::error::{OperatorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Override / Startup / MergeMode
// ---------------------------------------------------------------------------

/// How a layer's service definition combines with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Override {
    /// Overlay the set fields onto the existing definition.
    Merge,
    /// Discard the existing definition entirely.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Startup {
    Enabled,
    Disabled,
}

/// How a layer is applied to the plan already held by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Merge service by service, honouring each service's `override`.
    Combine,
    /// Drop the existing plan and start from this layer alone.
    Fresh,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "override")]
    pub override_mode: Override,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<Startup>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl Service {
    /// A `replace` service running `command` at startup.
    pub fn replace(command: impl Into<String>) -> Self {
        Self {
            override_mode: Override::Replace,
            summary: None,
            command: Some(command.into()),
            startup: Some(Startup::Enabled),
            environment: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.startup == Some(Startup::Enabled)
    }

    /// Split the command line into argv, honouring single and double quotes.
    pub fn argv(&self) -> Result<Vec<String>> {
        let command = self
            .command
            .as_deref()
            .ok_or_else(|| OperatorError::InvalidPlan("service has no command".into()))?;
        split_command(command)
    }

    /// Overlay `other` onto `self` following `other.override_mode`.
    fn merge_from(&mut self, other: &Service) {
        match other.override_mode {
            Override::Replace => *self = other.clone(),
            Override::Merge => {
                if other.summary.is_some() {
                    self.summary.clone_from(&other.summary);
                }
                if other.command.is_some() {
                    self.command.clone_from(&other.command);
                }
                if other.startup.is_some() {
                    self.startup = other.startup;
                }
                self.environment.extend(
                    other
                        .environment
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }
        }
    }
}

fn split_command(command: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;

    for ch in command.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                in_arg = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if quote.is_some() {
        return Err(OperatorError::InvalidPlan(format!(
            "unterminated quote in command: {command}"
        )));
    }
    if in_arg {
        args.push(current);
    }
    if args.is_empty() {
        return Err(OperatorError::InvalidPlan("empty command".into()));
    }
    Ok(args)
}

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
}

impl Layer {
    pub fn new(summary: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            description: Some(description.into()),
            services: BTreeMap::new(),
        }
    }

    pub fn with_service(mut self, name: impl Into<String>, service: Service) -> Self {
        self.services.insert(name.into(), service);
        self
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
}

impl Plan {
    /// Merge `layer` into this plan. Returns `true` if the plan changed.
    pub fn apply(&mut self, layer: &Layer, mode: MergeMode) -> bool {
        let before = self.clone();
        if mode == MergeMode::Fresh {
            self.services.clear();
        }
        for (name, service) in &layer.services {
            match self.services.get_mut(name) {
                Some(existing) => existing.merge_from(service),
                None => {
                    self.services.insert(name.clone(), service.clone());
                }
            }
        }
        *self != before
    }

    /// The plan as a JSON value, e.g. for comparing against an expected dict.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
