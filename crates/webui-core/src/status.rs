use serde::{Deserialize, Serialize};
use std::fmt;

pub const RUNTIME_NOT_READY: &str = "runtime not ready";
pub const CONFIG_NOT_WRITTEN: &str = "config not written";

/// Workload status as reported to the operator.
///
/// Recomputed by the reconciler on every event; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Status {
    /// No handler has run yet.
    #[default]
    Unknown,
    /// A precondition is not met; the reason is human readable.
    Waiting(String),
    Active,
}

impl Status {
    pub fn waiting(reason: impl Into<String>) -> Self {
        Self::Waiting(reason.into())
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Waiting(reason) => write!(f, "waiting: {reason}"),
            Self::Active => write!(f, "active"),
        }
    }
}
