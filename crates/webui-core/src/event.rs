//! Lifecycle events delivered to the reconciler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The unit was installed; the config artifact should be written.
    Install,
    /// The workload container became reachable.
    WorkloadReady,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::WorkloadReady => "workload_ready",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delivery of a lifecycle signal. A deferred event keeps its `id`
/// across re-deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub kind: EventKind,
    pub emitted_at: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            emitted_at: Utc::now(),
        }
    }

    pub fn install() -> Self {
        Self::new(EventKind::Install)
    }

    pub fn workload_ready() -> Self {
        Self::new(EventKind::WorkloadReady)
    }
}

/// What a handler asks the bus to do with the event it just processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    /// Re-deliver the same event later.
    Deferred,
}
