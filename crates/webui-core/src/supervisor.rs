//! Process supervision seam.
//!
//! The container hands its merged [`Plan`] to a [`ProcessSupervisor`] on every
//! replan. The tokio-backed implementation lives in the operator crate;
//! [`RecordingSupervisor`] only records what it was asked to enforce.

use crate::error::Result;
use crate::plan::Plan;

/// What a replan changed, by service name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplanReport {
    pub started: Vec<String>,
    pub stopped: Vec<String>,
    pub unchanged: Vec<String>,
}

pub trait ProcessSupervisor {
    /// Bring running processes in line with `plan`.
    fn replan(&mut self, plan: &Plan) -> Result<ReplanReport>;

    /// Stop every supervised process.
    fn stop_all(&mut self) -> Result<()>;
}

/// Supervisor that never starts anything; used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingSupervisor {
    plans: Vec<Plan>,
}

impl RecordingSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every plan passed to `replan`, oldest first.
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn last_plan(&self) -> Option<&Plan> {
        self.plans.last()
    }
}

impl ProcessSupervisor for RecordingSupervisor {
    fn replan(&mut self, plan: &Plan) -> Result<ReplanReport> {
        let previous = self.plans.last().cloned().unwrap_or_default();
        self.plans.push(plan.clone());

        let mut report = ReplanReport::default();
        for (name, service) in &plan.services {
            match previous.services.get(name) {
                Some(prev) if prev == service => report.unchanged.push(name.clone()),
                _ if service.is_enabled() => report.started.push(name.clone()),
                _ => {}
            }
        }
        for name in previous.services.keys() {
            if !plan.services.contains_key(name) {
                report.stopped.push(name.clone());
            }
        }
        tracing::debug!(
            started = ?report.started,
            stopped = ?report.stopped,
            "dry-run replan recorded"
        );
        Ok(report)
    }

    fn stop_all(&mut self) -> Result<()> {
        self.plans.push(Plan::default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Layer, MergeMode, Service};

    fn plan_with(command: &str) -> Plan {
        let mut plan = Plan::default();
        plan.apply(
            &Layer::new("s", "d").with_service("svc", Service::replace(command)),
            MergeMode::Combine,
        );
        plan
    }

    #[test]
    fn first_replan_starts_enabled_services() {
        let mut sup = RecordingSupervisor::new();
        let report = sup.replan(&plan_with("/bin/a")).unwrap();
        assert_eq!(report.started, vec!["svc"]);
        assert_eq!(sup.plans().len(), 1);
    }

    #[test]
    fn identical_replan_reports_unchanged() {
        let mut sup = RecordingSupervisor::new();
        sup.replan(&plan_with("/bin/a")).unwrap();
        let report = sup.replan(&plan_with("/bin/a")).unwrap();
        assert!(report.started.is_empty());
        assert_eq!(report.unchanged, vec!["svc"]);
    }

    #[test]
    fn removed_service_is_reported_stopped() {
        let mut sup = RecordingSupervisor::new();
        sup.replan(&plan_with("/bin/a")).unwrap();
        let report = sup.replan(&Plan::default()).unwrap();
        assert_eq!(report.stopped, vec!["svc"]);
    }
}
