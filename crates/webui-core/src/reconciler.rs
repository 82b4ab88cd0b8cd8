//! Install → write config → workload ready → apply plan → active.
//!
//! Both handlers are idempotent. A handler that finds a precondition unmet
//! sets `Status::Waiting` and returns [`Outcome::Deferred`]; the bus
//! re-delivers the same event later. There is no retry limit.
//!
//! ```text
//! UNINIT ──install/unreachable──► WAITING_RUNTIME ──install/reachable──► CONFIG_WRITTEN
//! any ──ready/unreachable──► WAITING_RUNTIME
//! any ──ready/no config──► WAITING_CONFIG ──ready/config──► ACTIVE ◄──ready── ACTIVE
//! ```

use crate::config::OperatorConfig;
use crate::container::RuntimeEnvironment;
use crate::error::Result;
use crate::event::{Event, EventKind, Outcome};
use crate::plan::MergeMode;
use crate::status::{Status, CONFIG_NOT_WRITTEN, RUNTIME_NOT_READY};
use crate::template::ConfigWriter;
use tracing::{info, Span};

pub struct Reconciler<C, W> {
    container: C,
    writer: W,
    config: OperatorConfig,
    status: Status,
    span: Span,
}

impl<C: RuntimeEnvironment, W: ConfigWriter> Reconciler<C, W> {
    /// `span` scopes every log line the reconciler emits.
    pub fn new(container: C, writer: W, config: OperatorConfig, span: Span) -> Self {
        Self {
            container,
            writer,
            config,
            status: Status::Unknown,
            span,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Route `event` to its handler.
    pub fn dispatch(&mut self, event: &Event) -> Result<Outcome> {
        match event.kind {
            EventKind::Install => self.on_install(event),
            EventKind::WorkloadReady => self.on_workload_ready(event),
        }
    }

    pub fn on_install(&mut self, event: &Event) -> Result<Outcome> {
        let span = self.span.clone();
        let _guard = span.enter();

        if !self.container.is_reachable() {
            return Ok(self.wait(event, RUNTIME_NOT_READY));
        }
        self.write_config_file()?;
        Ok(Outcome::Handled)
    }

    pub fn on_workload_ready(&mut self, event: &Event) -> Result<Outcome> {
        let span = self.span.clone();
        let _guard = span.enter();

        if !self.container.is_reachable() {
            return Ok(self.wait(event, RUNTIME_NOT_READY));
        }
        if !self.config_file_is_written()? {
            return Ok(self.wait(event, CONFIG_NOT_WRITTEN));
        }

        let layer = self.config.layer();
        let changed = self
            .container
            .apply_process_plan(&layer, MergeMode::Combine)?;
        let report = self.container.reconcile_processes()?;
        info!(
            service = %self.config.service_name,
            plan_changed = changed,
            started = ?report.started,
            "plan applied"
        );
        self.set_status(Status::Active);
        Ok(Outcome::Handled)
    }

    fn write_config_file(&mut self) -> Result<()> {
        let content = self
            .writer
            .render(&self.config.template, &self.config.template_params)?;
        let path = self.config.config_file_path();
        self.container.write_file(&path, &content)?;
        info!(path = %path, "pushed config file");
        Ok(())
    }

    fn config_file_is_written(&self) -> Result<bool> {
        let path = self.config.config_file_path();
        let exists = self.container.file_exists(&path)?;
        if exists {
            info!(path = %path, "config file is written");
        } else {
            info!(path = %path, "config file is not written");
        }
        Ok(exists)
    }

    fn wait(&mut self, event: &Event, reason: &str) -> Outcome {
        info!(
            event.id = %event.id,
            event.kind = %event.kind,
            reason,
            "deferring event"
        );
        self.set_status(Status::waiting(reason));
        Outcome::Deferred
    }

    fn set_status(&mut self, status: Status) {
        if self.status != status {
            info!(from = %self.status, to = %status, "status changed");
        }
        self.status = status;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::LocalContainer;
    use crate::supervisor::RecordingSupervisor;
    use crate::template::TemplateWriter;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    const CONFIG_PATH: &str = "free5gc/config/webuicfg.yaml";
    const EXPECTED_WEBUICFG: &str = "info:\n  version: 1.0.0\n  description: WEBUI initial local configuration\n\nconfiguration:\n  mongodb:\n    name: free5gc\n    url: mongodb://mongodb:27017\n\nlogger:\n  WEBUI:\n    ReportCaller: false\n    debugLevel: info";

    type TestReconciler = Reconciler<LocalContainer<RecordingSupervisor>, TemplateWriter>;

    fn reconciler(dir: &TempDir) -> TestReconciler {
        Reconciler::new(
            LocalContainer::new(dir.path(), RecordingSupervisor::new()),
            TemplateWriter::new(),
            OperatorConfig::default(),
            tracing::info_span!("test"),
        )
    }

    fn set_reachable(dir: &TempDir, reachable: bool) {
        let marker = dir.path().join(".ready");
        if reachable {
            std::fs::write(marker, b"").unwrap();
        } else if marker.exists() {
            std::fs::remove_file(marker).unwrap();
        }
    }

    fn write_config(root: &Path) {
        let path = root.join(CONFIG_PATH);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "pre-existing").unwrap();
    }

    fn submitted(r: &TestReconciler) -> usize {
        r.container().supervisor().plans().len()
    }

    #[test]
    fn install_when_reachable_writes_exact_config() {
        let dir = TempDir::new().unwrap();
        set_reachable(&dir, true);
        let mut r = reconciler(&dir);

        let outcome = r.on_install(&Event::install()).unwrap();

        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CONFIG_PATH)).unwrap(),
            EXPECTED_WEBUICFG
        );
        // install does not itself activate
        assert_eq!(r.status(), &Status::Unknown);
    }

    #[test]
    fn install_twice_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        set_reachable(&dir, true);
        let mut r = reconciler(&dir);

        r.on_install(&Event::install()).unwrap();
        let first = std::fs::read(dir.path().join(CONFIG_PATH)).unwrap();
        r.on_install(&Event::install()).unwrap();
        let second = std::fs::read(dir.path().join(CONFIG_PATH)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn install_when_unreachable_defers_without_writing() {
        let dir = TempDir::new().unwrap();
        let mut r = reconciler(&dir);

        let outcome = r.on_install(&Event::install()).unwrap();

        assert_eq!(outcome, Outcome::Deferred);
        assert!(!dir.path().join(CONFIG_PATH).exists());
        assert_eq!(r.status(), &Status::waiting("runtime not ready"));
    }

    #[test]
    fn ready_before_install_waits_for_config() {
        let dir = TempDir::new().unwrap();
        set_reachable(&dir, true);
        let mut r = reconciler(&dir);

        let outcome = r.on_workload_ready(&Event::workload_ready()).unwrap();

        assert_eq!(outcome, Outcome::Deferred);
        assert_eq!(r.status(), &Status::waiting("config not written"));
        assert_eq!(submitted(&r), 0);
        assert!(r.container().plan().services.is_empty());
    }

    #[test]
    fn ready_when_unreachable_waits_for_runtime() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path());
        let mut r = reconciler(&dir);

        let outcome = r.on_workload_ready(&Event::workload_ready()).unwrap();

        assert_eq!(outcome, Outcome::Deferred);
        assert_eq!(r.status(), &Status::waiting("runtime not ready"));
        assert_eq!(submitted(&r), 0);
    }

    #[test]
    fn ready_with_config_applies_plan_and_activates() {
        let dir = TempDir::new().unwrap();
        set_reachable(&dir, true);
        write_config(dir.path());
        let mut r = reconciler(&dir);

        let outcome = r.on_workload_ready(&Event::workload_ready()).unwrap();

        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(r.status(), &Status::Active);
        assert_eq!(
            r.container().plan().to_value().unwrap(),
            json!({
                "services": {
                    "free5gc-webui": {
                        "override": "replace",
                        "command": "/free5gc/webconsole/webconsole -c /free5gc/config/webuicfg.yaml",
                        "startup": "enabled",
                        "environment": {"GIN_MODE": "release"}
                    }
                }
            })
        );
        assert_eq!(submitted(&r), 1);
    }

    #[test]
    fn ready_again_when_active_resubmits_identical_plan() {
        let dir = TempDir::new().unwrap();
        set_reachable(&dir, true);
        write_config(dir.path());
        let mut r = reconciler(&dir);

        for _ in 0..3 {
            r.on_workload_ready(&Event::workload_ready()).unwrap();
            assert_eq!(r.status(), &Status::Active);
        }

        let plans = r.container().supervisor().plans();
        assert_eq!(plans.len(), 3);
        assert!(plans.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn plan_submitted_iff_config_exists() {
        for config_present in [false, true] {
            let dir = TempDir::new().unwrap();
            set_reachable(&dir, true);
            if config_present {
                write_config(dir.path());
            }
            let mut r = reconciler(&dir);
            r.on_workload_ready(&Event::workload_ready()).unwrap();
            assert_eq!(submitted(&r) == 1, config_present);
        }
    }

    #[test]
    fn full_sequence_with_late_runtime() {
        let dir = TempDir::new().unwrap();
        let mut r = reconciler(&dir);
        let install = Event::install();
        let ready = Event::workload_ready();

        assert_eq!(r.dispatch(&install).unwrap(), Outcome::Deferred);
        assert_eq!(r.dispatch(&ready).unwrap(), Outcome::Deferred);
        assert_eq!(r.status(), &Status::waiting("runtime not ready"));

        set_reachable(&dir, true);
        // ready re-delivered ahead of install: still waiting on config
        assert_eq!(r.dispatch(&ready).unwrap(), Outcome::Deferred);
        assert_eq!(r.status(), &Status::waiting("config not written"));

        assert_eq!(r.dispatch(&install).unwrap(), Outcome::Handled);
        assert_eq!(r.dispatch(&ready).unwrap(), Outcome::Handled);
        assert_eq!(r.status(), &Status::Active);
    }

    #[test]
    fn runtime_lost_after_active_goes_back_to_waiting() {
        let dir = TempDir::new().unwrap();
        set_reachable(&dir, true);
        let mut r = reconciler(&dir);
        r.dispatch(&Event::install()).unwrap();
        r.dispatch(&Event::workload_ready()).unwrap();
        assert!(r.status().is_active());

        set_reachable(&dir, false);
        assert_eq!(
            r.dispatch(&Event::workload_ready()).unwrap(),
            Outcome::Deferred
        );
        assert_eq!(r.status(), &Status::waiting("runtime not ready"));
    }

    #[test]
    fn render_failure_propagates() {
        let dir = TempDir::new().unwrap();
        set_reachable(&dir, true);
        let config = OperatorConfig {
            template: "missing.j2".into(),
            ..OperatorConfig::default()
        };
        let mut r = Reconciler::new(
            LocalContainer::new(dir.path(), RecordingSupervisor::new()),
            TemplateWriter::new(),
            config,
            tracing::Span::none(),
        );
        assert!(r.on_install(&Event::install()).is_err());
        assert!(!dir.path().join(CONFIG_PATH).exists());
    }
}
