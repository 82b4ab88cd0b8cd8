//! The workload's runtime environment.
//!
//! [`RuntimeEnvironment`] is the only surface the reconciler uses.
//! [`LocalContainer`] implements it over a host directory that mirrors the
//! container filesystem (a shared volume, or `/` when co-located).

use crate::error::Result;
use crate::io;
use crate::paths;
use crate::plan::{Layer, MergeMode, Plan};
use crate::supervisor::{ProcessSupervisor, ReplanReport};
use std::path::{Path, PathBuf};

pub trait RuntimeEnvironment {
    /// Whether the container currently accepts operations.
    fn is_reachable(&self) -> bool;

    fn write_file(&mut self, path: &str, content: &str) -> Result<()>;

    fn file_exists(&self, path: &str) -> Result<bool>;

    /// Merge `layer` into the held plan. Returns whether the plan changed.
    fn apply_process_plan(&mut self, layer: &Layer, mode: MergeMode) -> Result<bool>;

    /// Ask the supervisor to bring processes in line with the plan.
    fn reconcile_processes(&mut self) -> Result<ReplanReport>;

    fn plan(&self) -> &Plan;
}

// ---------------------------------------------------------------------------
// LocalContainer
// ---------------------------------------------------------------------------

pub struct LocalContainer<S> {
    root: PathBuf,
    ready_marker: String,
    plan: Plan,
    supervisor: S,
}

impl<S: ProcessSupervisor> LocalContainer<S> {
    pub fn new(root: impl Into<PathBuf>, supervisor: S) -> Self {
        Self {
            root: root.into(),
            ready_marker: paths::READY_MARKER.to_string(),
            plan: Plan::default(),
            supervisor,
        }
    }

    pub fn with_ready_marker(mut self, marker: impl Into<String>) -> Self {
        self.ready_marker = marker.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ready_marker_path(&self) -> PathBuf {
        self.root.join(&self.ready_marker)
    }

    pub fn supervisor(&self) -> &S {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut S {
        &mut self.supervisor
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.is_reachable() {
            return Ok(());
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            format!("container at {} is not reachable", self.root.display()),
        )
        .into())
    }
}

impl<S: ProcessSupervisor> RuntimeEnvironment for LocalContainer<S> {
    fn is_reachable(&self) -> bool {
        self.root.is_dir() && self.ready_marker_path().exists()
    }

    fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        self.ensure_reachable()?;
        let target = paths::host_path(&self.root, path)?;
        io::atomic_write(&target, content.as_bytes())
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        self.ensure_reachable()?;
        Ok(paths::host_path(&self.root, path)?.exists())
    }

    fn apply_process_plan(&mut self, layer: &Layer, mode: MergeMode) -> Result<bool> {
        self.ensure_reachable()?;
        Ok(self.plan.apply(layer, mode))
    }

    fn reconcile_processes(&mut self) -> Result<ReplanReport> {
        self.ensure_reachable()?;
        self.supervisor.replan(&self.plan)
    }

    fn plan(&self) -> &Plan {
        &self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperatorError;
    use crate::plan::Service;
    use crate::supervisor::RecordingSupervisor;
    use tempfile::TempDir;

    fn reachable(dir: &TempDir) -> LocalContainer<RecordingSupervisor> {
        std::fs::write(dir.path().join(".ready"), b"").unwrap();
        LocalContainer::new(dir.path(), RecordingSupervisor::new())
    }

    #[test]
    fn reachability_follows_marker() {
        let dir = TempDir::new().unwrap();
        let container = LocalContainer::new(dir.path(), RecordingSupervisor::new());
        assert!(!container.is_reachable());
        std::fs::write(dir.path().join(".ready"), b"").unwrap();
        assert!(container.is_reachable());
    }

    #[test]
    fn missing_root_is_unreachable() {
        let dir = TempDir::new().unwrap();
        let container = LocalContainer::new(dir.path().join("gone"), RecordingSupervisor::new());
        assert!(!container.is_reachable());
    }

    #[test]
    fn custom_marker() {
        let dir = TempDir::new().unwrap();
        let container = LocalContainer::new(dir.path(), RecordingSupervisor::new())
            .with_ready_marker("run/pebble.socket");
        std::fs::create_dir_all(dir.path().join("run")).unwrap();
        std::fs::write(dir.path().join("run/pebble.socket"), b"").unwrap();
        assert!(container.is_reachable());
    }

    #[test]
    fn write_and_exists_map_under_root() {
        let dir = TempDir::new().unwrap();
        let mut container = reachable(&dir);
        assert!(!container.file_exists("/free5gc/config/webuicfg.yaml").unwrap());
        container
            .write_file("/free5gc/config/webuicfg.yaml", "info: {}")
            .unwrap();
        assert!(container.file_exists("/free5gc/config/webuicfg.yaml").unwrap());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("free5gc/config/webuicfg.yaml")).unwrap(),
            "info: {}"
        );
    }

    #[test]
    fn operations_fail_when_unreachable() {
        let dir = TempDir::new().unwrap();
        let mut container = LocalContainer::new(dir.path(), RecordingSupervisor::new());
        let err = container.write_file("/a.yaml", "x").unwrap_err();
        assert!(
            matches!(err, OperatorError::Io(ref e) if e.kind() == std::io::ErrorKind::NotConnected)
        );
        assert!(container.file_exists("/a.yaml").is_err());
        assert!(container.reconcile_processes().is_err());
        assert!(!dir.path().join("a.yaml").exists());
    }

    #[test]
    fn write_rejects_path_escape() {
        let dir = TempDir::new().unwrap();
        let mut container = reachable(&dir);
        assert!(matches!(
            container.write_file("/../escape.yaml", "x"),
            Err(OperatorError::InvalidPath(_))
        ));
    }

    #[test]
    fn apply_then_reconcile_hands_plan_to_supervisor() {
        let dir = TempDir::new().unwrap();
        let mut container = reachable(&dir);
        let layer = Layer::new("s", "d").with_service("svc", Service::replace("/bin/a"));
        assert!(container.apply_process_plan(&layer, MergeMode::Combine).unwrap());
        assert!(!container.apply_process_plan(&layer, MergeMode::Combine).unwrap());
        let report = container.reconcile_processes().unwrap();
        assert_eq!(report.started, vec!["svc"]);
        assert_eq!(container.supervisor().last_plan(), Some(container.plan()));
    }
}
