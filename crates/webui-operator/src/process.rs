//! Tokio-backed [`ProcessSupervisor`].
//!
//! Each enabled service in the plan runs as one child process. A replan only
//! touches services whose definition changed or whose process has exited, so
//! resubmitting an identical plan leaves the running webconsole alone.
//!
//! Stopping a service sends `SIGTERM` and waits up to the stop timeout for
//! the process to exit before killing it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{info, warn};
use webui_core::error::{OperatorError, Result};
use webui_core::plan::{Plan, Service};
use webui_core::supervisor::{ProcessSupervisor, ReplanReport};

struct Running {
    service: Service,
    child: Child,
}

impl Running {
    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

/// Supervises the plan's services as local child processes.
///
/// Must be driven from inside a Tokio runtime: output forwarding runs on
/// spawned tasks.
pub struct ProcessManager {
    cwd: PathBuf,
    stop_timeout: Duration,
    running: BTreeMap<String, Running>,
}

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl ProcessManager {
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            running: BTreeMap::new(),
        }
    }

    /// How long a service gets to exit after `SIGTERM` before it is killed.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Names of services with a live process.
    pub fn running(&mut self) -> Vec<String> {
        self.running
            .iter_mut()
            .filter_map(|(name, r)| r.is_alive().then(|| name.clone()))
            .collect()
    }

    pub fn pid(&self, name: &str) -> Option<u32> {
        self.running.get(name).and_then(|r| r.child.id())
    }

    fn start(&mut self, name: &str, service: &Service) -> Result<()> {
        let argv = service.argv()?;
        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .envs(&service.environment)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                OperatorError::Supervisor(format!("failed to spawn '{}': {e}", argv[0]))
            })?;

        info!(service = name, pid = ?child.id(), "service started");

        if let Some(stdout) = child.stdout.take() {
            let service = name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(service = %service, "{line}");
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let service = name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(service = %service, "{line}");
                }
            });
        }

        self.running.insert(
            name.to_string(),
            Running {
                service: service.clone(),
                child,
            },
        );
        Ok(())
    }

    fn stop(&mut self, name: &str) -> Result<()> {
        let Some(mut running) = self.running.remove(name) else {
            return Ok(());
        };
        if running.is_alive() {
            terminate(name, &mut running, self.stop_timeout)?;
            info!(service = name, "service stopped");
        }
        Ok(())
    }
}

/// `SIGTERM`, then `SIGKILL` once `timeout` passes without an exit.
fn terminate(name: &str, running: &mut Running, timeout: Duration) -> Result<()> {
    if let Some(pid) = running.child.id() {
        match send_term(pid) {
            Ok(()) => {
                let deadline = Instant::now() + timeout;
                while Instant::now() < deadline {
                    if !running.is_alive() {
                        return Ok(());
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
                warn!(service = name, pid, "no exit after SIGTERM, killing");
            }
            Err(e) => warn!(service = name, pid, "SIGTERM failed: {e}"),
        }
    }
    running
        .child
        .start_kill()
        .map_err(|e| OperatorError::Supervisor(format!("failed to stop '{name}': {e}")))
}

/// Send SIGTERM to a process (`kill -TERM {pid}`).
fn send_term(pid: u32) -> std::io::Result<()> {
    let status = std::process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("kill exited with {status}")))
    }
}

impl ProcessSupervisor for ProcessManager {
    fn replan(&mut self, plan: &Plan) -> Result<ReplanReport> {
        let mut report = ReplanReport::default();

        let stale: Vec<String> = self
            .running
            .keys()
            .filter(|name| !plan.services.get(*name).is_some_and(Service::is_enabled))
            .cloned()
            .collect();
        for name in stale {
            self.stop(&name)?;
            report.stopped.push(name);
        }

        for (name, service) in plan.services.iter().filter(|(_, s)| s.is_enabled()) {
            let up_to_date = match self.running.get_mut(name) {
                Some(r) => r.service == *service && r.is_alive(),
                None => false,
            };
            if up_to_date {
                report.unchanged.push(name.clone());
                continue;
            }
            self.stop(name)?;
            self.start(name, service)?;
            report.started.push(name.clone());
        }

        Ok(report)
    }

    fn stop_all(&mut self) -> Result<()> {
        let names: Vec<String> = self.running.keys().cloned().collect();
        for name in names {
            self.stop(&name)?;
        }
        Ok(())
    }
}
