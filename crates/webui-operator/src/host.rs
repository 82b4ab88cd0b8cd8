//! The event loop that stands in for the orchestration framework.
//!
//! Emits `Install` once, then polls container reachability: every
//! unreachable → reachable edge emits `WorkloadReady`, and every other tick
//! re-delivers whatever the reconciler deferred. Once the workload is Active
//! and nothing is deferred, ticks re-enforce the plan so exited services are
//! restarted.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};
use webui_core::bus::{DeliveryReport, EventBus};
use webui_core::container::{LocalContainer, RuntimeEnvironment};
use webui_core::error::Result;
use webui_core::event::Event;
use webui_core::reconciler::Reconciler;
use webui_core::status::Status;
use webui_core::supervisor::{ProcessSupervisor, ReplanReport};
use webui_core::template::ConfigWriter;

pub struct Host<S, W> {
    reconciler: Reconciler<LocalContainer<S>, W>,
    bus: EventBus,
    poll_interval: Duration,
}

impl<S: ProcessSupervisor, W: ConfigWriter> Host<S, W> {
    pub fn new(reconciler: Reconciler<LocalContainer<S>, W>) -> Self {
        let poll_interval = reconciler.config().poll_interval();
        Self {
            reconciler,
            bus: EventBus::new(),
            poll_interval,
        }
    }

    pub fn status(&self) -> &Status {
        self.reconciler.status()
    }

    pub fn reconciler(&self) -> &Reconciler<LocalContainer<S>, W> {
        &self.reconciler
    }

    pub fn deferred_len(&self) -> usize {
        self.bus.deferred_len()
    }

    /// Deliver `event`, preceded by any deferred events.
    pub fn emit(&mut self, event: Event) -> Result<DeliveryReport> {
        debug!(event.id = %event.id, event.kind = %event.kind, "emitting event");
        let reconciler = &mut self.reconciler;
        self.bus.emit(event, |e| reconciler.dispatch(e))
    }

    /// Re-deliver deferred events only.
    pub fn tick(&mut self) -> Result<DeliveryReport> {
        let reconciler = &mut self.reconciler;
        self.bus.reemit_deferred(|e| reconciler.dispatch(e))
    }

    /// Bring supervised processes back in line with the current plan.
    /// Does nothing unless the workload is Active and reachable.
    pub fn enforce(&mut self) -> Result<Option<ReplanReport>> {
        if !self.status().is_active() || !self.reconciler.container().is_reachable() {
            return Ok(None);
        }
        let report = self.reconciler.container_mut().reconcile_processes()?;
        if !report.started.is_empty() {
            warn!(services = ?report.started, "restarted exited services");
        }
        Ok(Some(report))
    }

    /// Run until `shutdown` resolves or a handler fails. Supervised processes
    /// are stopped on the way out.
    pub async fn run<F>(mut self, shutdown: F) -> Result<Status>
    where
        F: Future<Output = ()>,
    {
        info!(
            service = %self.reconciler.config().service_name,
            poll_ms = self.poll_interval.as_millis() as u64,
            "operator host starting"
        );
        let result = self.event_loop(shutdown).await;
        let stopped = self.reconciler.container_mut().supervisor_mut().stop_all();
        if let (Err(_), Err(e)) = (&result, &stopped) {
            warn!("failed to stop services: {e}");
        }

        result?;
        stopped?;
        info!(status = %self.status(), "operator host stopped");
        Ok(self.status().clone())
    }

    async fn event_loop<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.emit(Event::install())?;

        let mut was_reachable = false;
        let mut interval = tokio::time::interval(self.poll_interval.max(Duration::from_millis(1)));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    return Ok(());
                }
                _ = interval.tick() => {
                    let reachable = self.reconciler.container().is_reachable();
                    if reachable && !was_reachable {
                        info!("workload container became reachable");
                        self.emit(Event::workload_ready())?;
                    } else if self.bus.deferred_len() > 0 {
                        self.tick()?;
                    } else {
                        self.enforce()?;
                    }
                    was_reachable = reachable;
                }
            }
        }
    }
}
