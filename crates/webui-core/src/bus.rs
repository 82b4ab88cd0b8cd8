//! Event delivery with deferral.
//!
//! Deferred events are kept in FIFO order and re-delivered ahead of every
//! newly emitted event, and whenever the host calls
//! [`EventBus::reemit_deferred`] (on each poll tick). A deferred event keeps
//! its id across deliveries.

use crate::error::Result;
use crate::event::{Event, Outcome};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub handled: usize,
    pub deferred: usize,
}

#[derive(Debug, Default)]
pub struct EventBus {
    deferred: VecDeque<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-deliver deferred events, then deliver `event`.
    pub fn emit<F>(&mut self, event: Event, mut handler: F) -> Result<DeliveryReport>
    where
        F: FnMut(&Event) -> Result<Outcome>,
    {
        let mut report = match self.reemit_deferred(&mut handler) {
            Ok(report) => report,
            Err(e) => {
                // never delivered, so it queues behind the backlog
                self.deferred.push_back(event);
                return Err(e);
            }
        };
        self.deliver(event, &mut handler, &mut report)?;
        Ok(report)
    }

    /// Re-deliver every deferred event once, in the order they were deferred.
    pub fn reemit_deferred<F>(&mut self, mut handler: F) -> Result<DeliveryReport>
    where
        F: FnMut(&Event) -> Result<Outcome>,
    {
        let mut report = DeliveryReport::default();
        let mut pending = std::mem::take(&mut self.deferred);
        while let Some(event) = pending.pop_front() {
            debug!(event.id = %event.id, event.kind = %event.kind, "re-emitting deferred event");
            if let Err(e) = self.deliver(event, &mut handler, &mut report) {
                self.deferred.extend(pending);
                return Err(e);
            }
        }
        Ok(report)
    }

    pub fn deferred(&self) -> impl Iterator<Item = &Event> {
        self.deferred.iter()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    fn deliver<F>(&mut self, event: Event, handler: &mut F, report: &mut DeliveryReport) -> Result<()>
    where
        F: FnMut(&Event) -> Result<Outcome>,
    {
        match handler(&event) {
            Ok(Outcome::Handled) => {
                report.handled += 1;
                Ok(())
            }
            Ok(Outcome::Deferred) => {
                report.deferred += 1;
                self.deferred.push_back(event);
                Ok(())
            }
            Err(e) => {
                // keep the event so a restarted loop could still see it
                self.deferred.push_front(event);
                Err(e)
            }
        }
    }
}
