//! `webui-core` — lifecycle reconciliation for the free5gc WebUI workload.
//!
//! The [`reconciler::Reconciler`] reacts to two lifecycle events and drives
//! the workload container through a fixed sequence:
//!
//! ```text
//! Install ──► write webuicfg.yaml ──► WorkloadReady ──► apply plan + replan ──► Active
//! ```
//!
//! Anything the reconciler cannot do yet (container unreachable, config not
//! written) is reported as `Status::Waiting` and the event is deferred back to
//! the [`bus::EventBus`] for re-delivery.

pub mod bus;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod io;
pub mod paths;
pub mod plan;
pub mod publisher;
pub mod reconciler;
pub mod status;
pub mod supervisor;
pub mod template;

pub use error::{OperatorError, Result};
