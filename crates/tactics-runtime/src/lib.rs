//! # tactics-runtime
//!
//! [`TacticsRuntime`] owns every component of the adaptive tactics core and
//! is built once at process start. The host calls [`TacticsRuntime::decide`]
//! and [`TacticsRuntime::report_outcome`] from its tick thread and hands
//! periodic persist/sync cycles to a [`BackgroundWorker`].

pub mod runtime;
pub mod tracing_setup;
pub mod worker;

pub use runtime::{CycleReport, RuntimeOptions, RuntimeStats, TacticsRuntime};
pub use worker::{BackgroundWorker, WorkerStats};
