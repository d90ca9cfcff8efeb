//! The workflow execution engine: a dependency-aware, parallel-group
//! scheduler over per-agent runtimes.
//!
//! # Main types
//!
//! - [`WorkflowEngine`] — drives agents to terminal states in cohorts.
//! - [`AgentExecutor`] — seam between scheduling and the agent runtime.
//! - [`AgentEvent`] / [`EventCallback`] — the ordered status stream.

/// The scheduler.
pub mod engine;
/// Agent state-change events.
pub mod events;
/// Executor seam and the production runtime executor.
pub mod executor;

pub use engine::{EngineOutcome, EngineStatus, WorkflowEngine};
pub use events::{null_callback, AgentEvent, EventCallback};
pub use executor::{AgentExecutor, BackendFactory, RuntimeExecutor};
