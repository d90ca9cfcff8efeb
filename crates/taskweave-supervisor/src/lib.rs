//! Task lifecycle supervision: decompose → execute → evaluate, with the
//! task registry and the update broadcast.
//!
//! # Main types
//!
//! - [`Supervisor`] — exclusive owner of tasks and their pipelines.
//! - [`Decomposer`] — decomposition LLM call with tolerant parsing.
//! - [`Task`] — the user-facing unit of work.
//! - [`UpdateEvent`] — fan-out to SSE subscribers.

/// Decomposition LLM I/O and DAG validation.
pub mod decompose;
/// The lifecycle supervisor.
pub mod supervisor;
/// Task model.
pub mod task;
/// Subscriber update events.
pub mod updates;

pub use decompose::{parse_decomposition, validate, Decomposer, Decomposition, SubtaskSpec};
pub use supervisor::Supervisor;
pub use task::{Task, TaskEvaluations};
pub use updates::UpdateEvent;
