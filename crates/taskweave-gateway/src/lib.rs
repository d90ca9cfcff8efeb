//! REST CRUD and SSE event surface over the supervisor.

/// Route handlers and router construction.
pub mod server;
/// Server-sent events endpoint.
pub mod sse;

pub use server::build;
