//! Vector store gateway with collection semantics and local embeddings.
//!
//! The orchestrator treats the vector store as an opaque
//! key/embedding/metadata store. This crate provides the abstract backend
//! trait, an in-memory brute-force-cosine implementation, a local hashed
//! embedding provider, and the [`VectorGateway`] facade the rest of the
//! system talks to.

/// Embedding provider trait and local implementation.
pub mod embedding;
/// Gateway facade combining backend and embedder.
pub mod gateway;
/// Collections, records, queries, and the in-memory backend.
pub mod store;

pub use embedding::{EmbeddingProvider, HashedEmbedding};
pub use gateway::{CollectionCounts, VectorGateway};
pub use store::{Collection, InMemoryBackend, MetadataFilter, QueryMatch, VectorBackend, VectorRecord};
