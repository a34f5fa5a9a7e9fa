//! # Storage Layer
//!
//! Document persistence for the four collections of an identity namespace
//! (children, tasks, rewards and per-child progress).
//!
//! - [`traits`]: the [`DocumentStore`] contract and its change feed
//! - [`memory`]: volatile store with fault injection
//! - [`yaml_store`]: durable store, one YAML file per collection
//! - [`merge`]: replace / shallow / deep patch semantics
//! - [`documents`]: typed entity <-> document field mapping

pub mod collections;
pub mod connection;
pub mod documents;
pub mod memory;
pub mod merge;
pub mod traits;
pub mod yaml_store;

pub use connection::YamlConnection;
pub use memory::InMemoryDocumentStore;
pub use traits::*;
pub use yaml_store::YamlDocumentStore;
