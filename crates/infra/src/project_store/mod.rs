//! Project document store boundary.
//!
//! This module defines the storage abstraction the registry consumes
//! (find-one, insert-one, atomic push, list) without making any transport
//! assumptions, plus in-memory and Postgres implementations.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryProjectStore;
pub use postgres::PostgresProjectStore;
pub use r#trait::{ProjectStore, ProjectStoreError};
