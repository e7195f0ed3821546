//! Infrastructure layer: project document stores and the registry that
//! orchestrates registration and event append against them.

pub mod project_store;
pub mod registry;

pub use project_store::{InMemoryProjectStore, PostgresProjectStore, ProjectStore, ProjectStoreError};
pub use registry::{DEFAULT_STORE_TIMEOUT, ProjectRegistry, RegistryError};
