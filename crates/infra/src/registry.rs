//! Project registration and event append (application-level orchestration).
//!
//! ```text
//! Register(name)
//!   ↓
//! 1. Validate name
//! 2. Find by name (early NameConflict)
//! 3. Issue key
//! 4. Insert (store unique constraint is authoritative)
//!
//! AppendEvent(name, key, body)
//!   ↓
//! 1. Find by name (ProjectNotFound)
//! 2. Compare key (Unauthorized)
//! 3. Extract payload (InvalidInput)
//! 4. Stamp with server time
//! 5. Atomic push onto the project's events
//! ```
//!
//! Every store call is bounded by the registry's store timeout. Nothing is
//! retried: the first failure is returned to the caller. Each store call is a
//! single atomic operation, so a failed or dropped call leaves no partial state.

use std::future::Future;
use std::time::Duration;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{info, instrument, warn};

use nommer_core::{
    DomainError, Event, KeyIssueError, KeyIssuer, Project, ProjectName, ProjectSummary,
    SecureKeyIssuer, extract_event_payload,
};

use crate::project_store::{ProjectStore, ProjectStoreError};

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Missing or malformed caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A project with this name already exists.
    #[error("project name already exists: {0}")]
    NameConflict(String),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    /// Presented key does not match the project's key.
    #[error("invalid API key")]
    Unauthorized,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("storage call timed out after {0:?}")]
    StorageTimeout(Duration),
    /// The store was shut down underneath an in-flight call.
    #[error("operation cancelled: {0}")]
    Cancelled(String),
    /// Fatal to the issuance attempt; there is no weaker fallback.
    #[error("API key issuance failed: {0}")]
    RandomSourceUnavailable(String),
}

impl From<DomainError> for RegistryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => RegistryError::InvalidInput(msg),
        }
    }
}

impl From<KeyIssueError> for RegistryError {
    fn from(value: KeyIssueError) -> Self {
        match value {
            KeyIssueError::RandomSourceUnavailable(msg) => {
                RegistryError::RandomSourceUnavailable(msg)
            }
        }
    }
}

impl From<ProjectStoreError> for RegistryError {
    fn from(value: ProjectStoreError) -> Self {
        match value {
            ProjectStoreError::NameTaken(name) => RegistryError::NameConflict(name),
            ProjectStoreError::NotFound(name) => RegistryError::ProjectNotFound(name),
            ProjectStoreError::Closed(msg) => RegistryError::Cancelled(msg),
            ProjectStoreError::Backend(msg) => RegistryError::Storage(msg),
        }
    }
}

/// Registers projects and appends events against an injected store.
///
/// ## Generic Parameters
///
/// - `S`: document store (`InMemoryProjectStore`, `PostgresProjectStore`, or
///   `Arc<dyn ProjectStore>`)
/// - `K`: key issuer, `SecureKeyIssuer` unless a test swaps it
#[derive(Debug)]
pub struct ProjectRegistry<S, K = SecureKeyIssuer> {
    store: S,
    issuer: K,
    store_timeout: Duration,
}

impl<S> ProjectRegistry<S> {
    pub fn new(store: S) -> Self {
        Self::with_issuer(store, SecureKeyIssuer::new())
    }
}

impl<S, K> ProjectRegistry<S, K> {
    pub fn with_issuer(store: S, issuer: K) -> Self {
        Self {
            store,
            issuer,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, K> ProjectRegistry<S, K>
where
    S: ProjectStore,
    K: KeyIssuer,
{
    /// Register a new project and return it, including its plaintext key.
    ///
    /// This is the only call that ever exposes the key.
    #[instrument(skip_all, fields(project = %name))]
    pub async fn register(&self, name: &str) -> Result<Project, RegistryError> {
        let name = ProjectName::parse(name)?;

        if self
            .bounded("find_by_name", self.store.find_by_name(&name))
            .await?
            .is_some()
        {
            info!("project name already taken");
            return Err(RegistryError::NameConflict(name.to_string()));
        }

        let api_key = self.issuer.issue(&name)?;
        let project = Project::register(name, api_key);

        // A concurrent registration may have slipped in after the lookup; the
        // store rejects it here with NameTaken -> NameConflict.
        self.bounded("insert", self.store.insert(&project)).await?;

        info!(project_id = %project.id, "project registered");
        Ok(project)
    }

    /// Authenticate `presented_key` against the project and append the event
    /// carried in `body`.
    ///
    /// `body` must look like `{"event": {...}}`. Pass `JsonValue::Null` for a
    /// body that failed to parse; it is rejected only after authentication.
    #[instrument(skip_all, fields(project = %project_name))]
    pub async fn append_event(
        &self,
        project_name: &str,
        presented_key: &str,
        body: &JsonValue,
    ) -> Result<Event, RegistryError> {
        // A name that fails validation can never have been registered.
        let name = ProjectName::parse(project_name)
            .map_err(|_| RegistryError::ProjectNotFound(project_name.to_string()))?;

        let project = self
            .bounded("find_by_name", self.store.find_by_name(&name))
            .await?
            .ok_or_else(|| RegistryError::ProjectNotFound(name.to_string()))?;

        if !project.authenticates(presented_key) {
            warn!("rejected event with invalid API key");
            return Err(RegistryError::Unauthorized);
        }

        let event = Event::accept(extract_event_payload(body)?);

        self.bounded("push_event", self.store.push_event(&name, &event))
            .await?;

        info!("event appended");
        Ok(event)
    }

    /// All registered projects without their keys.
    #[instrument(skip_all)]
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, RegistryError> {
        self.bounded("list", self.store.list()).await
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, ProjectStoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(|e| {
                warn!(operation, error = %e, "store call failed");
                RegistryError::from(e)
            }),
            Err(_) => {
                warn!(operation, timeout = ?self.store_timeout, "store call timed out");
                Err(RegistryError::StorageTimeout(self.store_timeout))
            }
        }
    }
}
