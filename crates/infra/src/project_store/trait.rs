use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use nommer_core::{Event, Project, ProjectName, ProjectSummary};

/// Project store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors
/// (validation). The registry maps them onto its own taxonomy.
///
/// ## Error Categories
///
/// - **NameTaken**: the store's uniqueness constraint on `name` rejected an insert
/// - **NotFound**: an update targeted a project that does not exist
/// - **Closed**: the store was shut down while the call was in flight
/// - **Backend**: any other storage failure (network, corrupt row, poisoned lock)
#[derive(Debug, Error)]
pub enum ProjectStoreError {
    #[error("project name already taken: {0}")]
    NameTaken(String),

    #[error("project not found: {0}")]
    NotFound(String),

    #[error("store closed: {0}")]
    Closed(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Document store holding one document per project.
///
/// Each project document carries its key and its embedded event array.
/// Implementations must be safe for concurrent use; callers add no locking.
///
/// ## Implementation Requirements
///
/// - `insert` must reject a second project with the same `name`
///   (`NameTaken`), even when two inserts race.
/// - `push_event` must append atomically to the single document: concurrent
///   pushes to the same project may land in any order but none may be lost.
/// - Every call is a single atomic operation, so dropping the future never
///   leaves a half-written document.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Find one project by exact name.
    async fn find_by_name(
        &self,
        name: &ProjectName,
    ) -> Result<Option<Project>, ProjectStoreError>;

    /// Insert a new project document.
    async fn insert(&self, project: &Project) -> Result<(), ProjectStoreError>;

    /// Atomically push one event onto the named project's event array.
    async fn push_event(
        &self,
        name: &ProjectName,
        event: &Event,
    ) -> Result<(), ProjectStoreError>;

    /// All projects, ordered by name, without keys or event bodies.
    async fn list(&self) -> Result<Vec<ProjectSummary>, ProjectStoreError>;
}

#[async_trait]
impl<S> ProjectStore for Arc<S>
where
    S: ProjectStore + ?Sized,
{
    async fn find_by_name(
        &self,
        name: &ProjectName,
    ) -> Result<Option<Project>, ProjectStoreError> {
        (**self).find_by_name(name).await
    }

    async fn insert(&self, project: &Project) -> Result<(), ProjectStoreError> {
        (**self).insert(project).await
    }

    async fn push_event(
        &self,
        name: &ProjectName,
        event: &Event,
    ) -> Result<(), ProjectStoreError> {
        (**self).push_event(name, event).await
    }

    async fn list(&self) -> Result<Vec<ProjectSummary>, ProjectStoreError> {
        (**self).list().await
    }
}
