//! Postgres-backed project document store.
//!
//! Each project is one row whose `events` column is a JSONB array, which makes
//! the row the "document". Appends are a single `UPDATE ... SET events = events
//! || ...` statement: Postgres takes the row lock for the duration of the
//! update, so concurrent pushes to the same project serialize and none is lost.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | ProjectStoreError | Scenario |
//! |------------|----------------------|-------------------|----------|
//! | Database (unique violation) | `23505` | `NameTaken` | Two registrations raced on the same name |
//! | Database (other) | Any other | `Backend` | Constraint/SQL failures |
//! | PoolClosed | N/A | `Closed` | Pool shut down while the call was in flight |
//! | Other | N/A | `Backend` | Network errors, decode failures, etc. |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use nommer_core::{ApiKey, Event, Project, ProjectId, ProjectName, ProjectSummary};

use super::r#trait::{ProjectStore, ProjectStoreError};

const CREATE_PROJECTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        api_key TEXT NOT NULL,
        events JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT projects_name_key UNIQUE (name)
    )
"#;

/// Postgres-backed project store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is `Send + Sync` and handles
/// connection management; the store adds no locking of its own.
///
/// ## Name Uniqueness
///
/// The `projects_name_key` unique constraint is the authoritative uniqueness
/// guarantee. An insert that loses a registration race fails with `23505`,
/// which is surfaced as `ProjectStoreError::NameTaken`.
#[derive(Debug, Clone)]
pub struct PostgresProjectStore {
    pool: Arc<PgPool>,
}

impl PostgresProjectStore {
    /// Create a new PostgresProjectStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `projects` table and its unique index if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), ProjectStoreError> {
        sqlx::query(CREATE_PROJECTS_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    /// Close the underlying pool. In-flight calls fail with `Closed`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ProjectStore for PostgresProjectStore {
    #[instrument(skip_all, fields(project = %name), err)]
    async fn find_by_name(
        &self,
        name: &ProjectName,
    ) -> Result<Option<Project>, ProjectStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, api_key, events
            FROM projects
            WHERE name = $1
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_name", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: uuid::Uuid = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("decode_project", e))?;
        let stored_name: String = row
            .try_get("name")
            .map_err(|e| map_sqlx_error("decode_project", e))?;
        let api_key: String = row
            .try_get("api_key")
            .map_err(|e| map_sqlx_error("decode_project", e))?;
        let Json(events): Json<Vec<Event>> = row
            .try_get("events")
            .map_err(|e| map_sqlx_error("decode_project", e))?;

        let name = ProjectName::parse(&stored_name).map_err(|e| {
            ProjectStoreError::Backend(format!("stored project name is invalid: {e}"))
        })?;

        Ok(Some(Project {
            id: ProjectId::from_uuid(id),
            name,
            api_key: ApiKey::new(api_key),
            events,
        }))
    }

    #[instrument(skip_all, fields(project = %project.name), err)]
    async fn insert(&self, project: &Project) -> Result<(), ProjectStoreError> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, api_key, events)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(project.id.as_uuid())
        .bind(project.name.as_str())
        .bind(project.api_key.as_str())
        .bind(Json(&project.events))
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ProjectStoreError::NameTaken(project.name.to_string())
            } else {
                map_sqlx_error("insert_project", e)
            }
        })?;

        Ok(())
    }

    #[instrument(skip_all, fields(project = %name), err)]
    async fn push_event(
        &self,
        name: &ProjectName,
        event: &Event,
    ) -> Result<(), ProjectStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET events = events || jsonb_build_array($2::jsonb)
            WHERE name = $1
            "#,
        )
        .bind(name.as_str())
        .bind(Json(event))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("push_event", e))?;

        if result.rows_affected() == 0 {
            return Err(ProjectStoreError::NotFound(name.to_string()));
        }
        Ok(())
    }

    #[instrument(skip_all, err)]
    async fn list(&self) -> Result<Vec<ProjectSummary>, ProjectStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, jsonb_array_length(events)::BIGINT AS event_count
            FROM projects
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_projects", e))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let id: uuid::Uuid = row
                .try_get("id")
                .map_err(|e| map_sqlx_error("decode_summary", e))?;
            let name: String = row
                .try_get("name")
                .map_err(|e| map_sqlx_error("decode_summary", e))?;
            let event_count: i64 = row
                .try_get("event_count")
                .map_err(|e| map_sqlx_error("decode_summary", e))?;

            summaries.push(ProjectSummary {
                id: ProjectId::from_uuid(id),
                name: ProjectName::parse(&name).map_err(|e| {
                    ProjectStoreError::Backend(format!("stored project name is invalid: {e}"))
                })?,
                event_count: event_count.max(0) as u64,
            });
        }
        Ok(summaries)
    }
}

/// Map SQLx errors to ProjectStoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> ProjectStoreError {
    match err {
        sqlx::Error::Database(db_err) => ProjectStoreError::Backend(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            ProjectStoreError::Closed(format!("connection pool closed in {operation}"))
        }
        _ => ProjectStoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
