//! `nommer-core`: project and event domain model.
//!
//! This crate contains **pure domain** types plus API key issuance
//! (no storage or transport concerns).

pub mod api_key;
pub mod error;
pub mod id;
pub mod project;

pub use api_key::{API_KEY_HEX_LEN, ApiKey, KeyIssueError, KeyIssuer, SecureKeyIssuer};
pub use error::{DomainError, DomainResult};
pub use id::ProjectId;
pub use project::{Event, Project, ProjectName, ProjectSummary, extract_event_payload};
