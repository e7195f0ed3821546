//! Project and event data model.
//!
//! A [`Project`] is a named client application that owns an append-only event
//! log and a single secret [`ApiKey`]. Events are opaque JSON objects stamped
//! with the server time at which they were accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::api_key::ApiKey;
use crate::error::{DomainError, DomainResult};
use crate::id::ProjectId;

/// Maximum length (in characters) of a project name.
pub const MAX_PROJECT_NAME_LEN: usize = 128;

/// Request body member that carries the event payload.
pub const EVENT_PAYLOAD_KEY: &str = "event";

/// Validated, trimmed project name.
///
/// Names are used verbatim as URL path segments, so `/` and control
/// characters are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        // Surrounding whitespace is normalized away: " alpha" and "alpha" name the same project.
        let name = raw.trim();
        if name.is_empty() {
            return Err(DomainError::validation("project name is required"));
        }
        if name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(DomainError::validation(format!(
                "project name must be at most {MAX_PROJECT_NAME_LEN} characters"
            )));
        }
        if name.chars().any(|c| c == '/' || c.is_control()) {
            return Err(DomainError::validation(
                "project name must not contain '/' or control characters",
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProjectName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A timestamped, opaque JSON payload appended to a project's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Server time at which the event was accepted. Never client-supplied.
    pub timestamp: DateTime<Utc>,
    pub data: Map<String, JsonValue>,
}

impl Event {
    /// Stamp `data` with the current server time.
    pub fn accept(data: Map<String, JsonValue>) -> Self {
        Self {
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Pull the event payload out of a submission body.
///
/// The body must be an object whose `event` member is itself a JSON object.
/// Anything else (including `null` for an unparseable body) is invalid input.
pub fn extract_event_payload(body: &JsonValue) -> DomainResult<Map<String, JsonValue>> {
    match body.get(EVENT_PAYLOAD_KEY) {
        Some(JsonValue::Object(data)) => Ok(data.clone()),
        Some(_) => Err(DomainError::validation("event data must be a JSON object")),
        None => Err(DomainError::validation("event data is required")),
    }
}

/// A registered project, including its secret key and full event log.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: ProjectName,
    pub api_key: ApiKey,
    pub events: Vec<Event>,
}

impl Project {
    /// A freshly registered project with an empty event log.
    pub fn register(name: ProjectName, api_key: ApiKey) -> Self {
        Self {
            id: ProjectId::new(),
            name,
            api_key,
            events: Vec::new(),
        }
    }

    /// Whether `presented` is this project's key.
    pub fn authenticates(&self, presented: &str) -> bool {
        self.api_key.matches(presented)
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            event_count: self.events.len() as u64,
        }
    }
}

/// Read-only listing view of a project. Never carries the API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: ProjectName,
    pub event_count: u64,
}
