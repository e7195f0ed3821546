use serde::Deserialize;
use serde_json::Value as JsonValue;

use nommer_core::{Event, Project, ProjectSummary};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterProjectRequest {
    /// Optional so a missing name reaches validation instead of failing to decode.
    pub name: Option<String>,
}

/// Parse an event submission body.
///
/// Malformed JSON becomes `null` so that authentication still runs before the
/// payload is rejected.
pub fn parse_event_body(body: &[u8]) -> JsonValue {
    serde_json::from_slice(body).unwrap_or(JsonValue::Null)
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// Full project including its plaintext key. Only used for the registration response.
pub fn project_to_json(project: &Project) -> JsonValue {
    serde_json::json!({
        "id": project.id.to_string(),
        "name": project.name.as_str(),
        "apiKey": project.api_key.as_str(),
        "events": project.events.iter().map(event_to_json).collect::<Vec<_>>(),
    })
}

pub fn event_to_json(event: &Event) -> JsonValue {
    serde_json::json!({
        "timestamp": event.timestamp.to_rfc3339(),
        "data": event.data,
    })
}

pub fn project_summary_to_json(summary: &ProjectSummary) -> JsonValue {
    serde_json::json!({
        "id": summary.id.to_string(),
        "name": summary.name.as_str(),
        "eventCount": summary.event_count,
    })
}

#[cfg(test)]
mod tests {
    use nommer_core::{ApiKey, ProjectName};
    use serde_json::{Map, json};

    use super::*;

    #[test]
    fn malformed_body_parses_to_null() {
        assert_eq!(parse_event_body(b"{not json"), JsonValue::Null);
        assert_eq!(parse_event_body(b""), JsonValue::Null);
        assert_eq!(parse_event_body(br#"{"event":{}}"#), json!({"event": {}}));
    }

    #[test]
    fn registration_json_exposes_key_and_empty_events() {
        let project = Project::register(ProjectName::parse("alpha").unwrap(), ApiKey::new("k"));
        let value = project_to_json(&project);
        assert_eq!(value["apiKey"], "k");
        assert_eq!(value["events"], json!([]));
        assert_eq!(value["id"], project.id.to_string());
    }

    #[test]
    fn event_json_carries_timestamp_and_data() {
        let mut data = Map::new();
        data.insert("x".to_string(), json!(1));
        let event = Event::accept(data);

        let value = event_to_json(&event);
        assert_eq!(value["data"], json!({"x": 1}));
        let ts = chrono::DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).unwrap();
        assert_eq!(ts, event.timestamp);
    }

    #[test]
    fn summary_json_counts_events_and_omits_key() {
        let mut project =
            Project::register(ProjectName::parse("alpha").unwrap(), ApiKey::new("secret"));
        project.events.push(Event::accept(Map::new()));

        let value = project_summary_to_json(&project.summary());
        assert_eq!(value["name"], "alpha");
        assert_eq!(value["eventCount"], 1);
        assert!(value.get("apiKey").is_none());
    }
}
