use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use nommer_infra::RegistryError;

/// Translate a registry failure into a status code and JSON error body.
///
/// Server-side failures are logged with their detail; clients only see a
/// stable code and a generic message.
pub fn registry_error_to_response(err: RegistryError) -> axum::response::Response {
    match err {
        RegistryError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_input", msg),
        RegistryError::NameConflict(name) => json_error(
            StatusCode::CONFLICT,
            "name_conflict",
            format!("project name already exists: {name}"),
        ),
        RegistryError::ProjectNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "project_not_found", "project not found")
        }
        RegistryError::Unauthorized => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid API key")
        }
        RegistryError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "storage failure")
        }
        RegistryError::StorageTimeout(timeout) => {
            tracing::error!(?timeout, "storage timeout");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_timeout",
                "storage did not respond in time",
            )
        }
        RegistryError::Cancelled(msg) => {
            tracing::error!(error = %msg, "operation cancelled");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "cancelled", "operation cancelled")
        }
        RegistryError::RandomSourceUnavailable(msg) => {
            tracing::error!(error = %msg, "API key issuance failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "key_issuance_failed",
                "could not issue an API key",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn status_of(err: RegistryError) -> StatusCode {
        registry_error_to_response(err).status()
    }

    #[test]
    fn maps_each_error_to_its_status() {
        assert_eq!(status_of(RegistryError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(RegistryError::NameConflict("a".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(RegistryError::ProjectNotFound("a".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(RegistryError::Unauthorized), StatusCode::UNAUTHORIZED);
        for err in [
            RegistryError::Storage("x".into()),
            RegistryError::StorageTimeout(Duration::from_secs(1)),
            RegistryError::Cancelled("x".into()),
            RegistryError::RandomSourceUnavailable("x".into()),
        ] {
            assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
