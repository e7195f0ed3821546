use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};

use crate::app::{dto, errors, services::AppServices};
use crate::context::PresentedApiKey;

/// Append one event to a project, authenticated by `X-API-Key`.
///
/// The body is taken as raw bytes so that a malformed payload is reported
/// only after the project and key have been checked.
pub async fn append_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(api_key): Extension<PresentedApiKey>,
    Path(project_name): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let body = dto::parse_event_body(&body);
    match services
        .registry()
        .append_event(&project_name, api_key.as_str(), &body)
        .await
    {
        Ok(event) => Json(dto::event_to_json(&event)).into_response(),
        Err(e) => errors::registry_error_to_response(e),
    }
}
