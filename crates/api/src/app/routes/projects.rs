use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::{dto, errors, services::AppServices};

pub async fn register_project(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::RegisterProjectRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_input",
                rejection.body_text(),
            );
        }
    };

    let name = body.name.unwrap_or_default();
    match services.registry().register(&name).await {
        Ok(project) => (StatusCode::CREATED, Json(dto::project_to_json(&project))).into_response(),
        Err(e) => errors::registry_error_to_response(e),
    }
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.registry().list_projects().await {
        Ok(summaries) => {
            let items: Vec<_> = summaries.iter().map(dto::project_summary_to_json).collect();
            Json(serde_json::json!({ "items": items })).into_response()
        }
        Err(e) => errors::registry_error_to_response(e),
    }
}
