use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

use crate::middleware::api_key_middleware;

pub mod events;
pub mod projects;
pub mod system;

/// Router for the project and event endpoints.
///
/// Event submission routes carry the API key middleware; registration and
/// listing are open.
pub fn router() -> Router {
    let event_routes = Router::new()
        .route("/projects/:project_name/events", post(events::append_event))
        .route("/:project_name/event", post(events::append_event))
        .route_layer(from_fn(api_key_middleware));

    Router::new()
        .route(
            "/projects",
            post(projects::register_project).get(projects::list_projects),
        )
        .merge(event_routes)
}
