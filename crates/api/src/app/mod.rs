//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the shared project registry
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{middleware::from_fn, routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every API route is served both at the root and under the `/1` prefix.
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let api = routes::router();

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api.clone())
        .nest("/1", api)
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(from_fn(middleware::log_requests)))
}
