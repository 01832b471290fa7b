//! Local-first collaborative document editor service.
//!
//! Documents are loro CRDTs located and synchronised by [`repo::DocRepo`];
//! [`session::SessionController`] exposes the one open document to the UI
//! shell served from [`routes`].

pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod repo;
pub mod routes;
pub mod session;

use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use docs::ApiDoc;
use routes::{create_api_routes, AppState};

/// Assemble the HTTP application: API under `/api` and Swagger UI.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_api_routes(state))
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
