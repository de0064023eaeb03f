//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for auth, users, invoices, expense accounts, budgets
//! - The realtime event feed (WebSocket)
//! - Authentication middleware and the typed role gate
//! - The shared error-to-response mapping

pub mod error;
pub mod middleware;
pub mod projections;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tresorerie_core::events::EventHub;
use tresorerie_core::fiscal::FiscalYearResolver;
use tresorerie_core::storage::FileStore;
use tresorerie_shared::JwtService;

/// Largest request body accepted, uploads included.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DatabaseConnection,
    /// JWT service for token operations.
    pub jwt: Arc<JwtService>,
    /// File store for attachment bytes.
    pub files: FileStore,
    /// Broadcast hub for change events.
    pub events: Arc<EventHub>,
    /// Fiscal calendar of the organization.
    pub fiscal: FiscalYearResolver,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
