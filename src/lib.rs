//! Alerta data API
//!
//! HTTP front end over the alert document store: single-alert fetch,
//! filtered listing with aggregate counts, partial updates with status
//! change notification over STOMP, tag pushes and deletes.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
use db::{AlertStore, MetricsStore};
use services::notifier::StatusNotifier;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub alerts: Arc<dyn AlertStore>,
    pub metrics: Arc<dyn MetricsStore>,
    pub notifier: Arc<StatusNotifier>,
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let base_path = state.config.api.base_path.clone();

    Router::new()
        .nest(&base_path, api::routes())
        .fallback(api::alerts::unmatched)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
