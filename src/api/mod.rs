//! API route handlers

pub mod alerts;

use axum::Router;

use crate::AppState;

/// Assemble the API routes mounted under the configured base path
pub fn routes() -> Router<AppState> {
    Router::new().merge(alerts::routes())
}
