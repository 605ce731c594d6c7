//! Alert API endpoints
//!
//! The request dispatcher: the five supported operations, the POST method
//! override for limited clients, and the fallback for everything else.
//! Every path through here ends in `finish`, which records the usage metric
//! for the operation class and renders the single response envelope.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::Method;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::db::MetricClass;
use crate::models::alert::{tally_counts, AlertStatus};
use crate::models::envelope::{render, AlertListing, ApiOutcome};
use crate::services::query::{build_list_params, callback_param, parse_query_pairs, ListParams};
use crate::utils::AppResult;
use crate::AppState;

/// Create the alert routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", get(list_alerts))
        .route(
            "/alerts/alert/{id}",
            get(get_alert)
                .put(modify_alert)
                .post(modify_alert)
                .delete(delete_alert),
        )
        .route(
            "/alerts/alert/{id}/tag",
            axum::routing::put(modify_tag).post(modify_tag),
        )
}

/// Fallback for requests matching none of the supported operations
pub async fn unmatched(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let started = Instant::now();
    let pairs = parse_query_pairs(raw.as_deref().unwrap_or(""));
    let callback = callback_param(&pairs);
    finish(
        &state,
        MetricClass::Bad,
        ApiOutcome::Error("unknown error".to_string()),
        started,
        callback,
    )
    .await
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /alerts/alert/{id}: single-alert fetch
async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawQuery(raw): RawQuery,
) -> Response {
    let started = Instant::now();
    let pairs = parse_query_pairs(raw.as_deref().unwrap_or(""));
    let callback = callback_param(&pairs);

    let outcome = match state.alerts.get(&id).await {
        Ok(found) => ApiOutcome::SingleAlert(found),
        Err(err) => {
            error!("{} : Alert lookup failed: {}", id, err);
            ApiOutcome::Error(err.to_string())
        }
    };

    finish(&state, MetricClass::SimpleGet, outcome, started, callback).await
}

/// GET /alerts: filtered/sorted list with aggregate counts
async fn list_alerts(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let started = Instant::now();
    let pairs = parse_query_pairs(raw.as_deref().unwrap_or(""));
    let callback = callback_param(&pairs);
    let params = build_list_params(&pairs, Utc::now());

    let outcome = match fetch_listing(&state, &params).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Alert listing failed: {}", err);
            ApiOutcome::Error(err.to_string())
        }
    };

    finish(&state, MetricClass::ComplexGet, outcome, started, callback).await
}

async fn fetch_listing(state: &AppState, params: &ListParams) -> AppResult<ApiOutcome> {
    // Historically the aggregate counts only cover the limit-bounded page
    // that is returned; counts_over_full_set widens them to the whole
    // filtered set while still truncating the returned details.
    let page_limit = params.query.limit.max(0) as usize;
    let alerts = if state.config.api.counts_over_full_set && params.query.limit > 0 {
        let mut unbounded = params.query.clone();
        unbounded.limit = 0;
        state.alerts.list(&unbounded).await?
    } else {
        state.alerts.list(&params.query).await?
    };

    let total = alerts.len() as u64;
    let (status_counts, severity_counts) = tally_counts(&alerts);

    let alert_details = if params.hide_details {
        None
    } else {
        let mut details = alerts;
        if page_limit > 0 && details.len() > page_limit {
            details.truncate(page_limit);
        }
        Some(details)
    };

    Ok(ApiOutcome::AlertList {
        listing: AlertListing {
            status_counts,
            severity_counts,
            alert_details,
        },
        total,
    })
}

/// PUT/POST /alerts/alert/{id}: partial update, or whatever operation the
/// body's `_method` override selects. The override marker never reaches the
/// store, and clients limited to POST get the full surface through it.
async fn modify_alert(
    State(state): State<AppState>,
    method: Method,
    Path(id): Path<String>,
    RawQuery(raw): RawQuery,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let pairs = parse_query_pairs(raw.as_deref().unwrap_or(""));
    let callback = callback_param(&pairs);

    let mut fields = match parse_body(&body) {
        Ok(fields) => fields,
        Err(message) => {
            return finish(
                &state,
                MetricClass::Bad,
                ApiOutcome::Error(message),
                started,
                callback,
            )
            .await;
        }
    };

    let effective =
        method_override(&mut fields).unwrap_or_else(|| method.as_str().to_uppercase());

    match effective.as_str() {
        "PUT" => {
            let outcome = apply_update(&state, &id, fields).await;
            finish(&state, MetricClass::Update, outcome, started, callback).await
        }
        "DELETE" => {
            let outcome = apply_delete(&state, &id).await;
            finish(&state, MetricClass::Delete, outcome, started, callback).await
        }
        _ => {
            finish(
                &state,
                MetricClass::Bad,
                ApiOutcome::Error("unknown error".to_string()),
                started,
                callback,
            )
            .await
        }
    }
}

/// PUT/POST /alerts/alert/{id}/tag: append-only tag push
async fn modify_tag(
    State(state): State<AppState>,
    method: Method,
    Path(id): Path<String>,
    RawQuery(raw): RawQuery,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let pairs = parse_query_pairs(raw.as_deref().unwrap_or(""));
    let callback = callback_param(&pairs);

    let mut tag = match parse_body(&body) {
        Ok(tag) => tag,
        Err(message) => {
            return finish(
                &state,
                MetricClass::Bad,
                ApiOutcome::Error(message),
                started,
                callback,
            )
            .await;
        }
    };

    let effective = method_override(&mut tag).unwrap_or_else(|| method.as_str().to_uppercase());

    if effective == "PUT" {
        let outcome = apply_tag(&state, &id, tag).await;
        finish(&state, MetricClass::Update, outcome, started, callback).await
    } else {
        finish(
            &state,
            MetricClass::Bad,
            ApiOutcome::Error("unknown error".to_string()),
            started,
            callback,
        )
        .await
    }
}

/// DELETE /alerts/alert/{id}: hard delete
async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawQuery(raw): RawQuery,
) -> Response {
    let started = Instant::now();
    let pairs = parse_query_pairs(raw.as_deref().unwrap_or(""));
    let callback = callback_param(&pairs);

    let outcome = apply_delete(&state, &id).await;
    finish(&state, MetricClass::Delete, outcome, started, callback).await
}

// ============================================================================
// Shared operation logic
// ============================================================================

async fn apply_update(state: &AppState, id: &str, fields: Map<String, Value>) -> ApiOutcome {
    let new_status = fields
        .get("status")
        .and_then(Value::as_str)
        .and_then(AlertStatus::from_str);

    match state.alerts.update(id, &fields).await {
        Ok(true) => {
            if let Some(status) = new_status {
                state.notifier.status_changed(id, status).await;
            }
            ApiOutcome::Mutation
        }
        Ok(false) => ApiOutcome::Error("No existing alert with that ID found".to_string()),
        Err(err) => {
            error!("{} : Update failed: {}", id, err);
            ApiOutcome::Error(err.to_string())
        }
    }
}

async fn apply_tag(state: &AppState, id: &str, tag: Map<String, Value>) -> ApiOutcome {
    match state.alerts.append_tag(id, &tag).await {
        Ok(()) => ApiOutcome::Mutation,
        Err(err) => {
            error!("{} : Tag push failed: {}", id, err);
            ApiOutcome::Error(err.to_string())
        }
    }
}

async fn apply_delete(state: &AppState, id: &str) -> ApiOutcome {
    // The remove is acknowledged even when nothing matched; a delete of a
    // missing id is not an error.
    match state.alerts.delete(id).await {
        Ok(_) => ApiOutcome::Mutation,
        Err(err) => {
            error!("{} : Delete failed: {}", id, err);
            ApiOutcome::Error(err.to_string())
        }
    }
}

/// Parse a PUT/POST body as a JSON object. Failure degrades the request to
/// the generic error outcome instead of a transport-level rejection.
fn parse_body(body: &Bytes) -> Result<Map<String, Value>, String> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) | Err(_) => Err("failed to parse json data in body".to_string()),
    }
}

/// Pop the `_method` override from a parsed body, normalized to uppercase
fn method_override(fields: &mut Map<String, Value>) -> Option<String> {
    fields
        .remove("_method")
        .and_then(|v| v.as_str().map(|s| s.to_uppercase()))
}

/// Record the usage metric and render the envelope
async fn finish(
    state: &AppState,
    class: MetricClass,
    outcome: ApiOutcome,
    started: Instant,
    callback: Option<String>,
) -> Response {
    let elapsed = started.elapsed();
    let elapsed_ms = elapsed.as_millis() as i64;

    if let Err(err) = state.metrics.record(class, elapsed_ms).await {
        warn!("Failed to record {} metric: {}", class.name(), err);
    }
    info!("Request ({}) completed in {}ms", class.name(), elapsed_ms);

    render(
        outcome,
        elapsed,
        state.config.warning.as_deref(),
        callback.as_deref(),
    )
}
