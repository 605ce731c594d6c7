//! Response envelope
//!
//! Every request, success or failure, is answered with the same wrapper:
//! `{"response": {status, time, localTime, ...}}` with exactly one domain
//! field (`alert` or `alerts`) set per outcome type. The outcome of a
//! dispatched operation is modeled as a tagged union and only turned into
//! the loosely-shaped envelope at the serialization boundary.

use std::time::Duration;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Local;
use serde::Serialize;
use serde_json::Value;

use crate::models::alert::{Alert, SeverityCounts, StatusCounts};

/// The `alerts` payload of a list response
#[derive(Debug, Clone, Serialize)]
pub struct AlertListing {
    #[serde(rename = "statusCounts")]
    pub status_counts: StatusCounts,
    #[serde(rename = "severityCounts")]
    pub severity_counts: SeverityCounts,
    /// Omitted entirely when `hide-alert-details` is set
    #[serde(rename = "alertDetails", skip_serializing_if = "Option::is_none")]
    pub alert_details: Option<Vec<Alert>>,
}

/// Result of one dispatched operation
#[derive(Debug)]
pub enum ApiOutcome {
    /// Single-alert fetch; `None` is the distinct "not found" state
    SingleAlert(Option<Alert>),
    /// Filtered listing with aggregate counts
    AlertList { listing: AlertListing, total: u64 },
    /// Update, tag push or delete that succeeded; `status` only
    Mutation,
    /// Anything that fell through or failed
    Error(String),
}

#[derive(Serialize)]
struct Envelope {
    status: &'static str,
    time: String,
    #[serde(rename = "localTime")]
    local_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alerts: Option<AlertListing>,
}

#[derive(Serialize)]
struct ResponseDocument {
    response: Envelope,
}

/// Render an outcome as the HTTP response.
///
/// `elapsed` is the request latency measured by the handler; `warning` is the
/// informational config key, surfaced on every envelope when present. When a
/// JSONP `callback` is supplied the JSON body is wrapped as `callback(JSON);`
/// and served as javascript.
pub fn render(
    outcome: ApiOutcome,
    elapsed: Duration,
    warning: Option<&str>,
    callback: Option<&str>,
) -> Response {
    let mut envelope = Envelope {
        status: "error",
        time: format!("{:.3}", elapsed.as_secs_f64()),
        local_time: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        total: None,
        message: None,
        warning: warning.map(String::from),
        alert: None,
        alerts: None,
    };

    match outcome {
        ApiOutcome::SingleAlert(Some(alert)) => {
            envelope.status = "ok";
            envelope.total = Some(1);
            envelope.alert = Some(serde_json::to_value(&alert).unwrap_or(Value::Null));
        }
        ApiOutcome::SingleAlert(None) => {
            envelope.status = "not found";
            envelope.total = Some(0);
            envelope.alert = Some(Value::Null);
        }
        ApiOutcome::AlertList { listing, total } => {
            envelope.status = "ok";
            envelope.total = Some(total);
            envelope.alerts = Some(listing);
        }
        ApiOutcome::Mutation => {
            envelope.status = "ok";
        }
        ApiOutcome::Error(message) => {
            envelope.status = "error";
            envelope.message = Some(message);
        }
    }

    let body = match serde_json::to_string(&ResponseDocument { response: envelope }) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!("Failed to serialize response envelope: {}", err);
            r#"{"response":{"status":"error","message":"internal serialization error"}}"#
                .to_string()
        }
    };

    match callback {
        Some(cb) => (
            [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
            format!("{}({});", cb, body),
        )
            .into_response(),
        None => (
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            body,
        )
            .into_response(),
    }
}
