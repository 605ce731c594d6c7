//! Test application setup utilities
//!
//! Builds the full router over in-memory stores and a recording broker so
//! integration tests exercise the real dispatch, query parsing and envelope
//! rendering.

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use tower::ServiceExt;

use alerta_dbapi::services::notifier::StatusNotifier;
use alerta_dbapi::{create_router, AppConfig, AppState};

use super::mocks::{InMemoryAlertStore, RecordingBroker, RecordingMetrics};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub alerts: Arc<InMemoryAlertStore>,
    pub metrics: Arc<RecordingMetrics>,
    pub broker: Arc<RecordingBroker>,
}

impl TestApp {
    /// Create a test application with default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application with custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        let alerts = Arc::new(InMemoryAlertStore::new());
        let metrics = Arc::new(RecordingMetrics::default());
        let broker = Arc::new(RecordingBroker::default());

        let notifier = Arc::new(StatusNotifier::new(
            alerts.clone(),
            broker.clone(),
            config.broker.topic.clone(),
            Duration::from_secs(config.broker.expiration_secs),
        ));

        let state = AppState {
            config: Arc::new(config),
            alerts: alerts.clone(),
            metrics: metrics.clone(),
            notifier,
        };

        let router = create_router(state);

        Self {
            router,
            alerts,
            metrics,
            broker,
        }
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a PUT request with JSON body
    pub async fn put_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a PUT request with a raw (possibly malformed) body
    pub async fn put_raw(&self, uri: &str, body: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// The inner `response` envelope as a JSON value
    pub fn envelope(&self) -> serde_json::Value {
        let body: serde_json::Value = self.json();
        body.get("response")
            .cloned()
            .expect("Response body has no envelope")
    }

    /// Assert the response status is OK (200); every envelope ships as 200
    pub fn assert_ok(&self) -> &Self {
        assert_eq!(
            self.status,
            axum::http::StatusCode::OK,
            "Expected status 200, got {}. Body: {}",
            self.status,
            self.text()
        );
        self
    }
}
