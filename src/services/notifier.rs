//! Status-transition notifier
//!
//! Runs after an update that changed an alert's status matched an existing
//! document: append one history entry, re-fetch the alert to build the
//! outbound payload, and publish a single message to the notify topic for
//! downstream consumers. Delivery is best-effort: every failure in this
//! pipeline is logged with the alert id and swallowed, and never alters the
//! HTTP response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::db::AlertStore;
use crate::models::alert::{AlertStatus, HistoryEntry};
use crate::services::stomp::StompClient;
use crate::utils::AppResult;

/// One outbound status-change notification
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    /// Alert category, forwarded as the `type` header
    pub alert_type: String,
    /// Alert id, forwarded as the `correlation-id` header
    pub correlation_id: String,
    /// Absolute expiry, epoch milliseconds
    pub expires_ms: i64,
    /// Serialized alert document
    pub body: String,
}

/// Pub/sub destination for status-change notifications
#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn publish(&self, message: &NotificationMessage) -> AppResult<()>;
}

/// STOMP-backed [`MessageBroker`]: one connection per message, failover
/// across the configured broker list.
pub struct StompBroker {
    brokers: Vec<String>,
    topic: String,
}

impl StompBroker {
    pub fn new(brokers: Vec<String>, topic: String) -> Self {
        Self { brokers, topic }
    }
}

#[async_trait]
impl MessageBroker for StompBroker {
    async fn publish(&self, message: &NotificationMessage) -> AppResult<()> {
        let mut client = StompClient::connect(&self.brokers).await?;

        let headers = vec![
            ("type".to_string(), message.alert_type.clone()),
            ("correlation-id".to_string(), message.correlation_id.clone()),
            ("persistent".to_string(), "true".to_string()),
            ("expires".to_string(), message.expires_ms.to_string()),
            ("repeat".to_string(), "false".to_string()),
        ];
        client
            .send(&self.topic, &headers, message.body.as_bytes())
            .await?;

        info!(
            "{} : Alert sent to {}",
            message.correlation_id,
            client.peer()
        );
        client.disconnect().await?;
        Ok(())
    }
}

/// The status-transition side-effect pipeline
pub struct StatusNotifier {
    store: Arc<dyn AlertStore>,
    broker: Arc<dyn MessageBroker>,
    topic: String,
    expiration: Duration,
}

impl StatusNotifier {
    pub fn new(
        store: Arc<dyn AlertStore>,
        broker: Arc<dyn MessageBroker>,
        topic: String,
        expiration: Duration,
    ) -> Self {
        Self {
            store,
            broker,
            topic,
            expiration,
        }
    }

    /// Handle one confirmed status change: history append, payload re-fetch,
    /// broker publish. Infallible by contract, failures are logged here.
    pub async fn status_changed(&self, id: &str, status: AlertStatus) {
        let entry = HistoryEntry {
            status,
            update_time: Utc::now(),
        };
        if let Err(err) = self.store.push_history(id, &entry).await {
            error!("{} : Failed to append history entry: {}", id, err);
            return;
        }

        let payload = match self.store.fetch_notification_payload(id).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                warn!("{} : Alert disappeared before notification", id);
                return;
            }
            Err(err) => {
                error!("{} : Failed to re-fetch alert for notification: {}", id, err);
                return;
            }
        };

        let alert_type = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut payload = payload;
        payload.insert("id".to_string(), Value::String(id.to_string()));

        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(err) => {
                error!("{} : Failed to serialize notification payload: {}", id, err);
                return;
            }
        };

        let message = NotificationMessage {
            alert_type,
            correlation_id: id.to_string(),
            expires_ms: Utc::now().timestamp_millis() + self.expiration.as_millis() as i64,
            body,
        };

        info!("{} : Fwd alert to {}", id, self.topic);
        if let Err(err) = self.broker.publish(&message).await {
            error!("{} : Failed to send alert to broker: {}", id, err);
        }
    }
}
