//! Document store layer
//!
//! Wraps the MongoDB collections holding alert documents and the management
//! records used for usage metrics. All access goes through the [`AlertStore`]
//! and [`MetricsStore`] traits so the request handlers never touch a driver
//! handle directly.

pub mod alert_store;
pub mod metrics;

use anyhow::Result;
use mongodb::{Client, Database};

use crate::config::DatabaseConfig;

pub use alert_store::{AlertStore, MongoAlertStore};
pub use metrics::{MetricClass, MetricsStore, MongoMetricsStore};

/// Connect to the document store and select the configured database
pub async fn init_database(config: &DatabaseConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.url).await?;
    Ok(client.database(&config.database))
}
