//! Usage metrics recorder
//!
//! Every request, success or failure, increments one management record keyed
//! by operation class: `count += 1`, `totalTime += elapsed ms`. Records are
//! created on first use with their descriptive metadata and never deleted
//! here.

use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::{Collection, Database};

use crate::utils::AppResult;

/// Operation classes the API accounts for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricClass {
    SimpleGet,
    ComplexGet,
    /// Shared by field updates and tag pushes
    Update,
    Delete,
    /// Fallback for unmatched or failed requests
    Bad,
}

impl MetricClass {
    pub fn name(&self) -> &'static str {
        match self {
            MetricClass::SimpleGet => "simple_get",
            MetricClass::ComplexGet => "complex_get",
            MetricClass::Update => "update",
            MetricClass::Delete => "delete",
            MetricClass::Bad => "bad",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MetricClass::SimpleGet => "counter",
            _ => "timer",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MetricClass::SimpleGet => "Simple GET requests",
            MetricClass::ComplexGet => "Complex GET requests",
            MetricClass::Update => "PUT requests",
            MetricClass::Delete => "DELETE requests",
            MetricClass::Bad => "Bad requests",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetricClass::SimpleGet | MetricClass::ComplexGet => {
                "Requests to the alert status API"
            }
            MetricClass::Update => "Requests to update alerts via the API",
            MetricClass::Delete => "Requests to delete alerts via the API",
            MetricClass::Bad => "Failed requests to the API",
        }
    }

    /// The identifying metadata document for this class's management record
    pub fn metadata(&self) -> Document {
        doc! {
            "group": "requests",
            "name": self.name(),
            "type": self.kind(),
            "title": self.title(),
            "description": self.description(),
        }
    }
}

/// Per-operation-class counter storage
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Upsert-increment the record for `class`
    async fn record(&self, class: MetricClass, elapsed_ms: i64) -> AppResult<()>;
}

/// MongoDB-backed [`MetricsStore`] over the management collection
pub struct MongoMetricsStore {
    records: Collection<Document>,
}

impl MongoMetricsStore {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            records: database.collection(collection),
        }
    }
}

#[async_trait]
impl MetricsStore for MongoMetricsStore {
    async fn record(&self, class: MetricClass, elapsed_ms: i64) -> AppResult<()> {
        self.records
            .update_one(
                class.metadata(),
                doc! { "$inc": { "count": 1_i64, "totalTime": elapsed_ms } },
            )
            .upsert(true)
            .await?;
        Ok(())
    }
}
