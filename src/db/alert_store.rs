//! Alert repository
//!
//! The core's interface to persistent alert documents: point lookup,
//! filtered listing, atomic partial update, tag push, hard delete, and the
//! projected re-fetch the notifier uses to build its outbound payload.
//!
//! The store keeps its primary key in `_id`; that name never leaks past this
//! module. Documents are renamed to the public `id` attribute on the way out.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::stream::TryStreamExt;
use mongodb::{Collection, Database};
use serde_json::{Map, Value};

use crate::models::alert::{iso_millis, Alert, HistoryEntry};
use crate::services::query::{AlertQuery, MatchRule, SortDirection};
use crate::utils::{AppError, AppResult};

/// Persistent alert document operations
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Point lookup by public id
    async fn get(&self, id: &str) -> AppResult<Option<Alert>>;

    /// Filtered, sorted, optionally limited listing
    async fn list(&self, query: &AlertQuery) -> AppResult<Vec<Alert>>;

    /// Partial merge of the supplied fields; returns whether a matching
    /// document existed (distinguishes "no such alert" from a no-op update)
    async fn update(&self, id: &str, fields: &Map<String, Value>) -> AppResult<bool>;

    /// Atomic append of one history entry
    async fn push_history(&self, id: &str, entry: &HistoryEntry) -> AppResult<()>;

    /// Atomic push of the supplied tag document fields
    async fn append_tag(&self, id: &str, tag: &Map<String, Value>) -> AppResult<()>;

    /// Hard delete; returns whether a document was removed
    async fn delete(&self, id: &str) -> AppResult<bool>;

    /// Re-fetch for the notifier: the full document minus the internal id
    /// and the history sequence
    async fn fetch_notification_payload(&self, id: &str) -> AppResult<Option<Map<String, Value>>>;
}

/// MongoDB-backed [`AlertStore`]
pub struct MongoAlertStore {
    alerts: Collection<Document>,
}

impl MongoAlertStore {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            alerts: database.collection(collection),
        }
    }
}

#[async_trait]
impl AlertStore for MongoAlertStore {
    async fn get(&self, id: &str) -> AppResult<Option<Alert>> {
        let found = self.alerts.find_one(doc! { "_id": id }).await?;
        found.map(document_to_alert).transpose()
    }

    async fn list(&self, query: &AlertQuery) -> AppResult<Vec<Alert>> {
        let mut find = self
            .alerts
            .find(predicate_document(query))
            .sort(sort_document(query));
        if query.limit > 0 {
            find = find.limit(query.limit);
        }

        let mut cursor = find.await?;
        let mut alerts = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            alerts.push(document_to_alert(doc)?);
        }
        Ok(alerts)
    }

    async fn update(&self, id: &str, fields: &Map<String, Value>) -> AppResult<bool> {
        let set = bson::to_document(fields)?;
        let result = self
            .alerts
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn push_history(&self, id: &str, entry: &HistoryEntry) -> AppResult<()> {
        self.alerts
            .update_one(
                doc! { "_id": id },
                doc! { "$push": { "history": {
                    "status": entry.status.as_str(),
                    "updateTime": bson::DateTime::from_chrono(entry.update_time),
                }}},
            )
            .await?;
        Ok(())
    }

    async fn append_tag(&self, id: &str, tag: &Map<String, Value>) -> AppResult<()> {
        let push = bson::to_document(tag)?;
        self.alerts
            .update_one(doc! { "_id": id }, doc! { "$push": push })
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.alerts.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn fetch_notification_payload(&self, id: &str) -> AppResult<Option<Map<String, Value>>> {
        let found = self
            .alerts
            .find_one(doc! { "_id": id })
            .projection(doc! { "_id": 0, "history": 0 })
            .await?;

        Ok(found.map(|doc| {
            doc.into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect()
        }))
    }
}

/// Translate the request-scoped predicate into a store filter document
pub fn predicate_document(query: &AlertQuery) -> Document {
    let mut filter = Document::new();

    for (field, rule) in &query.filters {
        match rule {
            MatchRule::IdPrefix(prefix) => {
                filter.insert("_id", doc! { "$regex": format!("^{}", prefix) });
            }
            MatchRule::Regex(fragment) => {
                filter.insert(
                    field.as_str(),
                    doc! { "$regex": fragment.clone(), "$options": "i" },
                );
            }
            MatchRule::OneOf(values) => {
                filter.insert(field.as_str(), doc! { "$in": values.clone() });
            }
        }
    }

    if let Some((from, to)) = query.last_receive_window {
        filter.insert(
            "lastReceiveTime",
            doc! {
                "$gte": bson::DateTime::from_chrono(from),
                "$lt": bson::DateTime::from_chrono(to),
            },
        );
    }

    filter
}

/// Translate the sort specification into a store sort document
pub fn sort_document(query: &AlertQuery) -> Document {
    let mut sort = Document::new();
    for (field, direction) in &query.sort {
        let order = match direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        };
        sort.insert(field.as_str(), order);
    }
    sort
}

/// Rename `_id` to `id` and decode the stored document into the model
pub fn document_to_alert(mut doc: Document) -> AppResult<Alert> {
    let id = match doc.remove("_id") {
        Some(Bson::String(id)) => id,
        Some(other) => other.to_string(),
        None => return Err(AppError::Database("alert document without _id".to_string())),
    };

    let mut json = Map::new();
    json.insert("id".to_string(), Value::String(id));
    for (key, value) in doc {
        json.insert(key, bson_to_json(value));
    }

    serde_json::from_value(Value::Object(json))
        .map_err(|e| AppError::Database(format!("malformed alert document: {}", e)))
}

/// Convert a stored value to JSON, rendering timestamps in the API's wire
/// format instead of extended-JSON `$date` wrappers.
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::DateTime(dt) => Value::String(iso_millis::to_string(&dt.to_chrono())),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => other.into_relaxed_extjson(),
    }
}
