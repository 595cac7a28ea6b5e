//! In-memory document store for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::Value;

use super::{prepare_for_insert, with_id};
use crate::domain::search::traits::{DocumentStore, Filter, StoreError};
use crate::domain::search::types::{Document, RecordId};

/// Document store backed by an in-memory map of collections.
///
/// Filters behave like [`PgDocumentStore`](super::PgDocumentStore): documents
/// come back in insertion order with their id first. Duplicate ids are
/// allowed so tests can provoke ambiguous joins.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<(RecordId, Document)>>>>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    last_filter: Arc<RwLock<Option<Filter>>>,
}

#[allow(dead_code)]
impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, as `insert` would store it.
    pub fn with_document(self, collection: &str, document: Value) -> Self {
        let document = document
            .as_object()
            .cloned()
            .expect("seed documents must be JSON objects");
        self.store(collection, document)
            .expect("seed document should be storable");
        self
    }

    /// Make every `find` wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `find` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The filter of the most recent `find` call.
    pub fn last_filter(&self) -> Option<Filter> {
        self.last_filter.read().unwrap().clone()
    }

    fn store(&self, collection: &str, document: Document) -> Result<RecordId, StoreError> {
        let (id, body) = prepare_for_insert(collection, document)?;
        self.collections
            .write()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push((id, body));
        Ok(id)
    }
}

fn filter_matches(id: &RecordId, body: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::FieldEquals { field, value } => {
            body.get(field).and_then(Value::as_str) == Some(value.as_str())
        }
        Filter::IdEquals(wanted) => id == wanted,
        Filter::FieldExists(field) => body.contains_key(field),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_filter.write().unwrap() = Some(filter.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let collections = self.collections.read().unwrap();
        let found = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(id, body)| filter_matches(id, body, filter))
                    .map(|(id, body)| with_id(*id, body.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(found)
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<RecordId, StoreError> {
        self.store(collection, document)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn field_equals_matches_strings_only() {
        let store = MemoryDocumentStore::new()
            .with_document("varieties", json!({ "name": "ParW001" }))
            .with_document("varieties", json!({ "name": 1 }))
            .with_document("varieties", json!({ "name": "ParW002" }));

        let found = store
            .find("varieties", &Filter::field_equals("name", "ParW001"))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"], json!("ParW001"));
    }

    #[tokio::test]
    async fn insert_generates_id_and_find_by_id_returns_it() {
        let store = MemoryDocumentStore::new();
        let document = json!({ "population_name": "ParW001" }).as_object().cloned().unwrap();

        let id = store.insert("populations", document).await.unwrap();
        let found = store.find("populations", &Filter::IdEquals(id)).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(RecordId::from_json(&found[0]["_id"]).unwrap(), id);
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_collection_is_empty() {
        let store = MemoryDocumentStore::new();
        let found = store
            .find("nowhere", &Filter::field_exists("anything"))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
