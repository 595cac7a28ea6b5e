//! Resolves a population display name to its genotype records.
//!
//! The varieties collection maps a display name to a list of record ids;
//! each id is then looked up in the populations collection. The join is
//! all-or-nothing: one bad id fails the whole call.

use serde_json::Value;

use super::context::SearchContext;
use super::schema::Schema;
use super::traits::{DocumentStore, Filter, Result, SearchError};
use super::types::{Collections, Document, RecordId};

pub struct JoinResolver<'a, S: ?Sized> {
    store: &'a S,
    collections: &'a Collections,
    schema: &'a Schema,
}

impl<'a, S: DocumentStore + ?Sized> JoinResolver<'a, S> {
    pub fn new(store: &'a S, collections: &'a Collections, schema: &'a Schema) -> Self {
        Self {
            store,
            collections,
            schema,
        }
    }

    /// Every record linked to `population`, in link order.
    pub async fn resolve(&self, ctx: &SearchContext, population: &str) -> Result<Vec<Document>> {
        if population.is_empty() {
            return Err(SearchError::QueryConstruction(
                "population name is empty".to_string(),
            ));
        }

        let filter = Filter::field_equals(self.schema.variety_name, population);
        let varieties = ctx
            .run(self.store.find(&self.collections.varieties, &filter))
            .await?;

        let mut candidates = Vec::new();
        for variety in &varieties {
            let Some(ids) = variety.get(self.schema.variety_ids).and_then(Value::as_array) else {
                tracing::warn!(
                    "variety entry for \"{}\" has no \"{}\" list",
                    population,
                    self.schema.variety_ids
                );
                continue;
            };

            for raw_id in ids {
                let id = RecordId::from_json(raw_id)
                    .map_err(|_| SearchError::MalformedId(raw_id.to_string()))?;
                candidates.push(self.fetch_record(ctx, id).await?);
            }
        }

        tracing::debug!(
            "population \"{}\" resolved to {} records via {} variety entries",
            population,
            candidates.len(),
            varieties.len()
        );
        Ok(candidates)
    }

    async fn fetch_record(&self, ctx: &SearchContext, id: RecordId) -> Result<Document> {
        let mut matches = ctx
            .run(
                self.store
                    .find(&self.collections.populations, &Filter::IdEquals(id)),
            )
            .await?;

        if matches.len() != 1 {
            return Err(SearchError::UnresolvedId {
                id,
                matches: matches.len(),
            });
        }
        Ok(matches.remove(0))
    }
}
