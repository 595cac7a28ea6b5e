//! Finds every genotype record that carries a given marker.

use super::context::SearchContext;
use super::escape::MarkerKey;
use super::traits::{DocumentStore, Filter, Result};
use super::types::{Collections, Document};

pub struct MarkerScanner<'a, S: ?Sized> {
    store: &'a S,
    collections: &'a Collections,
}

impl<'a, S: DocumentStore + ?Sized> MarkerScanner<'a, S> {
    pub fn new(store: &'a S, collections: &'a Collections) -> Self {
        Self { store, collections }
    }

    /// Records where the marker's stored field exists, verbatim and in store order.
    pub async fn scan(&self, ctx: &SearchContext, marker: &MarkerKey) -> Result<Vec<Document>> {
        let filter = Filter::field_exists(marker.stored());
        let records = ctx
            .run(self.store.find(&self.collections.populations, &filter))
            .await?;

        tracing::debug!(
            "marker \"{}\" present in {} records",
            marker.display(),
            records.len()
        );
        Ok(records)
    }
}
