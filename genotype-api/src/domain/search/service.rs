//! Search service: turns one request into a status and a list of projected records.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use super::context::SearchContext;
use super::escape::MarkerKey;
use super::join::JoinResolver;
use super::merge::merge_by_population;
use super::projection::Projector;
use super::scan::MarkerScanner;
use super::traits::{DocumentStore, GenotypeSearch, Result};
use super::types::{Document, OperationStatus, SearchConfig, SearchOutcome, SearchRequest, SearchResult};

/// How the surviving candidates are shaped for output.
enum Projection {
    Full,
    MarkerOnly(MarkerKey),
}

struct Candidates {
    records: Vec<Document>,
    projection: Projection,
}

/// Search service over a [`DocumentStore`].
///
/// A population search joins through the varieties collection, merges records
/// sharing a population name and always returns full records. A marker-only
/// search scans for the marker field and honours the caller's full-record
/// flag. With neither, nothing is queried.
pub struct SearchService<S>
where
    S: DocumentStore,
{
    store: S,
    projector: Projector,
    config: SearchConfig,
}

impl<S> SearchService<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, projector: Projector, config: SearchConfig) -> Self {
        Self {
            store,
            projector,
            config,
        }
    }

    /// Create a search service with default schema, collections and timeout.
    #[allow(dead_code)]
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, Projector::with_defaults(), SearchConfig::default())
    }

    /// Execute a search.
    ///
    /// Per-record projection failures lower the status to partial success or
    /// failure; a failed query, timeout or broken join fails the whole search.
    #[instrument(name = "genotype_search", skip(self, ctx))]
    pub async fn run(&self, request: &SearchRequest, ctx: &SearchContext) -> SearchOutcome {
        match self.collect(request, ctx).await {
            Ok(None) => SearchOutcome::empty(OperationStatus::Succeeded),
            Ok(Some(candidates)) => self.project(candidates),
            Err(err) => {
                tracing::error!("search failed: {}", err);
                SearchOutcome::empty(OperationStatus::Failed)
            }
        }
    }

    async fn collect(&self, request: &SearchRequest, ctx: &SearchContext) -> Result<Option<Candidates>> {
        let schema = self.projector.schema();

        if let Some(population) = request.population() {
            let records = JoinResolver::new(&self.store, &self.config.collections, schema)
                .resolve(ctx, population)
                .await?;

            // A population search means every marker for that population.
            return Ok(Some(Candidates {
                records: merge_by_population(records, schema),
                projection: Projection::Full,
            }));
        }

        if let Some(marker) = request.marker() {
            let marker = MarkerKey::new(marker)?;
            let records = MarkerScanner::new(&self.store, &self.config.collections)
                .scan(ctx, &marker)
                .await?;

            let projection = if request.full_record() {
                Projection::Full
            } else {
                Projection::MarkerOnly(marker)
            };
            return Ok(Some(Candidates {
                records,
                projection,
            }));
        }

        Ok(None)
    }

    fn project(&self, candidates: Candidates) -> SearchOutcome {
        let schema = self.projector.schema();
        let total = candidates.records.len();
        let mut results = Vec::with_capacity(total);

        for mut record in candidates.records {
            record.remove(schema.id);
            let title = record
                .get(schema.population_name)
                .and_then(Value::as_str)
                .map(str::to_owned);

            let projected = match &candidates.projection {
                Projection::Full => self.projector.build_full(record),
                Projection::MarkerOnly(marker) => {
                    self.projector
                        .build_marker_only(&record, marker.stored(), marker.display())
                }
            };

            match projected {
                Ok(data) => results.push(SearchResult::inline(title, data)),
                Err(err) => tracing::warn!(
                    "skipping record for \"{}\": {}",
                    title.as_deref().unwrap_or("<unnamed>"),
                    err
                ),
            }
        }

        let status = OperationStatus::from_counts(results.len(), total);
        tracing::info!("{} of {} records returned, {}", results.len(), total, status);
        SearchOutcome { status, results }
    }
}

#[async_trait]
impl<S> GenotypeSearch for SearchService<S>
where
    S: DocumentStore + 'static,
{
    fn new_context(&self) -> SearchContext {
        SearchContext::with_timeout(self.config.query_timeout)
    }

    async fn search(&self, request: &SearchRequest, ctx: &SearchContext) -> SearchOutcome {
        self.run(request, ctx).await
    }
}
