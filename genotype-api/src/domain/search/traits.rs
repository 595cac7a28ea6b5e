//! Trait definitions for search domain abstractions.
//!
//! These traits enable dependency injection and easy testing through an
//! in-memory store.

use async_trait::async_trait;

use super::context::SearchContext;
use super::types::{Document, RecordId, SearchOutcome, SearchRequest};

/// Error raised by a document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid collection name: {0:?}")]
    InvalidCollection(String),

    #[error("Malformed document in {collection}: {reason}")]
    MalformedDocument { collection: String, reason: String },

    #[error("Store query timed out")]
    Timeout,

    #[error("Store query cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

/// Error that aborts a whole search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Could not build query: {0}")]
    QueryConstruction(String),

    #[error("Malformed variety id {0}")]
    MalformedId(String),

    #[error("Variety id {id} resolved to {matches} population records")]
    UnresolvedId { id: RecordId, matches: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// A structural query against one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Top-level string field equal to `value`.
    FieldEquals { field: String, value: String },
    /// Document whose storage-internal id is `id`.
    IdEquals(RecordId),
    /// Top-level field present, whatever its value.
    FieldExists(String),
}

impl Filter {
    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field_exists(field: impl Into<String>) -> Self {
        Self::FieldExists(field.into())
    }
}

/// Trait for document persistence and retrieval.
///
/// Every returned document carries its id under [`ID_FIELD`](super::schema::ID_FIELD).
/// Implementations share one connection between concurrent callers and add
/// no locking of their own.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching `filter`, in store order.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> std::result::Result<Vec<Document>, StoreError>;

    /// Store a document, escaping its keys first.
    ///
    /// An id supplied under the id field is kept; otherwise one is generated.
    #[allow(dead_code)]
    async fn insert(
        &self,
        collection: &str,
        document: Document,
    ) -> std::result::Result<RecordId, StoreError>;
}

/// Inbound port: what HTTP handlers invoke.
#[async_trait]
pub trait GenotypeSearch: Send + Sync + 'static {
    /// A context bounded by the configured query timeout.
    fn new_context(&self) -> SearchContext;

    /// Run one search. Never fails; every outcome is carried in the status.
    async fn search(&self, request: &SearchRequest, ctx: &SearchContext) -> SearchOutcome;
}
