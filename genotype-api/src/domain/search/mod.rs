//! Parental genotype search: marker and population queries over two document collections.
//!
//! Genotype records live in a populations collection, one document per
//! (population, marker set) with every marker stored as a top-level key. A
//! varieties collection maps a population display name to the ids of its
//! records.
//!
//! # Architecture
//!
//! - [`DocumentStore`] - Collection queries (PostgreSQL, in-memory for tests)
//! - [`GenotypeSearch`] - What HTTP handlers call; implemented by [`SearchService`]
//!
//! A search flows through these stages:
//!
//! 1. Population given: resolve it through the varieties collection
//!    (`join`) and merge records sharing a population name (`merge`).
//! 2. Otherwise a marker given: find every record carrying it (`scan`).
//! 3. Project each candidate (`projection`), counting failures into the
//!    final [`OperationStatus`].
//!
//! Marker names may contain `.`, which is stored escaped (`escape`).
//!
//! # Example
//!
//! ```ignore
//! use genotype_api::domain::search::{SearchService, SearchRequest, GenotypeSearch};
//! use genotype_api::domain::search::store::PgDocumentStore;
//!
//! let service = SearchService::with_defaults(PgDocumentStore::new(pool));
//! let outcome = service.search(&SearchRequest::for_marker("Contig.1234"), &service.new_context()).await;
//! ```

mod context;
mod escape;
mod join;
mod merge;
mod projection;
mod scan;
mod schema;
mod service;
mod traits;
mod types;

pub mod store;

// Re-export main types
pub use projection::{InvalidMapping, NameMappings, Projector};
pub use schema::Schema;
pub use service::SearchService;
pub use traits::GenotypeSearch;
pub use types::{Collections, OperationStatus, SearchConfig, SearchOutcome, SearchRequest};
