//! Document store implementations.

#[cfg(test)]
mod memory;
mod postgres;

#[cfg(test)]
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

use super::escape::escape_all_keys;
use super::schema::ID_FIELD;
use super::traits::StoreError;
use super::types::{Document, RecordId};

/// Split a document on its way into a store: take out (or generate) its id
/// and escape the remaining keys.
fn prepare_for_insert(
    collection: &str,
    mut document: Document,
) -> Result<(RecordId, Document), StoreError> {
    let id = match document.remove(ID_FIELD) {
        Some(raw) => RecordId::from_json(&raw).map_err(|e| StoreError::MalformedDocument {
            collection: collection.to_string(),
            reason: e.to_string(),
        })?,
        None => RecordId::generate(),
    };

    escape_all_keys(&mut document).map_err(|e| StoreError::MalformedDocument {
        collection: collection.to_string(),
        reason: e.to_string(),
    })?;

    Ok((id, document))
}

/// Rebuild a stored document with its id as the first key.
fn with_id(id: RecordId, body: Document) -> Document {
    let mut document = Document::with_capacity(body.len() + 1);
    document.insert(ID_FIELD.to_string(), id.to_json());
    document.extend(body);
    document
}
