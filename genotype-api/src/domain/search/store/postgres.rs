//! PostgreSQL document store: one JSONB table per collection.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{prepare_for_insert, with_id};
use crate::domain::search::traits::{DocumentStore, Filter, StoreError};
use crate::domain::search::types::{Document, RecordId};

/// Longest collection name whose index name still fits PostgreSQL's 63-byte identifiers.
const MAX_COLLECTION_LEN: usize = 55;

const INDEX_SUFFIX: &str = "_doc_idx";

/// PostgreSQL-backed document store.
///
/// Each collection is a table `(seq BIGSERIAL, id TEXT PRIMARY KEY, doc JSONB)`.
/// Documents are stored without their id, which lives in the `id` column, and
/// are returned in insertion order.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    doc: Json<Document>,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and GIN index for `collection` if they are missing.
    pub async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        let table = quote_table(collection)?;
        let index = format!("\"{}{}\"", collection, INDEX_SUFFIX);

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                seq BIGSERIAL NOT NULL, \
                id TEXT PRIMARY KEY, \
                doc JSONB NOT NULL)"
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {index} ON {table} USING GIN (doc)"
        ))
        .execute(&self.pool)
        .await?;

        tracing::info!("collection \"{}\" ready", collection);
        Ok(())
    }
}

/// Validate a collection name and quote it for use as a table identifier.
fn quote_table(collection: &str) -> Result<String, StoreError> {
    let mut chars = collection.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_start || !valid_rest || collection.len() > MAX_COLLECTION_LEN {
        return Err(StoreError::InvalidCollection(collection.to_string()));
    }
    Ok(format!("\"{}\"", collection))
}

/// SQL selecting the documents of `table` that match `filter`.
///
/// Parameters are bound in the order [`bind_filter`] binds them.
fn find_sql(table: &str, filter: &Filter) -> String {
    let condition = match filter {
        Filter::FieldEquals { .. } => "jsonb_typeof(doc -> $1) = 'string' AND doc ->> $1 = $2",
        Filter::IdEquals(_) => "id = $1",
        Filter::FieldExists(_) => "doc ? $1",
    };
    format!("SELECT id, doc FROM {table} WHERE {condition} ORDER BY seq")
}

fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (id, doc) VALUES ($1, $2)")
}

fn bind_filter<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, DocumentRow, sqlx::postgres::PgArguments>,
    filter: &'q Filter,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, DocumentRow, sqlx::postgres::PgArguments> {
    match filter {
        Filter::FieldEquals { field, value } => query.bind(field.as_str()).bind(value.as_str()),
        Filter::IdEquals(id) => query.bind(id.to_string()),
        Filter::FieldExists(field) => query.bind(field.as_str()),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let sql = find_sql(&quote_table(collection)?, filter);

        let rows: Vec<DocumentRow> = bind_filter(sqlx::query_as(&sql), filter)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let id = row
                    .id
                    .parse::<RecordId>()
                    .map_err(|e| StoreError::MalformedDocument {
                        collection: collection.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(with_id(id, row.doc.0))
            })
            .collect()
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<RecordId, StoreError> {
        let table = quote_table(collection)?;
        let (id, body) = prepare_for_insert(collection, document)?;

        sqlx::query(&insert_sql(&table))
            .bind(id.to_string())
            .bind(Json(body))
            .execute(&self.pool)
            .await?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_table_accepts_plain_identifiers() {
        assert_eq!(quote_table("populations").unwrap(), "\"populations\"");
        assert_eq!(quote_table("_genotypes_2019").unwrap(), "\"_genotypes_2019\"");
    }

    #[test]
    fn quote_table_rejects_anything_else() {
        for name in ["", "1st", "pop-names", "a\"; DROP TABLE x; --", "pop.names"] {
            assert!(
                matches!(quote_table(name), Err(StoreError::InvalidCollection(_))),
                "{name} should be rejected"
            );
        }
        assert!(quote_table(&"a".repeat(55)).is_ok());
        assert!(quote_table(&"a".repeat(56)).is_err());
    }

    #[test]
    fn find_sql_per_filter() {
        let id = RecordId::generate();
        assert_eq!(
            find_sql("\"varieties\"", &Filter::field_equals("name", "ParW001")),
            "SELECT id, doc FROM \"varieties\" \
             WHERE jsonb_typeof(doc -> $1) = 'string' AND doc ->> $1 = $2 ORDER BY seq"
        );
        assert_eq!(
            find_sql("\"populations\"", &Filter::IdEquals(id)),
            "SELECT id, doc FROM \"populations\" WHERE id = $1 ORDER BY seq"
        );
        assert_eq!(
            find_sql("\"populations\"", &Filter::field_exists("Contig[dot]1234")),
            "SELECT id, doc FROM \"populations\" WHERE doc ? $1 ORDER BY seq"
        );
    }

    #[test]
    fn insert_sql_stores_id_and_escaped_body() {
        assert_eq!(
            insert_sql("\"populations\""),
            "INSERT INTO \"populations\" (id, doc) VALUES ($1, $2)"
        );

        let document = serde_json::json!({ "population_name": "ParW001", "Contig.1234": {} });
        let (_, body) =
            prepare_for_insert("populations", document.as_object().cloned().unwrap()).unwrap();
        assert!(body.contains_key("Contig[dot]1234"));
        assert!(!body.contains_key("_id"));
    }
}
