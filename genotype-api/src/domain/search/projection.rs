//! Shapes a stored genotype record into what a caller gets back.

use std::collections::HashMap;

use serde_json::Value;

use super::escape::{unescape_all_keys, EscapeError};
use super::schema::Schema;
use super::types::Document;

/// Why a single record could not be projected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("record has no \"{0}\" string")]
    MissingField(String),
    #[error("record has no marker \"{0}\"")]
    MissingMarker(String),
    #[error("marker display name \"{0}\" clashes with another output key")]
    NameClash(String),
    #[error(transparent)]
    Escape(#[from] EscapeError),
}

/// A display-name mapping that would overwrite another output key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMapping {
    #[error("\"{marker}\" maps onto fixed field \"{target}\"")]
    FixedField { marker: String, target: String },
    #[error("\"{first}\" and \"{second}\" both map to \"{target}\"")]
    SharedTarget {
        first: String,
        second: String,
        target: String,
    },
}

/// Optional display names for markers, applied to marker keys on output.
#[derive(Debug, Clone, Default)]
pub struct NameMappings(HashMap<String, String>);

impl NameMappings {
    pub fn new(mappings: HashMap<String, String>) -> Self {
        Self(mappings)
    }

    /// Reject mappings that target a fixed field or share a display name.
    pub fn validate(&self, schema: &Schema) -> Result<(), InvalidMapping> {
        let mut entries: Vec<(&String, &String)> = self.0.iter().collect();
        entries.sort();

        let mut claimed: HashMap<&str, &str> = HashMap::with_capacity(entries.len());
        for (marker, target) in entries {
            if schema.is_fixed_field(target) {
                return Err(InvalidMapping::FixedField {
                    marker: marker.clone(),
                    target: target.clone(),
                });
            }
            if let Some(first) = claimed.insert(target.as_str(), marker.as_str()) {
                return Err(InvalidMapping::SharedTarget {
                    first: first.to_string(),
                    second: marker.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The name to show for `marker`; the marker itself when unmapped.
    pub fn display_name<'a>(&'a self, marker: &'a str) -> &'a str {
        self.0.get(marker).map(String::as_str).unwrap_or(marker)
    }
}

pub struct Projector {
    schema: Schema,
    mappings: NameMappings,
}

impl Projector {
    pub fn new(schema: Schema, mappings: NameMappings) -> Self {
        Self { schema, mappings }
    }

    pub fn with_defaults() -> Self {
        Self::new(Schema::DEFAULT, NameMappings::default())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The whole record, minus its storage id, with every key unescaped.
    pub fn build_full(&self, mut record: Document) -> Result<Document, ProjectionError> {
        record.remove(self.schema.id);
        unescape_all_keys(&mut record)?;

        if self.mappings.is_empty() {
            return Ok(record);
        }

        let mut renamed = Document::new();
        for (key, value) in record {
            let name = if self.schema.is_fixed_field(&key) {
                key
            } else {
                self.mappings.display_name(&key).to_string()
            };
            if renamed.contains_key(&name) {
                return Err(ProjectionError::NameClash(name));
            }
            renamed.insert(name, value);
        }
        Ok(renamed)
    }

    /// Identity fields plus the one requested marker.
    ///
    /// The marker is read from `stored_key` and written under `output_key`
    /// (or its mapped display name).
    pub fn build_marker_only(
        &self,
        record: &Document,
        stored_key: &str,
        output_key: &str,
    ) -> Result<Document, ProjectionError> {
        let mut projected = Document::new();

        for field in self.schema.identity_fields() {
            let value = record
                .get(field)
                .and_then(Value::as_str)
                .ok_or_else(|| ProjectionError::MissingField(field.to_string()))?;
            projected.insert(field.to_string(), Value::String(value.to_string()));
        }

        let marker = record
            .get(stored_key)
            .ok_or_else(|| ProjectionError::MissingMarker(output_key.to_string()))?;
        let name = self.mappings.display_name(output_key);
        if projected.contains_key(name) {
            return Err(ProjectionError::NameClash(name.to_string()));
        }
        projected.insert(name.to_string(), marker.clone());

        Ok(projected)
    }
}
