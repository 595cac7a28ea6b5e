//! Folds candidate records that share a population name into one record.
//!
//! Candidates are grouped by name in order of first appearance, then each
//! group is reduced into its earliest member. A field already present on the
//! earlier record is never overwritten.

use std::collections::HashMap;

use serde_json::Value;

use super::schema::Schema;
use super::types::Document;

pub fn merge_by_population(candidates: Vec<Document>, schema: &Schema) -> Vec<Document> {
    let total = candidates.len();
    let mut groups: Vec<Vec<Document>> = Vec::with_capacity(total);
    let mut group_for_name: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let name = candidate
            .get(schema.population_name)
            .and_then(Value::as_str)
            .map(str::to_owned);

        match name {
            Some(name) => {
                let slot = *group_for_name.entry(name).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[slot].push(candidate);
            }
            None => {
                tracing::warn!(
                    "candidate has no \"{}\", keeping it unmerged",
                    schema.population_name
                );
                groups.push(vec![candidate]);
            }
        }
    }

    let merged: Vec<Document> = groups
        .into_iter()
        .filter_map(|group| group.into_iter().reduce(merge_missing))
        .collect();

    if merged.len() < total {
        tracing::debug!("merged {} candidates into {} records", total, merged.len());
    }
    merged
}

/// Copy every field of `source` that `target` lacks.
fn merge_missing(mut target: Document, source: Document) -> Document {
    for (key, value) in source {
        target.entry(key).or_insert(value);
    }
    target
}
