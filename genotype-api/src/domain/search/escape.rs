//! Key escaping for marker names used as document field names.
//!
//! A literal `.` cannot be stored in a field name, so every `.` in a marker
//! name is written as [`ESCAPED_DOT`] on the way in and restored on the way out.

use std::collections::HashSet;

use super::schema::ESCAPED_DOT;
use super::traits::{Result, SearchError};
use super::types::Document;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscapeError {
    #[error("renaming \"{from}\" to \"{to}\" collides with an existing key")]
    KeyCollision { from: String, to: String },
}

pub fn escape_key(name: &str) -> String {
    name.replace('.', ESCAPED_DOT)
}

pub fn unescape_key(name: &str) -> String {
    name.replace(ESCAPED_DOT, ".")
}

/// Restore every escaped top-level key of `document`.
///
/// Values and the remaining keys are untouched and key order is kept. If any
/// rename would land on a key that is already present the document is left
/// exactly as it was.
pub fn unescape_all_keys(document: &mut Document) -> std::result::Result<(), EscapeError> {
    rename_keys(document, |key| key.contains(ESCAPED_DOT), unescape_key)
}

/// Escape every top-level key of `document` that contains a `.`.
pub fn escape_all_keys(document: &mut Document) -> std::result::Result<(), EscapeError> {
    rename_keys(document, |key| key.contains('.'), escape_key)
}

fn rename_keys(
    document: &mut Document,
    needs_rename: impl Fn(&str) -> bool,
    rename: impl Fn(&str) -> String,
) -> std::result::Result<(), EscapeError> {
    let renames: Vec<(&String, String)> = document
        .keys()
        .filter(|key| needs_rename(key))
        .map(|key| (key, rename(key)))
        .collect();

    if renames.is_empty() {
        return Ok(());
    }

    let mut targets = HashSet::with_capacity(renames.len());
    for (from, to) in &renames {
        let occupied = document.contains_key(to.as_str()) && !needs_rename(to);
        if occupied || !targets.insert(to.as_str()) {
            return Err(EscapeError::KeyCollision {
                from: (*from).clone(),
                to: to.clone(),
            });
        }
    }

    let previous = std::mem::take(document);
    *document = previous
        .into_iter()
        .map(|(key, value)| {
            if needs_rename(&key) {
                (rename(&key), value)
            } else {
                (key, value)
            }
        })
        .collect();

    Ok(())
}

/// A marker name as the caller wrote it, alongside its stored form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerKey {
    display: String,
    stored: String,
}

impl MarkerKey {
    /// Fails when the name already contains the escape token, since its
    /// stored form could not be told apart from an escaped `.`.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(SearchError::QueryConstruction(
                "marker name is empty".to_string(),
            ));
        }
        if name.contains(ESCAPED_DOT) {
            return Err(SearchError::QueryConstruction(format!(
                "marker name \"{}\" contains the reserved sequence {}",
                name, ESCAPED_DOT
            )));
        }

        Ok(Self {
            display: name.to_string(),
            stored: escape_key(name),
        })
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn stored(&self) -> &str {
        &self.stored
    }
}
