//! Field-name conventions shared by every part of the genotype store.
//!
//! Storage keys are defined here once and handed to the components that need
//! them, so a query, a projection and a merge always agree on what a field is
//! called.

/// Placeholder stored in place of every literal `.` in a marker name.
pub const ESCAPED_DOT: &str = "[dot]";

/// Storage-internal identifier carried by every document the store returns.
pub const ID_FIELD: &str = "_id";

/// Names of the fixed fields in the varieties and populations collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Storage-internal identifier, stripped before anything reaches a caller.
    pub id: &'static str,
    /// Population name on a genotype record; the merge key.
    pub population_name: &'static str,
    pub parent_a: &'static str,
    pub parent_b: &'static str,
    /// Keys inside each marker's nested document.
    pub chromosome: &'static str,
    pub mapping_position: &'static str,
    /// Population display name on a variety link.
    pub variety_name: &'static str,
    /// List of population record ids on a variety link.
    pub variety_ids: &'static str,
}

impl Schema {
    pub const DEFAULT: Self = Self {
        id: ID_FIELD,
        population_name: "population_name",
        parent_a: "parent_a",
        parent_b: "parent_b",
        chromosome: "chromosome",
        mapping_position: "mapping_position",
        variety_name: "name",
        variety_ids: "variety_ids",
    };

    /// Fields every marker-only projection must carry besides the marker.
    pub fn identity_fields(&self) -> [&'static str; 3] {
        [self.population_name, self.parent_a, self.parent_b]
    }

    /// Whether `key` is one of the fixed record fields rather than a marker.
    pub fn is_fixed_field(&self, key: &str) -> bool {
        key == self.id || self.identity_fields().contains(&key)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::DEFAULT
    }
}
