//! Core types for the genotype search domain.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};

/// A stored document: an ordered map of top-level keys to JSON values.
pub type Document = serde_json::Map<String, Value>;

/// Identifier of a document in the store: twelve bytes, written as 24 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId([u8; 12]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid record id: {0}")]
pub struct InvalidRecordId(pub String);

static NEXT_SEQUENCE: AtomicU32 = AtomicU32::new(0);

impl RecordId {
    /// Generate a fresh id from the clock, the process id and a counter.
    pub fn generate() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or_default();
        let process = std::process::id();
        let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..8].copy_from_slice(&process.to_be_bytes());
        bytes[8..].copy_from_slice(&sequence.to_be_bytes());
        Self(bytes)
    }

    /// Read an id from a JSON value, either a bare hex string or `{"$oid": "<hex>"}`.
    pub fn from_json(value: &Value) -> Result<Self, InvalidRecordId> {
        match value {
            Value::String(hex) => hex.parse(),
            Value::Object(object) => match object.get("$oid") {
                Some(Value::String(hex)) if object.len() == 1 => hex.parse(),
                _ => Err(InvalidRecordId(value.to_string())),
            },
            _ => Err(InvalidRecordId(value.to_string())),
        }
    }

    /// Extended-JSON form used for the storage-internal id field.
    pub fn to_json(&self) -> Value {
        json!({ "$oid": self.to_string() })
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        if hex.len() != 24 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidRecordId(hex.to_string()));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| InvalidRecordId(hex.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Names of the two collections the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub populations: String,
    pub varieties: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            populations: "populations".to_string(),
            varieties: "varieties".to_string(),
        }
    }
}

/// Configuration for the search service.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub collections: Collections,
    /// Upper bound on the whole search, shared by every store call it makes.
    pub query_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            collections: Collections::default(),
            query_timeout: Duration::from_secs(30),
        }
    }
}

/// One incoming search. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    marker: Option<String>,
    population: Option<String>,
    full_record: bool,
}

impl SearchRequest {
    pub fn new(marker: Option<String>, population: Option<String>, full_record: bool) -> Self {
        Self {
            marker: marker.filter(|m| !m.is_empty()),
            population: population.filter(|p| !p.is_empty()),
            full_record,
        }
    }

    #[cfg(test)]
    pub fn for_marker(marker: impl Into<String>) -> Self {
        Self::new(Some(marker.into()), None, false)
    }

    #[cfg(test)]
    pub fn for_population(population: impl Into<String>) -> Self {
        Self::new(None, Some(population.into()), false)
    }

    #[cfg(test)]
    pub fn with_full_record(mut self, full_record: bool) -> Self {
        self.full_record = full_record;
        self
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    pub fn population(&self) -> Option<&str> {
        self.population.as_deref()
    }

    pub fn full_record(&self) -> bool {
        self.full_record
    }
}

/// Final status of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Succeeded,
    PartiallySucceeded,
    Failed,
    FailedToStart,
}

impl OperationStatus {
    /// Status after a query was issued and `total` candidates came back,
    /// `projected` of which made it into the results.
    pub fn from_counts(projected: usize, total: usize) -> Self {
        if total == 0 || projected == 0 {
            Self::Failed
        } else if projected == total {
            Self::Succeeded
        } else {
            Self::PartiallySucceeded
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Succeeded => write!(f, "succeeded"),
            OperationStatus::PartiallySucceeded => write!(f, "partially_succeeded"),
            OperationStatus::Failed => write!(f, "failed"),
            OperationStatus::FailedToStart => write!(f, "failed_to_start"),
        }
    }
}

/// How a result payload is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultProtocol {
    Inline,
}

/// One projected record, titled with its population name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub protocol: ResultProtocol,
    pub title: Option<String>,
    pub data: Document,
}

impl SearchResult {
    pub fn inline(title: Option<String>, data: Document) -> Self {
        Self {
            protocol: ResultProtocol::Inline,
            title,
            data,
        }
    }
}

/// Status plus whatever results were produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub status: OperationStatus,
    pub results: Vec<SearchResult>,
}

impl SearchOutcome {
    pub fn empty(status: OperationStatus) -> Self {
        Self {
            status,
            results: Vec::new(),
        }
    }
}
