//! Record Data Types
//!
//! `Record` is serialized as `{"name", "type", "values", "ttl"}`. That JSON object is both what
//! clients send and receive and what the etcd backend persists under each key, so field names
//! must stay stable. Unknown fields are ignored on decode.

use super::error::ValidationError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RECORD_TYPE: &str = "A";
pub const DEFAULT_TTL_SECS: i64 = 60;

/// A named DNS-like record.
///
/// `name` is the identity: storing a record under an existing name replaces the previous one
/// wholesale. `name` and `values` are required on decode, so an object without them is not a
/// record. Missing `type`/`ttl` decode to `""`/`0`; defaulting them is the job of
/// [`Record::normalize`], never of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub ttl: i64,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        values: Vec<String>,
        ttl: i64,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            values,
            ttl,
        }
    }

    /// Validates a client-supplied record and fills in defaults.
    ///
    /// Rejects a blank `name` or an empty `values` list. An empty `type` becomes `"A"` and a
    /// non-positive `ttl` becomes 60 seconds.
    pub fn normalize(mut self) -> Result<Self, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.values.is_empty() {
            return Err(ValidationError::MissingValues);
        }
        if self.record_type.is_empty() {
            self.record_type = DEFAULT_RECORD_TYPE.to_string();
        }
        if self.ttl <= 0 {
            self.ttl = DEFAULT_TTL_SECS;
        }
        Ok(self)
    }
}

/// Body of `POST /records` and `PUT /records/:name`.
///
/// Every field may be absent so that an incomplete body reaches [`Record::normalize`] and is
/// rejected with a field-specific message. On `PUT` the `name` comes from the path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordRequest {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub ttl: i64,
}

impl RecordRequest {
    pub fn into_record(self) -> Record {
        Record {
            name: self.name,
            record_type: self.record_type,
            values: self.values,
            ttl: self.ttl,
        }
    }
}

impl From<Record> for RecordRequest {
    fn from(record: Record) -> Self {
        Self {
            name: record.name,
            record_type: record.record_type,
            values: record.values,
            ttl: record.ttl,
        }
    }
}

/// Response body of `GET /records`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListRecordsResponse {
    pub records: Vec<Record>,
}

/// Body returned with every non-2xx status.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
