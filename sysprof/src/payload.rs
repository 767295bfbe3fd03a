//! Request payloads: a string-keyed JSON mapping and its byte encoding.
//!
//! Values go in through `serde`, so the time rule is carried by the types
//! themselves: `chrono` timestamps serialize as RFC 3339 strings and
//! [`sysprof_probe::Elapsed`] durations as `H:MM:SS` strings. Everything
//! else keeps its structure (nested objects and arrays are preserved).

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::PayloadError;

pub const TARGET: &str = "target";
pub const REPORT_ID: &str = "report_id";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `value` and store it under `key`, replacing any previous value.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: &T) -> Result<(), PayloadError>
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let v = serde_json::to_value(value).map_err(|source| PayloadError {
            field: key.clone(),
            source,
        })?;
        self.0.insert(key, v);
        Ok(())
    }

    /// Builder form of [`Fields::insert`].
    pub fn with<T>(mut self, key: impl Into<String>, value: &T) -> Result<Self, PayloadError>
    where
        T: Serialize + ?Sized,
    {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as a JSON object.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        serde_json::to_vec(&self.0).map_err(|source| PayloadError {
            field: String::from("<payload>"),
            source,
        })
    }

    /// Decode a JSON object; anything else is rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Map<String, Value>>(bytes).map(Self)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(m: Map<String, Value>) -> Self {
        Self(m)
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Attach the correlation keys to a domain payload. They overwrite any
/// caller-supplied values so every envelope of a run agrees on them.
pub fn envelope(mut fields: Fields, target: &str, report_id: Option<&str>) -> Fields {
    fields.insert_value(TARGET, Value::String(target.to_string()));
    fields.insert_value(
        REPORT_ID,
        report_id.map_or(Value::Null, |id| Value::String(id.to_string())),
    );
    fields
}
