//! Telemetry records assembled from decoded radar readings.
//!
//! A record is built fresh every poll cycle and holds no history. Before it
//! leaves the device it is merged with the [`DeviceIdentity`].

use crate::error::RadarError;
use crate::radar::response::DecodeError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Key under which interpretation errors are stored in a record.
pub const ERROR_KEY: &str = "error";

/// A typed value extracted from a response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Flag(bool),
    Integer(u64),
    /// Waveform samples or raw strings, exposed as byte values.
    Bytes(Vec<u8>),
    Label(&'static str),
    Text(String),
}

impl ReadingValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ReadingValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            ReadingValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ReadingValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ReadingValue::Label(v) => Some(v),
            ReadingValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// One named reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub key: &'static str,
    pub value: ReadingValue,
}

impl Reading {
    pub fn new(key: &'static str, value: ReadingValue) -> Self {
        Reading { key, value }
    }
}

/// Who the readings belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub id: String,
    pub model: String,
    pub location: String,
}

/// Reading name to value, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TelemetryRecord {
    values: BTreeMap<String, ReadingValue>,
}

impl TelemetryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ReadingValue) {
        self.values.insert(key.into(), value);
    }

    /// Stores a reading, or the error text under [`ERROR_KEY`].
    pub fn merge(&mut self, interpretation: Result<Reading, DecodeError>) {
        match interpretation {
            Ok(reading) => self.insert(reading.key, reading.value),
            Err(err) => self.insert(ERROR_KEY, ReadingValue::Text(err.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ReadingValue> {
        self.values.get(key)
    }

    pub fn error(&self) -> Option<&str> {
        self.get(ERROR_KEY).and_then(ReadingValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReadingValue)> {
        self.values.iter()
    }

    /// Copy of the record carrying the device identity fields.
    pub fn with_identity(&self, identity: &DeviceIdentity) -> TelemetryRecord {
        let mut record = self.clone();
        record.insert("id", ReadingValue::Text(identity.id.clone()));
        record.insert("model", ReadingValue::Text(identity.model.clone()));
        record.insert("location", ReadingValue::Text(identity.location.clone()));
        record
    }

    pub fn to_json(&self) -> Result<serde_json::Value, RadarError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<Reading> for TelemetryRecord {
    fn from(reading: Reading) -> Self {
        let mut record = TelemetryRecord::new();
        record.insert(reading.key, reading.value);
        record
    }
}
