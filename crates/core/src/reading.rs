//! Sensor reading input type and batch parsing.
//!
//! Readings arrive as JSON objects: a `timestamp` field plus one field per
//! parameter, each numeric or null.
//!
//! ```json
//! [{ "timestamp": "2026-05-01T10:00:00Z", "ph": 7.4, "turbidity": null }]
//! ```

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::parameters::Parameter;
use crate::types::Timestamp;

/// Name of the timestamp field inside a reading object.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// A single sensor reading: parameter values plus the time they were taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub values: BTreeMap<String, serde_json::Value>,
}

impl SensorReading {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Builder: set a numeric parameter value.
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        let json = serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
        self.values.insert(name.into(), json);
        self
    }

    /// Builder: set a raw JSON value (null, strings, ...).
    pub fn with_raw(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Numeric value for `name`, matched case-insensitively.
    ///
    /// Returns `None` for absent, null, non-numeric, or non-finite values.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_f64())
            .filter(|v| v.is_finite())
    }

    /// Numeric value for a known parameter, matching its wire name or any
    /// alias (`water_temp`, `DO`, ...).
    pub fn parameter_value(&self, parameter: Parameter) -> Option<f64> {
        self.values
            .iter()
            .filter(|(k, _)| Parameter::parse(k) == Some(parameter))
            .find_map(|(_, v)| v.as_f64())
            .filter(|v| v.is_finite())
    }
}

/// Parse a batch of readings from a JSON value.
///
/// `null` and non-array inputs yield an empty batch. An array entry that is
/// not an object, or that lacks a parseable timestamp, is a malformed input
/// shape and fails the whole batch.
pub fn parse_batch(input: &serde_json::Value) -> Result<Vec<SensorReading>, CoreError> {
    let entries = match input.as_array() {
        Some(entries) => entries,
        None => return Ok(Vec::new()),
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(i, entry))
        .collect()
}

fn parse_entry(index: usize, entry: &serde_json::Value) -> Result<SensorReading, CoreError> {
    let object = entry.as_object().ok_or_else(|| {
        CoreError::MalformedInput(format!("reading at index {index} is not an object"))
    })?;

    let timestamp = object
        .get(TIMESTAMP_FIELD)
        .and_then(parse_timestamp)
        .ok_or_else(|| {
            CoreError::MalformedInput(format!(
                "reading at index {index} has a missing or invalid timestamp"
            ))
        })?;

    let values = object
        .iter()
        .filter(|(k, _)| k.as_str() != TIMESTAMP_FIELD)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(SensorReading { timestamp, values })
}

/// Accept RFC 3339 strings or epoch milliseconds.
fn parse_timestamp(value: &serde_json::Value) -> Option<Timestamp> {
    match value {
        serde_json::Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn value_lookup_is_case_insensitive() {
        let reading = SensorReading::new(Utc::now()).with_value("pH", 7.2);
        assert_eq!(reading.value("ph"), Some(7.2));
        assert_eq!(reading.value("PH"), Some(7.2));
    }

    #[test]
    fn null_and_non_numeric_values_are_ignored() {
        let reading = SensorReading::new(Utc::now())
            .with_raw("ph", serde_json::Value::Null)
            .with_raw("turbidity", json!("high"));
        assert_eq!(reading.value("ph"), None);
        assert_eq!(reading.value("turbidity"), None);
        assert_eq!(reading.value("salinity"), None);
    }

    #[test]
    fn parameter_value_matches_aliases() {
        let reading = SensorReading::new(Utc::now())
            .with_value("water_temp", 31.5)
            .with_value("DO", 4.2);
        assert_eq!(reading.parameter_value(Parameter::Temperature), Some(31.5));
        assert_eq!(reading.parameter_value(Parameter::DissolvedOxygen), Some(4.2));
        assert_eq!(reading.parameter_value(Parameter::Ph), None);
    }

    #[test]
    fn parse_batch_non_array_is_empty() {
        assert!(parse_batch(&serde_json::Value::Null).unwrap().is_empty());
        assert!(parse_batch(&json!({"ph": 7})).unwrap().is_empty());
        assert!(parse_batch(&json!("text")).unwrap().is_empty());
    }

    #[test]
    fn parse_batch_reads_rfc3339_and_millis() {
        let batch = parse_batch(&json!([
            {"timestamp": "2026-05-01T10:00:00Z", "ph": 7.1},
            {"timestamp": 1_777_629_600_000_i64, "ph": 7.3, "turbidity": null},
        ]))
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].value("ph"), Some(7.1));
        assert_eq!(batch[1].value("ph"), Some(7.3));
        assert!(!batch[1].values.contains_key(TIMESTAMP_FIELD));
    }

    #[test]
    fn parse_batch_rejects_non_object_entries() {
        let err = parse_batch(&json!([1, 2, 3])).unwrap_err();
        assert_matches!(err, CoreError::MalformedInput(_));
    }

    #[test]
    fn parse_batch_rejects_missing_timestamp() {
        let err = parse_batch(&json!([{"ph": 7.0}])).unwrap_err();
        assert_matches!(err, CoreError::MalformedInput(msg) if msg.contains("timestamp"));
    }
}
