//! Alert row model.

use aquawatch_core::types::Timestamp;
use aquawatch_core::{Alert, AlertLevel, Category, Severity, Urgency};
use serde::Serialize;
use sqlx::FromRow;

/// A stored value that does not map back onto the domain type.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("Unknown {column} value: {value}")]
    UnknownValue { column: &'static str, value: String },

    #[error("Invalid remediation list: {0}")]
    Remediation(#[from] serde_json::Error),
}

/// A row from the `alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertRow {
    pub id: String,
    pub parameter: String,
    pub value: f64,
    pub alert_level: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub category: String,
    pub confidence: f64,
    pub priority: i32,
    pub urgency: String,
    pub remediation: serde_json::Value,
    pub timestamp: Timestamp,
    pub created_at: Timestamp,
}

fn parse_column<T>(
    column: &'static str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, RowError> {
    parse(raw).ok_or_else(|| RowError::UnknownValue {
        column,
        value: raw.to_string(),
    })
}

impl TryFrom<AlertRow> for Alert {
    type Error = RowError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            alert_level: parse_column("alert_level", &row.alert_level, AlertLevel::parse)?,
            severity: parse_column("severity", &row.severity, Severity::parse)?,
            category: parse_column("category", &row.category, Category::parse)?,
            urgency: parse_column("urgency", &row.urgency, Urgency::parse)?,
            remediation: serde_json::from_value(row.remediation)?,
            id: row.id,
            parameter: row.parameter,
            value: row.value,
            title: row.title,
            message: row.message,
            confidence: row.confidence,
            priority: row.priority,
            timestamp: row.timestamp,
            created_at: row.created_at,
        })
    }
}
