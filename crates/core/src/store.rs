//! Alert persistence collaborator.
//!
//! The core never talks to a database directly; it calls [`AlertStore`].
//! Implementations live in `aquawatch-db` (Postgres) and
//! `aquawatch-pipeline` (in-memory).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alert::{Alert, Severity};

/// Error type for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store rejected or failed the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// The store is not reachable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Filter for retrieving stored alerts. Also the cache key for display
/// queries, so it is hashable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub parameter: Option<String>,
    pub limit: Option<usize>,
}

impl AlertFilter {
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into().to_ascii_lowercase());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `alert` passes the severity and parameter criteria.
    ///
    /// `limit` is applied by the caller after ordering.
    pub fn matches(&self, alert: &Alert) -> bool {
        self.severity.map_or(true, |s| alert.severity == s)
            && self
                .parameter
                .as_deref()
                .map_or(true, |p| alert.parameter.eq_ignore_ascii_case(p))
    }
}

/// Durable storage for processed alerts.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Persist a batch of alerts in one call.
    async fn save_alerts(&self, alerts: &[Alert]) -> Result<(), StoreError>;

    /// Retrieve alerts matching `filter`, in priority order.
    async fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError>;
}
