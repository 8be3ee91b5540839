//! Alert types: threshold levels, drafts, and processed alerts.

use serde::{Deserialize, Serialize};

use crate::parameters::Parameter;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Result of evaluating a single value against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Value is inside the normal range.
    Normal,
    /// Value is outside the normal range but inside the critical range.
    Warning,
    /// Value is outside the critical range.
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Parse a wire-format level, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Narrow to an [`AlertLevel`]. `Normal` has no alert counterpart.
    pub fn alert_level(&self) -> Option<AlertLevel> {
        match self {
            Self::Normal => None,
            Self::Warning => Some(AlertLevel::Warning),
            Self::Critical => Some(AlertLevel::Critical),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level carried by a processed alert. Alerts are never `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Level::parse(s).and_then(|l| l.alert_level())
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity / Category / Urgency / Direction
// ---------------------------------------------------------------------------

/// Coarse classification driving priority and notification gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing tag selecting the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Chemical,
    Physical,
    Device,
    Weather,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chemical => "chemical",
            Self::Physical => "physical",
            Self::Device => "device",
            Self::Weather => "weather",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chemical" => Some(Self::Chemical),
            "physical" => Some(Self::Physical),
            "device" => Some(Self::Device),
            "weather" => Some(Self::Weather),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How soon an operator should act on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Immediate,
    Soon,
    /// Not produced by the default prioritizer; available to custom stages
    /// and to records written by other producers.
    Eventual,
    Monitor,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Soon => "soon",
            Self::Eventual => "eventual",
            Self::Monitor => "monitor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Some(Self::Immediate),
            "soon" => Some(Self::Soon),
            "eventual" => Some(Self::Eventual),
            "monitor" => Some(Self::Monitor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the normal range a value fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    High,
    Low,
}

// ---------------------------------------------------------------------------
// AlertDraft
// ---------------------------------------------------------------------------

/// An unvalidated candidate alert.
///
/// Fields are optional and loosely typed because drafts can come from
/// sources other than [`AlertGenerator`](crate::generator::AlertGenerator)
/// and must survive being malformed long enough to be reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertDraft {
    pub parameter: Option<String>,
    pub value: Option<serde_json::Value>,
    pub level: Option<String>,
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub direction: Option<Direction>,
    /// The bound that was crossed, when known.
    #[serde(default)]
    pub bound: Option<f64>,
    /// Informational drafts (weather) are enriched with `low` severity.
    #[serde(default)]
    pub informational: bool,
}

impl AlertDraft {
    /// Build a well-formed draft from evaluated parts.
    pub fn new(parameter: Parameter, value: f64, level: Level, timestamp: Timestamp) -> Self {
        Self {
            parameter: Some(parameter.as_str().to_string()),
            value: serde_json::Number::from_f64(value).map(serde_json::Value::Number),
            level: Some(level.as_str().to_string()),
            timestamp: Some(timestamp),
            direction: None,
            bound: None,
            informational: false,
        }
    }

    pub fn with_direction(mut self, direction: Option<Direction>, bound: Option<f64>) -> Self {
        self.direction = direction;
        self.bound = bound;
        self
    }

    pub fn informational(mut self) -> Self {
        self.informational = true;
        self
    }
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    /// Canonical parameter name (lowercase). Unknown parameters are kept
    /// verbatim so that templates can fall back to their default entry.
    pub parameter: String,
    pub value: f64,
    pub level: AlertLevel,
    pub timestamp: Timestamp,
    pub direction: Option<Direction>,
    pub bound: Option<f64>,
    pub informational: bool,
}

impl ValidDraft {
    /// The known parameter, if any.
    pub fn kind(&self) -> Option<Parameter> {
        Parameter::parse(&self.parameter)
    }
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// A fully processed alert. Immutable once created: a recurring condition
/// produces a new `Alert`, never an update to an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub parameter: String,
    pub value: f64,
    pub alert_level: AlertLevel,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub category: Category,
    pub confidence: f64,
    pub priority: i32,
    pub urgency: Urgency,
    #[serde(default)]
    pub remediation: Vec<String>,
    /// When the underlying reading was taken.
    pub timestamp: Timestamp,
    /// When the alert was created by the pipeline.
    pub created_at: Timestamp,
}

impl Alert {
    /// The known parameter, if any.
    pub fn kind(&self) -> Option<Parameter> {
        Parameter::parse(&self.parameter)
    }

    /// Whether the alert meets the notification threshold.
    pub fn should_notify(&self) -> bool {
        self.severity == Severity::High || self.alert_level == AlertLevel::Critical
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
