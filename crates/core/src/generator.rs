//! Alert draft generation from sensor readings.
//!
//! Only the most recent reading in a batch is evaluated; earlier entries
//! are context for the caller and never alerted on.

use std::sync::Arc;

use crate::alert::{AlertDraft, Level};
use crate::parameters::Parameter;
use crate::reading::SensorReading;
use crate::thresholds::ThresholdStore;

/// Rain status code meaning "no precipitation".
pub const RAIN_CODE_DRY: f64 = 0.0;

/// Rain codes at or above this value are storm conditions.
pub const RAIN_CODE_STORM: f64 = 4.0;

/// Human-readable status for a rain code.
pub fn rain_status(code: f64) -> &'static str {
    if code <= RAIN_CODE_DRY {
        "No rain"
    } else if code < 2.0 {
        "Light rain"
    } else if code < 3.0 {
        "Moderate rain"
    } else if code < RAIN_CODE_STORM {
        "Heavy rain"
    } else {
        "Storm"
    }
}

/// Turns the latest reading into alert drafts.
#[derive(Debug, Clone)]
pub struct AlertGenerator {
    thresholds: Arc<ThresholdStore>,
}

impl AlertGenerator {
    pub fn new(thresholds: Arc<ThresholdStore>) -> Self {
        Self { thresholds }
    }

    /// Produce drafts for every out-of-range parameter in the latest reading.
    ///
    /// Empty input yields an empty list.
    pub fn generate(&self, readings: &[SensorReading]) -> Vec<AlertDraft> {
        let Some(latest) = readings.last() else {
            return Vec::new();
        };

        let mut drafts = Vec::new();

        for parameter in Parameter::ALL {
            let Some(value) = latest.parameter_value(parameter) else {
                continue;
            };

            if parameter == Parameter::Rain {
                if let Some(draft) = rain_draft(value, latest) {
                    drafts.push(draft);
                }
                continue;
            }

            let assessment = self.thresholds.assess_parameter(parameter, value);
            if assessment.level == Level::Normal {
                continue;
            }

            drafts.push(
                AlertDraft::new(parameter, value, assessment.level, latest.timestamp)
                    .with_direction(assessment.direction, assessment.bound),
            );
        }

        if !drafts.is_empty() {
            tracing::debug!(count = drafts.len(), "Generated alert drafts");
        }

        drafts
    }
}

/// Rain bypasses thresholds: any active precipitation produces an
/// informational draft, storms escalate to critical.
fn rain_draft(code: f64, reading: &SensorReading) -> Option<AlertDraft> {
    if code <= RAIN_CODE_DRY {
        return None;
    }
    let level = if code >= RAIN_CODE_STORM {
        Level::Critical
    } else {
        Level::Warning
    };
    Some(AlertDraft::new(Parameter::Rain, code, level, reading.timestamp).informational())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
