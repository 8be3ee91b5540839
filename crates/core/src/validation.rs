//! Draft validation.
//!
//! Converts loosely typed [`AlertDraft`]s into [`ValidDraft`]s. Each
//! rejection names the offending field so it can be reported without
//! stopping the rest of the batch.

use crate::alert::{AlertDraft, Level, ValidDraft};
use crate::error::CoreError;
use crate::parameters::Parameter;

/// Validate a single draft.
pub fn validate_draft(draft: &AlertDraft) -> Result<ValidDraft, CoreError> {
    let raw_parameter = draft
        .parameter
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| CoreError::Validation("draft is missing parameter".into()))?;

    let parameter = match Parameter::parse(raw_parameter) {
        Some(p) => p.as_str().to_string(),
        None => raw_parameter.to_ascii_lowercase(),
    };

    let value = match &draft.value {
        None | Some(serde_json::Value::Null) => {
            return Err(CoreError::Validation(format!(
                "{parameter} draft is missing value"
            )))
        }
        Some(v) => v
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                CoreError::Validation(format!("{parameter} draft has non-numeric value {v}"))
            })?,
    };

    let raw_level = draft
        .level
        .as_deref()
        .ok_or_else(|| CoreError::Validation(format!("{parameter} draft is missing level")))?;
    let level = Level::parse(raw_level).ok_or_else(|| {
        CoreError::Validation(format!("{parameter} draft has unrecognized level '{raw_level}'"))
    })?;
    let level = level.alert_level().ok_or_else(|| {
        CoreError::Validation(format!("{parameter} draft has level normal"))
    })?;

    let timestamp = draft
        .timestamp
        .ok_or_else(|| CoreError::Validation(format!("{parameter} draft is missing timestamp")))?;

    Ok(ValidDraft {
        parameter,
        value,
        level,
        timestamp,
        direction: draft.direction,
        bound: draft.bound,
        informational: draft.informational,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
