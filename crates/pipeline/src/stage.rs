//! Custom processing stages.
//!
//! Stages run after deduplication and before enrichment, in the order they
//! were registered. A stage that fails is skipped: its input flows on to
//! the next stage unchanged.

use std::collections::HashSet;

use aquawatch_core::{AlertLevel, ValidDraft};

#[derive(Debug, thiserror::Error)]
#[error("Stage {stage} failed: {message}")]
pub struct ProcessorError {
    pub stage: &'static str,
    pub message: String,
}

impl ProcessorError {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// A pluggable transformation over validated, deduplicated drafts.
pub trait AlertProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn process(&self, drafts: &[ValidDraft]) -> Result<Vec<ValidDraft>, ProcessorError>;
}

// ---------------------------------------------------------------------------
// Built-in stages
// ---------------------------------------------------------------------------

/// Drops warning-level drafts for muted parameters. Critical drafts always
/// pass.
#[derive(Debug, Default)]
pub struct MuteWarnings {
    muted: HashSet<String>,
}

impl MuteWarnings {
    pub fn new<I, S>(parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            muted: parameters
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.muted.is_empty()
    }
}

impl AlertProcessor for MuteWarnings {
    fn name(&self) -> &'static str {
        "mute_warnings"
    }

    fn process(&self, drafts: &[ValidDraft]) -> Result<Vec<ValidDraft>, ProcessorError> {
        Ok(drafts
            .iter()
            .filter(|d| d.level == AlertLevel::Critical || !self.muted.contains(&d.parameter))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn draft(parameter: &str, level: AlertLevel) -> ValidDraft {
        ValidDraft {
            parameter: parameter.into(),
            value: 1.0,
            level,
            timestamp: Utc::now(),
            direction: None,
            bound: None,
            informational: false,
        }
    }

    #[test]
    fn mute_drops_only_warnings_for_listed_parameters() {
        let stage = MuteWarnings::new(["Turbidity", " rain "]);
        let out = stage
            .process(&[
                draft("turbidity", AlertLevel::Warning),
                draft("turbidity", AlertLevel::Critical),
                draft("ph", AlertLevel::Warning),
                draft("rain", AlertLevel::Warning),
            ])
            .unwrap();

        let kept: Vec<_> = out.iter().map(|d| (d.parameter.as_str(), d.level)).collect();
        assert_eq!(
            kept,
            vec![("turbidity", AlertLevel::Critical), ("ph", AlertLevel::Warning)]
        );
    }

    #[test]
    fn empty_entries_are_ignored() {
        assert!(MuteWarnings::new(["", "  "]).is_empty());
    }
}
