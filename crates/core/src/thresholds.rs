//! Per-parameter threshold evaluation.
//!
//! Pure logic, no I/O. [`ThresholdStore`] holds exactly one active
//! [`Threshold`] per [`Parameter`] and answers "is this value normal,
//! warning, or critical?". Boundaries are strict: a value equal to a bound
//! is still inside the range.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::alert::{Direction, Level};
use crate::error::CoreError;
use crate::parameters::Parameter;

// ---------------------------------------------------------------------------
// Threshold
// ---------------------------------------------------------------------------

/// Normal and critical bounds for one parameter. Any bound may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub parameter: Parameter,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub critical_min: Option<f64>,
    pub critical_max: Option<f64>,
}

/// Outcome of evaluating a value, including which bound was crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub level: Level,
    pub direction: Option<Direction>,
    pub bound: Option<f64>,
}

impl Assessment {
    const NORMAL: Assessment = Assessment {
        level: Level::Normal,
        direction: None,
        bound: None,
    };
}

impl Threshold {
    /// Build a threshold from normal bounds, deriving the critical bounds by
    /// padding each side with the parameter's fixed margin.
    pub fn from_bounds(parameter: Parameter, min: Option<f64>, max: Option<f64>) -> Self {
        let margin = parameter.critical_margin();
        Self {
            parameter,
            min,
            max,
            critical_min: min.zip(margin).map(|(m, pad)| m - pad),
            critical_max: max.zip(margin).map(|(m, pad)| m + pad),
        }
    }

    /// Evaluate `value` against this threshold.
    pub fn assess(&self, value: f64) -> Assessment {
        if !value.is_finite() {
            return Assessment::NORMAL;
        }

        if let Some(bound) = self.critical_min.filter(|b| value < *b) {
            return Assessment {
                level: Level::Critical,
                direction: Some(Direction::Low),
                bound: Some(bound),
            };
        }
        if let Some(bound) = self.critical_max.filter(|b| value > *b) {
            return Assessment {
                level: Level::Critical,
                direction: Some(Direction::High),
                bound: Some(bound),
            };
        }
        if let Some(bound) = self.min.filter(|b| value < *b) {
            return Assessment {
                level: Level::Warning,
                direction: Some(Direction::Low),
                bound: Some(bound),
            };
        }
        if let Some(bound) = self.max.filter(|b| value > *b) {
            return Assessment {
                level: Level::Warning,
                direction: Some(Direction::High),
                bound: Some(bound),
            };
        }

        Assessment::NORMAL
    }

    /// Check that bounds are finite and consistently ordered.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.parameter.is_threshold_based() {
            return Err(CoreError::Validation(format!(
                "{} does not support thresholds",
                self.parameter
            )));
        }

        let bounds = [self.min, self.max, self.critical_min, self.critical_max];
        if bounds.iter().flatten().any(|b| !b.is_finite()) {
            return Err(CoreError::Validation(format!(
                "{} threshold bounds must be finite",
                self.parameter
            )));
        }

        let ordered = |lo: Option<f64>, hi: Option<f64>| match (lo, hi) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        };
        if !ordered(self.min, self.max)
            || !ordered(self.critical_min, self.min)
            || !ordered(self.max, self.critical_max)
            || !ordered(self.critical_min, self.critical_max)
        {
            return Err(CoreError::Validation(format!(
                "{} threshold bounds must satisfy critical_min <= min <= max <= critical_max",
                self.parameter
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Startup configuration
// ---------------------------------------------------------------------------

/// Normal bounds for one parameter as loaded from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Threshold configuration in the `{parameter: {min, max}}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdConfig(pub BTreeMap<String, Bounds>);

impl ThresholdConfig {
    /// Parse a JSON document of the form `{"ph": {"min": 6.5, "max": 8.5}}`.
    pub fn from_json_str(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("invalid threshold config: {e}")))
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let entries = [
            (Parameter::Ph, Some(6.5), Some(8.5)),
            (Parameter::Temperature, Some(20.0), Some(30.0)),
            (Parameter::Turbidity, None, Some(50.0)),
            (Parameter::Salinity, Some(10.0), Some(35.0)),
            (Parameter::DissolvedOxygen, Some(5.0), None),
            (Parameter::DeviceTemperature, None, Some(60.0)),
            (Parameter::DeviceHumidity, None, Some(85.0)),
        ];
        Self(
            entries
                .into_iter()
                .map(|(p, min, max)| (p.as_str().to_string(), Bounds { min, max }))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// ThresholdStore
// ---------------------------------------------------------------------------

/// Holds the active threshold for each parameter.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared between the generator and the orchestrator.
#[derive(Debug, Default)]
pub struct ThresholdStore {
    thresholds: RwLock<HashMap<Parameter, Threshold>>,
}

impl ThresholdStore {
    /// Create an empty store. Every parameter evaluates as normal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from startup configuration.
    ///
    /// Unknown parameter names and invalid bounds are skipped with a warning
    /// so that one bad entry never disables the rest.
    pub fn from_config(config: &ThresholdConfig) -> Self {
        let mut thresholds = HashMap::new();
        for (name, bounds) in &config.0 {
            let Some(parameter) = Parameter::parse(name) else {
                tracing::warn!(parameter = %name, "Ignoring threshold for unknown parameter");
                continue;
            };
            let threshold = Threshold::from_bounds(parameter, bounds.min, bounds.max);
            if let Err(e) = threshold.validate() {
                tracing::warn!(parameter = %name, error = %e, "Ignoring invalid threshold");
                continue;
            }
            thresholds.insert(parameter, threshold);
        }
        Self {
            thresholds: RwLock::new(thresholds),
        }
    }

    /// Evaluate a value for a parameter given by name.
    ///
    /// Unknown parameters and non-finite values resolve to
    /// [`Level::Normal`]; this never fails.
    pub fn evaluate(&self, parameter: &str, value: f64) -> Level {
        self.assess(parameter, value).level
    }

    /// Like [`evaluate`](Self::evaluate) but also reports the crossed bound.
    pub fn assess(&self, parameter: &str, value: f64) -> Assessment {
        match Parameter::parse(parameter) {
            Some(p) => self.assess_parameter(p, value),
            None => Assessment::NORMAL,
        }
    }

    /// Evaluate a value for a known parameter.
    pub fn assess_parameter(&self, parameter: Parameter, value: f64) -> Assessment {
        let thresholds = self.thresholds.read().unwrap_or_else(PoisonError::into_inner);
        thresholds
            .get(&parameter)
            .map(|t| t.assess(value))
            .unwrap_or(Assessment::NORMAL)
    }

    /// Replace the active threshold for `parameter`.
    ///
    /// Takes effect on the next evaluation. Invalidating anything computed
    /// from the previous threshold is the caller's responsibility.
    pub fn update_threshold(&self, parameter: &str, threshold: Threshold) -> Result<(), CoreError> {
        let parameter = Parameter::parse(parameter)
            .ok_or_else(|| CoreError::UnknownParameter(parameter.to_string()))?;
        let threshold = Threshold {
            parameter,
            ..threshold
        };
        threshold.validate()?;

        self.thresholds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(parameter, threshold);

        tracing::info!(%parameter, "Threshold updated");
        Ok(())
    }

    /// Current threshold for a parameter, if any.
    pub fn get(&self, parameter: &str) -> Option<Threshold> {
        let parameter = Parameter::parse(parameter)?;
        self.thresholds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&parameter)
            .cloned()
    }

    /// All active thresholds, ordered by parameter.
    pub fn snapshot(&self) -> Vec<Threshold> {
        let mut all: Vec<Threshold> = self
            .thresholds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|t| t.parameter);
        all
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
