//! Sensor parameter catalogue.
//!
//! Every parameter the monitoring core knows about is a variant of the
//! closed [`Parameter`] enum. Per-parameter constants (unit, routing
//! category, priority weight, critical margin) live here so that the rest
//! of the crate never branches on raw parameter strings.

use serde::{Deserialize, Serialize};

use crate::alert::Category;

// ---------------------------------------------------------------------------
// Wire names
// ---------------------------------------------------------------------------

pub const PARAM_PH: &str = "ph";
pub const PARAM_TEMPERATURE: &str = "temperature";
pub const PARAM_TURBIDITY: &str = "turbidity";
pub const PARAM_SALINITY: &str = "salinity";
pub const PARAM_DISSOLVED_OXYGEN: &str = "dissolved_oxygen";
pub const PARAM_DEVICE_TEMPERATURE: &str = "device_temperature";
pub const PARAM_DEVICE_HUMIDITY: &str = "device_humidity";
pub const PARAM_RAIN: &str = "rain";

// ---------------------------------------------------------------------------
// Parameter
// ---------------------------------------------------------------------------

/// A monitored sensor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Ph,
    Temperature,
    Turbidity,
    Salinity,
    DissolvedOxygen,
    DeviceTemperature,
    DeviceHumidity,
    /// Precipitation status code. Never threshold-evaluated.
    Rain,
}

impl Parameter {
    /// All parameters in evaluation order.
    pub const ALL: [Parameter; 8] = [
        Parameter::Ph,
        Parameter::Temperature,
        Parameter::Turbidity,
        Parameter::Salinity,
        Parameter::DissolvedOxygen,
        Parameter::DeviceTemperature,
        Parameter::DeviceHumidity,
        Parameter::Rain,
    ];

    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ph => PARAM_PH,
            Self::Temperature => PARAM_TEMPERATURE,
            Self::Turbidity => PARAM_TURBIDITY,
            Self::Salinity => PARAM_SALINITY,
            Self::DissolvedOxygen => PARAM_DISSOLVED_OXYGEN,
            Self::DeviceTemperature => PARAM_DEVICE_TEMPERATURE,
            Self::DeviceHumidity => PARAM_DEVICE_HUMIDITY,
            Self::Rain => PARAM_RAIN,
        }
    }

    /// Case-insensitive lookup by wire name or a known alias.
    ///
    /// Returns `None` for anything unrecognised; callers treat unknown
    /// parameters as "nothing to evaluate".
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "ph" | "ph_level" => Some(Self::Ph),
            "temperature" | "temp" | "water_temperature" | "water_temp" => Some(Self::Temperature),
            "turbidity" | "ntu" => Some(Self::Turbidity),
            "salinity" | "ppt" => Some(Self::Salinity),
            "dissolved_oxygen" | "do" | "oxygen" => Some(Self::DissolvedOxygen),
            "device_temperature" | "device_temp" | "enclosure_temperature" => {
                Some(Self::DeviceTemperature)
            }
            "device_humidity" | "humidity" | "enclosure_humidity" => Some(Self::DeviceHumidity),
            "rain" | "rain_status" | "rain_code" | "precipitation" => Some(Self::Rain),
            _ => None,
        }
    }

    /// Measurement unit shown in alert messages.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Ph => "",
            Self::Temperature | Self::DeviceTemperature => "°C",
            Self::Turbidity => " NTU",
            Self::Salinity => " ppt",
            Self::DissolvedOxygen => " mg/L",
            Self::DeviceHumidity => "%",
            Self::Rain => "",
        }
    }

    /// Human-readable label used in titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ph => "pH",
            Self::Temperature => "Water temperature",
            Self::Turbidity => "Turbidity",
            Self::Salinity => "Salinity",
            Self::DissolvedOxygen => "Dissolved oxygen",
            Self::DeviceTemperature => "Device temperature",
            Self::DeviceHumidity => "Device humidity",
            Self::Rain => "Rain",
        }
    }

    /// Routing category for notifications.
    pub fn category(&self) -> Category {
        match self {
            Self::Ph | Self::Salinity | Self::DissolvedOxygen => Category::Chemical,
            Self::Temperature | Self::Turbidity => Category::Physical,
            Self::DeviceTemperature | Self::DeviceHumidity => Category::Device,
            Self::Rain => Category::Weather,
        }
    }

    /// Additive weight used by the priority score.
    pub fn weight(&self) -> i32 {
        match self {
            Self::Ph | Self::DissolvedOxygen => 30,
            Self::Temperature => 25,
            Self::Salinity => 20,
            Self::Turbidity => 15,
            Self::Rain => 10,
            Self::DeviceTemperature | Self::DeviceHumidity => 5,
        }
    }

    /// Padding applied to normal bounds to derive the critical bounds.
    ///
    /// `None` for parameters that are not threshold-evaluated.
    pub fn critical_margin(&self) -> Option<f64> {
        match self {
            Self::Ph => Some(0.5),
            Self::Temperature => Some(3.0),
            Self::Turbidity => Some(50.0),
            Self::Salinity => Some(5.0),
            Self::DissolvedOxygen => Some(1.0),
            Self::DeviceTemperature | Self::DeviceHumidity => Some(10.0),
            Self::Rain => None,
        }
    }

    /// Whether this parameter goes through threshold evaluation.
    pub fn is_threshold_based(&self) -> bool {
        self.critical_margin().is_some()
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
