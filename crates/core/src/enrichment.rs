//! Alert enrichment: identifiers, human-readable text, severity, category,
//! confidence and remediation suggestions.
//!
//! Message selection is a lookup table keyed by [`Parameter`] and
//! [`Direction`]. Parameters without an entry fall back to a generic
//! template, so new sensor types still produce readable alerts.

use rand::distr::{Alphanumeric, SampleString};
use rand::seq::IndexedRandom;

use crate::alert::{Alert, AlertLevel, Category, Direction, Severity, Urgency, ValidDraft};
use crate::generator::rain_status;
use crate::parameters::Parameter;
use crate::types::Timestamp;

/// Length of the random suffix appended to alert ids.
const ID_SUFFIX_LEN: usize = 6;

/// Confidence when the value sits within this fraction of the crossed bound.
const NEAR_BOUND_FRACTION: f64 = 0.02;

/// Penalty applied to confidence for near-bound values.
const NEAR_BOUND_PENALTY: f64 = 0.1;

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// One phrasing of an alert. Placeholders: `{label}`, `{value}`, `{unit}`,
/// `{bound}`, `{status}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub title: &'static str,
    pub message: &'static str,
}

/// How to pick among equivalent phrasings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateSelection {
    /// Always the first phrasing. Deterministic output.
    #[default]
    First,
    /// Uniformly random phrasing.
    Random,
}

const fn t(title: &'static str, message: &'static str) -> Template {
    Template { title, message }
}

const PH_HIGH: &[Template] = &[
    t(
        "High pH detected",
        "pH has risen to {value}, above the safe limit of {bound}. Alkaline water stresses gills and increases ammonia toxicity.",
    ),
    t(
        "pH too alkaline",
        "Water pH is {value} (limit {bound}). Check for algal blooms or liming overdose.",
    ),
];
const PH_LOW: &[Template] = &[
    t(
        "Low pH detected",
        "pH has dropped to {value}, below the safe limit of {bound}. Acidic water impairs respiration and growth.",
    ),
    t(
        "pH too acidic",
        "Water pH is {value} (limit {bound}). Check buffering capacity and recent rainfall runoff.",
    ),
];
const TEMPERATURE_HIGH: &[Template] = &[
    t(
        "Water temperature too high",
        "Water temperature is {value}{unit}, above {bound}{unit}. Oxygen solubility falls as temperature rises.",
    ),
    t(
        "Heat stress risk",
        "Temperature reached {value}{unit} (limit {bound}{unit}). Stock may reduce feeding.",
    ),
];
const TEMPERATURE_LOW: &[Template] = &[
    t(
        "Water temperature too low",
        "Water temperature is {value}{unit}, below {bound}{unit}. Metabolism and immunity slow in cold water.",
    ),
    t(
        "Cold stress risk",
        "Temperature dropped to {value}{unit} (limit {bound}{unit}).",
    ),
];
const TURBIDITY_HIGH: &[Template] = &[
    t(
        "High turbidity",
        "Turbidity is {value}{unit}, above {bound}{unit}. Suspended solids can clog gills and block light.",
    ),
    t(
        "Water clarity degraded",
        "Turbidity reached {value}{unit} (limit {bound}{unit}).",
    ),
];
const SALINITY_HIGH: &[Template] = &[t(
    "Salinity too high",
    "Salinity is {value}{unit}, above {bound}{unit}. Osmotic stress risk for stock.",
)];
const SALINITY_LOW: &[Template] = &[t(
    "Salinity too low",
    "Salinity is {value}{unit}, below {bound}{unit}. Freshwater intrusion suspected.",
)];
const OXYGEN_LOW: &[Template] = &[
    t(
        "Low dissolved oxygen",
        "Dissolved oxygen is {value}{unit}, below {bound}{unit}. Stock may be suffocating.",
    ),
    t(
        "Oxygen depletion",
        "Dissolved oxygen fell to {value}{unit} (minimum {bound}{unit}).",
    ),
];
const DEVICE_HIGH: &[Template] = &[t(
    "{label} out of range",
    "{label} is {value}{unit}, above {bound}{unit}. The sensor enclosure may be failing.",
)];
const RAIN: &[Template] = &[
    t("{status} detected", "{status} reported at the site (code {value})."),
    t("Weather update: {status}", "Rain sensor reports {status} (code {value})."),
];
const GENERIC_HIGH: &[Template] = &[t(
    "{label} above safe range",
    "{label} is {value}{unit}, above the safe limit of {bound}{unit}.",
)];
const GENERIC_LOW: &[Template] = &[t(
    "{label} below safe range",
    "{label} is {value}{unit}, below the safe limit of {bound}{unit}.",
)];

/// Phrasings for a parameter and direction. Always non-empty.
pub fn templates_for(parameter: Option<Parameter>, direction: Option<Direction>) -> &'static [Template] {
    use Direction::{High, Low};
    use Parameter::*;

    match (parameter, direction) {
        (Some(Ph), Some(High)) => PH_HIGH,
        (Some(Ph), Some(Low)) => PH_LOW,
        (Some(Temperature), Some(High)) => TEMPERATURE_HIGH,
        (Some(Temperature), Some(Low)) => TEMPERATURE_LOW,
        (Some(Turbidity), Some(High)) => TURBIDITY_HIGH,
        (Some(Salinity), Some(High)) => SALINITY_HIGH,
        (Some(Salinity), Some(Low)) => SALINITY_LOW,
        (Some(DissolvedOxygen), Some(Low)) => OXYGEN_LOW,
        (Some(DeviceTemperature | DeviceHumidity), Some(High)) => DEVICE_HIGH,
        (Some(Rain), _) => RAIN,
        (_, Some(Low)) => GENERIC_LOW,
        _ => GENERIC_HIGH,
    }
}

/// Operator actions for a parameter and direction.
pub fn remediation_for(parameter: Option<Parameter>, direction: Option<Direction>) -> &'static [&'static str] {
    use Direction::{High, Low};
    use Parameter::*;

    match (parameter, direction) {
        (Some(Ph), Some(High)) => &[
            "Perform a partial water exchange",
            "Reduce liming and check for algal blooms",
        ],
        (Some(Ph), Some(Low)) => &[
            "Apply agricultural lime to raise alkalinity",
            "Check for acidic runoff after rain",
        ],
        (Some(Temperature), Some(High)) => &[
            "Increase aeration",
            "Provide shade or add cooler water",
            "Reduce feeding until temperature stabilizes",
        ],
        (Some(Temperature), Some(Low)) => &[
            "Reduce feeding rates",
            "Cover tanks or use heaters where available",
        ],
        (Some(Turbidity), _) => &[
            "Check for erosion or inflow disturbance",
            "Pause feeding to reduce suspended waste",
        ],
        (Some(Salinity), Some(High)) => &["Dilute with fresh water gradually"],
        (Some(Salinity), _) => &["Check for freshwater intrusion", "Add marine salt gradually"],
        (Some(DissolvedOxygen), _) => &[
            "Run emergency aerators immediately",
            "Stop feeding until oxygen recovers",
        ],
        (Some(DeviceTemperature | DeviceHumidity), _) => &[
            "Inspect the sensor enclosure and ventilation",
            "Verify readings with a handheld meter",
        ],
        (Some(Rain), _) => &[
            "Monitor pH and salinity for runoff effects",
            "Check overflow and drainage",
        ],
        _ => &["Verify the reading with a manual measurement"],
    }
}

fn render(template: &str, draft: &ValidDraft, parameter: Option<Parameter>) -> String {
    let label = parameter
        .map(|p| p.label().to_string())
        .unwrap_or_else(|| draft.parameter.clone());
    let unit = parameter.map(|p| p.unit()).unwrap_or("");
    let bound = draft
        .bound
        .map(format_number)
        .unwrap_or_else(|| "the configured limit".to_string());
    let status = rain_status(draft.value);

    template
        .replace("{label}", &label)
        .replace("{value}", &format_number(draft.value))
        .replace("{unit}", unit)
        .replace("{bound}", &bound)
        .replace("{status}", status)
}

/// Format with at most two decimals and no trailing zeros.
fn format_number(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Severity tier for a validated draft.
pub fn severity_for(draft: &ValidDraft) -> Severity {
    if draft.informational {
        return Severity::Low;
    }
    match draft.level {
        AlertLevel::Critical => Severity::High,
        AlertLevel::Warning => Severity::Medium,
    }
}

/// Confidence that the alert reflects a real condition.
pub fn confidence_for(draft: &ValidDraft) -> f64 {
    let base = if draft.informational {
        0.70
    } else {
        match draft.level {
            AlertLevel::Critical => 0.95,
            AlertLevel::Warning => 0.85,
        }
    };

    let near_bound = draft.bound.is_some_and(|bound| {
        let tolerance = (bound.abs() * NEAR_BOUND_FRACTION).max(f64::EPSILON);
        (draft.value - bound).abs() <= tolerance
    });

    if near_bound {
        base - NEAR_BOUND_PENALTY
    } else {
        base
    }
}

/// Generate an alert id: creation time in millis plus a random suffix.
pub fn alert_id(created_at: Timestamp) -> String {
    let suffix = Alphanumeric.sample_string(&mut rand::rng(), ID_SUFFIX_LEN);
    format!("{}-{suffix}", created_at.timestamp_millis())
}

/// Turns validated drafts into alerts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertEnricher {
    selection: TemplateSelection,
}

impl AlertEnricher {
    pub fn new(selection: TemplateSelection) -> Self {
        Self { selection }
    }

    /// Build an [`Alert`] from a validated draft.
    ///
    /// Priority and urgency are left at their neutral values; the
    /// prioritizer fills them in.
    pub fn enrich(&self, draft: &ValidDraft, now: Timestamp) -> Alert {
        let parameter = draft.kind();
        let direction = draft.direction;
        let template = self.pick(templates_for(parameter, direction));

        let category = parameter.map(|p| p.category()).unwrap_or(Category::Physical);

        Alert {
            id: alert_id(now),
            parameter: draft.parameter.clone(),
            value: draft.value,
            alert_level: draft.level,
            severity: severity_for(draft),
            title: render(template.title, draft, parameter),
            message: render(template.message, draft, parameter),
            category,
            confidence: confidence_for(draft),
            priority: 0,
            urgency: Urgency::Monitor,
            remediation: remediation_for(parameter, direction)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timestamp: draft.timestamp,
            created_at: now,
        }
    }

    fn pick(&self, templates: &'static [Template]) -> Template {
        let chosen = match self.selection {
            TemplateSelection::First => templates.first(),
            TemplateSelection::Random => templates.choose(&mut rand::rng()),
        };
        chosen.copied().unwrap_or(GENERIC_HIGH[0])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
