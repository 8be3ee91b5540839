//! AquaWatch domain logic.
//!
//! Everything in this crate is pure (no network or database access) so it
//! can be tested in isolation:
//!
//! - [`thresholds`]: per-parameter bounds and the [`ThresholdStore`].
//! - [`generator`]: turns the latest reading into [`AlertDraft`]s.
//! - [`validation`] and [`dedup`]: draft checks and the moving-window
//!   suppressor.
//! - [`enrichment`] and [`priority`]: text, severity, priority, urgency.
//! - [`store`] and [`notify`]: collaborator traits implemented elsewhere.

pub mod alert;
pub mod clock;
pub mod dedup;
pub mod enrichment;
pub mod error;
pub mod generator;
pub mod notify;
pub mod parameters;
pub mod priority;
pub mod reading;
pub mod store;
pub mod thresholds;
pub mod types;
pub mod validation;

pub use alert::{
    Alert, AlertDraft, AlertLevel, Category, Direction, Level, Severity, Urgency, ValidDraft,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dedup::AlertDeduplicator;
pub use enrichment::{AlertEnricher, TemplateSelection};
pub use error::CoreError;
pub use generator::AlertGenerator;
pub use notify::{DeliveryError, NotificationSink};
pub use parameters::Parameter;
pub use reading::SensorReading;
pub use store::{AlertFilter, AlertStore, StoreError};
pub use thresholds::{Threshold, ThresholdConfig, ThresholdStore};
