//! Reading fan-out and alert notification delivery.
//!
//! - [`ReadingBus`]: in-process publish/subscribe hub for reading batches,
//!   backed by `tokio::sync::broadcast`.
//! - [`NotificationRouter`]: routes alerts to category channels and
//!   collects per-alert receipts and failures.
//! - [`delivery`]: sinks that push notifications out (webhook, log).

pub mod bus;
pub mod delivery;
pub mod router;

pub use bus::{ReadingBatch, ReadingBus};
pub use delivery::log::LogNotifier;
pub use delivery::webhook::{WebhookError, WebhookNotifier};
pub use router::{
    DeviceChannel, DispatchReport, NotificationChannel, NotificationFailure, NotificationReceipt,
    NotificationRouter, WaterQualityChannel, WeatherChannel,
};
