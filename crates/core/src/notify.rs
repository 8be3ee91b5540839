//! Notification delivery collaborator.
//!
//! [`NotificationSink`] is the transport the router hands alerts to. It
//! exposes one call shape per notification family. Retry and timeout policy
//! belong to the implementation.

use async_trait::async_trait;

use crate::alert::AlertLevel;

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The transport failed (network, HTTP status, ...).
    #[error("Delivery transport failed: {0}")]
    Transport(String),

    /// The transport refused the notification.
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Water-quality alert (chemical or physical parameter).
    async fn notify(&self, parameter: &str, value: f64, level: AlertLevel)
        -> Result<(), DeliveryError>;

    /// Device-environment alert.
    async fn notify_device_status(
        &self,
        device_name: &str,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<(), DeliveryError>;

    /// Weather alert.
    async fn notify_weather_alert(&self, status_text: &str, code: i64)
        -> Result<(), DeliveryError>;
}
