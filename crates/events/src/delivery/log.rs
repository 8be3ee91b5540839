//! Notification sink that only writes to the log.
//!
//! Used when no webhook is configured, so alerts stay visible in the
//! service output.

use aquawatch_core::{AlertLevel, DeliveryError, NotificationSink};
use async_trait::async_trait;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, parameter: &str, value: f64, level: AlertLevel) -> Result<(), DeliveryError> {
        tracing::warn!(parameter, value, level = %level, "Water quality alert");
        Ok(())
    }

    async fn notify_device_status(
        &self,
        device_name: &str,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        tracing::warn!(device_name, kind, payload = %payload, "Device status alert");
        Ok(())
    }

    async fn notify_weather_alert(&self, status_text: &str, code: i64) -> Result<(), DeliveryError> {
        tracing::warn!(status = status_text, code, "Weather alert");
        Ok(())
    }
}
