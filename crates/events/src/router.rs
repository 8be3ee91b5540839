//! Category-based notification routing.
//!
//! [`NotificationRouter`] partitions alerts into disjoint groups, one per
//! [`NotificationChannel`], and dispatches the groups concurrently. Each
//! alert yields either a [`NotificationReceipt`] or a
//! [`NotificationFailure`]; a failure never stops the remaining alerts or
//! the other channels.

use std::sync::Arc;

use aquawatch_core::generator::rain_status;
use aquawatch_core::types::Timestamp;
use aquawatch_core::{Alert, Category, DeliveryError, NotificationSink};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;

pub const CHANNEL_WATER_QUALITY: &str = "water_quality";
pub const CHANNEL_DEVICE: &str = "device";
pub const CHANNEL_WEATHER: &str = "weather";

/// Device name reported for device-environment alerts when none is configured.
pub const DEFAULT_DEVICE_NAME: &str = "sensor-node";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Proof that one alert was handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationReceipt {
    pub alert_id: String,
    pub parameter: String,
    pub channel: &'static str,
    pub delivered_at: Timestamp,
}

/// A single alert that could not be delivered.
#[derive(Debug)]
pub struct NotificationFailure {
    pub alert_id: String,
    pub parameter: String,
    pub channel: &'static str,
    pub error: DeliveryError,
}

/// Outcome of dispatching a batch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub receipts: Vec<NotificationReceipt>,
    pub failures: Vec<NotificationFailure>,
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// One notification family: which alerts it takes and how it calls the sink.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    fn accepts(&self, category: Category) -> bool;

    async fn send(&self, alert: &Alert, sink: &dyn NotificationSink) -> Result<(), DeliveryError>;
}

/// Core water-quality alerts (chemical and physical parameters).
#[derive(Debug, Default)]
pub struct WaterQualityChannel;

#[async_trait]
impl NotificationChannel for WaterQualityChannel {
    fn name(&self) -> &'static str {
        CHANNEL_WATER_QUALITY
    }

    fn accepts(&self, category: Category) -> bool {
        matches!(category, Category::Chemical | Category::Physical)
    }

    async fn send(&self, alert: &Alert, sink: &dyn NotificationSink) -> Result<(), DeliveryError> {
        sink.notify(&alert.parameter, alert.value, alert.alert_level)
            .await
    }
}

/// Device-environment alerts (enclosure temperature, humidity).
#[derive(Debug)]
pub struct DeviceChannel {
    device_name: String,
}

impl DeviceChannel {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
        }
    }
}

impl Default for DeviceChannel {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_NAME)
    }
}

#[async_trait]
impl NotificationChannel for DeviceChannel {
    fn name(&self) -> &'static str {
        CHANNEL_DEVICE
    }

    fn accepts(&self, category: Category) -> bool {
        category == Category::Device
    }

    async fn send(&self, alert: &Alert, sink: &dyn NotificationSink) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({
            "alert_id": alert.id,
            "value": alert.value,
            "alert_level": alert.alert_level,
            "severity": alert.severity,
            "title": alert.title,
            "message": alert.message,
            "timestamp": alert.timestamp,
        });
        sink.notify_device_status(&self.device_name, &alert.parameter, &payload)
            .await
    }
}

/// Weather alerts.
#[derive(Debug, Default)]
pub struct WeatherChannel;

#[async_trait]
impl NotificationChannel for WeatherChannel {
    fn name(&self) -> &'static str {
        CHANNEL_WEATHER
    }

    fn accepts(&self, category: Category) -> bool {
        category == Category::Weather
    }

    async fn send(&self, alert: &Alert, sink: &dyn NotificationSink) -> Result<(), DeliveryError> {
        let code = alert.value.round() as i64;
        sink.notify_weather_alert(rain_status(alert.value), code)
            .await
    }
}

// ---------------------------------------------------------------------------
// NotificationRouter
// ---------------------------------------------------------------------------

/// Fans alerts out to their category channel.
pub struct NotificationRouter {
    channels: Vec<Box<dyn NotificationChannel>>,
    sink: Arc<dyn NotificationSink>,
}

impl NotificationRouter {
    /// Router with the three standard channels.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_device_name(sink, DEFAULT_DEVICE_NAME)
    }

    pub fn with_device_name(sink: Arc<dyn NotificationSink>, device_name: &str) -> Self {
        Self {
            channels: vec![
                Box::new(WaterQualityChannel),
                Box::new(DeviceChannel::new(device_name)),
                Box::new(WeatherChannel),
            ],
            sink,
        }
    }

    /// Router with an explicit channel list. An alert goes to the first
    /// channel that accepts its category.
    pub fn with_channels(
        sink: Arc<dyn NotificationSink>,
        channels: Vec<Box<dyn NotificationChannel>>,
    ) -> Self {
        Self { channels, sink }
    }

    /// Dispatch every alert through its channel.
    ///
    /// Channel groups run concurrently; alerts inside a group are sent in
    /// order. Alerts no channel accepts are reported as failures.
    pub async fn dispatch(&self, alerts: &[Alert]) -> DispatchReport {
        let mut groups: Vec<Vec<&Alert>> = vec![Vec::new(); self.channels.len()];
        let mut report = DispatchReport::default();

        for alert in alerts {
            match self.channels.iter().position(|c| c.accepts(alert.category)) {
                Some(i) => groups[i].push(alert),
                None => report.failures.push(NotificationFailure {
                    alert_id: alert.id.clone(),
                    parameter: alert.parameter.clone(),
                    channel: "unrouted",
                    error: DeliveryError::Rejected(format!(
                        "no channel accepts category {}",
                        alert.category
                    )),
                }),
            }
        }

        let sink = self.sink.as_ref();
        let outcomes = join_all(
            self.channels
                .iter()
                .zip(groups)
                .filter(|(_, group)| !group.is_empty())
                .map(|(channel, group)| dispatch_group(channel.as_ref(), group, sink)),
        )
        .await;

        for group_report in outcomes {
            report.receipts.extend(group_report.receipts);
            report.failures.extend(group_report.failures);
        }

        report
    }
}

async fn dispatch_group(
    channel: &dyn NotificationChannel,
    alerts: Vec<&Alert>,
    sink: &dyn NotificationSink,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for alert in alerts {
        match channel.send(alert, sink).await {
            Ok(()) => {
                tracing::debug!(
                    alert_id = %alert.id,
                    channel = channel.name(),
                    "Notification delivered"
                );
                report.receipts.push(NotificationReceipt {
                    alert_id: alert.id.clone(),
                    parameter: alert.parameter.clone(),
                    channel: channel.name(),
                    delivered_at: Utc::now(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    alert_id = %alert.id,
                    channel = channel.name(),
                    error = %e,
                    "Notification delivery failed"
                );
                report.failures.push(NotificationFailure {
                    alert_id: alert.id.clone(),
                    parameter: alert.parameter.clone(),
                    channel: channel.name(),
                    error: e,
                });
            }
        }
    }

    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
