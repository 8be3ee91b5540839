//! Webhook notification sink with exponential-backoff retry.
//!
//! [`WebhookNotifier`] POSTs one JSON document per notification to a fixed
//! URL. Each document carries a `type` discriminator (`water_quality`,
//! `device_status`, `weather`). Failed attempts are retried with backoff
//! (1 s, 2 s, 4 s) before the last error is surfaced.

use std::time::Duration;

use aquawatch_core::{AlertLevel, DeliveryError, NotificationSink};
use async_trait::async_trait;
use chrono::Utc;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

impl From<WebhookError> for DeliveryError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::HttpStatus(code) if (400..500).contains(&code) => {
                DeliveryError::Rejected(err.to_string())
            }
            other => DeliveryError::Transport(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

pub fn water_quality_payload(parameter: &str, value: f64, level: AlertLevel) -> serde_json::Value {
    serde_json::json!({
        "type": "water_quality",
        "parameter": parameter,
        "value": value,
        "alert_level": level,
        "sent_at": Utc::now(),
    })
}

pub fn device_status_payload(
    device_name: &str,
    kind: &str,
    payload: &serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "type": "device_status",
        "device_name": device_name,
        "kind": kind,
        "payload": payload,
        "sent_at": Utc::now(),
    })
}

pub fn weather_payload(status_text: &str, code: i64) -> serde_json::Value {
    serde_json::json!({
        "type": "weather",
        "status": status_text,
        "code": code,
        "sent_at": Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers notifications to one webhook endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver a payload with retry. Returns on the first successful attempt.
    pub async fn deliver(&self, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let url = self.url.as_str();

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(payload).await {
                Ok(()) => return Ok(()),
                // Client errors will not succeed on retry.
                Err(WebhookError::HttpStatus(code)) if (400..500).contains(&code) => {
                    tracing::error!(url, status = code, "Webhook rejected notification");
                    return Err(WebhookError::HttpStatus(code));
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(payload).await.inspect_err(|e| {
            tracing::error!(url, error = %e, "Webhook delivery failed after all retries");
        })
    }

    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn notify(&self, parameter: &str, value: f64, level: AlertLevel) -> Result<(), DeliveryError> {
        self.deliver(&water_quality_payload(parameter, value, level))
            .await
            .map_err(DeliveryError::from)
    }

    async fn notify_device_status(
        &self,
        device_name: &str,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        self.deliver(&device_status_payload(device_name, kind, payload))
            .await
            .map_err(DeliveryError::from)
    }

    async fn notify_weather_alert(&self, status_text: &str, code: i64) -> Result<(), DeliveryError> {
        self.deliver(&weather_payload(status_text, code))
            .await
            .map_err(DeliveryError::from)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
