//! Where readings come from.
//!
//! [`HttpReadingSource`] is pulled by the poll loop. [`WsReadingSubscriber`]
//! holds a WebSocket open and publishes every pushed batch to the
//! [`ReadingBus`].

use std::sync::Arc;
use std::time::Duration;

use aquawatch_core::reading::parse_batch;
use aquawatch_core::{CoreError, SensorReading};
use aquawatch_events::ReadingBus;
use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// HTTP request timeout for a single poll.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// First wait after a dropped or refused WebSocket connection.
const RECONNECT_BASE: Duration = Duration::from_secs(1);
/// Longest wait between WebSocket connection attempts.
const RECONNECT_CAP: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Readings endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Malformed(#[from] CoreError),
}

/// Decode a JSON document into a reading batch. A single object is treated
/// as a batch of one.
pub fn batch_from_value(value: serde_json::Value) -> Result<Vec<SensorReading>, SourceError> {
    let value = if value.is_object() {
        serde_json::Value::Array(vec![value])
    } else {
        value
    };
    Ok(parse_batch(&value)?)
}

pub fn decode_batch(text: &str) -> Result<Vec<SensorReading>, SourceError> {
    batch_from_value(serde_json::from_str(text)?)
}

// ---------------------------------------------------------------------------
// Pull
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<SensorReading>, SourceError>;
}

pub struct HttpReadingSource {
    client: reqwest::Client,
    url: String,
}

impl HttpReadingSource {
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReadingSource for HttpReadingSource {
    async fn fetch(&self) -> Result<Vec<SensorReading>, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status().as_u16()));
        }
        let body: serde_json::Value = response.json().await?;
        batch_from_value(body)
    }
}

// ---------------------------------------------------------------------------
// Push
// ---------------------------------------------------------------------------

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Doubling wait between connection attempts, capped. A successful
/// connection resets it.
#[derive(Debug, Clone)]
struct Backoff {
    base: Duration,
    cap: Duration,
    current: Duration,
}

impl Backoff {
    fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            current: base,
        }
    }

    /// Wait to use now; the following one doubles.
    fn next_wait(&mut self) -> Duration {
        let wait = self.current;
        self.current = self.current.saturating_mul(2).min(self.cap);
        wait
    }

    fn reset(&mut self) {
        self.current = self.base;
    }
}

pub struct WsReadingSubscriber {
    url: String,
    backoff: Backoff,
}

impl WsReadingSubscriber {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff: Backoff::new(RECONNECT_BASE, RECONNECT_CAP),
        }
    }

    /// Override the reconnect wait bounds.
    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff = Backoff::new(base, cap.max(base));
        self
    }

    /// Keep a session open, reconnecting with backoff, until `cancel`
    /// fires.
    pub async fn run(&self, bus: Arc<ReadingBus>, cancel: CancellationToken) {
        let mut backoff = self.backoff.clone();

        loop {
            tracing::info!(url = %self.url, "Connecting to readings WebSocket");

            tokio::select! {
                _ = cancel.cancelled() => break,
                result = connect_async(self.url.as_str()) => match result {
                    Ok((stream, _response)) => {
                        tracing::info!(url = %self.url, "Readings WebSocket connected");
                        backoff.reset();
                        run_session(stream, &bus, &cancel).await;
                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::warn!("Readings WebSocket session ended, reconnecting");
                    }
                    Err(e) => {
                        tracing::error!(url = %self.url, error = %e, "Readings WebSocket connection failed");
                    }
                },
            }

            let wait = backoff.next_wait();
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Waiting before reconnect");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        tracing::info!("Readings WebSocket subscriber stopped");
    }
}

async fn run_session(mut stream: WsStream, bus: &ReadingBus, cancel: &CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = stream.close(None).await;
                return;
            }
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => match decode_batch(&text) {
                    Ok(batch) if batch.is_empty() => {}
                    Ok(batch) => {
                        let receivers = bus.publish(batch);
                        tracing::debug!(receivers, "Published pushed reading batch");
                    }
                    Err(e) => tracing::warn!(error = %e, "Ignoring undecodable reading message"),
                },
                Some(Ok(Message::Close(_))) | None => return,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Readings WebSocket error");
                    return;
                }
            },
        }
    }
}
