#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aquawatch_core::{
    Alert, AlertFilter, AlertLevel, AlertStore, DeliveryError, ManualClock, NotificationSink,
    SensorReading, StoreError, ThresholdConfig, ThresholdStore,
};
use aquawatch_pipeline::{AlertOrchestrator, InMemoryAlertStore, OrchestratorBuilder};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

/// Fixed start time so recency bonuses are predictable.
pub fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap()
}

pub fn reading(values: &[(&str, f64)]) -> SensorReading {
    values
        .iter()
        .fold(SensorReading::new(start_time()), |r, (name, v)| r.with_value(*name, *v))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// In-memory store that counts calls and can be switched to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryAlertStore,
    pub save_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl RecordingStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn saved(&self) -> Vec<Alert> {
        self.inner.all()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertStore for RecordingStore {
    async fn save_alerts(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("database offline".into()));
        }
        self.inner.save_alerts(alerts).await
    }

    async fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.query(filter).await
    }
}

/// Store whose first `query` takes its snapshot, signals `entered`, then
/// holds the result until `release` is notified.
pub struct GatedQueryStore {
    inner: InMemoryAlertStore,
    gated: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl Default for GatedQueryStore {
    fn default() -> Self {
        Self {
            inner: InMemoryAlertStore::default(),
            gated: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl AlertStore for GatedQueryStore {
    async fn save_alerts(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        self.inner.save_alerts(alerts).await
    }

    async fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        let snapshot = self.inner.query(filter).await?;
        if self.gated.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    WaterQuality {
        parameter: String,
        value: f64,
        level: AlertLevel,
    },
    Device {
        device_name: String,
        kind: String,
    },
    Weather {
        status: String,
        code: i64,
    },
}

#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    pub fail: AtomicBool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: SinkCall) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("gateway timeout".into()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, parameter: &str, value: f64, level: AlertLevel) -> Result<(), DeliveryError> {
        self.record(SinkCall::WaterQuality {
            parameter: parameter.to_string(),
            value,
            level,
        })
    }

    async fn notify_device_status(
        &self,
        device_name: &str,
        kind: &str,
        _payload: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        self.record(SinkCall::Device {
            device_name: device_name.to_string(),
            kind: kind.to_string(),
        })
    }

    async fn notify_weather_alert(&self, status_text: &str, code: i64) -> Result<(), DeliveryError> {
        self.record(SinkCall::Weather {
            status: status_text.to_string(),
            code,
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<RecordingStore>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(RecordingStore::default(), RecordingSink::default())
    }

    pub fn with(store: RecordingStore, sink: RecordingSink) -> Self {
        Self {
            store: Arc::new(store),
            sink: Arc::new(sink),
            clock: Arc::new(ManualClock::new(start_time())),
        }
    }

    pub fn builder(&self) -> OrchestratorBuilder {
        self.builder_with_store(self.store.clone())
    }

    /// Builder persisting to `store` instead of the recording store.
    pub fn builder_with_store(&self, store: Arc<dyn AlertStore>) -> OrchestratorBuilder {
        let thresholds = Arc::new(ThresholdStore::from_config(&ThresholdConfig::default()));
        AlertOrchestrator::builder(thresholds, store, self.sink.clone())
            .with_clock(self.clock.clone())
    }

    pub fn orchestrator(&self) -> Arc<AlertOrchestrator> {
        Arc::new(self.builder().build())
    }
}
