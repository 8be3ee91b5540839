//! The alert processing facade.
//!
//! [`AlertOrchestrator`] runs one cycle per reading batch:
//!
//! 1. generate drafts from the latest reading
//! 2. validate, then suppress repeats inside the dedup window
//! 3. run custom stages, each isolated from the others' failures
//! 4. enrich and prioritize
//! 5. persist the survivors in one batch
//! 6. notify alerts that warrant it, grouped by category channel
//! 7. invalidate the display cache
//!
//! Only a malformed input shape aborts a cycle. Every other failure is
//! recorded in [`ProcessingResult::errors`] and the cycle carries on.
//!
//! The orchestrator is shared as `Arc<AlertOrchestrator>` between the poll
//! loop and the push subscription; concurrent cycles are safe because the
//! dedup check-then-set is atomic.

use std::sync::Arc;

use aquawatch_core::dedup::{signature, DEFAULT_DEDUP_WINDOW_MS};
use aquawatch_core::priority::{prioritize, sort_by_priority};
use aquawatch_core::reading::parse_batch;
use aquawatch_core::types::Timestamp;
use aquawatch_core::validation::validate_draft;
use aquawatch_core::{
    Alert, AlertDeduplicator, AlertDraft, AlertEnricher, AlertFilter, AlertGenerator, AlertStore,
    Clock, CoreError, NotificationSink, SensorReading, StoreError, SystemClock, TemplateSelection,
    Threshold, ThresholdStore, ValidDraft,
};
use aquawatch_events::router::{NotificationReceipt, NotificationRouter, DEFAULT_DEVICE_NAME};
use chrono::Duration;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::cache::{ResultCache, DEFAULT_CACHE_TTL_SECS};
use crate::error::{ErrorKind, PipelineError, ProcessingError};
use crate::stage::AlertProcessor;

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// No drafts were generated; nothing was persisted or sent.
    #[default]
    NoAlerts,
    Processed,
}

/// Consolidated outcome of one cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingResult {
    pub status: ProcessingStatus,
    /// Alerts that were persisted. Empty when persistence failed.
    pub new_alerts: Vec<Alert>,
    /// Every alert that survived the pipeline, in priority order.
    pub processed_alerts: Vec<Alert>,
    pub notifications: Vec<NotificationReceipt>,
    pub errors: Vec<ProcessingError>,
}

impl ProcessingResult {
    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &ProcessingError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Config / builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub dedup_window: Duration,
    pub cache_ttl: Duration,
    /// Name reported on device-environment notifications.
    pub device_name: String,
    pub template_selection: TemplateSelection,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            dedup_window: Duration::milliseconds(DEFAULT_DEDUP_WINDOW_MS),
            cache_ttl: Duration::seconds(DEFAULT_CACHE_TTL_SECS),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            template_selection: TemplateSelection::default(),
        }
    }
}

pub struct OrchestratorBuilder {
    thresholds: Arc<ThresholdStore>,
    store: Arc<dyn AlertStore>,
    sink: Arc<dyn NotificationSink>,
    stages: Vec<Box<dyn AlertProcessor>>,
    clock: Arc<dyn Clock>,
    config: OrchestratorConfig,
}

impl OrchestratorBuilder {
    /// Append a custom stage. Stages run in registration order.
    pub fn with_stage(mut self, stage: impl AlertProcessor + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> AlertOrchestrator {
        let config = self.config;
        AlertOrchestrator {
            generator: AlertGenerator::new(Arc::clone(&self.thresholds)),
            thresholds: self.thresholds,
            deduplicator: AlertDeduplicator::new(config.dedup_window),
            stages: self.stages,
            enricher: AlertEnricher::new(config.template_selection),
            store: self.store,
            router: NotificationRouter::with_device_name(self.sink, &config.device_name),
            cache: ResultCache::new(config.cache_ttl, Arc::clone(&self.clock)),
            clock: self.clock,
        }
    }
}

// ---------------------------------------------------------------------------
// AlertOrchestrator
// ---------------------------------------------------------------------------

pub struct AlertOrchestrator {
    thresholds: Arc<ThresholdStore>,
    generator: AlertGenerator,
    deduplicator: AlertDeduplicator,
    stages: Vec<Box<dyn AlertProcessor>>,
    enricher: AlertEnricher,
    store: Arc<dyn AlertStore>,
    router: NotificationRouter,
    cache: ResultCache,
    clock: Arc<dyn Clock>,
}

impl AlertOrchestrator {
    pub fn builder(
        thresholds: Arc<ThresholdStore>,
        store: Arc<dyn AlertStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            thresholds,
            store,
            sink,
            stages: Vec::new(),
            clock: Arc::new(SystemClock),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn thresholds(&self) -> &Arc<ThresholdStore> {
        &self.thresholds
    }

    pub fn deduplicator(&self) -> &AlertDeduplicator {
        &self.deduplicator
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Run one cycle over a reading batch (oldest first).
    pub async fn process_reading(
        &self,
        readings: &[SensorReading],
    ) -> Result<ProcessingResult, PipelineError> {
        let drafts = self.generator.generate(readings);
        Ok(self.process_drafts(drafts).await)
    }

    /// Parse a JSON batch and run one cycle over it.
    pub async fn process_json(
        &self,
        input: &serde_json::Value,
    ) -> Result<ProcessingResult, PipelineError> {
        let readings = parse_batch(input)?;
        self.process_reading(&readings).await
    }

    /// Run the post-generation pipeline over drafts produced elsewhere.
    ///
    /// An empty draft list returns immediately without touching the store,
    /// the sink or the cache. Any other cycle ends by invalidating the
    /// display cache, even when every draft was dropped.
    pub async fn process_drafts(&self, drafts: Vec<AlertDraft>) -> ProcessingResult {
        let mut result = ProcessingResult::default();
        if drafts.is_empty() {
            return result;
        }
        result.status = ProcessingStatus::Processed;

        let now = self.clock.now();
        let swept = self.deduplicator.sweep(now);
        if swept > 0 {
            tracing::debug!(swept, "Evicted stale dedup signatures");
        }

        let accepted = self.validate_and_dedup(&drafts, now, &mut result.errors);
        let accepted = self.run_stages(accepted, &mut result.errors);

        let mut alerts: Vec<Alert> = accepted
            .iter()
            .map(|d| prioritize(self.enricher.enrich(d, now), now))
            .collect();
        sort_by_priority(&mut alerts);

        if !alerts.is_empty() {
            match self.store.save_alerts(&alerts).await {
                Ok(()) => result.new_alerts = alerts.clone(),
                Err(e) => {
                    tracing::error!(count = alerts.len(), error = %e, "Failed to persist alerts");
                    result
                        .errors
                        .push(ProcessingError::new(ErrorKind::Persistence, e.to_string()));
                }
            }

            let to_notify: Vec<Alert> = alerts.iter().filter(|a| a.should_notify()).cloned().collect();
            if !to_notify.is_empty() {
                let report = self.router.dispatch(&to_notify).await;
                result.notifications = report.receipts;
                result.errors.extend(report.failures.into_iter().map(|f| {
                    ProcessingError::new(
                        ErrorKind::Notification,
                        format!("{} ({}): {}", f.alert_id, f.channel, f.error),
                    )
                    .with_parameter(Some(f.parameter))
                }));
            }
        }

        self.cache.invalidate_all();
        result.processed_alerts = alerts;

        tracing::info!(
            drafts = drafts.len(),
            alerts = result.processed_alerts.len(),
            persisted = result.new_alerts.len(),
            notified = result.notifications.len(),
            errors = result.errors.len(),
            "Processed alert cycle"
        );

        result
    }

    /// Run a cycle on its own task. Dropping the returned handle does not
    /// abort the cycle.
    pub fn spawn_process(
        self: Arc<Self>,
        readings: Vec<SensorReading>,
    ) -> JoinHandle<Result<ProcessingResult, PipelineError>> {
        tokio::spawn(async move { self.process_reading(&readings).await })
    }

    /// [`spawn_process`](Self::spawn_process) and wait for the result.
    /// A panicked cycle surfaces as [`PipelineError::Internal`].
    pub async fn run_detached(
        self: &Arc<Self>,
        readings: Vec<SensorReading>,
    ) -> Result<ProcessingResult, PipelineError> {
        Arc::clone(self)
            .spawn_process(readings)
            .await
            .map_err(|e| PipelineError::Internal(format!("processing task failed: {e}")))?
    }

    /// Replace one parameter's threshold and drop cached display results.
    pub fn update_threshold(&self, parameter: &str, threshold: Threshold) -> Result<(), CoreError> {
        self.thresholds.update_threshold(parameter, threshold)?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Stored alerts for display, priority order, served from the cache
    /// when fresh.
    pub async fn alerts_for_display(&self, filter: AlertFilter) -> Result<Vec<Alert>, StoreError> {
        if let Some(cached) = self.cache.get(&filter) {
            return Ok(cached);
        }

        let generation = self.cache.generation();
        let mut alerts = self.store.query(&filter).await?;
        sort_by_priority(&mut alerts);
        if let Some(limit) = filter.limit {
            alerts.truncate(limit);
        }

        self.cache.set(filter, alerts.clone(), generation);
        Ok(alerts)
    }

    // -- stages --------------------------------------------------------------

    fn validate_and_dedup(
        &self,
        drafts: &[AlertDraft],
        now: Timestamp,
        errors: &mut Vec<ProcessingError>,
    ) -> Vec<ValidDraft> {
        let mut accepted = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let valid = match validate_draft(draft) {
                Ok(valid) => valid,
                Err(e) => {
                    tracing::warn!(parameter = ?draft.parameter, error = %e, "Dropping invalid draft");
                    errors.push(
                        ProcessingError::new(ErrorKind::Validation, e.to_string())
                            .with_parameter(draft.parameter.clone()),
                    );
                    continue;
                }
            };

            let sig = signature(&valid);
            if self.deduplicator.check_and_record(&sig, now) {
                accepted.push(valid);
            } else {
                tracing::debug!(signature = %sig, "Suppressed duplicate alert");
                errors.push(
                    ProcessingError::new(
                        ErrorKind::DuplicateSuppression,
                        format!("{sig} already raised within the dedup window"),
                    )
                    .with_parameter(Some(valid.parameter)),
                );
            }
        }

        accepted
    }

    fn run_stages(
        &self,
        mut drafts: Vec<ValidDraft>,
        errors: &mut Vec<ProcessingError>,
    ) -> Vec<ValidDraft> {
        for stage in &self.stages {
            match stage.process(&drafts) {
                Ok(output) => drafts = output,
                Err(e) => {
                    tracing::warn!(stage = stage.name(), error = %e, "Stage failed, passing input through");
                    errors.push(ProcessingError::new(ErrorKind::ProcessorStage, e.to_string()));
                }
            }
        }
        drafts
    }
}
