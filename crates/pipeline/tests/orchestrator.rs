//! End-to-end cycles through `AlertOrchestrator` with recording fakes for
//! persistence and notification.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;
use serde_json::json;

use aquawatch_core::{
    AlertDraft, AlertFilter, AlertLevel, Category, Parameter, Severity, Threshold, Urgency,
    ValidDraft,
};
use aquawatch_pipeline::{
    AlertProcessor, ErrorKind, PipelineError, ProcessingStatus, ProcessorError,
};

use common::{reading, GatedQueryStore, Harness, RecordingSink, RecordingStore, SinkCall};

// ---------------------------------------------------------------------------
// Test: a reading inside every range produces nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn normal_reading_has_no_side_effects() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();

    let result = orchestrator
        .process_reading(&[reading(&[("ph", 7.4), ("temperature", 26.0), ("turbidity", 10.0)])])
        .await
        .unwrap();

    assert_eq!(result.status, ProcessingStatus::NoAlerts);
    assert!(result.processed_alerts.is_empty());
    assert!(result.errors.is_empty());
    assert_eq!(h.store.save_calls(), 0);
    assert!(h.sink.calls().is_empty());
}

#[tokio::test]
async fn empty_batch_is_no_alerts() {
    let h = Harness::new();
    let result = h.orchestrator().process_reading(&[]).await.unwrap();
    assert_eq!(result.status, ProcessingStatus::NoAlerts);
}

// ---------------------------------------------------------------------------
// Test: threshold crossings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ph_above_critical_bound_is_critical_and_notified() {
    let h = Harness::new();
    let result = h
        .orchestrator()
        .process_reading(&[reading(&[("ph", 9.5)])])
        .await
        .unwrap();

    assert_eq!(result.status, ProcessingStatus::Processed);
    assert_eq!(result.new_alerts.len(), 1);

    let alert = &result.new_alerts[0];
    assert_eq!(alert.parameter, "ph");
    assert_eq!(alert.alert_level, AlertLevel::Critical);
    assert_eq!(alert.severity, Severity::High);
    assert_eq!(alert.category, Category::Chemical);
    assert_eq!(alert.urgency, Urgency::Immediate);
    assert_eq!(alert.title, "High pH detected");
    assert!(!alert.remediation.is_empty());

    assert_eq!(result.notifications.len(), 1);
    assert_eq!(
        h.sink.calls(),
        vec![SinkCall::WaterQuality {
            parameter: "ph".into(),
            value: 9.5,
            level: AlertLevel::Critical,
        }]
    );
    assert_eq!(h.store.saved().len(), 1);
}

#[tokio::test]
async fn turbidity_warning_is_persisted_but_not_notified() {
    let h = Harness::new();
    let result = h
        .orchestrator()
        .process_reading(&[reading(&[("turbidity", 75.0)])])
        .await
        .unwrap();

    assert_eq!(result.new_alerts.len(), 1);
    assert_eq!(result.new_alerts[0].alert_level, AlertLevel::Warning);
    assert_eq!(result.new_alerts[0].severity, Severity::Medium);
    assert!(result.notifications.is_empty());
    assert!(h.sink.calls().is_empty());
}

#[tokio::test]
async fn only_latest_reading_is_evaluated() {
    let h = Harness::new();
    let older = reading(&[("ph", 10.0)]);
    let latest = reading(&[("ph", 7.0)]);

    let result = h
        .orchestrator()
        .process_reading(&[older, latest])
        .await
        .unwrap();
    assert_eq!(result.status, ProcessingStatus::NoAlerts);
}

#[tokio::test]
async fn device_alert_goes_to_device_channel() {
    let h = Harness::new();
    let orchestrator = Arc::new(
        h.builder()
            .with_config(aquawatch_pipeline::OrchestratorConfig {
                device_name: "pond-3-node".into(),
                ..Default::default()
            })
            .build(),
    );

    let result = orchestrator
        .process_reading(&[reading(&[("device_temperature", 75.0)])])
        .await
        .unwrap();

    assert_eq!(result.processed_alerts[0].category, Category::Device);
    assert_eq!(
        h.sink.calls(),
        vec![SinkCall::Device {
            device_name: "pond-3-node".into(),
            kind: "device_temperature".into(),
        }]
    );
}

// ---------------------------------------------------------------------------
// Test: rain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rain_zero_generates_nothing() {
    let h = Harness::new();
    let result = h
        .orchestrator()
        .process_reading(&[reading(&[("rain", 0.0)])])
        .await
        .unwrap();
    assert_eq!(result.status, ProcessingStatus::NoAlerts);
}

#[tokio::test]
async fn moderate_rain_is_one_low_severity_weather_alert() {
    let h = Harness::new();
    let result = h
        .orchestrator()
        .process_reading(&[reading(&[("rain", 2.0)])])
        .await
        .unwrap();

    assert_eq!(result.processed_alerts.len(), 1);
    let alert = &result.processed_alerts[0];
    assert_eq!(alert.category, Category::Weather);
    assert_eq!(alert.severity, Severity::Low);
    assert!(h.sink.calls().is_empty());
}

#[tokio::test]
async fn storm_is_sent_to_weather_channel() {
    let h = Harness::new();
    h.orchestrator()
        .process_reading(&[reading(&[("rain", 4.0)])])
        .await
        .unwrap();

    assert_eq!(
        h.sink.calls(),
        vec![SinkCall::Weather {
            status: "Storm".into(),
            code: 4,
        }]
    );
}

// ---------------------------------------------------------------------------
// Test: deduplication window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_reading_inside_window_is_persisted_once() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();
    let batch = [reading(&[("ph", 9.5)])];

    let first = orchestrator.process_reading(&batch).await.unwrap();
    h.clock.advance(Duration::minutes(2));
    let second = orchestrator.process_reading(&batch).await.unwrap();

    assert_eq!(first.new_alerts.len(), 1);
    assert!(second.new_alerts.is_empty());
    assert_eq!(second.errors_of(ErrorKind::DuplicateSuppression).count(), 1);
    assert_eq!(h.store.saved().len(), 1);
    assert_eq!(h.sink.calls().len(), 1);
}

#[tokio::test]
async fn identical_reading_after_window_is_a_new_alert() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();
    let batch = [reading(&[("ph", 9.5)])];

    orchestrator.process_reading(&batch).await.unwrap();
    h.clock.advance(Duration::minutes(5) + Duration::seconds(1));
    let again = orchestrator.process_reading(&batch).await.unwrap();

    assert_eq!(again.new_alerts.len(), 1);
    assert_eq!(h.store.saved().len(), 2);
}

#[tokio::test]
async fn values_rounding_to_same_signature_are_duplicates() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();

    orchestrator.process_reading(&[reading(&[("ph", 9.51)])]).await.unwrap();
    let second = orchestrator
        .process_reading(&[reading(&[("ph", 9.54)])])
        .await
        .unwrap();

    assert!(second.processed_alerts.is_empty());
}

#[tokio::test]
async fn reset_dedup_allows_repeat() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();
    let batch = [reading(&[("ph", 9.5)])];

    orchestrator.process_reading(&batch).await.unwrap();
    orchestrator.deduplicator().reset();
    let again = orchestrator.process_reading(&batch).await.unwrap();
    assert_eq!(again.new_alerts.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cycles_with_same_reading_yield_one_alert() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();
    let batch = vec![reading(&[("ph", 9.5)])];

    let handles: Vec<_> = (0..8)
        .map(|_| Arc::clone(&orchestrator).spawn_process(batch.clone()))
        .collect();
    let results = futures::future::join_all(handles).await;

    let persisted: usize = results
        .into_iter()
        .map(|r| r.unwrap().unwrap().new_alerts.len())
        .sum();
    assert_eq!(persisted, 1);
    assert_eq!(h.store.saved().len(), 1);
    assert_eq!(h.sink.calls().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: partial failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_draft_does_not_block_valid_ones() {
    let h = Harness::new();
    let now = common::start_time();

    let drafts = vec![
        AlertDraft {
            parameter: Some("ph".into()),
            value: Some(json!("not a number")),
            level: Some("critical".into()),
            timestamp: Some(now),
            ..Default::default()
        },
        AlertDraft::new(Parameter::Turbidity, 120.0, aquawatch_core::Level::Critical, now),
    ];

    let result = h.orchestrator().process_drafts(drafts).await;

    assert_eq!(result.processed_alerts.len(), 1);
    assert_eq!(result.processed_alerts[0].parameter, "turbidity");
    let validation: Vec<_> = result.errors_of(ErrorKind::Validation).collect();
    assert_eq!(validation.len(), 1);
    assert_eq!(validation[0].parameter.as_deref(), Some("ph"));
}

#[tokio::test]
async fn persistence_failure_still_notifies() {
    let h = Harness::with(RecordingStore::failing(), RecordingSink::default());
    let result = h
        .orchestrator()
        .process_reading(&[reading(&[("ph", 9.5)])])
        .await
        .unwrap();

    assert!(result.new_alerts.is_empty());
    assert_eq!(result.processed_alerts.len(), 1);
    assert_eq!(result.errors_of(ErrorKind::Persistence).count(), 1);
    assert_eq!(result.notifications.len(), 1);
    assert_eq!(h.sink.calls().len(), 1);
}

#[tokio::test]
async fn notification_failure_is_recorded_per_alert() {
    let h = Harness::with(RecordingStore::default(), RecordingSink::failing());
    let result = h
        .orchestrator()
        .process_reading(&[reading(&[("ph", 9.5), ("dissolved_oxygen", 2.0)])])
        .await
        .unwrap();

    assert_eq!(result.new_alerts.len(), 2);
    assert!(result.notifications.is_empty());
    assert_eq!(result.errors_of(ErrorKind::Notification).count(), 2);
}

struct FailingStage;

impl AlertProcessor for FailingStage {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn process(&self, _drafts: &[ValidDraft]) -> Result<Vec<ValidDraft>, ProcessorError> {
        Err(ProcessorError::new("failing", "model unavailable"))
    }
}

struct DropAll;

impl AlertProcessor for DropAll {
    fn name(&self) -> &'static str {
        "drop_all"
    }

    fn process(&self, _drafts: &[ValidDraft]) -> Result<Vec<ValidDraft>, ProcessorError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn failing_stage_passes_input_through() {
    let h = Harness::new();
    let orchestrator = h.builder().with_stage(FailingStage).build();

    let result = orchestrator
        .process_reading(&[reading(&[("ph", 9.5)])])
        .await
        .unwrap();

    assert_eq!(result.processed_alerts.len(), 1);
    assert_eq!(result.errors_of(ErrorKind::ProcessorStage).count(), 1);
}

#[tokio::test]
async fn stage_output_replaces_drafts() {
    let h = Harness::new();
    let orchestrator = h.builder().with_stage(DropAll).build();

    let result = orchestrator
        .process_reading(&[reading(&[("ph", 9.5)])])
        .await
        .unwrap();

    assert_eq!(result.status, ProcessingStatus::Processed);
    assert!(result.processed_alerts.is_empty());
    assert_eq!(h.store.save_calls(), 0);
}

// ---------------------------------------------------------------------------
// Test: ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn high_severity_sorts_before_medium() {
    let h = Harness::new();
    let result = h
        .orchestrator()
        .process_reading(&[reading(&[("turbidity", 75.0), ("ph", 9.5)])])
        .await
        .unwrap();

    let severities: Vec<_> = result.processed_alerts.iter().map(|a| a.severity).collect();
    assert_eq!(severities, vec![Severity::High, Severity::Medium]);
    assert!(result.processed_alerts[0].priority > result.processed_alerts[1].priority);
}

// ---------------------------------------------------------------------------
// Test: JSON input
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_json_rejects_malformed_shape() {
    let h = Harness::new();
    let err = h
        .orchestrator()
        .process_json(&json!([{"ph": 9.5}]))
        .await
        .unwrap_err();
    assert_matches!(err, PipelineError::MalformedInput(_));
    assert_eq!(h.store.save_calls(), 0);
}

#[tokio::test]
async fn process_json_accepts_batch() {
    let h = Harness::new();
    let result = h
        .orchestrator()
        .process_json(&json!([
            {"timestamp": "2026-05-01T09:59:00Z", "pH": 9.5, "turbidity": null}
        ]))
        .await
        .unwrap();
    assert_eq!(result.new_alerts.len(), 1);

    let empty = h.orchestrator().process_json(&json!(null)).await.unwrap();
    assert_eq!(empty.status, ProcessingStatus::NoAlerts);
}

// ---------------------------------------------------------------------------
// Test: thresholds and display cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn updated_threshold_applies_to_next_cycle() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();

    orchestrator
        .update_threshold(
            "temperature",
            Threshold::from_bounds(Parameter::Temperature, Some(20.0), Some(26.0)),
        )
        .unwrap();

    let result = orchestrator
        .process_reading(&[reading(&[("temperature", 27.0)])])
        .await
        .unwrap();
    assert_eq!(result.processed_alerts.len(), 1);
    assert_eq!(result.processed_alerts[0].alert_level, AlertLevel::Warning);
}

#[tokio::test]
async fn display_queries_are_cached_until_new_alerts() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();
    let filter = AlertFilter::default().with_severity(Severity::High);

    orchestrator.process_reading(&[reading(&[("ph", 9.5)])]).await.unwrap();

    let first = orchestrator.alerts_for_display(filter.clone()).await.unwrap();
    let second = orchestrator.alerts_for_display(filter.clone()).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert_eq!(h.store.query_calls(), 1);

    orchestrator
        .process_reading(&[reading(&[("dissolved_oxygen", 2.0)])])
        .await
        .unwrap();
    let third = orchestrator.alerts_for_display(filter.clone()).await.unwrap();
    assert_eq!(third.len(), 2);
    assert_eq!(h.store.query_calls(), 2);

    h.clock.advance(Duration::seconds(31));
    orchestrator.alerts_for_display(filter).await.unwrap();
    assert_eq!(h.store.query_calls(), 3);
}

#[tokio::test]
async fn threshold_update_invalidates_display_cache() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();

    orchestrator.alerts_for_display(AlertFilter::default()).await.unwrap();
    assert_eq!(orchestrator.cache().len(), 1);

    orchestrator
        .update_threshold("ph", Threshold::from_bounds(Parameter::Ph, Some(6.0), Some(9.0)))
        .unwrap();
    assert!(orchestrator.cache().is_empty());
}

#[tokio::test]
async fn display_read_overlapping_a_cycle_is_not_cached() {
    let h = Harness::new();
    let store = Arc::new(GatedQueryStore::default());
    let orchestrator = Arc::new(h.builder_with_store(store.clone()).build());

    let reader = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.alerts_for_display(AlertFilter::default()).await }
    });
    store.entered.notified().await;

    let result = orchestrator.process_reading(&[reading(&[("ph", 9.5)])]).await.unwrap();
    assert_eq!(result.new_alerts.len(), 1);

    store.release.notify_one();
    let early = reader.await.unwrap().unwrap();
    assert!(early.is_empty());
    assert_eq!(orchestrator.cache().get(&AlertFilter::default()), None);

    let fresh = orchestrator.alerts_for_display(AlertFilter::default()).await.unwrap();
    assert_eq!(fresh.len(), 1);
}

#[tokio::test]
async fn fully_suppressed_cycle_still_invalidates_display_cache() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();

    orchestrator.process_reading(&[reading(&[("ph", 9.5)])]).await.unwrap();
    orchestrator.alerts_for_display(AlertFilter::default()).await.unwrap();
    assert_eq!(orchestrator.cache().len(), 1);

    let repeat = orchestrator.process_reading(&[reading(&[("ph", 9.5)])]).await.unwrap();
    assert!(repeat.processed_alerts.is_empty());
    assert!(orchestrator.cache().is_empty());
}

#[tokio::test]
async fn normal_reading_leaves_display_cache_alone() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();

    orchestrator.alerts_for_display(AlertFilter::default()).await.unwrap();
    orchestrator.process_reading(&[reading(&[("ph", 7.2)])]).await.unwrap();
    assert_eq!(orchestrator.cache().len(), 1);
}
