//! `aquawatch-monitor`: water-quality alerting service.
//!
//! Polls and/or subscribes to sensor readings, runs them through the alert
//! pipeline, persists alerts and sends notifications. See
//! [`MonitorConfig::from_env`] for the environment variables.

use std::sync::Arc;

use anyhow::Context;
use aquawatch_core::{AlertStore, NotificationSink, ThresholdStore};
use aquawatch_events::{LogNotifier, ReadingBus, WebhookNotifier};
use aquawatch_monitor::logging::init_tracing;
use aquawatch_monitor::poller::run_poll_loop;
use aquawatch_monitor::subscriber::run_subscription_loop;
use aquawatch_monitor::{HttpReadingSource, MonitorConfig, ReadingSource, WsReadingSubscriber};
use aquawatch_pipeline::{AlertOrchestrator, InMemoryAlertStore, MuteWarnings};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = MonitorConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);
    tracing::info!(
        poll = config.readings_url.is_some(),
        push = config.readings_ws_url.is_some(),
        dedup_window_ms = config.dedup_window_ms,
        "Loaded monitor configuration"
    );

    // --- Thresholds ---
    let thresholds = Arc::new(ThresholdStore::from_config(&config.load_thresholds()?));
    tracing::info!(count = thresholds.snapshot().len(), "Thresholds loaded");

    // --- Persistence ---
    let store: Arc<dyn AlertStore> = match &config.database_url {
        Some(url) => {
            let pool = aquawatch_db::create_pool(url)
                .await
                .context("Failed to connect to database")?;
            aquawatch_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            aquawatch_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database ready");
            Arc::new(aquawatch_db::PgAlertStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, alerts are kept in memory only");
            Arc::new(InMemoryAlertStore::new())
        }
    };

    // --- Notifications ---
    let sink: Arc<dyn NotificationSink> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.as_str()).context("Failed to build webhook client")?),
        None => {
            tracing::warn!("NOTIFY_WEBHOOK_URL not set, notifications are logged only");
            Arc::new(LogNotifier)
        }
    };

    // --- Orchestrator ---
    let mut builder = AlertOrchestrator::builder(thresholds, store, sink)
        .with_config(config.orchestrator_config());
    let mute = MuteWarnings::new(&config.muted_parameters);
    if !mute.is_empty() {
        builder = builder.with_stage(mute);
    }
    let orchestrator = Arc::new(builder.build());

    // --- Triggers ---
    let cancel = CancellationToken::new();
    let tracker = TaskTracker::new();

    if let Some(url) = &config.readings_url {
        let source: Arc<dyn ReadingSource> = Arc::new(HttpReadingSource::new(url.as_str())?);
        tracker.spawn(run_poll_loop(
            source,
            Arc::clone(&orchestrator),
            config.poll_interval,
            cancel.clone(),
        ));
    }

    if let Some(url) = &config.readings_ws_url {
        let bus = Arc::new(ReadingBus::default());
        tracker.spawn(run_subscription_loop(
            bus.subscribe(),
            Arc::clone(&orchestrator),
            cancel.clone(),
        ));

        let subscriber = WsReadingSubscriber::new(url.as_str());
        let ws_cancel = cancel.clone();
        tracker.spawn(async move { subscriber.run(bus, ws_cancel).await });
    }

    tracker.close();
    tracing::info!("Monitor running, press Ctrl-C to stop");

    // --- Shutdown ---
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received, stopping loops");

    cancel.cancel();
    tracker.wait().await;
    tracing::info!("Monitor stopped");

    Ok(())
}
