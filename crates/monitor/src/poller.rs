//! Fixed-interval poll loop.

use std::sync::Arc;
use std::time::Duration;

use aquawatch_pipeline::{AlertOrchestrator, ProcessingResult};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cycle::run_cycle;
use crate::sources::ReadingSource;

/// Poll `source` every `interval` until `cancel` fires. The first poll
/// happens immediately.
pub async fn run_poll_loop(
    source: Arc<dyn ReadingSource>,
    orchestrator: Arc<AlertOrchestrator>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Poll loop started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Poll loop stopping");
                break;
            }
            _ = ticker.tick() => {
                poll_once(source.as_ref(), &orchestrator).await;
            }
        }
    }
}

/// Fetch one batch and process it. Fetch failures are logged and skipped.
pub async fn poll_once(
    source: &dyn ReadingSource,
    orchestrator: &Arc<AlertOrchestrator>,
) -> Option<ProcessingResult> {
    let batch = match source.fetch().await {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch readings");
            return None;
        }
    };
    if batch.is_empty() {
        tracing::debug!("Poll returned no readings");
    }
    run_cycle(orchestrator, batch, "poll").await
}
