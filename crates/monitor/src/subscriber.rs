//! Push-style subscription loop: reading bus to orchestrator.

use std::sync::Arc;

use aquawatch_events::ReadingBatch;
use aquawatch_pipeline::AlertOrchestrator;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio_util::sync::CancellationToken;

use crate::cycle::run_cycle;

/// Process every batch published on the bus until `cancel` fires or the bus
/// closes.
pub async fn run_subscription_loop(
    mut rx: Receiver<ReadingBatch>,
    orchestrator: Arc<AlertOrchestrator>,
    cancel: CancellationToken,
) {
    tracing::info!("Subscription loop started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Subscription loop stopping");
                break;
            }
            msg = rx.recv() => match msg {
                Ok(batch) => {
                    run_cycle(&orchestrator, batch, "push").await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Subscription loop lagged, batches dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Reading bus closed");
                    break;
                }
            },
        }
    }
}
