//! One processing cycle, shared by the poll and push triggers.

use std::sync::Arc;

use aquawatch_core::SensorReading;
use aquawatch_pipeline::{AlertOrchestrator, ProcessingResult, ProcessingStatus};

/// Run a cycle detached from the caller and log its outcome.
///
/// Returns `None` when the cycle aborted.
pub async fn run_cycle(
    orchestrator: &Arc<AlertOrchestrator>,
    batch: Vec<SensorReading>,
    trigger: &'static str,
) -> Option<ProcessingResult> {
    match orchestrator.run_detached(batch).await {
        Ok(result) => {
            if result.status == ProcessingStatus::Processed {
                tracing::info!(
                    trigger,
                    new_alerts = result.new_alerts.len(),
                    notifications = result.notifications.len(),
                    errors = result.errors.len(),
                    "Alert cycle complete"
                );
            }
            for error in &result.errors {
                tracing::debug!(trigger, kind = %error.kind, message = %error.message, "Cycle error");
            }
            Some(result)
        }
        Err(e) => {
            tracing::error!(trigger, error = %e, "Alert cycle aborted");
            None
        }
    }
}
