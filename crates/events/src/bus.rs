//! In-process reading bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`ReadingBus`] is the push-style subscription path: sources publish
//! reading batches as they arrive, and every subscriber (the alert
//! subscription loop, dashboards, ...) receives its own copy. It is designed
//! to be shared via `Arc<ReadingBus>`.

use aquawatch_core::SensorReading;
use tokio::sync::broadcast;

/// A batch of readings, oldest first.
pub type ReadingBatch = Vec<SensorReading>;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out bus for reading batches.
pub struct ReadingBus {
    sender: broadcast::Sender<ReadingBatch>,
}

impl ReadingBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed batches are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a batch to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it. Batches published
    /// with no subscribers are dropped.
    pub fn publish(&self, batch: ReadingBatch) -> usize {
        // SendError only means there are zero receivers.
        self.sender.send(batch).unwrap_or(0)
    }

    /// Subscribe to all batches published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ReadingBatch> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReadingBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
