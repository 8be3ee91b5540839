//! Alert processing pipeline.
//!
//! [`AlertOrchestrator`] ties the pure logic in `aquawatch-core` to the
//! persistence and notification collaborators, and owns the mutable state
//! of a running pipeline: the dedup window and the display cache.

pub mod cache;
pub mod error;
pub mod memory_store;
pub mod orchestrator;
pub mod stage;

pub use cache::ResultCache;
pub use error::{ErrorKind, PipelineError, ProcessingError};
pub use memory_store::InMemoryAlertStore;
pub use orchestrator::{
    AlertOrchestrator, OrchestratorBuilder, OrchestratorConfig, ProcessingResult, ProcessingStatus,
};
pub use stage::{AlertProcessor, MuteWarnings, ProcessorError};
