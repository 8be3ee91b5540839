//! AquaWatch monitor service: reading sources, trigger loops and wiring.

pub mod config;
pub mod cycle;
pub mod logging;
pub mod poller;
pub mod sources;
pub mod subscriber;

pub use config::{ConfigError, LogFormat, MonitorConfig};
pub use sources::{HttpReadingSource, ReadingSource, SourceError, WsReadingSubscriber};
