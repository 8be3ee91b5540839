//! External delivery sinks for alert notifications.
//!
//! These implement [`aquawatch_core::NotificationSink`] and are handed to
//! the notification router.

pub mod log;
pub mod webhook;
