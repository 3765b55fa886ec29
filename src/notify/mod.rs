//! Notification module
//!
//! Lifecycle events produced by the engine and the hub that fans them out to
//! subscribers.

pub mod event;
pub mod hub;

// Re-export main types
pub use event::{EventKind, NotificationEvent};
pub use hub::{NotificationHub, Subscription, SUBSCRIBER_QUEUE};
