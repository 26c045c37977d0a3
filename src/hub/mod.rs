//! Live event fan-out
//!
//! `Hub` owns the set of live subscribers and delivers every published
//! `Event` to each of them through a bounded queue. Transports (the WebSocket
//! endpoint) hold a `Subscription`; producers call `broadcast`.

mod hub;
mod message;
mod metrics;
mod subscriber;

pub use hub::Hub;
pub use message::{
    ChangeAction, DataChange, Event, EventKind, EventPayload, Notification, NotificationLevel,
    WidgetFailure,
};
pub use metrics::{HubMetrics, HubMetricsSnapshot};
pub use subscriber::{SubscriberId, SubscriberState, Subscription};
