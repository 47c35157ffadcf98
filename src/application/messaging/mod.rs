//! Event handling - Shared event source and per-plugin subscriptions

pub mod event_bus;
pub mod router;

pub use event_bus::{EventBus, Listener, ListenerFuture, ListenerId};
pub use router::{EventRouter, EventSubscription, SharedBus};
