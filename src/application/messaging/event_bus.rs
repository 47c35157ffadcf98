//! Shared event source
//!
//! Every inbound platform event is emitted here once; listeners attached by
//! plugins receive it in the order they were attached. One-shot listeners are
//! dropped from the bus before they run, and any listener, fired or not, can be
//! removed through the id returned when it was attached.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::domain::entities::BotEvent;

pub type ListenerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Callback attached to the bus; receives the event and the shared context
pub type Listener<C> = Arc<dyn Fn(Arc<BotEvent>, Arc<C>) -> ListenerFuture + Send + Sync>;

/// Identifies one attached listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

struct Registration<C> {
    id: ListenerId,
    event: String,
    once: bool,
    listener: Listener<C>,
}

pub struct EventBus<C> {
    listeners: Mutex<Vec<Registration<C>>>,
}

impl<C: Send + Sync + 'static> EventBus<C> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Attach a persistent listener
    pub fn on(&self, event: impl Into<String>, listener: Listener<C>) -> ListenerId {
        self.attach(event.into(), false, listener)
    }

    /// Attach a listener that runs for the next matching event only
    pub fn once(&self, event: impl Into<String>, listener: Listener<C>) -> ListenerId {
        self.attach(event.into(), true, listener)
    }

    fn attach(&self, event: String, once: bool, listener: Listener<C>) -> ListenerId {
        let id = ListenerId::new();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                id,
                event,
                once,
                listener,
            });
        id
    }

    /// Detach a listener; false if it already fired (one-shot) or was never attached
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.event == event)
            .count()
    }

    /// Deliver `event` to every matching listener, sequentially, in attachment order.
    ///
    /// Matching listeners are collected up front; one detached by an earlier
    /// handler of the same emit is skipped. A one-shot listener is taken off the
    /// bus right before it runs, so concurrent emits invoke it at most once.
    /// Returns the number of listeners invoked.
    pub async fn emit(&self, event: BotEvent, ctx: Arc<C>) -> usize {
        let due: Vec<(ListenerId, bool, Listener<C>)> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.event == event.name())
            .map(|r| (r.id, r.once, r.listener.clone()))
            .collect();

        let event = Arc::new(event);
        let mut invoked = 0;
        for (id, once, listener) in &due {
            let attached = if *once {
                self.remove_listener(*id)
            } else {
                self.is_attached(*id)
            };
            if !attached {
                continue;
            }
            listener(event.clone(), ctx.clone()).await;
            invoked += 1;
        }
        invoked
    }

    fn is_attached(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|r| r.id == id)
    }
}

impl<C: Send + Sync + 'static> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}
