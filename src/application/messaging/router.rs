//! Event router - Subscribes plugin event handlers onto the shared bus

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error};

use super::event_bus::{EventBus, Listener, ListenerFuture, ListenerId};
use crate::application::context::BotContext;
use crate::domain::entities::{BotEvent, EventHandler};

/// The bus every platform event is emitted on
pub type SharedBus = Arc<EventBus<BotContext>>;

/// One listener attached on behalf of a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSubscription {
    pub plugin: String,
    pub event: String,
    pub once: bool,
    pub listener: ListenerId,
}

/// Tracks which bus listeners belong to which plugin
pub struct EventRouter {
    bus: SharedBus,
    subscriptions: Mutex<HashMap<String, Vec<EventSubscription>>>,
}

impl EventRouter {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }

    /// Subscribe `handler` to `event` for `plugin`.
    ///
    /// Handler errors are logged with the owning plugin and never reach the
    /// other listeners of the same event.
    pub fn attach(
        &self,
        plugin: &str,
        event: &str,
        handler: Arc<dyn EventHandler>,
        once: bool,
    ) -> ListenerId {
        let owner = plugin.to_string();
        let listener: Listener<BotContext> =
            Arc::new(move |event: Arc<BotEvent>, ctx: Arc<BotContext>| -> ListenerFuture {
                let handler = handler.clone();
                let owner = owner.clone();
                Box::pin(async move {
                    if let Err(e) = handler.execute(&event, &ctx).await {
                        error!(plugin = %owner, event = event.name(), "Event handler failed: {}", e);
                    }
                })
            });

        let id = if once {
            self.bus.once(event, listener)
        } else {
            self.bus.on(event, listener)
        };

        debug!(plugin = %plugin, event = %event, once, "Attached event listener");
        self.lock().entry(plugin.to_string()).or_default().push(EventSubscription {
            plugin: plugin.to_string(),
            event: event.to_string(),
            once,
            listener: id,
        });
        id
    }

    /// Remove every listener attached for `plugin`.
    ///
    /// Returns how many were still on the bus; one-shot listeners that already
    /// fired are gone and not counted.
    pub fn detach_all(&self, plugin: &str) -> usize {
        let subscriptions = self.lock().remove(plugin).unwrap_or_default();
        subscriptions
            .iter()
            .filter(|s| self.bus.remove_listener(s.listener))
            .count()
    }

    /// Event names `plugin` subscribed to, in attachment order
    pub fn events_of(&self, plugin: &str) -> Vec<String> {
        self.lock()
            .get(plugin)
            .map(|subs| subs.iter().map(|s| s.event.clone()).collect())
            .unwrap_or_default()
    }

    pub fn subscriptions_of(&self, plugin: &str) -> Vec<EventSubscription> {
        self.lock().get(plugin).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<EventSubscription>>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
