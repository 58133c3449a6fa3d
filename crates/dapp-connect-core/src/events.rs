use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{EventName, ProviderEvent};

pub type Listener = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Event name to listener set. Listener identity is the `Arc` pointer.
#[derive(Default, Clone)]
pub struct EventRegistry {
    listeners: BTreeMap<EventName, Vec<Listener>>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, set)| (name.as_str(), set.len()))
            .collect();
        f.debug_struct("EventRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

impl EventRegistry {
    /// Returns false when the listener was already registered for `event`.
    pub fn subscribe(&mut self, event: EventName, listener: Listener) -> bool {
        let set = self.listeners.entry(event).or_default();
        if set.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        set.push(listener);
        true
    }

    /// Returns false when nothing was removed.
    pub fn unsubscribe(&mut self, event: EventName, listener: &Listener) -> bool {
        let Some(set) = self.listeners.get_mut(&event) else {
            return false;
        };
        let before = set.len();
        set.retain(|l| !Arc::ptr_eq(l, listener));
        before != set.len()
    }

    pub fn listener_count(&self, event: EventName) -> usize {
        self.listeners.get(&event).map_or(0, Vec::len)
    }

    /// Snapshot of the listeners for an event. Callers invoke them after
    /// releasing whatever lock guards the registry.
    pub fn listeners_for(&self, event: EventName) -> Vec<Listener> {
        self.listeners.get(&event).cloned().unwrap_or_default()
    }

    pub fn emit(&self, event: &ProviderEvent) -> usize {
        let listeners = self.listeners_for(event.name());
        tracing::debug!(event = %event.name(), listeners = listeners.len(), "emitting provider event");
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
