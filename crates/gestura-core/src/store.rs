#![forbid(unsafe_code)]

//! Scoped registries of listeners and timers.
//!
//! Each gesture kind owns one [`EventStore`] and one [`TimeoutStore`]; the
//! controller owns one more [`EventStore`] for the listeners it attaches to
//! the target. A store only ever releases what it registered itself, and
//! [`EventStore::clean`] / [`TimeoutStore::clean`] release everything at once.

use crate::event::{EventType, PointerInput};
use crate::host::{Host, ListenerId, ListenerOptions, ListenerTarget};

/// A listener registered with the host, tagged with what it should trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Listener<A> {
    pub id: ListenerId,
    pub target: ListenerTarget,
    pub event_type: EventType,
    pub options: ListenerOptions,
    pub action: A,
}

/// Owned collection of host listeners.
#[derive(Debug, Clone)]
pub struct EventStore<A> {
    listeners: Vec<Listener<A>>,
}

impl<A> Default for EventStore<A> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<A: Copy + PartialEq> EventStore<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener with the host and remember it.
    pub fn add(
        &mut self,
        host: &mut impl Host,
        target: ListenerTarget,
        event_type: EventType,
        options: ListenerOptions,
        action: A,
    ) -> ListenerId {
        let id = host.add_listener(target, event_type, options);
        tracing::trace!(listener = id, event = %event_type, ?target, "listener added");
        self.listeners.push(Listener {
            id,
            target,
            event_type,
            options,
            action,
        });
        id
    }

    /// Remove one listener. Unknown ids are ignored.
    pub fn remove(&mut self, host: &mut impl Host, id: ListenerId) {
        if let Some(pos) = self.listeners.iter().position(|l| l.id == id) {
            self.listeners.remove(pos);
            host.remove_listener(id);
        }
    }

    /// Remove every listener whose action matches `action`.
    pub fn remove_action(&mut self, host: &mut impl Host, action: A) {
        self.listeners.retain(|l| {
            if l.action == action {
                host.remove_listener(l.id);
                false
            } else {
                true
            }
        });
    }

    /// Actions of listeners registered for `event_type`, in registration
    /// order.
    #[must_use]
    pub fn actions_for(&self, event_type: EventType) -> Vec<A> {
        self.listeners
            .iter()
            .filter(|l| l.event_type == event_type)
            .map(|l| l.action)
            .collect()
    }

    #[must_use]
    pub fn contains(&self, event_type: EventType) -> bool {
        self.listeners.iter().any(|l| l.event_type == event_type)
    }

    #[must_use]
    pub fn listeners(&self) -> &[Listener<A>] {
        &self.listeners
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Remove every listener. Safe to call repeatedly.
    pub fn clean(&mut self, host: &mut impl Host) {
        if self.listeners.is_empty() {
            return;
        }
        tracing::trace!(count = self.listeners.len(), "releasing listeners");
        for listener in self.listeners.drain(..) {
            host.remove_listener(listener.id);
        }
    }
}

/// Timer names. Scheduling under a name that is already pending replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    /// Activation delay of a pressed pointer.
    DragDelay,
    /// Scroll-prevention grace period before a touch drag starts.
    StartPointerDrag,
    /// Deferred final emission after a cancel.
    Cancel,
}

/// A pending timer.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub key: TimerKey,
    /// Fire time, in event timestamp units.
    pub deadline: f64,
    /// Event the timer was scheduled for, replayed when it fires.
    pub event: Option<PointerInput>,
}

/// Named, replaceable deadlines.
///
/// There is no background clock: the host advances time and collects due
/// timers with [`TimeoutStore::take_due`].
#[derive(Debug, Clone, Default)]
pub struct TimeoutStore {
    timers: Vec<Timer>,
}

impl TimeoutStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire at `now + delay`, replacing any pending timer
    /// with the same key.
    pub fn add(&mut self, key: TimerKey, now: f64, delay: f64, event: Option<PointerInput>) {
        self.remove(key);
        let deadline = now + delay.max(0.0);
        tracing::trace!(?key, deadline, "timer scheduled");
        self.timers.push(Timer {
            key,
            deadline,
            event,
        });
    }

    /// Cancel a pending timer. Returns whether one was pending.
    pub fn remove(&mut self, key: TimerKey) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.key != key);
        before != self.timers.len()
    }

    #[must_use]
    pub fn contains(&self, key: TimerKey) -> bool {
        self.timers.iter().any(|t| t.key == key)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<f64> {
        self.timers.iter().map(|t| t.deadline).reduce(f64::min)
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: f64) -> Vec<Timer> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            if self.timers[i].deadline <= now {
                due.push(self.timers.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline));
        due
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Drop every pending timer.
    pub fn clean(&mut self) {
        self.timers.clear();
    }
}
