#![forbid(unsafe_code)]

//! Gesture controller: per-kind slots, shared state and the bind/clean
//! lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//!  new ──► apply_config ──► bind / effect ──► dispatch / advance ... ──► clean / drop
//! ```
//!
//! [`Controller::bind`] either attaches composed listeners to the configured
//! target through the [`Host`], or, without a target, hands the composed
//! listeners back as [`Binding::Props`] for the host to attach itself. Either
//! way, native events come back in through [`Controller::dispatch`].
//!
//! Time only moves when the host says so: timers (activation delay, scroll
//! grace period, deferred cancel) fire from [`Controller::advance`], which
//! [`Controller::dispatch`] also calls with each event's timestamp.
//!
//! # Example
//!
//! ```ignore
//! let mut ctrl = Controller::new(host, SharedOptions { target: Some(1), ..Default::default() })
//!     .with_drag(DragOptions::default(), |s| {
//!         println!("offset {:?}", s.offset);
//!         None
//!     });
//! let detach = ctrl.effect();
//! ctrl.dispatch(&PointerInput::new(EventType::PointerDown, 1, [0.0, 0.0], 0.0).into());
//! ```

use std::collections::BTreeSet;

use crate::config::{
    DragConfig, DragOptions, SharedConfig, SharedOptions, resolve_drag, resolve_shared,
};
use crate::drag::{Drag, DragAction, DragRecognizer};
use crate::event::{EventType, InputEvent, PointerId, PointerInput};
use crate::host::{Host, ListenerOptions, ListenerTarget};
use crate::recognizer::Handler;
use crate::state::{GestureState, SharedState, Snapshot};
use crate::store::{EventStore, TimeoutStore};

/// Registered gesture kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKey {
    Drag,
}

impl GestureKey {
    pub const ALL: [Self; 1] = [Self::Drag];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drag => "drag",
        }
    }
}

/// What the host should do with the native event after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

/// Live pointer and touch identities on the target.
///
/// Updated only on down, up and cancel events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerIds {
    pointers: BTreeSet<PointerId>,
    touches: BTreeSet<PointerId>,
}

impl PointerIds {
    /// Fold `event` into the identity sets and return the size of the set it
    /// belongs to. Mouse events carry no identity and return `None`.
    pub fn set_event_ids(&mut self, event: &PointerInput) -> Option<usize> {
        let event_type = event.event_type;
        if event_type.is_touch() {
            self.touches = event.active_touches.iter().copied().collect();
            return Some(self.touches.len());
        }
        if !event_type.is_pointer() {
            return None;
        }
        match event_type {
            EventType::PointerUp | EventType::PointerCancel => {
                self.pointers.remove(&event.pointer_id);
            }
            EventType::PointerDown => {
                self.pointers.insert(event.pointer_id);
            }
            _ => {}
        }
        Some(self.pointers.len())
    }

    /// Live pointers, or live touches when no pointer is down.
    #[must_use]
    pub fn count(&self) -> usize {
        if self.pointers.is_empty() {
            self.touches.len()
        } else {
            self.pointers.len()
        }
    }

    #[must_use]
    pub fn pointers(&self) -> &BTreeSet<PointerId> {
        &self.pointers
    }

    #[must_use]
    pub fn touches(&self) -> &BTreeSet<PointerId> {
        &self.touches
    }
}

/// What a bound listener runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundAction {
    Drag(DragAction),
    /// Index into the controller's native handlers.
    Native(usize),
}

/// One composed listener: every action bound to the same event and phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub event_type: EventType,
    pub options: ListenerOptions,
    /// Handler prop name, e.g. `onPointerDown` or `onClickCapture`.
    pub prop: String,
    pub actions: Vec<BoundAction>,
}

/// Outcome of [`Controller::bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Listeners were attached to the target.
    Attached,
    /// The configured target is not mounted; nothing was bound.
    Unmounted,
    /// No target: the host attaches these itself and routes events to
    /// [`Controller::dispatch`].
    Props(Vec<EventBinding>),
}

/// Token returned by [`Controller::effect`]. Passing it to
/// [`Controller::detach`] removes the listeners that effect attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "dropping the token leaves the listeners attached until the next effect or clean"]
pub struct Detach {
    generation: u64,
}

type NativeHandler = Box<dyn FnMut(&InputEvent, &SharedState)>;

struct NativeEntry {
    event_type: EventType,
    handler: NativeHandler,
}

/// State, config, handler and stores of one gesture kind.
struct GestureSlot<M> {
    config: DragConfig,
    state: GestureState,
    memo: Option<M>,
    handler: Handler<M>,
    events: EventStore<DragAction>,
    timers: TimeoutStore,
    deferred: TimeoutStore,
}

/// Gesture controller for one target.
///
/// `M` is the memo type handlers return.
pub struct Controller<H: Host, M = ()> {
    host: H,
    shared_options: SharedOptions,
    shared_config: SharedConfig,
    drag_options: DragOptions,
    drag: Option<GestureSlot<M>>,
    native: Vec<NativeEntry>,
    shared: SharedState,
    ids: PointerIds,
    bound: Vec<EventBinding>,
    /// Host listeners on the target, tagged with their index in `bound`.
    target_store: EventStore<usize>,
    response: EventResponse,
    generation: u64,
}

impl<H: Host, M: 'static> Controller<H, M> {
    /// Create a controller with no gesture registered.
    pub fn new(host: H, shared: SharedOptions) -> Self {
        let shared_config = resolve_shared(&shared, &host.support());
        Self {
            host,
            shared_options: shared,
            shared_config,
            drag_options: DragOptions::default(),
            drag: None,
            native: Vec::new(),
            shared: SharedState::default(),
            ids: PointerIds::default(),
            bound: Vec::new(),
            target_store: EventStore::new(),
            response: EventResponse::default(),
            generation: 0,
        }
    }

    /// Register the drag gesture.
    #[must_use]
    pub fn with_drag(
        mut self,
        options: DragOptions,
        handler: impl FnMut(&Snapshot<'_, M>) -> Option<M> + 'static,
    ) -> Self {
        self.set_drag(options, handler);
        self
    }

    /// Register (or replace) the drag gesture. Gesture state carries over
    /// when a drag was already registered.
    pub fn set_drag(
        &mut self,
        options: DragOptions,
        handler: impl FnMut(&Snapshot<'_, M>) -> Option<M> + 'static,
    ) {
        let config = resolve_drag(&options, &self.shared_config, &self.host.support());
        self.drag_options = options;
        match &mut self.drag {
            Some(slot) => {
                slot.config = config;
                slot.handler = Box::new(handler);
            }
            None => {
                self.drag = Some(GestureSlot {
                    config,
                    state: GestureState::default(),
                    memo: None,
                    handler: Box::new(handler),
                    events: EventStore::new(),
                    timers: TimeoutStore::new(),
                    deferred: TimeoutStore::new(),
                });
            }
        }
    }

    /// Register a plain handler for a native event, composed with gesture
    /// listeners for the same event on the next bind.
    pub fn on_native(
        &mut self,
        event_type: EventType,
        handler: impl FnMut(&InputEvent, &SharedState) + 'static,
    ) {
        self.native.push(NativeEntry {
            event_type,
            handler: Box::new(handler),
        });
    }

    /// Re-resolve configuration. Takes effect for listeners on the next bind
    /// and for recognition immediately.
    pub fn apply_config(&mut self, shared: SharedOptions, drag: DragOptions) {
        let support = self.host.support();
        self.shared_config = resolve_shared(&shared, &support);
        self.shared_options = shared;
        if let Some(slot) = &mut self.drag {
            slot.config = resolve_drag(&drag, &self.shared_config, &support);
        }
        self.drag_options = drag;
        tracing::debug!(target = ?self.shared_config.target, "gesture config applied");
    }

    /// Compose listeners for every enabled gesture and native handler.
    ///
    /// With a target configured, listeners are attached through the host and
    /// released by [`Controller::clean`] or [`Controller::detach`]. Binding
    /// again replaces the previously attached listeners.
    pub fn bind(&mut self) -> Binding {
        let target = self.shared_config.target;
        if let Some(element) = target
            && !self.host.is_mounted(element)
        {
            tracing::debug!(element, "bind skipped, target not mounted");
            return Binding::Unmounted;
        }

        let mut groups: Vec<EventBinding> = Vec::new();
        if self.shared_config.enabled {
            if let Some(slot) = &self.drag
                && slot.config.common.enabled
            {
                let defaults = slot.config.common.event_options;
                for binding in Drag::bindings(&slot.config) {
                    let options = binding.options.unwrap_or(defaults);
                    compose(
                        &mut groups,
                        binding.event_type,
                        options,
                        BoundAction::Drag(binding.action),
                    );
                }
            }
            let options = self.shared_config.event_options;
            for (i, entry) in self.native.iter().enumerate() {
                compose(&mut groups, entry.event_type, options, BoundAction::Native(i));
            }
        }
        self.bound = groups;

        let Some(element) = target else {
            tracing::trace!(listeners = self.bound.len(), "bound as props");
            return Binding::Props(self.bound.clone());
        };
        self.target_store.clean(&mut self.host);
        for (i, group) in self.bound.iter().enumerate() {
            self.target_store.add(
                &mut self.host,
                ListenerTarget::Element(element),
                group.event_type,
                group.options,
                i,
            );
        }
        tracing::debug!(element, listeners = self.bound.len(), "listeners attached");
        Binding::Attached
    }

    /// Mount/update hook: drop the previous target listeners and bind again.
    ///
    /// Returns `None` when no target is configured (props mode binds through
    /// [`Controller::bind`] directly).
    pub fn effect(&mut self) -> Option<Detach> {
        self.shared_config.target?;
        self.generation += 1;
        self.bind();
        Some(Detach {
            generation: self.generation,
        })
    }

    /// Undo the [`Controller::effect`] that returned `token`. Stale tokens
    /// are ignored.
    pub fn detach(&mut self, token: Detach) {
        if token.generation != self.generation {
            return;
        }
        self.target_store.clean(&mut self.host);
        self.bound.clear();
    }

    /// Route a native event to everything listening for it.
    pub fn dispatch(&mut self, event: &InputEvent) -> EventResponse {
        self.advance(event.time_stamp());
        self.response = EventResponse::default();

        let event_type = event.event_type();
        let actions: Vec<BoundAction> = self
            .bound
            .iter()
            .filter(|b| b.event_type == event_type)
            .flat_map(|b| b.actions.iter().copied())
            .collect();
        for action in actions {
            match action {
                BoundAction::Drag(action) => self.run_drag(action, event),
                BoundAction::Native(i) => {
                    if let Some(entry) = self.native.get_mut(i) {
                        (entry.handler)(event, &self.shared);
                    }
                }
            }
        }

        let dynamic = self
            .drag
            .as_ref()
            .map(|slot| slot.events.actions_for(event_type))
            .unwrap_or_default();
        for action in dynamic {
            self.run_drag(action, event);
        }

        std::mem::take(&mut self.response)
    }

    /// Fire every timer due at `now`, earliest first. Timers scheduled while
    /// firing wait for the next call.
    pub fn advance(&mut self, now: f64) {
        let Some(slot) = &mut self.drag else {
            return;
        };
        let mut due = slot.timers.take_due(now);
        due.extend(slot.deferred.take_due(now));
        if due.is_empty() {
            return;
        }
        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline));
        for timer in due {
            if let Some(mut recognizer) = self.drag_recognizer() {
                recognizer.fire(timer);
            }
        }
    }

    /// Cancel the running drag. The final frame arrives on the next
    /// [`Controller::advance`].
    pub fn cancel(&mut self) {
        if let Some(mut recognizer) = self.drag_recognizer() {
            recognizer.cancel();
        }
    }

    fn run_drag(&mut self, action: DragAction, event: &InputEvent) {
        if let Some(mut recognizer) = self.drag_recognizer() {
            recognizer.handle(action, event);
        }
    }

    fn drag_recognizer(&mut self) -> Option<DragRecognizer<'_, H, M>> {
        let slot = self.drag.as_mut()?;
        Some(DragRecognizer {
            config: &slot.config,
            host: &mut self.host,
            shared: &mut self.shared,
            state: &mut slot.state,
            memo: &mut slot.memo,
            handler: &mut slot.handler,
            events: &mut slot.events,
            timers: &mut slot.timers,
            deferred: &mut slot.deferred,
            ids: &mut self.ids,
            response: &mut self.response,
            target: self.shared_config.target,
            window: self.shared_config.window,
        })
    }
}

impl<H: Host, M> Controller<H, M> {
    /// Release every listener and timer. Safe to call any number of times.
    pub fn clean(&mut self) {
        self.target_store.clean(&mut self.host);
        self.bound.clear();
        if let Some(slot) = &mut self.drag {
            slot.events.clean(&mut self.host);
            slot.timers.clean();
            slot.deferred.clean();
        }
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn shared_state(&self) -> &SharedState {
        &self.shared
    }

    /// Drag state, when a drag is registered.
    #[must_use]
    pub fn drag_state(&self) -> Option<&GestureState> {
        self.drag.as_ref().map(|slot| &slot.state)
    }

    #[must_use]
    pub fn drag_config(&self) -> Option<&DragConfig> {
        self.drag.as_ref().map(|slot| &slot.config)
    }

    #[must_use]
    pub fn drag_memo(&self) -> Option<&M> {
        self.drag.as_ref().and_then(|slot| slot.memo.as_ref())
    }

    #[must_use]
    pub fn drag_options(&self) -> &DragOptions {
        &self.drag_options
    }

    #[must_use]
    pub fn shared_options(&self) -> &SharedOptions {
        &self.shared_options
    }

    #[must_use]
    pub fn pointer_ids(&self) -> &PointerIds {
        &self.ids
    }

    /// Listeners composed by the last bind.
    #[must_use]
    pub fn bound(&self) -> &[EventBinding] {
        &self.bound
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<f64> {
        let slot = self.drag.as_ref()?;
        match (slot.timers.next_deadline(), slot.deferred.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

impl<H: Host, M> Drop for Controller<H, M> {
    fn drop(&mut self) {
        self.clean();
    }
}

/// Add `action` to the group for `(event_type, capture)`. A group is passive
/// only while every action in it is.
fn compose(
    groups: &mut Vec<EventBinding>,
    event_type: EventType,
    options: ListenerOptions,
    action: BoundAction,
) {
    if let Some(group) = groups
        .iter_mut()
        .find(|g| g.event_type == event_type && g.options.capture == options.capture)
    {
        group.options.passive &= options.passive;
        group.actions.push(action);
        return;
    }
    groups.push(EventBinding {
        event_type,
        options,
        prop: event_type.prop_name(options.capture),
        actions: vec![action],
    });
}
