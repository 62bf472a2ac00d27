#![forbid(unsafe_code)]

//! Drag recognition.
//!
//! Turns pointer, touch and arrow-key input into drag frames. On top of the
//! generic state machine this module handles:
//!
//! - pointer acquisition: button filtering, identity registration, and
//!   first-pointer-wins arbitration between concurrent pointers;
//! - pointer capture (or window listeners when capture is off) and pointer
//!   lock;
//! - the activation delay and touch scroll prevention, both driven by named
//!   timers;
//! - bounds (static, element-relative or computed) resolved on the first
//!   frame;
//! - release classification into tap or swipe;
//! - click suppression after a real drag, and keyboard displacement.

use crate::config::{
    BoundsOption, BoundsSides, CommonConfig, DEFAULT_PREVENT_SCROLL_DELAY, DragConfig,
    ResolvedBounds, ScrollAxis, sides_to_bounds,
};
use crate::coordinates;
use crate::event::{
    Action, ClickInput, ElementId, EventType, InputEvent, KeyInput, PointerInput, PointerType,
};
use crate::host::{Host, ListenerOptions, ListenerTarget};
use crate::recognizer::{GestureKind, Recognizer};
use crate::state::{Axis, GestureState, SharedState};
use crate::store::{Timer, TimerKey};
use crate::vector::{Bounds, UNBOUNDED, Vector2, add_to, sign, sub};

/// Keyboard displacement multiplier while shift is held.
pub const SHIFT_FACTOR: f64 = 10.0;
/// Keyboard displacement multiplier while alt is held.
pub const ALT_FACTOR: f64 = 0.1;

/// The drag gesture kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drag;

/// What a drag listener does when its event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragAction {
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
    KeyDown,
    KeyUp,
    /// Block native scrolling once the drag has started.
    PreventScroll,
    /// Touch ended: stop blocking scroll.
    EndScrollPrevention,
}

/// Recognizer specialized for drags.
pub type DragRecognizer<'a, H, M> = Recognizer<'a, Drag, H, M>;

/// A listener the controller binds for a drag. `options` overrides the
/// gesture's event options when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragBinding {
    pub event_type: EventType,
    pub options: Option<ListenerOptions>,
    pub action: DragAction,
}

impl Drag {
    /// Listeners a drag needs on its target.
    #[must_use]
    pub fn bindings(config: &DragConfig) -> Vec<DragBinding> {
        let mut out = Vec::new();
        let mut push = |event_type: Option<EventType>, options, action| {
            if let Some(event_type) = event_type {
                out.push(DragBinding {
                    event_type,
                    options,
                    action,
                });
            }
        };
        let device = config.device;
        push(
            EventType::for_device(device, Action::Start),
            None,
            DragAction::PointerDown,
        );
        if config.pointer_capture {
            push(
                EventType::for_device(device, Action::Change),
                None,
                DragAction::PointerMove,
            );
            push(
                EventType::for_device(device, Action::End),
                None,
                DragAction::PointerUp,
            );
            push(
                EventType::for_device(device, Action::Cancel),
                None,
                DragAction::PointerUp,
            );
            push(Some(EventType::LostPointerCapture), None, DragAction::PointerUp);
        }
        if config.keys {
            push(Some(EventType::KeyDown), None, DragAction::KeyDown);
            push(Some(EventType::KeyUp), None, DragAction::KeyUp);
        }
        if config.filter_taps {
            push(
                Some(EventType::Click),
                Some(ListenerOptions::new(true, false)),
                DragAction::Click,
            );
        }
        out
    }
}

impl GestureKind for Drag {
    type Config = DragConfig;
    type Action = DragAction;

    const NAME: &'static str = "drag";

    fn common(config: &DragConfig) -> &CommonConfig {
        &config.common
    }

    fn set_in_progress(shared: &mut SharedState, value: bool) {
        shared.dragging = value;
    }

    fn reset(state: &mut GestureState) {
        state.pointer_id = None;
        state.pointer_active = false;
        state.keyboard_active = false;
        state.prevent_scroll = false;
        state.delayed = false;
        state.swipe = [0, 0];
        state.tap = false;
        state.canceled = false;
    }

    fn setup<H: Host>(
        config: &DragConfig,
        state: &mut GestureState,
        host: &H,
        target: Option<ElementId>,
    ) {
        let current = target.or(state.target);
        state.bounds = match &config.common.bounds {
            ResolvedBounds::Static(bounds) => *bounds,
            ResolvedBounds::Element(element) => element_bounds(host, *element, current, state.offset),
            ResolvedBounds::Dynamic(f) => match f.call(state) {
                BoundsOption::Sides(sides) => sides_to_bounds(sides),
                BoundsOption::Element { element } => {
                    element_bounds(host, element, current, state.offset)
                }
                BoundsOption::Dynamic(_) => UNBOUNDED,
            },
        };
    }

    fn axis_intent(config: &DragConfig, state: &mut GestureState, pointer: Option<PointerType>) {
        coordinates::axis_intent(
            config.axis,
            config.lock_direction,
            pointer.map(|p| config.axis_threshold.get(p)),
            state,
        );
    }

    fn restrict_to_axis(config: &DragConfig, state: &GestureState, v: &mut Vector2) {
        coordinates::restrict_to_axis(config.axis, config.lock_direction, state.axis, v);
    }

    fn compute_offset(state: &mut GestureState) {
        coordinates::compute_offset(state);
    }

    fn compute_movement(state: &mut GestureState) {
        coordinates::compute_movement(state);
    }

    fn clean<H: Host>(
        config: &DragConfig,
        state: &mut GestureState,
        host: &mut H,
        target: Option<ElementId>,
    ) {
        if config.pointer_lock {
            let locked = host.pointer_lock_element();
            if locked.is_some() && locked == target.or(state.target) {
                host.exit_pointer_lock();
            }
        }
        state.pointer_active = false;
        state.keyboard_active = false;
    }
}

/// Bounds keeping the dragged element (`current`) inside `element`, relative
/// to the current offset. Unbounded when either box is unavailable.
fn element_bounds<H: Host>(
    host: &H,
    element: ElementId,
    current: Option<ElementId>,
    offset: Vector2,
) -> Bounds {
    let outer = host.element_rect(element);
    let inner = current.and_then(|c| host.element_rect(c));
    let (Some(outer), Some(inner)) = (outer, inner) else {
        tracing::debug!(element, "bounds element has no layout, drag is unbounded");
        return UNBOUNDED;
    };
    sides_to_bounds(BoundsSides {
        left: Some(outer.left - inner.left + offset[0]),
        right: Some(outer.right - inner.right + offset[0]),
        top: Some(outer.top - inner.top + offset[1]),
        bottom: Some(outer.bottom - inner.bottom + offset[1]),
    })
}

fn scroll_axis_matches(scroll: ScrollAxis, axis: Axis) -> bool {
    matches!(
        (scroll, axis),
        (ScrollAxis::Xy, _) | (ScrollAxis::X, Axis::X) | (ScrollAxis::Y, Axis::Y)
    )
}

impl<H: Host, M> DragRecognizer<'_, H, M> {
    /// Run the handler behind `action` for `event`.
    pub(crate) fn handle(&mut self, action: DragAction, event: &InputEvent) {
        match (action, event) {
            (DragAction::PointerDown, InputEvent::Pointer(p)) => self.pointer_down(p, event),
            (DragAction::PointerMove, InputEvent::Pointer(p)) => self.pointer_move(p, event),
            (DragAction::PointerUp, InputEvent::Pointer(p)) => self.pointer_up(p, event),
            (DragAction::PreventScroll, InputEvent::Pointer(p)) => self.prevent_scroll(p),
            (DragAction::EndScrollPrevention, InputEvent::Pointer(_)) => {
                self.end_scroll_prevention();
            }
            (DragAction::Click, InputEvent::Click(c)) => self.pointer_click(c),
            (DragAction::KeyDown, InputEvent::Key(k)) => self.key_down(k, event),
            (DragAction::KeyUp, InputEvent::Key(k)) => self.key_up(k, event),
            _ => tracing::trace!(?action, event = %event.event_type(), "action ignored for event"),
        }
    }

    /// Run a due timer.
    pub(crate) fn fire(&mut self, timer: Timer) {
        tracing::trace!(key = ?timer.key, deadline = timer.deadline, "timer fired");
        match timer.key {
            TimerKey::Cancel => self.finish_cancel(),
            TimerKey::DragDelay | TimerKey::StartPointerDrag => {
                let Some(mut pointer) = timer.event else {
                    return;
                };
                pointer.time_stamp = timer.deadline;
                if timer.key == TimerKey::DragDelay {
                    self.state.step = [Some(0.0), Some(0.0)];
                }
                self.start_pointer_drag(&InputEvent::Pointer(pointer));
            }
        }
    }

    fn set_active(&mut self) {
        self.state.engaged = self.state.pointer_active || self.state.keyboard_active;
    }

    fn pointer_down(&mut self, pointer: &PointerInput, event: &InputEvent) {
        let config = self.config;
        if let Some(buttons) = pointer.buttons
            && !config.pointer_buttons.accepts(buttons)
        {
            tracing::trace!(buttons = buttons.bits(), "pointer down filtered by buttons");
            return;
        }

        let ids = self.ids.set_event_ids(pointer);
        if config.pointer_capture
            && let Err(err) = self.host.set_pointer_capture(pointer.target, pointer.pointer_id)
        {
            tracing::debug!(error = %err, pointer = pointer.pointer_id, "pointer capture failed");
        }
        if ids.is_some_and(|n| n > 1) && self.state.pointer_active {
            tracing::trace!(pointer = pointer.pointer_id, "additional pointer ignored");
            return;
        }

        self.start(event);
        self.setup_pointer(pointer);
        self.state.pointer_id = Some(pointer.pointer_id);
        self.state.pointer_active = true;
        self.compute_values(pointer.position);
        self.compute_initial();

        if config.prevent_scroll_axis.is_some()
            && pointer.effective_pointer_type() != PointerType::Mouse
        {
            self.state.engaged = false;
            self.setup_scroll_prevention(pointer);
        } else if config.delay > 0.0 {
            self.setup_delay_trigger(pointer);
            if config.common.trigger_all_events {
                self.compute(Some(event));
                self.emit();
            }
        } else {
            self.start_pointer_drag(event);
        }
    }

    fn start_pointer_drag(&mut self, event: &InputEvent) {
        let state = &mut *self.state;
        state.engaged = true;
        state.prevent_scroll = true;
        state.delayed = false;
        self.compute(Some(event));
        self.emit();
    }

    /// Pointer lock, and window-level listeners when the target does not
    /// capture the pointer.
    fn setup_pointer(&mut self, pointer: &PointerInput) {
        let config = self.config;
        if config.pointer_lock {
            self.host.request_pointer_lock(pointer.target.or(self.target));
        }
        if config.pointer_capture || !self.window {
            return;
        }
        let options = config.common.event_options;
        for (phase, action) in [
            (Action::Change, DragAction::PointerMove),
            (Action::End, DragAction::PointerUp),
            (Action::Cancel, DragAction::PointerUp),
        ] {
            if let Some(event_type) = EventType::for_device(config.device, phase)
                && !self.events.contains(event_type)
            {
                self.events
                    .add(self.host, ListenerTarget::Window, event_type, options, action);
            }
        }
    }

    /// Hold off touch drags so the page can scroll, and start the drag once
    /// the grace period expires.
    fn setup_scroll_prevention(&mut self, pointer: &PointerInput) {
        self.state.prevent_scroll = false;
        if self.window {
            let options = self.config.common.event_options;
            self.events.add(
                self.host,
                ListenerTarget::Window,
                EventType::TouchMove,
                ListenerOptions::new(options.capture, false),
                DragAction::PreventScroll,
            );
            for event_type in [EventType::TouchEnd, EventType::TouchCancel] {
                self.events.add(
                    self.host,
                    ListenerTarget::Window,
                    event_type,
                    options,
                    DragAction::EndScrollPrevention,
                );
            }
        }
        let delay = self
            .config
            .prevent_scroll_delay
            .unwrap_or(DEFAULT_PREVENT_SCROLL_DELAY);
        self.timers.add(
            TimerKey::StartPointerDrag,
            pointer.time_stamp,
            delay,
            Some(pointer.clone()),
        );
        tracing::debug!(
            pointer = pointer.pointer_id,
            delay,
            "drag waiting for scroll intent"
        );
    }

    fn prevent_scroll(&mut self, pointer: &PointerInput) {
        if self.state.prevent_scroll && pointer.cancelable {
            self.response.prevent_default = true;
        }
    }

    fn end_scroll_prevention(&mut self) {
        self.events.remove_action(self.host, DragAction::PreventScroll);
        self.events
            .remove_action(self.host, DragAction::EndScrollPrevention);
    }

    fn setup_delay_trigger(&mut self, pointer: &PointerInput) {
        self.state.delayed = true;
        self.timers.add(
            TimerKey::DragDelay,
            pointer.time_stamp,
            self.config.delay,
            Some(pointer.clone()),
        );
    }

    fn pointer_move(&mut self, pointer: &PointerInput, event: &InputEvent) {
        if !self.state.pointer_active {
            return;
        }
        if self
            .state
            .pointer_id
            .is_some_and(|id| id != pointer.pointer_id)
        {
            return;
        }

        let locked = self.host.pointer_lock_element();
        if locked.is_some() && locked == pointer.target {
            self.state.raw_delta = pointer.movement;
        } else {
            self.state.raw_delta = sub(pointer.position, self.state.raw_values);
            self.compute_values(pointer.position);
        }
        let raw_delta = self.state.raw_delta;
        add_to(&mut self.state.raw_movement, raw_delta);
        self.compute(Some(event));

        if self.state.delayed && self.state.intentional {
            self.timers.remove(TimerKey::DragDelay);
            self.state.active = false;
            self.start_pointer_drag(event);
            return;
        }

        if let Some(scroll_axis) = self.config.prevent_scroll_axis
            && !self.state.prevent_scroll
        {
            match self.state.axis {
                Some(axis) if scroll_axis_matches(scroll_axis, axis) => {
                    tracing::debug!(?axis, "movement along scroll axis, drag abandoned");
                    self.state.engaged = false;
                    self.clean();
                }
                Some(_) => {
                    self.timers.remove(TimerKey::StartPointerDrag);
                    self.start_pointer_drag(event);
                }
                None => {}
            }
            return;
        }

        self.emit();
    }

    fn pointer_up(&mut self, pointer: &PointerInput, event: &InputEvent) {
        self.ids.set_event_ids(pointer);
        if self.config.pointer_capture
            && self
                .host
                .has_pointer_capture(pointer.target, pointer.pointer_id)
            && let Err(err) = self
                .host
                .release_pointer_capture(pointer.target, pointer.pointer_id)
        {
            tracing::debug!(error = %err, pointer = pointer.pointer_id, "pointer capture release failed");
        }

        if self.state.pointer_active
            && !self.state.engaged
            && self.state.pointer_id == Some(pointer.pointer_id)
            && self.timers.remove(TimerKey::StartPointerDrag)
        {
            tracing::debug!(pointer = pointer.pointer_id, "released during scroll grace period");
            self.state.pointer_active = false;
            self.clean();
            return;
        }

        if !self.state.engaged || !self.state.pointer_active {
            return;
        }
        if self
            .state
            .pointer_id
            .is_some_and(|id| id != pointer.pointer_id)
        {
            return;
        }

        self.state.pointer_active = false;
        self.set_active();
        self.compute(Some(event));

        let config = self.config;
        let state = &mut *self.state;
        let [dx, dy] = state.raw_distance;
        state.tap = dx <= config.taps_threshold && dy <= config.taps_threshold;
        if state.tap && config.filter_taps {
            state.force = true;
        } else if state.elapsed_time < config.swipe.duration {
            for i in 0..2 {
                let velocity = (state.raw_delta[i] / state.time_delta).abs();
                if velocity > config.swipe.velocity[i]
                    && state.raw_movement[i].abs() > config.swipe.distance[i]
                {
                    state.swipe[i] = sign(state.raw_delta[i]) as i8;
                }
            }
        }
        tracing::debug!(
            tap = state.tap,
            swipe = ?state.swipe,
            elapsed = state.elapsed_time,
            "drag released"
        );
        self.emit();
    }

    /// Swallow the click that follows a drag that moved.
    fn pointer_click(&mut self, click: &ClickInput) {
        if !self.state.tap && click.detail > 0 {
            self.response.prevent_default = true;
            self.response.stop_propagation = true;
        }
    }

    fn key_down(&mut self, key: &KeyInput, event: &InputEvent) {
        let Some(direction) = key.code.arrow_direction() else {
            return;
        };
        let factor = if key.shift() {
            SHIFT_FACTOR
        } else if key.alt() {
            ALT_FACTOR
        } else {
            1.0
        };
        self.start(event);
        // Arrow keys skip the dead zone.
        for step in &mut self.state.step {
            step.get_or_insert(0.0);
        }
        let step = self.config.keyboard_displacement * factor;
        self.state.raw_delta = [direction[0] * step, direction[1] * step];
        self.state.keyboard_active = true;
        let raw_delta = self.state.raw_delta;
        add_to(&mut self.state.raw_movement, raw_delta);
        self.compute(Some(event));
        self.emit();
    }

    fn key_up(&mut self, key: &KeyInput, event: &InputEvent) {
        if key.code.arrow_direction().is_none() {
            return;
        }
        self.state.keyboard_active = false;
        self.set_active();
        self.compute(Some(event));
        self.emit();
    }
}
