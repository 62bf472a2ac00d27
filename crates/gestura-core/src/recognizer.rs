#![forbid(unsafe_code)]

//! Generic gesture state machine.
//!
//! A [`Recognizer`] is a short-lived view over one gesture slot of the
//! controller: its config, state, memo, handler and stores, plus the shared
//! state and the host. It is rebuilt for every event, so holding one never
//! outlives a dispatch.
//!
//! # State Machine
//!
//! ```text
//!   ┌──────┐ start  ┌────────────────┐ threshold ┌────────┐ release ┌──────────┐
//!   │ Idle │───────►│ Intent pending │──────────►│ Active │────────►│ Settling │──► Idle
//!   └──────┘        └────────────────┘           └────────┘         └──────────┘
//! ```
//!
//! * `engaged` flips first, on input. `active` follows it on the next
//!   [`Recognizer::compute`], which is also when `first` / `last` are set.
//! * While no axis has crossed its threshold the gesture is not
//!   `intentional` and compute stops early.
//! * On the settling frame (`last`), kinematics are only refreshed when more
//!   than [`BEFORE_LAST_KINEMATICS_DELAY`] elapsed since the previous frame,
//!   so a release right after a fast move keeps that move's velocity.
//!
//! Kind-specific behavior plugs in through [`GestureKind`].

use std::cell::Cell;
use std::fmt;

use crate::config::{CommonConfig, ResolvedFrom};
use crate::controller::{EventResponse, PointerIds};
use crate::event::{Buttons, ElementId, InputEvent, PointerType};
use crate::host::Host;
use crate::state::{GestureState, SharedState, Snapshot};
use crate::store::{EventStore, TimeoutStore, TimerKey};
use crate::vector::{
    UNBOUNDED, Vector2, abs, add, add_to, compute_rubberband, overflow, sign, signs, sub,
};

/// Milliseconds. A settling frame closer than this to the previous frame
/// keeps the previous kinematics.
pub const BEFORE_LAST_KINEMATICS_DELAY: f64 = 32.0;

/// User callback. Its return value, when `Some`, becomes the memo passed back
/// on the next call.
pub type Handler<M> = Box<dyn FnMut(&Snapshot<'_, M>) -> Option<M>>;

/// Hooks a gesture kind provides to the generic state machine.
pub trait GestureKind {
    type Config;
    /// What the kind's listeners trigger.
    type Action: Copy + PartialEq + fmt::Debug;

    const NAME: &'static str;

    fn common(config: &Self::Config) -> &CommonConfig;

    /// Update the shared "gesture in progress" flag.
    fn set_in_progress(shared: &mut SharedState, value: bool);

    /// Kind-specific part of [`Recognizer::reset`].
    fn reset(state: &mut GestureState);

    /// Runs on the first frame of an activation, before the offset is
    /// computed.
    fn setup<H: Host>(
        config: &Self::Config,
        state: &mut GestureState,
        host: &H,
        target: Option<ElementId>,
    );

    /// Detect the axis and decide whether the gesture is blocked.
    fn axis_intent(config: &Self::Config, state: &mut GestureState, pointer: Option<PointerType>);

    /// Zero the components of `v` the gesture may not move along.
    fn restrict_to_axis(config: &Self::Config, state: &GestureState, v: &mut Vector2);

    fn compute_offset(state: &mut GestureState);

    fn compute_movement(state: &mut GestureState);

    /// Kind-specific part of [`Recognizer::clean`].
    fn clean<H: Host>(
        config: &Self::Config,
        state: &mut GestureState,
        host: &mut H,
        target: Option<ElementId>,
    );
}

/// Borrowed view over one gesture slot.
pub struct Recognizer<'a, K: GestureKind, H: Host, M> {
    pub(crate) config: &'a K::Config,
    pub(crate) host: &'a mut H,
    pub(crate) shared: &'a mut SharedState,
    pub(crate) state: &'a mut GestureState,
    pub(crate) memo: &'a mut Option<M>,
    pub(crate) handler: &'a mut Handler<M>,
    pub(crate) events: &'a mut EventStore<K::Action>,
    pub(crate) timers: &'a mut TimeoutStore,
    /// Deferred work that survives [`Recognizer::clean`] (cancel emission).
    pub(crate) deferred: &'a mut TimeoutStore,
    pub(crate) ids: &'a mut PointerIds,
    pub(crate) response: &'a mut EventResponse,
    /// Element the controller is bound to.
    pub(crate) target: Option<ElementId>,
    /// Window-level listeners are available.
    pub(crate) window: bool,
}

impl<K: GestureKind, H: Host, M> Recognizer<'_, K, H, M> {
    pub(crate) fn common(&self) -> &CommonConfig {
        K::common(self.config)
    }

    /// Reinitialize the state for a new gesture cycle.
    ///
    /// Offsets and values carry over, so a new drag continues from where the
    /// previous one ended.
    pub(crate) fn reset(&mut self) {
        K::set_in_progress(self.shared, false);
        *self.memo = None;
        let state = &mut *self.state;
        state.engaged = false;
        state.active = false;
        state.blocked = false;
        state.force = false;
        state.intentional = false;
        state.step = [None, None];
        state.raw_movement = [0.0, 0.0];
        state.raw_distance = [0.0, 0.0];
        state.raw_direction = [0.0, 0.0];
        state.raw_delta = [0.0, 0.0];
        state.bounds = UNBOUNDED;
        state.axis = None;
        state.elapsed_time = 0.0;
        state.time_delta = 0.0;
        state.direction = [0.0, 0.0];
        state.distance = [0.0, 0.0];
        state.overflow = [0, 0];
        state.movement_bound = [None, None];
        state.velocity = [0.0, 0.0];
        state.movement = [0.0, 0.0];
        state.delta = [0.0, 0.0];
        state.time_stamp = 0.0;
        K::reset(state);
    }

    /// Begin a gesture cycle unless one is already engaged.
    pub(crate) fn start(&mut self, event: &InputEvent) {
        if self.state.engaged {
            return;
        }
        self.reset();
        self.compute_initial();
        let from = match &K::common(self.config).from {
            Some(ResolvedFrom::Static(v)) => Some(*v),
            Some(ResolvedFrom::Dynamic(f)) => Some(f.call(self.state)),
            None => None,
        };
        let state = &mut *self.state;
        state.engaged = true;
        state.target = match event {
            InputEvent::Pointer(p) => p.target.or(self.target),
            _ => self.target,
        };
        state.last_offset = from.unwrap_or(state.offset);
        state.offset = state.last_offset;
        state.start_time = event.time_stamp();
        state.time_stamp = event.time_stamp();
        tracing::trace!(gesture = K::NAME, ts = state.start_time, "gesture engaged");
    }

    /// Store raw input coordinates and their transformed values.
    pub(crate) fn compute_values(&mut self, raw: Vector2) {
        self.state.raw_values = raw;
        self.state.values = K::common(self.config).transform(raw);
    }

    pub(crate) fn compute_initial(&mut self) {
        self.state.raw_initial = self.state.raw_values;
        self.state.initial = self.state.values;
    }

    /// Input movement used for threshold stepping: raw movement, or the
    /// transformed displacement from the initial point when a custom
    /// transform is configured.
    fn intent_movement(&self) -> Vector2 {
        let common = K::common(self.config);
        if !common.has_custom_transform {
            return self.state.raw_movement;
        }
        let origin = self.state.raw_initial;
        sub(
            common.transform(add(origin, self.state.raw_movement)),
            common.transform(origin),
        )
    }

    /// Fold the latest input into the gesture state.
    pub(crate) fn compute(&mut self, event: Option<&InputEvent>) {
        let common = K::common(self.config);
        let mut dt = 0.0;

        if let Some(event) = event {
            self.state.event_type = Some(event.event_type());
            if common.prevent_default && event.cancelable() {
                self.response.prevent_default = true;
            }
            let shared = &mut *self.shared;
            shared.touches = self.ids.count();
            shared.locked = self.host.pointer_lock_element().is_some();
            shared.modifiers = event.modifiers();
            shared.buttons = event.buttons();
            shared.down = shared.buttons.contains(Buttons::PRIMARY) || shared.touches > 0;
            shared.pressed = shared.down;

            let ts = event.time_stamp();
            dt = ts - self.state.time_stamp;
            self.state.time_stamp = ts;
            self.state.elapsed_time = ts - self.state.start_time;
        }

        if self.state.engaged {
            let raw_delta = abs(self.state.raw_delta);
            add_to(&mut self.state.raw_distance, raw_delta);
        }

        K::axis_intent(self.config, self.state, event.map(InputEvent::pointer_type));

        let m = self.intent_movement();
        let state = &mut *self.state;
        for i in 0..2 {
            let t = common.threshold[i];
            if state.step[i].is_none() && m[i].abs() >= t {
                state.step[i] = Some(sign(m[i]) * t);
            }
        }
        state.intentional = state.step.iter().any(Option::is_some);
        if !state.intentional {
            return;
        }

        let mut movement = [0.0, 0.0];
        for (i, step) in state.step.iter().enumerate() {
            if let Some(step) = step {
                movement[i] = m[i] - step;
            }
        }
        if !state.blocked {
            K::restrict_to_axis(self.config, state, &mut movement);
        }

        let previous_offset = state.offset;
        let gesture_is_active = (state.engaged && !state.blocked) || state.active;

        if gesture_is_active {
            state.first = state.engaged && !state.active;
            state.last = !state.engaged && state.active;
            state.active = state.engaged;
            K::set_in_progress(self.shared, state.active);

            if event.is_some() {
                if state.first {
                    K::setup(self.config, state, &*self.host, self.target);
                    tracing::debug!(
                        gesture = K::NAME,
                        ts = state.time_stamp,
                        axis = ?state.axis,
                        "gesture activated"
                    );
                }
                state.movement = movement;
                K::compute_offset(state);
            }
        }

        state.overflow = overflow(state.bounds, state.offset);
        for i in 0..2 {
            state.movement_bound[i] = if state.overflow[i] == 0 {
                None
            } else {
                Some(state.movement_bound[i].unwrap_or(state.raw_movement[i]))
            };
        }

        let rubberband = if state.engaged {
            common.rubberband
        } else {
            [0.0, 0.0]
        };
        state.offset = compute_rubberband(state.bounds, state.offset, rubberband);
        state.delta = sub(state.offset, previous_offset);
        K::compute_movement(state);

        if gesture_is_active && (!state.last || dt > BEFORE_LAST_KINEMATICS_DELAY) {
            state.delta = sub(state.offset, previous_offset);
            let absolute = abs(state.delta);
            add_to(&mut state.distance, absolute);
            state.direction = signs(state.delta);
            state.raw_direction = signs(state.raw_delta);

            if !state.first && dt > 0.0 {
                state.velocity = [absolute[0] / dt, absolute[1] / dt];
                state.time_delta = dt;
            }
        }
    }

    /// Deliver the state to the handler.
    ///
    /// A disengaged recognizer releases its stores first. Frames of a gesture
    /// that never became intentional (or is blocked) are swallowed unless
    /// forced or `trigger_all_events` is set.
    pub(crate) fn emit(&mut self) {
        if !self.state.engaged {
            self.clean();
        }
        let state = &*self.state;
        if (state.blocked || !state.intentional)
            && !state.force
            && !K::common(self.config).trigger_all_events
        {
            return;
        }

        let cancel = Cell::new(false);
        let returned = {
            let snapshot = Snapshot::new(&*self.shared, state, self.memo.as_ref(), &cancel);
            (self.handler)(&snapshot)
        };
        if let Some(memo) = returned {
            *self.memo = Some(memo);
        }
        if cancel.get() {
            self.cancel();
        }
    }

    /// Abort the running gesture. The final frame is emitted when the
    /// deferred timer fires, with `canceled` set and the gesture inactive.
    pub(crate) fn cancel(&mut self) {
        if self.state.canceled {
            return;
        }
        self.state.canceled = true;
        self.state.engaged = false;
        self.deferred
            .add(TimerKey::Cancel, self.state.time_stamp, 0.0, None);
        tracing::debug!(gesture = K::NAME, ts = self.state.time_stamp, "gesture canceled");
    }

    /// Deferred half of [`Recognizer::cancel`].
    pub(crate) fn finish_cancel(&mut self) {
        self.compute(None);
        self.emit();
    }

    /// Release listeners and timers registered during the gesture.
    pub(crate) fn clean(&mut self) {
        self.events.clean(self.host);
        self.timers.clean();
        K::clean(self.config, self.state, self.host, self.target);
    }
}
