#![forbid(unsafe_code)]

//! Gesture and shared interaction state.
//!
//! [`GestureState`] has exactly one writer: the recognizer of its gesture
//! kind. Handlers observe it through a [`Snapshot`], which also exposes the
//! [`SharedState`] every gesture kind updates (modifiers, touch count, ...).

use std::cell::Cell;
use std::ops::Deref;

use crate::event::{Buttons, ElementId, EventType, Modifiers, PointerId};
use crate::vector::{Bounds, UNBOUNDED, Vector2};

/// A resolved lock axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// Kinematic and lifecycle state of one gesture kind.
///
/// Public fields are what handlers see. Crate-private fields are recognizer
/// bookkeeping; a few have read-only accessors for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    /// Internal activation flag. `active` follows it on the next compute.
    pub(crate) engaged: bool,
    /// Whether the gesture is running, as observed by handlers.
    pub active: bool,
    /// First frame of an activation.
    pub first: bool,
    /// Final frame of an activation.
    pub last: bool,
    /// The gesture was aborted via `cancel`.
    pub canceled: bool,
    /// At least one axis has crossed its threshold.
    pub intentional: bool,
    pub(crate) blocked: bool,
    pub(crate) force: bool,

    /// Current (transformed) input values.
    pub values: Vector2,
    /// Values at gesture start.
    pub initial: Vector2,
    pub(crate) raw_values: Vector2,
    pub(crate) raw_initial: Vector2,

    /// Position after bounds and rubberbanding.
    pub offset: Vector2,
    /// Offset when the current gesture started.
    pub last_offset: Vector2,
    /// `offset - last_offset`.
    pub movement: Vector2,
    /// Offset change since the previous frame.
    pub delta: Vector2,
    /// Cumulative absolute offset change.
    pub distance: Vector2,
    /// Sign of `delta` per axis.
    pub direction: Vector2,
    /// `|delta| / time_delta`, per axis.
    pub velocity: Vector2,
    /// Which side of the bounds the offset is on, per axis.
    pub overflow: [i8; 2],

    pub(crate) raw_movement: Vector2,
    pub(crate) raw_delta: Vector2,
    pub(crate) raw_distance: Vector2,
    pub(crate) raw_direction: Vector2,

    pub time_stamp: f64,
    pub start_time: f64,
    pub elapsed_time: f64,
    pub time_delta: f64,

    /// Released within the tap threshold.
    pub tap: bool,
    /// Swipe direction per axis (`-1`, `0`, `1`).
    pub swipe: [i8; 2],
    /// Resolved lock axis, once detected.
    pub axis: Option<Axis>,

    /// Element the gesture started on.
    pub target: Option<ElementId>,
    /// Type of the last event folded into the state.
    pub event_type: Option<EventType>,

    pub(crate) bounds: Bounds,
    pub(crate) step: [Option<f64>; 2],
    pub(crate) movement_bound: [Option<f64>; 2],
    pub(crate) pointer_id: Option<PointerId>,
    pub(crate) pointer_active: bool,
    pub(crate) keyboard_active: bool,
    pub(crate) delayed: bool,
    pub(crate) prevent_scroll: bool,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            engaged: false,
            active: false,
            first: false,
            last: false,
            canceled: false,
            intentional: false,
            blocked: false,
            force: false,
            values: [0.0, 0.0],
            initial: [0.0, 0.0],
            raw_values: [0.0, 0.0],
            raw_initial: [0.0, 0.0],
            offset: [0.0, 0.0],
            last_offset: [0.0, 0.0],
            movement: [0.0, 0.0],
            delta: [0.0, 0.0],
            distance: [0.0, 0.0],
            direction: [0.0, 0.0],
            velocity: [0.0, 0.0],
            overflow: [0, 0],
            raw_movement: [0.0, 0.0],
            raw_delta: [0.0, 0.0],
            raw_distance: [0.0, 0.0],
            raw_direction: [0.0, 0.0],
            time_stamp: 0.0,
            start_time: 0.0,
            elapsed_time: 0.0,
            time_delta: 0.0,
            tap: false,
            swipe: [0, 0],
            axis: None,
            target: None,
            event_type: None,
            bounds: UNBOUNDED,
            step: [None, None],
            movement_bound: [None, None],
            pointer_id: None,
            pointer_active: false,
            keyboard_active: false,
            delayed: false,
            prevent_scroll: false,
        }
    }
}

impl GestureState {
    /// Bounds resolved on the first frame of the current activation.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Pointer driving the current drag, if any.
    #[must_use]
    pub const fn pointer_id(&self) -> Option<PointerId> {
        self.pointer_id
    }

    /// Whether the recognizer is engaged, even if `active` has not caught up.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Threshold-crossing marker per axis; `None` until crossed.
    #[must_use]
    pub const fn step(&self) -> [Option<f64>; 2] {
        self.step
    }

    /// Raw (untransformed, unbounded) accumulated input movement.
    #[must_use]
    pub const fn raw_movement(&self) -> Vector2 {
        self.raw_movement
    }

    /// Raw movement at which each axis first overflowed its bounds.
    #[must_use]
    pub const fn movement_bound(&self) -> [Option<f64>; 2] {
        self.movement_bound
    }
}

/// State shared by every gesture kind of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SharedState {
    pub modifiers: Modifiers,
    pub buttons: Buttons,
    /// Live pointers (or touches) on the target.
    pub touches: usize,
    pub down: bool,
    pub pressed: bool,
    /// Pointer lock is engaged.
    pub locked: bool,
    /// A drag is in progress.
    pub dragging: bool,
}

impl SharedState {
    #[must_use]
    pub const fn shift_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    #[must_use]
    pub const fn alt_key(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[must_use]
    pub const fn ctrl_key(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[must_use]
    pub const fn meta_key(&self) -> bool {
        self.modifiers.contains(Modifiers::META)
    }
}

/// What a handler receives: shared state, gesture state, and the value the
/// handler returned last time.
///
/// Dereferences to [`GestureState`], so `snapshot.offset` reads directly.
pub struct Snapshot<'a, M> {
    pub shared: &'a SharedState,
    pub state: &'a GestureState,
    pub memo: Option<&'a M>,
    cancel: &'a Cell<bool>,
}

impl<'a, M> Snapshot<'a, M> {
    pub(crate) const fn new(
        shared: &'a SharedState,
        state: &'a GestureState,
        memo: Option<&'a M>,
        cancel: &'a Cell<bool>,
    ) -> Self {
        Self {
            shared,
            state,
            memo,
            cancel,
        }
    }

    /// Alias for the current `values`.
    #[must_use]
    pub const fn xy(&self) -> Vector2 {
        self.state.values
    }

    /// Request cancellation of the running gesture once the handler returns.
    pub fn cancel(&self) {
        self.cancel.set(true);
    }
}

impl<M> Deref for Snapshot<'_, M> {
    type Target = GestureState;

    fn deref(&self) -> &GestureState {
        self.state
    }
}
