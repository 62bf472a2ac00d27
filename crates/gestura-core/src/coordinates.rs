#![forbid(unsafe_code)]

//! Axis detection and offset bookkeeping for position-based gestures.

use crate::state::{Axis, GestureState};
use crate::vector::{Vector2, add, sub};

/// Pick the dominant axis of `movement` once it exceeds `threshold`.
///
/// Ties never resolve: an exactly diagonal movement keeps the axis open.
#[must_use]
pub fn select_axis(movement: Vector2, threshold: f64) -> Option<Axis> {
    let [dx, dy] = [movement[0].abs(), movement[1].abs()];
    if dx > dy && dx > threshold {
        Some(Axis::X)
    } else if dy > dx && dy > threshold {
        Some(Axis::Y)
    } else {
        None
    }
}

/// Resolve `state.axis` from raw movement (when an input event is available)
/// and recompute `state.blocked`.
///
/// A gesture is blocked while it waits for an axis it needs, or once it
/// resolved to an axis other than the configured one.
pub(crate) fn axis_intent(
    configured: Option<Axis>,
    lock_direction: bool,
    threshold: Option<f64>,
    state: &mut GestureState,
) {
    if state.axis.is_none()
        && let Some(threshold) = threshold
    {
        state.axis = select_axis(state.raw_movement, threshold);
    }
    let waiting = (lock_direction || configured.is_some()) && state.axis.is_none();
    let mismatched = configured.is_some() && configured != state.axis;
    state.blocked = waiting || mismatched;
}

/// Zero the off-axis component of `v` when the gesture is axis-restricted.
pub(crate) fn restrict_to_axis(
    configured: Option<Axis>,
    lock_direction: bool,
    axis: Option<Axis>,
    v: &mut Vector2,
) {
    if configured.is_none() && !lock_direction {
        return;
    }
    match axis {
        Some(Axis::X) => v[1] = 0.0,
        Some(Axis::Y) => v[0] = 0.0,
        None => {}
    }
}

pub(crate) fn compute_offset(state: &mut GestureState) {
    state.offset = add(state.last_offset, state.movement);
}

pub(crate) fn compute_movement(state: &mut GestureState) {
    state.movement = sub(state.offset, state.last_offset);
}
