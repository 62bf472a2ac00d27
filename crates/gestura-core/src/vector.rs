#![forbid(unsafe_code)]

//! Two-component vector helpers and the rubberband damping curve.
//!
//! Every kinematic quantity tracked by a recognizer (offset, movement,
//! velocity, ...) is a `[x, y]` pair. Bounds are `[[xmin, xmax], [ymin, ymax]]`
//! with infinite sides meaning "unbounded".
//!
//! # Rubberbanding
//!
//! Instead of stopping hard at a bound, an out-of-range position is pulled
//! back with a saturating curve:
//!
//! ```text
//! P(x, y, f) = x * y * f / (y + f * x)
//! ```
//!
//! where `x` is the excess past the bound, `y` the bound range and `f` the
//! elastic factor. As `x` grows the overflow approaches `f * y` but never
//! reaches it. When the range is infinite (or zero) the curve degenerates to
//! `x^(5f)`.

use serde::Deserialize;

/// A pair of `[x, y]` components.
pub type Vector2 = [f64; 2];

/// Per-axis `[min, max]` ranges: `[[xmin, xmax], [ymin, ymax]]`.
pub type Bounds = [[f64; 2]; 2];

/// Bounds that never constrain.
pub const UNBOUNDED: Bounds = [
    [f64::NEG_INFINITY, f64::INFINITY],
    [f64::NEG_INFINITY, f64::INFINITY],
];

/// A scalar applying to both axes, or an explicit per-axis pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VectorValue {
    Scalar(f64),
    Pair(Vector2),
}

impl VectorValue {
    /// Expand into a pair.
    #[must_use]
    pub const fn to_vector(self) -> Vector2 {
        match self {
            Self::Scalar(v) => [v, v],
            Self::Pair(v) => v,
        }
    }
}

impl From<f64> for VectorValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vector2> for VectorValue {
    fn from(value: Vector2) -> Self {
        Self::Pair(value)
    }
}

/// Expand an optional scalar/pair, using `fallback` on both axes when absent.
#[must_use]
pub fn to_vector(value: Option<VectorValue>, fallback: f64) -> Vector2 {
    value.map_or([fallback, fallback], VectorValue::to_vector)
}

#[inline]
#[must_use]
pub fn add(a: Vector2, b: Vector2) -> Vector2 {
    [a[0] + b[0], a[1] + b[1]]
}

#[inline]
#[must_use]
pub fn sub(a: Vector2, b: Vector2) -> Vector2 {
    [a[0] - b[0], a[1] - b[1]]
}

/// In-place `a += b`.
#[inline]
pub fn add_to(a: &mut Vector2, b: Vector2) {
    a[0] += b[0];
    a[1] += b[1];
}

/// In-place `a -= b`.
#[inline]
pub fn sub_to(a: &mut Vector2, b: Vector2) {
    a[0] -= b[0];
    a[1] -= b[1];
}

#[inline]
#[must_use]
pub fn abs(v: Vector2) -> Vector2 {
    [v[0].abs(), v[1].abs()]
}

/// Sign of `value` as `-1`, `0` or `1`.
///
/// Unlike [`f64::signum`], zero (of either sign) maps to `0`.
#[inline]
#[must_use]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[inline]
#[must_use]
pub fn signs(v: Vector2) -> Vector2 {
    [sign(v[0]), sign(v[1])]
}

/// Saturating overflow for an excess `distance` past a bound of size
/// `dimension` with elastic factor `constant`.
#[must_use]
pub fn rubberband(distance: f64, dimension: f64, constant: f64) -> f64 {
    if dimension == 0.0 || dimension.is_infinite() {
        return distance.powf(constant * 5.0);
    }
    (distance * dimension * constant) / (dimension + constant * distance)
}

/// Damp `position` into `[min, max]`.
///
/// A zero `constant` hard-clamps. Positions already in range are returned
/// unchanged.
#[must_use]
pub fn rubberband_if_out_of_bounds(position: f64, min: f64, max: f64, constant: f64) -> f64 {
    if constant == 0.0 {
        return position.max(min).min(max);
    }
    if position < min {
        return -rubberband(min - position, max - min, constant) + min;
    }
    if position > max {
        return rubberband(position - max, max - min, constant) + max;
    }
    position
}

/// Apply [`rubberband_if_out_of_bounds`] per axis.
#[must_use]
pub fn compute_rubberband(bounds: Bounds, offset: Vector2, rubberband: Vector2) -> Vector2 {
    let [[x0, x1], [y0, y1]] = bounds;
    [
        rubberband_if_out_of_bounds(offset[0], x0, x1, rubberband[0]),
        rubberband_if_out_of_bounds(offset[1], y0, y1, rubberband[1]),
    ]
}

/// Which side of each axis range `offset` lies on: `-1` below, `1` above,
/// `0` inside.
#[must_use]
pub fn overflow(bounds: Bounds, offset: Vector2) -> [i8; 2] {
    let side = |v: f64, [lo, hi]: [f64; 2]| {
        if v < lo {
            -1
        } else if v > hi {
            1
        } else {
            0
        }
    };
    [side(offset[0], bounds[0]), side(offset[1], bounds[1])]
}
