#![forbid(unsafe_code)]

//! Options and their resolution into per-gesture configuration.
//!
//! Hosts describe what they want with partially filled option structs
//! ([`SharedOptions`], [`DragOptions`]), either in code or loaded from JSON.
//! [`resolve_shared`] and [`resolve_drag`] turn those into fully populated
//! configs by running a fixed sequence of small resolver functions, each of
//! which owns one key and its default.
//!
//! Resolution never fails: malformed values degrade (negative elasticity to
//! none, inverted bounds to unbounded, unsupported devices to the best one
//! available).
//!
//! # Defaults
//!
//! | key                     | default                          |
//! |-------------------------|----------------------------------|
//! | `rubberband`            | `0` (`true` → `0.15`)            |
//! | `threshold`             | `0` (taps threshold with `filterTaps`, `1` with `axis`) |
//! | `tapsThreshold`         | `3`                              |
//! | `swipe`                 | velocity `0.5`, distance `50`, duration `250` |
//! | `delay`                 | `0` (`true` → `180`)             |
//! | `preventScroll`         | `250` when enabled (a `preventScrollAxis` alone enables it) |
//! | `axisThreshold`         | mouse `0`, touch `0`, pen `8`    |
//! | `keyboardDisplacement`  | `10`                             |
//! | `pointer.buttons`       | `1` (`-1` accepts any)           |

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::event::{Buttons, Device, ElementId, PointerType};
use crate::host::{ListenerOptions, Support};
use crate::state::{Axis, GestureState};
use crate::vector::{Bounds, Vector2, VectorValue, to_vector};

/// Elastic factor used when `rubberband` is `true`.
pub const DEFAULT_RUBBERBAND: f64 = 0.15;
pub const DEFAULT_TAPS_THRESHOLD: f64 = 3.0;
pub const DEFAULT_SWIPE_VELOCITY: f64 = 0.5;
pub const DEFAULT_SWIPE_DISTANCE: f64 = 50.0;
pub const DEFAULT_SWIPE_DURATION: f64 = 250.0;
/// Activation delay used when `delay` is `true`.
pub const DEFAULT_DRAG_DELAY: f64 = 180.0;
pub const DEFAULT_PREVENT_SCROLL_DELAY: f64 = 250.0;
pub const DEFAULT_KEYBOARD_DISPLACEMENT: f64 = 10.0;
pub const DEFAULT_AXIS_THRESHOLD: AxisThreshold = AxisThreshold {
    mouse: 0.0,
    touch: 0.0,
    pen: 8.0,
};

// ---------------------------------------------------------------------------
// Callable options
// ---------------------------------------------------------------------------

/// Maps raw input coordinates into the gesture's value space.
#[derive(Clone)]
pub struct Transform(Rc<dyn Fn(Vector2) -> Vector2>);

impl Transform {
    pub fn new(f: impl Fn(Vector2) -> Vector2 + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[must_use]
    pub fn apply(&self, v: Vector2) -> Vector2 {
        (self.0)(v)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

/// Bounds computed from the gesture state on the first frame.
#[derive(Clone)]
pub struct BoundsFn(Rc<dyn Fn(&GestureState) -> BoundsOption>);

impl BoundsFn {
    pub fn new(f: impl Fn(&GestureState) -> BoundsOption + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[must_use]
    pub fn call(&self, state: &GestureState) -> BoundsOption {
        (self.0)(state)
    }
}

impl fmt::Debug for BoundsFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoundsFn(..)")
    }
}

/// Starting offset computed from the gesture state.
#[derive(Clone)]
pub struct FromFn(Rc<dyn Fn(&GestureState) -> Vector2>);

impl FromFn {
    pub fn new(f: impl Fn(&GestureState) -> Vector2 + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[must_use]
    pub fn call(&self, state: &GestureState) -> Vector2 {
        (self.0)(state)
    }
}

impl fmt::Debug for FromFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromFn(..)")
    }
}

// ---------------------------------------------------------------------------
// Raw options
// ---------------------------------------------------------------------------

/// Either a boolean switch or an explicit value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BoolOr<T> {
    Bool(bool),
    Value(T),
}

/// Bounds sides. Missing sides are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct BoundsSides {
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
}

/// How drag bounds are specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoundsOption {
    /// Keep the dragged element inside another element.
    Element { element: ElementId },
    /// Static sides.
    Sides(BoundsSides),
    /// Computed on the first frame of every activation.
    #[serde(skip)]
    Dynamic(BoundsFn),
}

/// Starting offset, static or computed.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FromOption {
    Value(VectorValue),
    #[serde(skip)]
    Dynamic(FromFn),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOption {
    X,
    Y,
    /// Lock onto whichever axis moves first.
    Lock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollAxis {
    X,
    Y,
    Xy,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AxisThresholdOptions {
    pub mouse: Option<f64>,
    pub touch: Option<f64>,
    pub pen: Option<f64>,
}

/// `-1` accepts any buttons; a list accepts any of its values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ButtonsOption {
    One(i32),
    Many(Vec<u16>),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PointerOptions {
    pub capture: Option<bool>,
    pub buttons: Option<ButtonsOption>,
    pub keys: Option<bool>,
    /// Prefer touch events over pointer events.
    pub touch: Option<bool>,
    /// Request pointer lock on drag start.
    pub lock: Option<bool>,
    /// Prefer mouse events over pointer events.
    pub mouse: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SwipeOptions {
    pub velocity: Option<VectorValue>,
    pub distance: Option<VectorValue>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct EventOptions {
    pub capture: Option<bool>,
    pub passive: Option<bool>,
}

/// Options shared by every gesture kind of a controller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SharedOptions {
    /// Element to attach listeners to. Without one, `bind` hands back the
    /// listeners for the host to attach.
    pub target: Option<ElementId>,
    pub enabled: Option<bool>,
    pub event_options: Option<EventOptions>,
    /// Whether window-level listeners may be registered.
    pub window: Option<bool>,
    #[serde(skip)]
    pub transform: Option<Transform>,
}

/// Drag options. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DragOptions {
    pub enabled: Option<bool>,
    pub event_options: Option<EventOptions>,
    pub prevent_default: Option<bool>,
    pub trigger_all_events: Option<bool>,
    pub rubberband: Option<BoolOr<VectorValue>>,
    pub from: Option<FromOption>,
    pub threshold: Option<VectorValue>,
    #[serde(skip)]
    pub transform: Option<Transform>,
    pub axis: Option<AxisOption>,
    pub axis_threshold: Option<AxisThresholdOptions>,
    pub bounds: Option<BoundsOption>,
    pub filter_taps: Option<bool>,
    pub taps_threshold: Option<f64>,
    pub swipe: Option<SwipeOptions>,
    pub prevent_scroll: Option<BoolOr<f64>>,
    pub prevent_scroll_axis: Option<ScrollAxis>,
    pub delay: Option<BoolOr<f64>>,
    pub pointer: Option<PointerOptions>,
    pub keyboard_displacement: Option<f64>,
}

impl DragOptions {
    /// Parse drag options from JSON.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(ConfigError::Json)
    }
}

impl SharedOptions {
    /// Parse shared options from JSON.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(ConfigError::Json)
    }
}

/// Options loading failures.
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(error) => write!(f, "invalid gesture options: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(error) => Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SharedConfig {
    pub target: Option<ElementId>,
    pub enabled: bool,
    pub window: bool,
    pub event_options: ListenerOptions,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone)]
pub enum ResolvedBounds {
    Static(Bounds),
    Element(ElementId),
    Dynamic(BoundsFn),
}

#[derive(Debug, Clone)]
pub enum ResolvedFrom {
    Static(Vector2),
    Dynamic(FromFn),
}

/// Keys every gesture kind understands.
#[derive(Debug, Clone)]
pub struct CommonConfig {
    pub enabled: bool,
    pub event_options: ListenerOptions,
    pub prevent_default: bool,
    pub trigger_all_events: bool,
    pub rubberband: Vector2,
    pub from: Option<ResolvedFrom>,
    pub transform: Option<Transform>,
    pub has_custom_transform: bool,
    pub threshold: Vector2,
    pub bounds: ResolvedBounds,
}

impl CommonConfig {
    /// Apply the configured transform, or return `v` unchanged.
    #[must_use]
    pub fn transform(&self, v: Vector2) -> Vector2 {
        self.transform.as_ref().map_or(v, |t| t.apply(v))
    }
}

/// Per-device-class axis lock thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisThreshold {
    pub mouse: f64,
    pub touch: f64,
    pub pen: f64,
}

impl AxisThreshold {
    #[must_use]
    pub const fn get(&self, pointer_type: PointerType) -> f64 {
        match pointer_type {
            PointerType::Mouse => self.mouse,
            PointerType::Touch => self.touch,
            PointerType::Pen => self.pen,
        }
    }
}

/// Which `buttons` values may start a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonFilter {
    Any,
    Exactly(u16),
    OneOf(Vec<u16>),
}

impl ButtonFilter {
    #[must_use]
    pub fn accepts(&self, buttons: Buttons) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(b) => *b == buttons.bits(),
            Self::OneOf(list) => list.contains(&buttons.bits()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    pub velocity: Vector2,
    pub distance: Vector2,
    pub duration: f64,
}

/// Fully resolved drag configuration.
#[derive(Debug, Clone)]
pub struct DragConfig {
    pub common: CommonConfig,
    /// Axis the drag is restricted to.
    pub axis: Option<Axis>,
    /// Lock onto the first detected axis.
    pub lock_direction: bool,
    pub axis_threshold: AxisThreshold,
    pub filter_taps: bool,
    pub taps_threshold: f64,
    pub swipe: SwipeConfig,
    pub prevent_scroll_axis: Option<ScrollAxis>,
    pub prevent_scroll_delay: Option<f64>,
    pub delay: f64,
    pub device: Device,
    pub pointer_lock: bool,
    pub pointer_capture: bool,
    pub pointer_buttons: ButtonFilter,
    pub keys: bool,
    pub keyboard_displacement: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        let shared = resolve_shared(&SharedOptions::default(), &Support::default());
        resolve_drag(&DragOptions::default(), &shared, &Support::default())
    }
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/// Resolve shared options.
#[must_use]
pub fn resolve_shared(options: &SharedOptions, support: &Support) -> SharedConfig {
    let event_options = options.event_options.unwrap_or_default();
    SharedConfig {
        target: options.target,
        enabled: options.enabled.unwrap_or(true),
        window: options.window.unwrap_or(support.is_browser),
        event_options: ListenerOptions::new(
            event_options.capture.unwrap_or(false),
            event_options.passive.unwrap_or(true),
        ),
        transform: options.transform.clone(),
    }
}

/// Resolve drag options against shared config and platform support.
///
/// Resolvers run in a fixed order: common keys first, then coordinate keys,
/// then drag keys. `device` runs before `pointer_capture`, which depends on
/// it.
#[must_use]
pub fn resolve_drag(options: &DragOptions, shared: &SharedConfig, support: &Support) -> DragConfig {
    let transform = resolve_transform(options.transform.as_ref(), shared);
    let has_custom_transform = transform.is_some();
    let (device, pointer_lock) = resolve_device(options.pointer.as_ref(), support);
    let pointer = options.pointer.clone().unwrap_or_default();
    let (prevent_scroll_axis, prevent_scroll_delay) = resolve_prevent_scroll(
        options.prevent_scroll_axis,
        options.prevent_scroll,
        support,
    );
    let filter_taps = options.filter_taps.unwrap_or(false);
    let taps_threshold = options.taps_threshold.unwrap_or(DEFAULT_TAPS_THRESHOLD);

    let common = CommonConfig {
        enabled: options.enabled.unwrap_or(true),
        event_options: resolve_event_options(options.event_options, shared),
        prevent_default: options.prevent_default.unwrap_or(false),
        trigger_all_events: options.trigger_all_events.unwrap_or(false),
        rubberband: resolve_rubberband(options.rubberband),
        from: resolve_from(options.from.as_ref()),
        has_custom_transform,
        threshold: resolve_drag_threshold(
            options.threshold,
            filter_taps,
            taps_threshold,
            matches!(options.axis, Some(AxisOption::X | AxisOption::Y)),
        ),
        bounds: resolve_bounds(options.bounds.as_ref()),
        transform,
    };
    let (axis, lock_direction) = resolve_axis(options.axis);
    let swipe = resolve_swipe(options.swipe.unwrap_or_default(), &common);

    DragConfig {
        axis,
        lock_direction,
        axis_threshold: resolve_axis_threshold(options.axis_threshold),
        filter_taps,
        taps_threshold,
        swipe,
        prevent_scroll_axis,
        prevent_scroll_delay,
        delay: resolve_delay(options.delay),
        device,
        pointer_lock,
        pointer_capture: resolve_pointer_capture(&pointer, device, pointer_lock),
        pointer_buttons: resolve_buttons(pointer.buttons.as_ref()),
        keys: pointer.keys.unwrap_or(true),
        keyboard_displacement: options
            .keyboard_displacement
            .filter(|d| d.is_finite())
            .unwrap_or(DEFAULT_KEYBOARD_DISPLACEMENT),
        common,
    }
}

fn resolve_event_options(value: Option<EventOptions>, shared: &SharedConfig) -> ListenerOptions {
    let value = value.unwrap_or_default();
    ListenerOptions::new(
        value.capture.unwrap_or(shared.event_options.capture),
        value.passive.unwrap_or(shared.event_options.passive),
    )
}

fn resolve_rubberband(value: Option<BoolOr<VectorValue>>) -> Vector2 {
    let sanitize = |f: f64| if f.is_finite() && f > 0.0 { f } else { 0.0 };
    match value {
        None | Some(BoolOr::Bool(false)) => [0.0, 0.0],
        Some(BoolOr::Bool(true)) => [DEFAULT_RUBBERBAND, DEFAULT_RUBBERBAND],
        Some(BoolOr::Value(v)) => {
            let [x, y] = v.to_vector();
            [sanitize(x), sanitize(y)]
        }
    }
}

fn resolve_from(value: Option<&FromOption>) -> Option<ResolvedFrom> {
    match value? {
        FromOption::Value(v) => Some(ResolvedFrom::Static(v.to_vector())),
        FromOption::Dynamic(f) => Some(ResolvedFrom::Dynamic(f.clone())),
    }
}

fn resolve_transform(value: Option<&Transform>, shared: &SharedConfig) -> Option<Transform> {
    value.or(shared.transform.as_ref()).cloned()
}

fn resolve_drag_threshold(
    value: Option<VectorValue>,
    filter_taps: bool,
    taps_threshold: f64,
    has_axis: bool,
) -> Vector2 {
    let fallback = if filter_taps {
        taps_threshold
    } else if has_axis {
        1.0
    } else {
        0.0
    };
    to_vector(value, fallback)
}

/// Resolve a bounds option into the form stored in config.
#[must_use]
pub fn resolve_bounds(value: Option<&BoundsOption>) -> ResolvedBounds {
    match value {
        None => ResolvedBounds::Static(sides_to_bounds(BoundsSides::default())),
        Some(BoundsOption::Sides(sides)) => ResolvedBounds::Static(sides_to_bounds(*sides)),
        Some(BoundsOption::Element { element }) => ResolvedBounds::Element(*element),
        Some(BoundsOption::Dynamic(f)) => ResolvedBounds::Dynamic(f.clone()),
    }
}

/// Turn sides into bounds. Missing or NaN sides are unbounded; an inverted
/// axis is left unbounded.
#[must_use]
pub fn sides_to_bounds(sides: BoundsSides) -> Bounds {
    let side = |v: Option<f64>, fallback: f64| v.filter(|v| !v.is_nan()).unwrap_or(fallback);
    let axis = |lo: Option<f64>, hi: Option<f64>| {
        let lo = side(lo, f64::NEG_INFINITY);
        let hi = side(hi, f64::INFINITY);
        if lo > hi {
            [f64::NEG_INFINITY, f64::INFINITY]
        } else {
            [lo, hi]
        }
    };
    [
        axis(sides.left, sides.right),
        axis(sides.top, sides.bottom),
    ]
}

fn resolve_axis(value: Option<AxisOption>) -> (Option<Axis>, bool) {
    match value {
        None => (None, false),
        Some(AxisOption::X) => (Some(Axis::X), false),
        Some(AxisOption::Y) => (Some(Axis::Y), false),
        Some(AxisOption::Lock) => (None, true),
    }
}

fn resolve_axis_threshold(value: Option<AxisThresholdOptions>) -> AxisThreshold {
    let Some(value) = value else {
        return DEFAULT_AXIS_THRESHOLD;
    };
    AxisThreshold {
        mouse: value.mouse.unwrap_or(DEFAULT_AXIS_THRESHOLD.mouse),
        touch: value.touch.unwrap_or(DEFAULT_AXIS_THRESHOLD.touch),
        pen: value.pen.unwrap_or(DEFAULT_AXIS_THRESHOLD.pen),
    }
}

fn resolve_swipe(value: SwipeOptions, common: &CommonConfig) -> SwipeConfig {
    SwipeConfig {
        velocity: common.transform(to_vector(value.velocity, DEFAULT_SWIPE_VELOCITY)),
        distance: common.transform(to_vector(value.distance, DEFAULT_SWIPE_DISTANCE)),
        duration: value.duration.unwrap_or(DEFAULT_SWIPE_DURATION),
    }
}

fn resolve_delay(value: Option<BoolOr<f64>>) -> f64 {
    match value {
        None | Some(BoolOr::Bool(false)) => 0.0,
        Some(BoolOr::Bool(true)) => DEFAULT_DRAG_DELAY,
        Some(BoolOr::Value(ms)) => ms.max(0.0),
    }
}

/// Pick the device family: explicit touch preference, then pointer lock,
/// then native pointer events (unless mouse is forced), then touch, then
/// mouse. Returns the device and whether pointer lock is in effect.
#[must_use]
pub fn resolve_device(pointer: Option<&PointerOptions>, support: &Support) -> (Device, bool) {
    let touch = pointer.and_then(|p| p.touch).unwrap_or(false);
    let lock = pointer.and_then(|p| p.lock).unwrap_or(false) && support.pointer_lock;
    let mouse = pointer.and_then(|p| p.mouse).unwrap_or(false);

    let device = if support.touch && touch {
        Device::Touch
    } else if lock {
        Device::Mouse
    } else if support.pointer && !mouse {
        Device::Pointer
    } else if support.touch {
        Device::Touch
    } else {
        Device::Mouse
    };
    (device, lock)
}

fn resolve_prevent_scroll(
    axis: Option<ScrollAxis>,
    prevent_scroll: Option<BoolOr<f64>>,
    support: &Support,
) -> (Option<ScrollAxis>, Option<f64>) {
    let delay = match prevent_scroll {
        Some(BoolOr::Value(ms)) => Some(ms),
        Some(BoolOr::Bool(true)) => Some(DEFAULT_PREVENT_SCROLL_DELAY),
        None if axis.is_some() => Some(DEFAULT_PREVENT_SCROLL_DELAY),
        _ => None,
    };
    if !support.touchscreen || prevent_scroll == Some(BoolOr::Bool(false)) {
        return (None, delay);
    }
    let axis = axis.or(if prevent_scroll.is_some() {
        Some(ScrollAxis::Y)
    } else {
        None
    });
    (axis, delay)
}

fn resolve_pointer_capture(pointer: &PointerOptions, device: Device, pointer_lock: bool) -> bool {
    !pointer_lock && device == Device::Pointer && pointer.capture.unwrap_or(true)
}

fn resolve_buttons(value: Option<&ButtonsOption>) -> ButtonFilter {
    match value {
        None => ButtonFilter::Exactly(1),
        Some(ButtonsOption::One(-1)) => ButtonFilter::Any,
        Some(ButtonsOption::One(b)) => u16::try_from(*b).map_or(ButtonFilter::Any, ButtonFilter::Exactly),
        Some(ButtonsOption::Many(list)) => ButtonFilter::OneOf(list.clone()),
    }
}
