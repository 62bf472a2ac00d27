#![forbid(unsafe_code)]

//! Platform seam.
//!
//! The engine never touches a real window. Everything it needs from the
//! platform (listener registration, pointer capture, pointer lock, element
//! geometry, feature detection) goes through [`Host`]. Hosts route the native
//! events they receive back into [`Controller::dispatch`].
//!
//! [`Controller::dispatch`]: crate::controller::Controller::dispatch

use std::fmt;

use crate::event::{ElementId, EventType, PointerId};

/// Handle returned by [`Host::add_listener`].
pub type ListenerId = u64;

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    /// The configured drag target.
    Element(ElementId),
    /// The global window.
    Window,
}

/// Native listener options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
}

impl ListenerOptions {
    #[must_use]
    pub const fn new(capture: bool, passive: bool) -> Self {
        Self { capture, passive }
    }
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self {
            capture: false,
            passive: true,
        }
    }
}

/// Element box in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Device classes the platform supports.
///
/// This is the feature-detection collaborator: hosts fill it in once and the
/// config resolver picks the drag device from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Support {
    /// Running inside a windowed environment at all.
    pub is_browser: bool,
    /// Touch events are available.
    pub touch: bool,
    /// A touch screen is present (touch events or touch points).
    pub touchscreen: bool,
    /// Pointer events are available.
    pub pointer: bool,
    /// Pointer lock is available.
    pub pointer_lock: bool,
}

impl Support {
    /// A desktop browser with pointer events and pointer lock.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            is_browser: true,
            touch: false,
            touchscreen: false,
            pointer: true,
            pointer_lock: true,
        }
    }

    /// A touch device exposing both pointer and touch events.
    #[must_use]
    pub const fn touch_device() -> Self {
        Self {
            is_browser: true,
            touch: true,
            touchscreen: true,
            pointer: true,
            pointer_lock: false,
        }
    }
}

/// Failures reported by host pointer-capture operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The pointer id is not (or no longer) active.
    UnknownPointer { pointer_id: PointerId },
    /// The element is detached or was never known to the host.
    ElementUnavailable { element: Option<ElementId> },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPointer { pointer_id } => {
                write!(f, "pointer {pointer_id} is not active")
            }
            Self::ElementUnavailable { element: Some(id) } => {
                write!(f, "element {id} is not attached")
            }
            Self::ElementUnavailable { element: None } => {
                write!(f, "event has no target element")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Platform operations the engine relies on.
pub trait Host {
    /// Feature detection for device selection.
    fn support(&self) -> Support;

    /// Whether `element` is currently mounted. Binding to an unmounted target
    /// is skipped.
    fn is_mounted(&self, element: ElementId) -> bool;

    /// Register a native listener and return a handle for removal.
    fn add_listener(
        &mut self,
        target: ListenerTarget,
        event: EventType,
        options: ListenerOptions,
    ) -> ListenerId;

    /// Remove a listener previously returned by [`Host::add_listener`].
    fn remove_listener(&mut self, id: ListenerId);

    fn set_pointer_capture(
        &mut self,
        element: Option<ElementId>,
        pointer_id: PointerId,
    ) -> Result<(), HostError>;

    fn has_pointer_capture(&self, element: Option<ElementId>, pointer_id: PointerId) -> bool;

    fn release_pointer_capture(
        &mut self,
        element: Option<ElementId>,
        pointer_id: PointerId,
    ) -> Result<(), HostError>;

    fn request_pointer_lock(&mut self, element: Option<ElementId>);

    fn exit_pointer_lock(&mut self);

    /// Element currently holding pointer lock, if any.
    fn pointer_lock_element(&self) -> Option<ElementId>;

    /// Client rectangle of `element`, if it is laid out.
    fn element_rect(&self, element: ElementId) -> Option<Rect>;
}
