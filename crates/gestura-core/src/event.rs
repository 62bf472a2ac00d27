#![forbid(unsafe_code)]

//! Canonical input events consumed by the recognizers.
//!
//! Mouse, touch and pointer events all fold into one [`PointerInput`] shape;
//! the [`EventType`] keeps track of which native family an event came from so
//! that identity tracking (pointer ids vs. touch identifiers) stays correct.
//!
//! # Design Notes
//!
//! - Positions are client coordinates in whatever unit the host uses.
//! - Timestamps are host milliseconds; the engine never reads a wall clock.
//! - Touch events carry the identifier of the changed touch as `pointer_id`
//!   and the identifiers of all touches still on the target in
//!   `active_touches`.

use bitflags::bitflags;
#[cfg(not(target_arch = "wasm32"))]
use crossterm::event as cte;
use std::fmt;

use crate::vector::Vector2;

/// Identifier of a pointer or touch contact.
pub type PointerId = u32;

/// Opaque host handle for an element (drag target or bounds element).
pub type ElementId = u64;

bitflags! {
    /// Modifier keys held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Meta/Command/Super key.
        const META  = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

bitflags! {
    /// Pressed pointer buttons, using the DOM `buttons` bit layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Buttons: u16 {
        const PRIMARY   = 0b0_0001;
        const SECONDARY = 0b0_0010;
        const AUXILIARY = 0b0_0100;
        const BACK      = 0b0_1000;
        const FORWARD   = 0b1_0000;
    }
}

impl Default for Buttons {
    fn default() -> Self {
        Self::empty()
    }
}

/// Physical kind of pointing device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerType {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// Native event family a drag listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Pointer,
    Mouse,
    Touch,
}

impl Device {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Mouse => "mouse",
            Self::Touch => "touch",
        }
    }
}

/// Phase of a device event family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    Change,
    End,
    Cancel,
}

/// Native event names the engine can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    MouseDown,
    MouseMove,
    MouseUp,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    LostPointerCapture,
    KeyDown,
    KeyUp,
    Click,
}

impl EventType {
    /// Event name for `action` on `device`. Mouse has no cancel event.
    #[must_use]
    pub const fn for_device(device: Device, action: Action) -> Option<Self> {
        Some(match (device, action) {
            (Device::Pointer, Action::Start) => Self::PointerDown,
            (Device::Pointer, Action::Change) => Self::PointerMove,
            (Device::Pointer, Action::End) => Self::PointerUp,
            (Device::Pointer, Action::Cancel) => Self::PointerCancel,
            (Device::Mouse, Action::Start) => Self::MouseDown,
            (Device::Mouse, Action::Change) => Self::MouseMove,
            (Device::Mouse, Action::End) => Self::MouseUp,
            (Device::Mouse, Action::Cancel) => return None,
            (Device::Touch, Action::Start) => Self::TouchStart,
            (Device::Touch, Action::Change) => Self::TouchMove,
            (Device::Touch, Action::End) => Self::TouchEnd,
            (Device::Touch, Action::Cancel) => Self::TouchCancel,
        })
    }

    /// Lowercase DOM event name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::PointerUp => "pointerup",
            Self::PointerCancel => "pointercancel",
            Self::MouseDown => "mousedown",
            Self::MouseMove => "mousemove",
            Self::MouseUp => "mouseup",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::TouchCancel => "touchcancel",
            Self::LostPointerCapture => "lostpointercapture",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::Click => "click",
        }
    }

    /// Handler prop name, e.g. `onPointerDown`, with a `Capture` suffix for
    /// capture-phase listeners.
    #[must_use]
    pub fn prop_name(self, capture: bool) -> String {
        let base = match self {
            Self::PointerDown => "onPointerDown",
            Self::PointerMove => "onPointerMove",
            Self::PointerUp => "onPointerUp",
            Self::PointerCancel => "onPointerCancel",
            Self::MouseDown => "onMouseDown",
            Self::MouseMove => "onMouseMove",
            Self::MouseUp => "onMouseUp",
            Self::TouchStart => "onTouchStart",
            Self::TouchMove => "onTouchMove",
            Self::TouchEnd => "onTouchEnd",
            Self::TouchCancel => "onTouchCancel",
            Self::LostPointerCapture => "onLostPointerCapture",
            Self::KeyDown => "onKeyDown",
            Self::KeyUp => "onKeyUp",
            Self::Click => "onClick",
        };
        if capture {
            format!("{base}Capture")
        } else {
            base.to_string()
        }
    }

    #[must_use]
    pub const fn is_touch(self) -> bool {
        matches!(
            self,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::TouchCancel
        )
    }

    #[must_use]
    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::PointerDown
                | Self::PointerMove
                | Self::PointerUp
                | Self::PointerCancel
                | Self::LostPointerCapture
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pointer, mouse or touch event.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerInput {
    pub event_type: EventType,
    /// Pointer id, or the changed touch identifier for touch events.
    pub pointer_id: PointerId,
    pub pointer_type: PointerType,
    /// Pressed buttons; `None` for touch events, which do not report them.
    pub buttons: Option<Buttons>,
    /// Client position.
    pub position: Vector2,
    /// Relative motion since the previous event (used under pointer lock).
    pub movement: Vector2,
    /// Touches still on the target (touch events only).
    pub active_touches: Vec<PointerId>,
    pub modifiers: Modifiers,
    pub time_stamp: f64,
    /// Element the event was dispatched on.
    pub target: Option<ElementId>,
    pub cancelable: bool,
}

impl PointerInput {
    /// Create an event with the defaults a browser would report for its
    /// family: touch events are `Touch` with no buttons and the contact
    /// listed in `active_touches` while it is down; down/move events hold the
    /// primary button; up/cancel events hold none.
    #[must_use]
    pub fn new(
        event_type: EventType,
        pointer_id: PointerId,
        position: Vector2,
        time_stamp: f64,
    ) -> Self {
        let touch = event_type.is_touch();
        let pressed = matches!(
            event_type,
            EventType::PointerDown
                | EventType::PointerMove
                | EventType::MouseDown
                | EventType::MouseMove
        );
        let buttons = if touch {
            None
        } else if pressed {
            Some(Buttons::PRIMARY)
        } else {
            Some(Buttons::empty())
        };
        let active_touches = if matches!(event_type, EventType::TouchStart | EventType::TouchMove) {
            vec![pointer_id]
        } else {
            Vec::new()
        };
        Self {
            event_type,
            pointer_id,
            pointer_type: if touch {
                PointerType::Touch
            } else {
                PointerType::Mouse
            },
            buttons,
            position,
            movement: [0.0, 0.0],
            active_touches,
            modifiers: Modifiers::NONE,
            time_stamp,
            target: None,
            cancelable: true,
        }
    }

    #[must_use]
    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self
    }

    #[must_use]
    pub fn with_buttons(mut self, buttons: Option<Buttons>) -> Self {
        self.buttons = buttons;
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn with_movement(mut self, movement: Vector2) -> Self {
        self.movement = movement;
        self
    }

    #[must_use]
    pub fn with_touches(mut self, touches: Vec<PointerId>) -> Self {
        self.active_touches = touches;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    /// Pointer type as the recognizers see it: touch events are always touch,
    /// pointer events report their own type, mouse events are mouse.
    #[must_use]
    pub const fn effective_pointer_type(&self) -> PointerType {
        if self.event_type.is_touch() {
            PointerType::Touch
        } else if self.event_type.is_pointer() {
            self.pointer_type
        } else {
            PointerType::Mouse
        }
    }
}

/// Key codes the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    Enter,
    Escape,
    Tab,
    Up,
    Down,
    Left,
    Right,
    /// Any key the engine has no use for.
    Other,
}

impl KeyCode {
    /// Unit direction for arrow keys (y grows downward).
    #[must_use]
    pub const fn arrow_direction(self) -> Option<Vector2> {
        match self {
            Self::Right => Some([1.0, 0.0]),
            Self::Left => Some([-1.0, 0.0]),
            Self::Up => Some([0.0, -1.0]),
            Self::Down => Some([0.0, 1.0]),
            _ => None,
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyInput {
    /// [`EventType::KeyDown`] or [`EventType::KeyUp`].
    pub event_type: EventType,
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub time_stamp: f64,
}

impl KeyInput {
    #[must_use]
    pub const fn down(code: KeyCode, time_stamp: f64) -> Self {
        Self {
            event_type: EventType::KeyDown,
            code,
            modifiers: Modifiers::NONE,
            time_stamp,
        }
    }

    #[must_use]
    pub const fn up(code: KeyCode, time_stamp: f64) -> Self {
        Self {
            event_type: EventType::KeyUp,
            code,
            modifiers: Modifiers::NONE,
            time_stamp,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }
}

/// A click event. `detail` is the click count; synthetic clicks report `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickInput {
    pub detail: u32,
    pub modifiers: Modifiers,
    pub time_stamp: f64,
}

impl ClickInput {
    #[must_use]
    pub const fn new(detail: u32, time_stamp: f64) -> Self {
        Self {
            detail,
            modifiers: Modifiers::NONE,
            time_stamp,
        }
    }
}

/// Any event the controller can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerInput),
    Key(KeyInput),
    Click(ClickInput),
}

impl InputEvent {
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Pointer(e) => e.event_type,
            Self::Key(e) => e.event_type,
            Self::Click(_) => EventType::Click,
        }
    }

    #[must_use]
    pub const fn time_stamp(&self) -> f64 {
        match self {
            Self::Pointer(e) => e.time_stamp,
            Self::Key(e) => e.time_stamp,
            Self::Click(e) => e.time_stamp,
        }
    }

    #[must_use]
    pub const fn modifiers(&self) -> Modifiers {
        match self {
            Self::Pointer(e) => e.modifiers,
            Self::Key(e) => e.modifiers,
            Self::Click(e) => e.modifiers,
        }
    }

    /// Pressed buttons; events without button state report none.
    #[must_use]
    pub fn buttons(&self) -> Buttons {
        match self {
            Self::Pointer(e) => e.buttons.unwrap_or(Buttons::empty()),
            _ => Buttons::empty(),
        }
    }

    #[must_use]
    pub const fn pointer_type(&self) -> PointerType {
        match self {
            Self::Pointer(e) => e.effective_pointer_type(),
            _ => PointerType::Mouse,
        }
    }

    #[must_use]
    pub const fn cancelable(&self) -> bool {
        match self {
            Self::Pointer(e) => e.cancelable,
            _ => true,
        }
    }

    /// Convert a crossterm event into an engine event.
    ///
    /// Terminal mice report a single pointer (id `1`) in cell coordinates.
    /// Crossterm carries no timestamps, so the caller supplies one.
    #[must_use]
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_crossterm(event: cte::Event, time_stamp: f64) -> Option<Self> {
        match event {
            cte::Event::Mouse(mouse) => map_mouse_event(mouse, time_stamp).map(Self::Pointer),
            cte::Event::Key(key) => Some(Self::Key(map_key_event(key, time_stamp))),
            _ => None,
        }
    }
}

impl From<PointerInput> for InputEvent {
    fn from(event: PointerInput) -> Self {
        Self::Pointer(event)
    }
}

impl From<KeyInput> for InputEvent {
    fn from(event: KeyInput) -> Self {
        Self::Key(event)
    }
}

impl From<ClickInput> for InputEvent {
    fn from(event: ClickInput) -> Self {
        Self::Click(event)
    }
}

/// Pointer id reported for terminal mouse events.
#[cfg(not(target_arch = "wasm32"))]
pub const TERMINAL_POINTER_ID: PointerId = 1;

#[cfg(not(target_arch = "wasm32"))]
fn map_mouse_event(event: cte::MouseEvent, time_stamp: f64) -> Option<PointerInput> {
    let (event_type, buttons) = match event.kind {
        cte::MouseEventKind::Down(button) => (EventType::PointerDown, map_mouse_button(button)),
        cte::MouseEventKind::Drag(button) => (EventType::PointerMove, map_mouse_button(button)),
        cte::MouseEventKind::Moved => (EventType::PointerMove, Buttons::empty()),
        cte::MouseEventKind::Up(_) => (EventType::PointerUp, Buttons::empty()),
        cte::MouseEventKind::ScrollUp
        | cte::MouseEventKind::ScrollDown
        | cte::MouseEventKind::ScrollLeft
        | cte::MouseEventKind::ScrollRight => return None,
    };
    let position = [f64::from(event.column), f64::from(event.row)];
    Some(
        PointerInput::new(event_type, TERMINAL_POINTER_ID, position, time_stamp)
            .with_buttons(Some(buttons))
            .with_modifiers(map_modifiers(event.modifiers)),
    )
}

#[cfg(not(target_arch = "wasm32"))]
fn map_mouse_button(button: cte::MouseButton) -> Buttons {
    match button {
        cte::MouseButton::Left => Buttons::PRIMARY,
        cte::MouseButton::Right => Buttons::SECONDARY,
        cte::MouseButton::Middle => Buttons::AUXILIARY,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn map_key_event(event: cte::KeyEvent, time_stamp: f64) -> KeyInput {
    let code = match event.code {
        cte::KeyCode::Left => KeyCode::Left,
        cte::KeyCode::Right => KeyCode::Right,
        cte::KeyCode::Up => KeyCode::Up,
        cte::KeyCode::Down => KeyCode::Down,
        cte::KeyCode::Enter => KeyCode::Enter,
        cte::KeyCode::Esc => KeyCode::Escape,
        cte::KeyCode::Tab => KeyCode::Tab,
        cte::KeyCode::Char(c) => KeyCode::Char(c),
        _ => KeyCode::Other,
    };
    let base = match event.kind {
        cte::KeyEventKind::Press | cte::KeyEventKind::Repeat => KeyInput::down(code, time_stamp),
        cte::KeyEventKind::Release => KeyInput::up(code, time_stamp),
    };
    base.with_modifiers(map_modifiers(event.modifiers))
}

#[cfg(not(target_arch = "wasm32"))]
fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.contains(cte::KeyModifiers::SUPER)
        || modifiers.contains(cte::KeyModifiers::HYPER)
        || modifiers.contains(cte::KeyModifiers::META)
    {
        mapped |= Modifiers::META;
    }
    mapped
}
