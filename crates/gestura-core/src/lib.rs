#![forbid(unsafe_code)]

//! Drag gesture recognition.
//!
//! This crate folds raw pointer, touch and keyboard events into one
//! continuously updated drag state and hands it to a single callback:
//!
//! - [`vector`] - 2-D vector helpers and the rubberband damping curve
//! - [`config`] - Options, JSON loading and resolution with defaults
//! - [`store`] - Scoped listener and timer registries
//! - [`recognizer`] - Generic activation/threshold/kinematics state machine
//! - [`drag`] - Pointer arbitration, delay, scroll prevention, tap and swipe
//! - [`controller`] - Gesture slots, shared state, bind/clean lifecycle
//! - [`host`] - The platform seam ([`Host`])
//!
//! # Example
//!
//! ```ignore
//! use gestura_core::{Controller, DragOptions, EventType, PointerInput, SharedOptions};
//!
//! let mut ctrl = Controller::new(host, SharedOptions::default())
//!     .with_drag(DragOptions::from_json(r#"{ "axis": "x", "rubberband": true }"#)?, |s| {
//!         move_card_to(s.offset);
//!         None
//!     });
//! let Binding::Props(listeners) = ctrl.bind() else { unreachable!() };
//! // attach `listeners`, then forward native events:
//! ctrl.dispatch(&PointerInput::new(EventType::PointerDown, 1, [10.0, 10.0], 0.0).into());
//! ```

pub mod config;
pub mod controller;
pub mod coordinates;
pub mod drag;
pub mod event;
pub mod host;
pub mod recognizer;
pub mod state;
pub mod store;
pub mod vector;

pub use config::{ConfigError, DragConfig, DragOptions, SharedOptions};
pub use controller::{Binding, Controller, Detach, EventBinding, EventResponse};
pub use drag::{Drag, DragAction};
pub use event::{
    Buttons, ClickInput, ElementId, EventType, InputEvent, KeyCode, KeyInput, Modifiers,
    PointerId, PointerInput, PointerType,
};
pub use host::{Host, HostError, ListenerId, ListenerOptions, ListenerTarget, Rect, Support};
pub use recognizer::Handler;
pub use state::{Axis, GestureState, SharedState, Snapshot};
pub use vector::{Bounds, Vector2};
