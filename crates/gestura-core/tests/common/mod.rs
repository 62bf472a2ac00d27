//! Shared fixtures: a recording host and event builders.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use gestura_core::{
    Controller, DragOptions, ElementId, EventType, GestureState, Host, HostError, InputEvent,
    ListenerId, ListenerOptions, ListenerTarget, PointerId, PointerInput, Rect, SharedOptions,
    Support,
};

pub const TARGET: ElementId = 1;

/// Everything the host saw, shared between the controller's copy and the
/// test's handle.
#[derive(Debug, Default)]
pub struct HostLog {
    pub support: Support,
    pub unmounted: BTreeSet<ElementId>,
    pub next_id: ListenerId,
    pub listeners: Vec<(ListenerId, ListenerTarget, EventType, ListenerOptions)>,
    pub captures: BTreeSet<PointerId>,
    pub captured: Vec<PointerId>,
    pub released: Vec<PointerId>,
    pub fail_release: bool,
    pub lock: Option<ElementId>,
    pub lock_requests: usize,
    pub rects: HashMap<ElementId, Rect>,
}

#[derive(Debug, Clone, Default)]
pub struct MockHost {
    pub log: Rc<RefCell<HostLog>>,
}

impl MockHost {
    pub fn new(support: Support) -> Self {
        let host = Self::default();
        host.log.borrow_mut().support = support;
        host
    }

    pub fn desktop() -> Self {
        Self::new(Support::desktop())
    }

    pub fn touch_device() -> Self {
        Self::new(Support::touch_device())
    }

    pub fn listener_count(&self) -> usize {
        self.log.borrow().listeners.len()
    }

    pub fn window_listeners(&self) -> Vec<EventType> {
        self.log
            .borrow()
            .listeners
            .iter()
            .filter(|(_, target, _, _)| *target == ListenerTarget::Window)
            .map(|(_, _, event, _)| *event)
            .collect()
    }
}

impl Host for MockHost {
    fn support(&self) -> Support {
        self.log.borrow().support
    }

    fn is_mounted(&self, element: ElementId) -> bool {
        !self.log.borrow().unmounted.contains(&element)
    }

    fn add_listener(
        &mut self,
        target: ListenerTarget,
        event: EventType,
        options: ListenerOptions,
    ) -> ListenerId {
        let mut log = self.log.borrow_mut();
        log.next_id += 1;
        let id = log.next_id;
        log.listeners.push((id, target, event, options));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.log.borrow_mut().listeners.retain(|(l, ..)| *l != id);
    }

    fn set_pointer_capture(
        &mut self,
        _element: Option<ElementId>,
        pointer_id: PointerId,
    ) -> Result<(), HostError> {
        let mut log = self.log.borrow_mut();
        log.captures.insert(pointer_id);
        log.captured.push(pointer_id);
        Ok(())
    }

    fn has_pointer_capture(&self, _element: Option<ElementId>, pointer_id: PointerId) -> bool {
        self.log.borrow().captures.contains(&pointer_id)
    }

    fn release_pointer_capture(
        &mut self,
        _element: Option<ElementId>,
        pointer_id: PointerId,
    ) -> Result<(), HostError> {
        let mut log = self.log.borrow_mut();
        if log.fail_release {
            return Err(HostError::UnknownPointer { pointer_id });
        }
        log.captures.remove(&pointer_id);
        log.released.push(pointer_id);
        Ok(())
    }

    fn request_pointer_lock(&mut self, element: Option<ElementId>) {
        let mut log = self.log.borrow_mut();
        log.lock_requests += 1;
        log.lock = element;
    }

    fn exit_pointer_lock(&mut self) {
        self.log.borrow_mut().lock = None;
    }

    fn pointer_lock_element(&self) -> Option<ElementId> {
        self.log.borrow().lock
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        self.log.borrow().rects.get(&element).copied()
    }
}

pub type Frames = Rc<RefCell<Vec<GestureState>>>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A controller bound to [`TARGET`] on `host`, recording every frame.
pub fn recording(host: MockHost, options: DragOptions) -> (Controller<MockHost>, Frames) {
    init_tracing();
    let frames: Frames = Rc::default();
    let sink = Rc::clone(&frames);
    let mut ctrl = Controller::new(
        host,
        SharedOptions {
            target: Some(TARGET),
            ..SharedOptions::default()
        },
    )
    .with_drag(options, move |s| {
        sink.borrow_mut().push(s.state.clone());
        None
    });
    let _ = ctrl.effect();
    (ctrl, frames)
}

pub fn desktop(options: DragOptions) -> (Controller<MockHost>, Frames) {
    recording(MockHost::desktop(), options)
}

pub fn down(id: PointerId, pos: [f64; 2], t: f64) -> InputEvent {
    PointerInput::new(EventType::PointerDown, id, pos, t)
        .with_target(TARGET)
        .into()
}

pub fn move_to(id: PointerId, pos: [f64; 2], t: f64) -> InputEvent {
    PointerInput::new(EventType::PointerMove, id, pos, t)
        .with_target(TARGET)
        .into()
}

pub fn up(id: PointerId, pos: [f64; 2], t: f64) -> InputEvent {
    PointerInput::new(EventType::PointerUp, id, pos, t)
        .with_target(TARGET)
        .into()
}

pub fn assert_close(actual: [f64; 2], expected: [f64; 2]) {
    assert!(
        (actual[0] - expected[0]).abs() < 1e-9 && (actual[1] - expected[1]).abs() < 1e-9,
        "expected {expected:?}, got {actual:?}"
    );
}
