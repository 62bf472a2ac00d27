//! End-to-end drag scenarios driven through the controller.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{MockHost, TARGET, assert_close, desktop, down, move_to, recording, up};
use gestura_core::config::{
    AxisOption, BoolOr, BoundsFn, BoundsOption, BoundsSides, FromOption, PointerOptions,
    ScrollAxis, Transform,
};
use gestura_core::vector::VectorValue;
use gestura_core::{
    Buttons, ClickInput, Controller, DragOptions, EventType, InputEvent, KeyCode, KeyInput,
    Modifiers, PointerInput, PointerType, Rect, SharedOptions,
};

// ═════════════════════════════════════════════════════════════════════════
// Activation and kinematics
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn press_move_release_produces_first_and_last_frames() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [10.0, 5.0], 16.0));
    ctrl.dispatch(&up(1, [10.0, 5.0], 100.0));

    let frames = frames.borrow();
    assert_eq!(frames.len(), 3);
    assert!(frames[0].first && frames[0].active);
    assert_close(frames[1].offset, [10.0, 5.0]);
    assert_close(frames[1].delta, [10.0, 5.0]);
    assert_close(frames[1].velocity, [10.0 / 16.0, 5.0 / 16.0]);
    assert_eq!(frames[1].direction, [1.0, 1.0]);
    let last = &frames[2];
    assert!(last.last && !last.active);
    assert_close(last.offset, [10.0, 5.0]);
    assert_eq!(last.elapsed_time, 100.0);
}

#[test]
fn shared_state_reflects_drag() {
    let (mut ctrl, _frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    let shared = *ctrl.shared_state();
    assert!(shared.dragging && shared.down && shared.pressed);
    assert_eq!(shared.touches, 1);
    assert_eq!(shared.buttons, Buttons::PRIMARY);

    ctrl.dispatch(&up(1, [0.0, 0.0], 10.0));
    let shared = *ctrl.shared_state();
    assert!(!shared.dragging && !shared.down);
    assert_eq!(shared.touches, 0);
}

#[test]
fn offset_carries_over_to_next_drag() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [10.0, 0.0], 16.0));
    ctrl.dispatch(&up(1, [10.0, 0.0], 50.0));

    ctrl.dispatch(&down(1, [100.0, 100.0], 500.0));
    ctrl.dispatch(&move_to(1, [105.0, 100.0], 516.0));

    let frames = frames.borrow();
    let latest = frames.last().expect("frames");
    assert_close(latest.last_offset, [10.0, 0.0]);
    assert_close(latest.offset, [15.0, 0.0]);
    assert_close(latest.movement, [5.0, 0.0]);
    assert_close(latest.initial, [100.0, 100.0]);
}

#[test]
fn from_option_sets_starting_offset() {
    let options = DragOptions {
        from: Some(FromOption::Value(VectorValue::Pair([5.0, 5.0]))),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [10.0, 0.0], 16.0));
    assert_close(frames.borrow()[1].offset, [15.0, 5.0]);
}

#[test]
fn distance_never_decreases_while_reversing() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    for (i, x) in [10.0, 20.0, 5.0, -15.0, 0.0].into_iter().enumerate() {
        ctrl.dispatch(&move_to(1, [x, 0.0], 16.0 * (i as f64 + 1.0)));
    }
    let frames = frames.borrow();
    for pair in frames.windows(2) {
        assert!(pair[1].distance[0] >= pair[0].distance[0]);
    }
    assert_close(frames.last().expect("frames").distance, [70.0, 0.0]);
}

#[test]
fn repeated_identical_input_is_idempotent() {
    let (mut ctrl, _frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [30.0, 0.0], 16.0));
    let velocity = ctrl.drag_state().expect("drag").velocity;

    ctrl.dispatch(&move_to(1, [30.0, 0.0], 16.0));
    let second = ctrl.drag_state().expect("drag").clone();
    ctrl.dispatch(&move_to(1, [30.0, 0.0], 16.0));
    let third = ctrl.drag_state().expect("drag").clone();

    assert_eq!(second, third);
    assert_close(third.offset, [30.0, 0.0]);
    assert_close(third.movement, [30.0, 0.0]);
    assert_close(third.velocity, velocity);
}

#[test]
fn first_frame_has_no_velocity() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    let frames = frames.borrow();
    assert_eq!(frames[0].velocity, [0.0, 0.0]);
    assert_eq!(frames[0].time_delta, 0.0);
}

// ═════════════════════════════════════════════════════════════════════════
// Thresholds and axis
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn dead_zone_suppresses_emission() {
    let options = DragOptions {
        threshold: Some(VectorValue::Scalar(10.0)),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [5.0, 3.0], 16.0));
    assert!(frames.borrow().is_empty());

    ctrl.dispatch(&move_to(1, [12.0, 3.0], 32.0));
    let frames = frames.borrow();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].intentional && frames[0].first);
    assert_eq!(frames[0].step(), [Some(10.0), None]);
    assert_close(frames[0].offset, [2.0, 0.0]);
}

#[test]
fn step_is_fixed_once_crossed() {
    let options = DragOptions {
        threshold: Some(VectorValue::Scalar(4.0)),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [-6.0, 0.0], 16.0));
    ctrl.dispatch(&move_to(1, [10.0, 0.0], 32.0));
    let frames = frames.borrow();
    assert!(frames.iter().all(|f| f.step()[0] == Some(-4.0)));
    assert_close(frames.last().expect("frames").offset, [14.0, 0.0]);
}

#[test]
fn axis_option_zeroes_cross_axis_delta() {
    let options = DragOptions {
        axis: Some(AxisOption::X),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [10.0, 4.0], 16.0));
    ctrl.dispatch(&move_to(1, [20.0, 15.0], 32.0));

    let frames = frames.borrow();
    assert_eq!(frames.len(), 2);
    for frame in frames.iter() {
        assert_eq!(frame.delta[1], 0.0);
        assert_eq!(frame.offset[1], 0.0);
    }
    assert_close(frames[0].offset, [9.0, 0.0]);
    assert_close(frames[1].delta, [10.0, 0.0]);
}

#[test]
fn mismatched_axis_blocks_gesture() {
    let options = DragOptions {
        axis: Some(AxisOption::X),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [2.0, 20.0], 16.0));
    ctrl.dispatch(&move_to(1, [40.0, 20.0], 32.0));
    ctrl.dispatch(&up(1, [40.0, 20.0], 48.0));
    assert!(frames.borrow().is_empty());
    assert!(!ctrl.shared_state().dragging);
}

#[test]
fn lock_direction_follows_first_axis() {
    let options = DragOptions {
        axis: Some(AxisOption::Lock),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [1.0, 8.0], 16.0));
    ctrl.dispatch(&move_to(1, [30.0, 10.0], 32.0));
    let frames = frames.borrow();
    let last = frames.last().expect("frames");
    assert_eq!(last.axis, Some(gestura_core::Axis::Y));
    assert_close(last.offset, [0.0, 10.0]);
}

#[test]
fn pen_needs_axis_threshold_before_locking() {
    let options = DragOptions {
        axis: Some(AxisOption::Lock),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    let pen = |event: EventType, x: f64, t: f64| -> InputEvent {
        PointerInput::new(event, 1, [x, 0.0], t)
            .with_pointer_type(PointerType::Pen)
            .with_target(TARGET)
            .into()
    };
    ctrl.dispatch(&pen(EventType::PointerDown, 0.0, 0.0));
    ctrl.dispatch(&pen(EventType::PointerMove, 6.0, 16.0));
    assert!(frames.borrow().is_empty());
    ctrl.dispatch(&pen(EventType::PointerMove, 9.0, 32.0));
    assert_eq!(frames.borrow().len(), 1);
}

// ═════════════════════════════════════════════════════════════════════════
// Tap and swipe
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn small_travel_is_a_tap() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [2.0, 1.0], 50.0));
    ctrl.dispatch(&up(1, [2.0, 1.0], 100.0));
    let frames = frames.borrow();
    let last = frames.last().expect("frames");
    assert!(last.tap && last.last);
    assert_eq!(last.swipe, [0, 0]);
}

#[test]
fn filtered_tap_emits_once_when_released() {
    let options = DragOptions {
        filter_taps: Some(true),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [1.0, 1.0], 50.0));
    assert!(frames.borrow().is_empty());
    ctrl.dispatch(&up(1, [1.0, 1.0], 100.0));
    let frames = frames.borrow();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].tap);
    assert!(!frames[0].intentional);
}

#[test]
fn fast_short_release_swipes_right() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [30.0, 0.0], 150.0));
    ctrl.dispatch(&move_to(1, [54.0, 0.0], 190.0));
    ctrl.dispatch(&up(1, [54.0, 0.0], 200.0));
    let frames = frames.borrow();
    let last = frames.last().expect("frames");
    assert_eq!(last.swipe, [1, 0]);
    assert!(!last.tap);
    assert_eq!(last.time_delta, 40.0);
}

#[test]
fn fast_short_release_swipes_left() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [-30.0, 0.0], 150.0));
    ctrl.dispatch(&move_to(1, [-54.0, 0.0], 190.0));
    ctrl.dispatch(&up(1, [-54.0, 0.0], 200.0));
    assert_eq!(frames.borrow().last().expect("frames").swipe, [-1, 0]);
}

#[test]
fn slow_gesture_is_not_a_swipe() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [30.0, 0.0], 250.0));
    ctrl.dispatch(&move_to(1, [54.0, 0.0], 290.0));
    ctrl.dispatch(&up(1, [54.0, 0.0], 300.0));
    assert_eq!(frames.borrow().last().expect("frames").swipe, [0, 0]);
}

#[test]
fn click_after_drag_is_suppressed() {
    let options = DragOptions {
        filter_taps: Some(true),
        ..DragOptions::default()
    };
    let (mut ctrl, _frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [20.0, 0.0], 16.0));
    ctrl.dispatch(&up(1, [20.0, 0.0], 32.0));
    let response = ctrl.dispatch(&ClickInput::new(1, 33.0).into());
    assert!(response.prevent_default && response.stop_propagation);

    ctrl.dispatch(&down(1, [0.0, 0.0], 100.0));
    ctrl.dispatch(&up(1, [0.0, 0.0], 120.0));
    let response = ctrl.dispatch(&ClickInput::new(1, 121.0).into());
    assert!(!response.prevent_default && !response.stop_propagation);
}

// ═════════════════════════════════════════════════════════════════════════
// Bounds and rubberband
// ═════════════════════════════════════════════════════════════════════════

fn horizontal_bounds() -> Option<BoundsOption> {
    Some(BoundsOption::Sides(BoundsSides {
        left: Some(-50.0),
        right: Some(50.0),
        ..BoundsSides::default()
    }))
}

#[test]
fn bounds_without_rubberband_clamp() {
    let options = DragOptions {
        bounds: horizontal_bounds(),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [80.0, 300.0], 16.0));
    let frames = frames.borrow();
    let frame = frames.last().expect("frames");
    assert_close(frame.offset, [50.0, 300.0]);
    assert_eq!(frame.overflow, [1, 0]);
    assert_eq!(frame.movement_bound(), [Some(80.0), None]);
}

#[test]
fn rubberband_overshoots_then_settles() {
    let options = DragOptions {
        bounds: horizontal_bounds(),
        rubberband: Some(BoolOr::Bool(true)),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [80.0, 0.0], 16.0));
    ctrl.dispatch(&up(1, [80.0, 0.0], 100.0));
    let frames = frames.borrow();
    let stretched = frames[1].offset[0];
    assert!(stretched > 50.0 && stretched < 50.0 + 0.15 * 100.0);
    assert_close(frames[2].offset, [50.0, 0.0]);
}

#[test]
fn element_bounds_use_host_rects() {
    let host = MockHost::desktop();
    {
        let mut log = host.log.borrow_mut();
        log.rects.insert(2, Rect::new(0.0, 0.0, 200.0, 100.0));
        log.rects.insert(TARGET, Rect::new(10.0, 10.0, 60.0, 40.0));
    }
    let options = DragOptions {
        bounds: Some(BoundsOption::Element { element: 2 }),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = recording(host, options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [500.0, -500.0], 16.0));
    let frames = frames.borrow();
    assert_eq!(frames[0].bounds(), [[-10.0, 140.0], [-10.0, 60.0]]);
    assert_close(frames[1].offset, [140.0, -10.0]);
}

#[test]
fn element_bounds_without_layout_are_unbounded() {
    let options = DragOptions {
        bounds: Some(BoundsOption::Element { element: 2 }),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [500.0, 0.0], 16.0));
    assert_close(frames.borrow()[1].offset, [500.0, 0.0]);
}

#[test]
fn dynamic_bounds_are_computed_per_activation() {
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    let options = DragOptions {
        bounds: Some(BoundsOption::Dynamic(BoundsFn::new(move |_| {
            *counter.borrow_mut() += 1;
            BoundsOption::Sides(BoundsSides {
                top: Some(0.0),
                bottom: Some(20.0),
                ..BoundsSides::default()
            })
        }))),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [0.0, 90.0], 16.0));
    ctrl.dispatch(&move_to(1, [0.0, 95.0], 32.0));
    assert_eq!(*calls.borrow(), 1);
    assert_close(frames.borrow()[2].offset, [0.0, 20.0]);
}

#[test]
fn custom_transform_scales_movement() {
    let options = DragOptions {
        transform: Some(Transform::new(|[x, y]| [x * 2.0, y * 2.0])),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [1.0, 1.0], 0.0));
    ctrl.dispatch(&move_to(1, [11.0, 1.0], 16.0));
    let frames = frames.borrow();
    assert_close(frames[1].values, [22.0, 2.0]);
    assert_close(frames[1].offset, [20.0, 0.0]);
}

// ═════════════════════════════════════════════════════════════════════════
// Pointer arbitration and capture
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn first_pointer_wins() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    let host = ctrl.host().clone();
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&down(2, [100.0, 100.0], 10.0));
    ctrl.dispatch(&move_to(2, [150.0, 100.0], 20.0));
    ctrl.dispatch(&move_to(1, [5.0, 0.0], 30.0));
    ctrl.dispatch(&up(2, [150.0, 100.0], 40.0));

    let state = ctrl.drag_state().expect("drag");
    assert!(state.active);
    assert_eq!(state.pointer_id(), Some(1));
    assert_close(state.offset, [5.0, 0.0]);
    // The second pointer was captured before arbitration rejected it.
    assert_eq!(host.log.borrow().captured, vec![1, 2]);

    ctrl.dispatch(&up(1, [5.0, 0.0], 50.0));
    let frames = frames.borrow();
    assert!(frames.last().expect("frames").last);
    assert_eq!(frames.len(), 3);
}

#[test]
fn capture_is_released_on_up() {
    let (mut ctrl, _frames) = desktop(DragOptions::default());
    let host = ctrl.host().clone();
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    assert!(host.log.borrow().captures.contains(&1));
    ctrl.dispatch(&up(1, [0.0, 0.0], 10.0));
    assert!(host.log.borrow().captures.is_empty());
    assert_eq!(host.log.borrow().released, vec![1]);
}

#[test]
fn failed_capture_release_still_ends_drag() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.host().log.borrow_mut().fail_release = true;
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [10.0, 0.0], 16.0));
    ctrl.dispatch(&up(1, [10.0, 0.0], 32.0));
    assert!(frames.borrow().last().expect("frames").last);
    assert!(!ctrl.shared_state().dragging);
}

#[test]
fn lost_capture_ends_drag() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [10.0, 0.0], 16.0));
    let lost = PointerInput::new(EventType::LostPointerCapture, 1, [10.0, 0.0], 20.0)
        .with_target(TARGET);
    ctrl.dispatch(&lost.into());
    let frames = frames.borrow();
    let last = frames.last().expect("frames");
    assert!(last.last && !last.active);
    assert_eq!(last.event_type, Some(EventType::LostPointerCapture));
}

#[test]
fn unaccepted_button_is_ignored() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    let right = PointerInput::new(EventType::PointerDown, 1, [0.0, 0.0], 0.0)
        .with_buttons(Some(Buttons::SECONDARY))
        .with_target(TARGET);
    ctrl.dispatch(&right.into());
    assert!(frames.borrow().is_empty());
    assert!(!ctrl.drag_state().expect("drag").is_engaged());
}

#[test]
fn any_button_option_accepts_secondary() {
    let options = DragOptions::from_json(r#"{ "pointer": { "buttons": -1 } }"#).expect("options");
    let (mut ctrl, frames) = desktop(options);
    let right = PointerInput::new(EventType::PointerDown, 1, [0.0, 0.0], 0.0)
        .with_buttons(Some(Buttons::SECONDARY))
        .with_target(TARGET);
    ctrl.dispatch(&right.into());
    assert_eq!(frames.borrow().len(), 1);
}

#[test]
fn without_capture_window_listeners_follow_the_drag() {
    let options = DragOptions {
        pointer: Some(PointerOptions {
            capture: Some(false),
            ..PointerOptions::default()
        }),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    let host = ctrl.host().clone();
    assert!(host.window_listeners().is_empty());

    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    assert_eq!(
        host.window_listeners(),
        vec![
            EventType::PointerMove,
            EventType::PointerUp,
            EventType::PointerCancel
        ]
    );
    ctrl.dispatch(&move_to(1, [7.0, 0.0], 16.0));
    ctrl.dispatch(&up(1, [7.0, 0.0], 32.0));
    assert!(host.window_listeners().is_empty());
    assert_close(frames.borrow()[1].offset, [7.0, 0.0]);
}

#[test]
fn pointer_lock_uses_relative_movement() {
    let options = DragOptions {
        pointer: Some(PointerOptions {
            lock: Some(true),
            ..PointerOptions::default()
        }),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    let host = ctrl.host().clone();
    let mouse = |event: EventType, movement: [f64; 2], t: f64| -> InputEvent {
        PointerInput::new(event, 1, [0.0, 0.0], t)
            .with_movement(movement)
            .with_target(TARGET)
            .into()
    };

    ctrl.dispatch(&mouse(EventType::MouseDown, [0.0, 0.0], 0.0));
    assert_eq!(host.log.borrow().lock, Some(TARGET));
    ctrl.dispatch(&mouse(EventType::MouseMove, [5.0, -2.0], 16.0));
    ctrl.dispatch(&mouse(EventType::MouseMove, [5.0, -2.0], 32.0));
    assert_close(frames.borrow()[2].offset, [10.0, -4.0]);
    assert!(ctrl.shared_state().locked);

    ctrl.dispatch(&mouse(EventType::MouseUp, [0.0, 0.0], 48.0));
    assert_eq!(host.log.borrow().lock, None);
}

// ═════════════════════════════════════════════════════════════════════════
// Delay and scroll prevention
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn delayed_drag_starts_when_timer_fires() {
    let options = DragOptions {
        delay: Some(BoolOr::Bool(true)),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    assert_eq!(ctrl.next_deadline(), Some(180.0));
    ctrl.advance(179.0);
    assert!(frames.borrow().is_empty());
    ctrl.advance(180.0);
    let frames = frames.borrow();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].first && frames[0].active);
    assert_eq!(frames[0].time_stamp, 180.0);
}

#[test]
fn moving_during_delay_starts_immediately() {
    let options = DragOptions {
        delay: Some(BoolOr::Value(180.0)),
        threshold: Some(VectorValue::Scalar(3.0)),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [2.0, 0.0], 20.0));
    assert!(frames.borrow().is_empty());
    ctrl.dispatch(&move_to(1, [8.0, 0.0], 40.0));
    assert_eq!(frames.borrow().len(), 1);
    assert!(frames.borrow()[0].first);
    assert_eq!(ctrl.next_deadline(), None);
}

#[test]
fn release_during_delay_clears_timer() {
    let options = DragOptions {
        delay: Some(BoolOr::Bool(true)),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&up(1, [0.0, 0.0], 50.0));
    assert_eq!(ctrl.next_deadline(), None);
    ctrl.advance(500.0);
    let frames = frames.borrow();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].tap && !frames[0].active && !frames[0].first);
}

fn touch_pointer(event: EventType, pos: [f64; 2], t: f64) -> InputEvent {
    PointerInput::new(event, 1, pos, t)
        .with_pointer_type(PointerType::Touch)
        .with_target(TARGET)
        .into()
}

fn scroll_guarded() -> (Controller<MockHost>, common::Frames) {
    let options = DragOptions {
        prevent_scroll: Some(BoolOr::Bool(true)),
        ..DragOptions::default()
    };
    recording(MockHost::touch_device(), options)
}

#[test]
fn scroll_axis_movement_abandons_drag() {
    let (mut ctrl, frames) = scroll_guarded();
    let host = ctrl.host().clone();
    assert_eq!(
        ctrl.drag_config().expect("drag").prevent_scroll_axis,
        Some(ScrollAxis::Y)
    );

    ctrl.dispatch(&touch_pointer(EventType::PointerDown, [0.0, 0.0], 0.0));
    assert!(host.window_listeners().contains(&EventType::TouchMove));
    ctrl.dispatch(&touch_pointer(EventType::PointerMove, [0.0, 20.0], 50.0));
    ctrl.advance(400.0);

    assert!(frames.borrow().is_empty());
    assert!(host.window_listeners().is_empty());
    assert_eq!(ctrl.next_deadline(), None);
}

#[test]
fn cross_axis_movement_starts_drag_and_blocks_scroll() {
    let (mut ctrl, frames) = scroll_guarded();
    ctrl.dispatch(&touch_pointer(EventType::PointerDown, [0.0, 0.0], 0.0));
    let before = ctrl.dispatch(&touch_pointer(EventType::TouchMove, [0.0, 0.0], 10.0));
    assert!(!before.prevent_default);

    ctrl.dispatch(&touch_pointer(EventType::PointerMove, [20.0, 0.0], 50.0));
    assert_eq!(frames.borrow().len(), 1);
    assert_close(frames.borrow()[0].offset, [20.0, 0.0]);
    assert_eq!(ctrl.next_deadline(), None);

    let after = ctrl.dispatch(&touch_pointer(EventType::TouchMove, [20.0, 0.0], 60.0));
    assert!(after.prevent_default);
}

#[test]
fn holding_still_starts_drag_after_grace_period() {
    let (mut ctrl, frames) = scroll_guarded();
    ctrl.dispatch(&touch_pointer(EventType::PointerDown, [0.0, 0.0], 0.0));
    ctrl.advance(249.0);
    assert!(frames.borrow().is_empty());
    ctrl.advance(250.0);
    assert_eq!(frames.borrow().len(), 1);
    assert!(ctrl.shared_state().dragging);
}

#[test]
fn tap_during_scroll_grace_never_activates() {
    let (mut ctrl, frames) = scroll_guarded();
    let host = ctrl.host().clone();
    ctrl.dispatch(&touch_pointer(EventType::PointerDown, [0.0, 0.0], 0.0));
    assert!(ctrl.next_deadline().is_some());
    ctrl.dispatch(&touch_pointer(EventType::PointerUp, [0.0, 0.0], 50.0));

    assert_eq!(ctrl.next_deadline(), None);
    assert!(host.window_listeners().is_empty());
    ctrl.advance(400.0);
    assert!(frames.borrow().is_empty());
    assert!(!ctrl.shared_state().dragging);
}

#[test]
fn mouse_ignores_scroll_prevention() {
    let (mut ctrl, frames) = scroll_guarded();
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    assert_eq!(frames.borrow().len(), 1);
}

// ═════════════════════════════════════════════════════════════════════════
// Keyboard
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn arrow_keys_displace_with_modifiers() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&KeyInput::down(KeyCode::Right, 0.0).with_modifiers(Modifiers::SHIFT).into());
    ctrl.dispatch(&KeyInput::down(KeyCode::Right, 16.0).with_modifiers(Modifiers::ALT).into());
    ctrl.dispatch(&KeyInput::down(KeyCode::Up, 32.0).into());
    ctrl.dispatch(&KeyInput::up(KeyCode::Up, 48.0).into());

    let frames = frames.borrow();
    assert_eq!(frames.len(), 4);
    assert_close(frames[0].offset, [100.0, 0.0]);
    assert_close(frames[1].delta, [1.0, 0.0]);
    assert_close(frames[2].offset, [101.0, -10.0]);
    assert!(frames[3].last && !frames[3].active);
}

#[test]
fn arrow_keys_move_past_drag_threshold() {
    let (mut ctrl, frames) = desktop(DragOptions {
        threshold: Some(VectorValue::Scalar(20.0)),
        ..DragOptions::default()
    });
    ctrl.dispatch(&KeyInput::down(KeyCode::Right, 0.0).with_modifiers(Modifiers::ALT).into());
    ctrl.dispatch(&KeyInput::down(KeyCode::Right, 50.0).into());
    ctrl.dispatch(&KeyInput::down(KeyCode::Right, 100.0).into());
    ctrl.dispatch(&KeyInput::up(KeyCode::Right, 150.0).into());

    let frames = frames.borrow();
    assert_eq!(frames.len(), 4);
    assert!(frames[0].first && frames[0].active);
    assert_close(frames[0].offset, [1.0, 0.0]);
    assert_close(frames[1].offset, [11.0, 0.0]);
    assert_close(frames[2].offset, [21.0, 0.0]);
    assert!(frames[3].last && !frames[3].active);
    assert_close(frames[3].offset, [21.0, 0.0]);
}

#[test]
fn non_arrow_keys_do_nothing() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&KeyInput::down(KeyCode::Char('a'), 0.0).into());
    ctrl.dispatch(&KeyInput::up(KeyCode::Enter, 10.0).into());
    assert!(frames.borrow().is_empty());
}

#[test]
fn keys_can_be_disabled() {
    let options = DragOptions {
        pointer: Some(PointerOptions {
            keys: Some(false),
            ..PointerOptions::default()
        }),
        ..DragOptions::default()
    };
    let (mut ctrl, frames) = desktop(options);
    ctrl.dispatch(&KeyInput::down(KeyCode::Left, 0.0).into());
    assert!(frames.borrow().is_empty());
}

// ═════════════════════════════════════════════════════════════════════════
// Cancel and memo
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn handler_cancel_defers_final_frame() {
    let frames: common::Frames = Rc::default();
    let sink = Rc::clone(&frames);
    let mut ctrl: Controller<MockHost> = Controller::new(
        MockHost::desktop(),
        SharedOptions {
            target: Some(TARGET),
            ..SharedOptions::default()
        },
    )
    .with_drag(DragOptions::default(), move |s| {
        sink.borrow_mut().push(s.state.clone());
        if s.offset[0] >= 10.0 {
            s.cancel();
        }
        None
    });
    let _ = ctrl.effect();

    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [10.0, 0.0], 16.0));
    assert_eq!(frames.borrow().len(), 2);
    assert!(!frames.borrow()[1].canceled);
    assert_eq!(ctrl.next_deadline(), Some(16.0));

    ctrl.dispatch(&move_to(1, [20.0, 0.0], 32.0));
    let frames = frames.borrow();
    assert_eq!(frames.len(), 3);
    let last = &frames[2];
    assert!(last.canceled && last.last && !last.active);
    assert_close(last.offset, [10.0, 0.0]);
}

#[test]
fn controller_cancel_ends_drag_on_next_advance() {
    let (mut ctrl, frames) = desktop(DragOptions::default());
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [10.0, 0.0], 16.0));
    ctrl.cancel();
    assert_eq!(frames.borrow().len(), 2);
    ctrl.advance(16.0);
    assert!(frames.borrow()[2].canceled);
    ctrl.dispatch(&up(1, [10.0, 0.0], 30.0));
    assert_eq!(frames.borrow().len(), 3);
}

#[test]
fn memo_is_passed_back_and_reset_per_gesture() {
    let seen: Rc<RefCell<Vec<Option<u32>>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let mut ctrl: Controller<MockHost, u32> =
        Controller::new(MockHost::desktop(), SharedOptions::default()).with_drag(
            DragOptions::default(),
            move |s| {
                sink.borrow_mut().push(s.memo.copied());
                Some(s.memo.copied().unwrap_or(0) + 1)
            },
        );
    ctrl.bind();
    ctrl.dispatch(&down(1, [0.0, 0.0], 0.0));
    ctrl.dispatch(&move_to(1, [1.0, 0.0], 16.0));
    ctrl.dispatch(&up(1, [1.0, 0.0], 32.0));
    assert_eq!(ctrl.drag_memo(), Some(&3));
    ctrl.dispatch(&down(1, [0.0, 0.0], 100.0));
    assert_eq!(*seen.borrow(), vec![None, Some(1), Some(2), None]);
}
