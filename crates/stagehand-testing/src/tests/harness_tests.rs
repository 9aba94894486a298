use super::*;
use crate::EventRecorder;
use stagehand_transition::{TransitionEvent, TransitionState};

#[test]
fn advance_frame_steps_synthetic_time() {
    let mut harness = TransitionHarness::new();
    assert_eq!(harness.frame_time(), 0);
    assert_eq!(harness.advance_frame(), FRAME_INTERVAL_NANOS);
    harness.advance_frames(2);
    assert_eq!(harness.frame_time(), 3 * FRAME_INTERVAL_NANOS);
}

#[test]
fn advance_time_rounds_up_to_whole_frames() {
    let mut harness = TransitionHarness::new();
    harness.advance_time(Duration::from_millis(20));
    assert_eq!(harness.frame_time(), 2 * FRAME_INTERVAL_NANOS);
}

#[test]
fn pump_until_idle_stops_at_transition_end_waits() {
    run_test_transition(|harness| {
        let node = harness
            .transition(
                harness.root(),
                TransitionProps::new().shown(false).enter("fade"),
                None,
            )
            .expect("node");
        node.set_shown(true);
        let frames = harness.pump_until_idle();
        assert_eq!(frames, 2, "the commit wait takes two frames");
        assert_eq!(node.state(), TransitionState::Entering);

        let invoked = harness.finish_transition(node.content()).expect("dispatch");
        assert_eq!(invoked, 1);
        assert_eq!(node.state(), TransitionState::Shown);
    });
}

#[test]
fn recorder_keeps_cross_node_order() {
    let mut harness = TransitionHarness::new();
    let first = harness
        .transition(harness.root(), TransitionProps::new().shown(false), None)
        .expect("first");
    let second = harness
        .transition(harness.root(), TransitionProps::new().shown(false), None)
        .expect("second");
    let recorder = EventRecorder::new();
    let _a = recorder.attach("a", &first);
    let _b = recorder.attach("b", &second);

    first.set_shown(true);
    harness.pump_until_idle();
    second.set_shown(true);
    harness.pump_until_idle();

    assert_eq!(
        recorder.trace(),
        vec!["a:BeforeEnter", "a:AfterEnter", "b:BeforeEnter", "b:AfterEnter"]
    );
    assert_eq!(
        recorder.events_for("b"),
        vec![TransitionEvent::BeforeEnter, TransitionEvent::AfterEnter]
    );
    recorder.clear();
    assert!(recorder.events().is_empty());
}
