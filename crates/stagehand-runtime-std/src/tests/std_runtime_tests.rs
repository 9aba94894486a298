use super::StdRuntime;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn spawning_requests_a_frame_until_pumped() {
    let runtime = StdRuntime::new();
    runtime
        .runtime_handle()
        .spawn_ui(async {})
        .expect("runtime alive");

    assert!(
        runtime.take_frame_request(),
        "spawning a task should request a frame"
    );
    assert!(!runtime.take_frame_request());

    runtime
        .runtime_handle()
        .spawn_ui(async {})
        .expect("runtime alive");
    runtime.pump_frame();
    assert!(!runtime.take_frame_request(), "pumping consumes the request");
    assert!(runtime.is_idle());
}

#[test]
fn pump_frame_delivers_monotonic_timestamps() {
    let runtime = StdRuntime::new();
    let clock = runtime.frame_clock();
    let observed = Rc::new(Cell::new(None));
    {
        let observed = Rc::clone(&observed);
        runtime
            .runtime_handle()
            .spawn_ui(async move {
                let first = clock.next_frame().await;
                let second = clock.next_frame().await;
                observed.set(Some((first, second)));
            })
            .expect("runtime alive");
    }

    let first = runtime.pump_frame();
    assert_eq!(observed.get(), None, "two frames are required");
    let second = runtime.pump_frame();
    assert_eq!(observed.get(), Some((first, second)));
    assert!(second >= first);
    assert!(runtime.is_idle());
}
